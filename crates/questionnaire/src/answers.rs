//! The in-progress answer set held by the wizard.
//!
//! All answers live in one [`Answers`] aggregate. Choice answers remember the
//! selected option and the free-text override separately so switching away
//! from "Other" and back starts with an empty override, and quantity maps
//! never hold a zero or negative entry.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::options::OTHER;

/// A single-choice answer with an optional free-text override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceAnswer {
    selection: String,
    other: String,
}

impl ChoiceAnswer {
    /// Choose `selection`. Choosing anything but "Other" clears the override.
    pub fn select(&mut self, selection: impl Into<String>) {
        self.selection = selection.into();
        if !self.is_other() {
            self.other.clear();
        }
    }

    /// Set the free-text override used when "Other" is selected.
    pub fn set_other(&mut self, text: impl Into<String>) {
        self.other = text.into();
    }

    /// The option as chosen, possibly `"Other"` or empty.
    #[must_use]
    pub fn selection(&self) -> &str {
        &self.selection
    }

    /// The free-text override.
    #[must_use]
    pub fn other(&self) -> &str {
        &self.other
    }

    /// Whether "Other" is selected.
    #[must_use]
    pub fn is_other(&self) -> bool {
        self.selection == OTHER
    }

    /// The value to submit: the override when "Other" is selected, otherwise
    /// the selection.
    ///
    /// # Examples
    /// ```
    /// use questionnaire::ChoiceAnswer;
    ///
    /// let mut answer = ChoiceAnswer::default();
    /// answer.select("Other");
    /// answer.set_other("Custom Harness V2");
    /// assert_eq!(answer.resolved(), "Custom Harness V2");
    ///
    /// answer.select("NTCIP");
    /// assert_eq!(answer.resolved(), "NTCIP");
    /// assert_eq!(answer.other(), "");
    /// ```
    #[must_use]
    pub fn resolved(&self) -> &str {
        if self.is_other() {
            &self.other
        } else {
            &self.selection
        }
    }
}

/// Read a quantity the way a browser number field's text is read as an
/// integer.
///
/// Leading whitespace is skipped, one optional sign is honoured and the
/// leading run of digits is taken. Input with no leading digits reads as 0.
///
/// # Examples
/// ```
/// use questionnaire::parse_quantity;
///
/// assert_eq!(parse_quantity("  12 units"), 12);
/// assert_eq!(parse_quantity("3.7"), 3);
/// assert_eq!(parse_quantity("-2"), -2);
/// assert_eq!(parse_quantity("abc"), 0);
/// ```
#[must_use]
pub fn parse_quantity(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let magnitude = digits
        .chars()
        .map_while(|ch| ch.to_digit(10))
        .fold(0_i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit))
        });
    if negative { -magnitude } else { magnitude }
}

/// Item name to positive quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Quantities(BTreeMap<String, u32>);

impl Quantities {
    /// Apply a typed quantity: positive sets or overwrites, anything else
    /// removes the item.
    pub fn set_from_input(&mut self, item: &str, input: &str) {
        self.set(item, parse_quantity(input));
    }

    /// Set `item` to `quantity`, removing it when `quantity <= 0`.
    pub fn set(&mut self, item: &str, quantity: i64) {
        if quantity <= 0 {
            self.0.remove(item);
        } else {
            let clamped = u32::try_from(quantity).unwrap_or(u32::MAX);
            self.0.insert(item.to_owned(), clamped);
        }
    }

    /// Quantity for `item`, if set.
    #[must_use]
    pub fn get(&self, item: &str) -> Option<u32> {
        self.0.get(item).copied()
    }

    /// Entries in item-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(item, qty)| (item.as_str(), *qty))
    }

    /// Number of items with a quantity.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no item has a quantity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The JSON object text sent in the multipart form.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_owned())
    }
}

/// A file chosen for one of the upload steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDraft {
    /// Name reported to the server.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl AttachmentDraft {
    /// Draft from in-memory contents.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read the file at `path`.
    ///
    /// # Errors
    /// Returns the I/O error when the file cannot be read.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self { file_name, bytes })
    }
}

/// Authorization step: who is ordering and where it ships.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    /// Distributor name.
    pub distributor: String,
    /// End-user name.
    pub end_user: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// ZIP code.
    pub zip: String,
}

/// Every answer the wizard collects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers {
    /// Step 1.
    pub cabinet_type: ChoiceAnswer,
    /// Step 2.
    pub detection_io: ChoiceAnswer,
    /// Step 3.
    pub tls_connection: ChoiceAnswer,
    /// Step 4.
    pub intersection_phasing: Option<AttachmentDraft>,
    /// Step 5.
    pub signal_timing: Option<AttachmentDraft>,
    /// Step 6.
    pub equipment: Quantities,
    /// Step 7.
    pub auxiliary_equipment: Quantities,
    /// Step 9.
    pub contact: Contact,
}
