//! Questionnaire submission aggregate and its value types.
//!
//! A [`Submission`] is the canonical in-memory shape handed to adapters. Its
//! equipment mappings are always structured [`EquipmentMap`] values, however
//! the record happened to be persisted.
//!
//! ## Invariants
//! - [`EquipmentMap`] never holds a zero quantity; non-positive input is
//!   dropped during construction.
//! - [`StoredName`] is always a single, non-hidden path component.
//! - `created_at` is assigned when the record is persisted.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Choice label meaning "use the accompanying free-text override".
pub const OTHER_CHOICE: &str = "Other";

/// Unique, never reused submission identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(u64);

impl SubmissionId {
    /// Identifier handed to the first record of an empty store.
    pub const FIRST: Self = Self(1);

    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolve a choice answer, substituting the override when "Other" was chosen.
///
/// An absent or empty override is accepted as-is and yields an empty string.
///
/// # Examples
/// ```
/// use intake_backend::domain::resolve_choice;
///
/// assert_eq!(resolve_choice("NTCIP", Some("ignored")), "NTCIP");
/// assert_eq!(resolve_choice("Other", Some("Custom Harness V2")), "Custom Harness V2");
/// assert_eq!(resolve_choice("Other", None), "");
/// ```
#[must_use]
pub fn resolve_choice(selection: &str, other: Option<&str>) -> String {
    if selection == OTHER_CHOICE {
        other.unwrap_or_default().to_owned()
    } else {
        selection.to_owned()
    }
}

/// Errors raised while building an [`EquipmentMap`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquipmentMapError {
    /// The serialized form is not valid JSON.
    #[error("equipment is not valid JSON: {message}")]
    Syntax {
        /// Parser diagnostic.
        message: String,
    },
    /// The value is valid JSON but not an object.
    #[error("equipment must be a JSON object of item quantities")]
    NotAnObject,
    /// A quantity is not an integer.
    #[error("quantity for '{item}' must be an integer")]
    InvalidQuantity {
        /// Item whose quantity is malformed.
        item: String,
    },
    /// A quantity does not fit the supported range.
    #[error("quantity for '{item}' is too large")]
    QuantityOutOfRange {
        /// Item whose quantity overflowed.
        item: String,
    },
}

/// Item name to positive quantity mapping.
///
/// # Examples
/// ```
/// use intake_backend::domain::EquipmentMap;
///
/// let mut map = EquipmentMap::default();
/// map.set("Nexus Unit", 2);
/// map.set("Type 1 Sensor", 0);
/// assert_eq!(map.get("Nexus Unit"), Some(2));
/// assert!(map.get("Type 1 Sensor").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EquipmentMap(BTreeMap<String, u32>);

impl EquipmentMap {
    /// Set a quantity; zero removes the item.
    pub fn set(&mut self, item: impl Into<String>, quantity: u32) {
        let item = item.into();
        if quantity == 0 {
            self.0.remove(&item);
        } else {
            self.0.insert(item, quantity);
        }
    }

    /// Quantity for `item`, if one is recorded.
    #[must_use]
    pub fn get(&self, item: &str) -> Option<u32> {
        self.0.get(item).copied()
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

    /// Iterate items in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(item, qty)| (item.as_str(), *qty))
    }

    /// Parse the serialized form sent by clients.
    ///
    /// Blank input means "nothing selected". Anything else must be a JSON
    /// object of integer quantities.
    ///
    /// # Errors
    /// Returns [`EquipmentMapError`] when the input is not such an object.
    pub fn parse_serialized(raw: &str) -> Result<Self, EquipmentMapError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value =
            serde_json::from_str(raw).map_err(|err| EquipmentMapError::Syntax {
                message: err.to_string(),
            })?;
        Self::from_object(&value)
    }

    /// Normalize a persisted mapping, which may be a structured object, a
    /// serialized string holding an object, or absent.
    ///
    /// # Errors
    /// Returns [`EquipmentMapError`] when the stored value cannot be read as a
    /// mapping.
    ///
    /// # Examples
    /// ```
    /// use intake_backend::domain::EquipmentMap;
    /// use serde_json::json;
    ///
    /// let structured = EquipmentMap::from_stored(&json!({"Nexus Unit": 2})).unwrap();
    /// let serialized = EquipmentMap::from_stored(&json!("{\"Nexus Unit\":2}")).unwrap();
    /// assert_eq!(structured, serialized);
    /// ```
    pub fn from_stored(value: &Value) -> Result<Self, EquipmentMapError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(raw) => Self::parse_serialized(raw),
            other => Self::from_object(other),
        }
    }

    /// Structured JSON form written to the record document.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(item, qty)| (item.clone(), Value::from(*qty)))
                .collect(),
        )
    }

    fn from_object(value: &Value) -> Result<Self, EquipmentMapError> {
        let Value::Object(entries) = value else {
            return Err(EquipmentMapError::NotAnObject);
        };
        let mut map = Self::default();
        for (item, quantity) in entries {
            let quantity = quantity
                .as_i64()
                .ok_or_else(|| EquipmentMapError::InvalidQuantity { item: item.clone() })?;
            if quantity <= 0 {
                continue;
            }
            let quantity = u32::try_from(quantity)
                .map_err(|_| EquipmentMapError::QuantityOutOfRange { item: item.clone() })?;
            map.set(item.clone(), quantity);
        }
        Ok(map)
    }
}

impl FromIterator<(String, u32)> for EquipmentMap {
    fn from_iter<T: IntoIterator<Item = (String, u32)>>(iter: T) -> Self {
        let mut map = Self::default();
        for (item, quantity) in iter {
            map.set(item, quantity);
        }
        map
    }
}

/// Validation failures for [`StoredName`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoredNameError {
    /// The name is empty.
    #[error("stored name must not be empty")]
    Empty,
    /// The name could escape the attachment directory or names a hidden file.
    #[error("stored name '{0}' is not a plain file name")]
    NotPlain(String),
}

/// Collision-resistant name under which attachment bytes are stored.
///
/// Deserialisation goes through [`StoredName::parse`], so a record document
/// naming an escaping path fails to load instead of yielding a bad name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoredName(String);

impl StoredName {
    /// Validate a stored name received from a client or the record document.
    ///
    /// # Errors
    /// Rejects empty names, names starting with `.`, and names containing
    /// path separators or NUL.
    ///
    /// # Examples
    /// ```
    /// use intake_backend::domain::StoredName;
    ///
    /// assert!(StoredName::parse("1700000000000-42-plan.pdf").is_ok());
    /// assert!(StoredName::parse("../submissions.json").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, StoredNameError> {
        if raw.is_empty() {
            return Err(StoredNameError::Empty);
        }
        let escapes = raw.starts_with('.') || raw.contains(['/', '\\', '\0']);
        if escapes {
            return Err(StoredNameError::NotPlain(raw.to_owned()));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for StoredName {
    type Error = StoredNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoredName> for String {
    fn from(value: StoredName) -> Self {
        value.0
    }
}

impl fmt::Display for StoredName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two independently optional upload slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentSlot {
    /// Intersection phasing diagram.
    IntersectionPhasing,
    /// Signal timing sheet.
    SignalTiming,
}

impl AttachmentSlot {
    /// Multipart field name carrying this slot's file.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::IntersectionPhasing => "intersectionPhasingFile",
            Self::SignalTiming => "signalTimingFile",
        }
    }

    /// Map a multipart field name back to its slot.
    #[must_use]
    pub fn from_field_name(name: &str) -> Option<Self> {
        [Self::IntersectionPhasing, Self::SignalTiming]
            .into_iter()
            .find(|slot| slot.field_name() == name)
    }
}

/// Postal address of the end user. All parts are free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    /// Street address.
    #[serde(rename = "address")]
    pub street: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// ZIP code.
    pub zip: String,
}

/// A validated submission waiting for an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    /// Resolved cabinet type.
    pub cabinet_type: String,
    /// Resolved detection I/O type.
    pub detection_io: String,
    /// Resolved TLS connection type.
    pub tls_connection: String,
    /// Stored intersection phasing attachment.
    pub intersection_phasing_file: Option<StoredName>,
    /// Stored signal timing attachment.
    pub signal_timing_file: Option<StoredName>,
    /// Equipment quantities.
    pub equipment: EquipmentMap,
    /// Auxiliary equipment quantities.
    pub auxiliary_equipment: EquipmentMap,
    /// Distributor name.
    pub distributor: String,
    /// End-user name.
    pub end_user: String,
    /// End-user postal address.
    pub address: PostalAddress,
    /// Persistence timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewSubmission {
    /// Stored names of every attachment this submission references.
    pub fn attachments(&self) -> impl Iterator<Item = &StoredName> {
        self.intersection_phasing_file
            .iter()
            .chain(self.signal_timing_file.iter())
    }
}

/// A persisted questionnaire submission.
///
/// Serialises with the snake_case keys of the record document, flattening the
/// postal address into `address`, `city`, `state` and `zip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    /// Identifier.
    pub id: SubmissionId,
    /// Resolved cabinet type.
    pub cabinet_type: String,
    /// Resolved detection I/O type.
    pub detection_io: String,
    /// Resolved TLS connection type.
    pub tls_connection: String,
    /// Stored intersection phasing attachment.
    pub intersection_phasing_file: Option<StoredName>,
    /// Stored signal timing attachment.
    pub signal_timing_file: Option<StoredName>,
    /// Equipment quantities.
    pub equipment: EquipmentMap,
    /// Auxiliary equipment quantities.
    pub auxiliary_equipment: EquipmentMap,
    /// Distributor name.
    pub distributor: String,
    /// End-user name.
    pub end_user: String,
    /// End-user postal address.
    #[serde(flatten)]
    pub address: PostalAddress,
    /// Persistence timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Unit coverage for submission value types.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("NEMA TS-2 Type 1", None, "NEMA TS-2 Type 1")]
    #[case("Other", Some("Custom Harness V2"), "Custom Harness V2")]
    #[case("Other", Some(""), "")]
    #[case("Other", None, "")]
    #[case("NTCIP", Some("stale override"), "NTCIP")]
    fn resolve_choice_prefers_override_only_for_other(
        #[case] selection: &str,
        #[case] other: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(resolve_choice(selection, other), expected);
    }

    #[rstest]
    #[case("", 0)]
    #[case("   ", 0)]
    #[case("{}", 0)]
    #[case(r#"{"Nexus Unit":2}"#, 1)]
    #[case(r#"{"Nexus Unit":2,"Type 1 Sensor":0,"Type 2 Sensor":-3}"#, 1)]
    fn parse_serialized_accepts_objects(#[case] raw: &str, #[case] expected_len: usize) {
        let map = EquipmentMap::parse_serialized(raw).expect("valid mapping");
        assert_eq!(map.len(), expected_len);
    }

    #[rstest]
    #[case("not json", "Syntax")]
    #[case("[1,2]", "NotAnObject")]
    #[case("null", "NotAnObject")]
    #[case(r#"{"Nexus Unit":"two"}"#, "InvalidQuantity")]
    #[case(r#"{"Nexus Unit":1.5}"#, "InvalidQuantity")]
    #[case(r#"{"Nexus Unit":99999999999}"#, "QuantityOutOfRange")]
    fn parse_serialized_rejects_malformed_input(#[case] raw: &str, #[case] kind: &str) {
        let err = EquipmentMap::parse_serialized(raw).expect_err("mapping is malformed");
        let matched = match err {
            EquipmentMapError::Syntax { .. } => "Syntax",
            EquipmentMapError::NotAnObject => "NotAnObject",
            EquipmentMapError::InvalidQuantity { .. } => "InvalidQuantity",
            EquipmentMapError::QuantityOutOfRange { .. } => "QuantityOutOfRange",
        };
        assert_eq!(matched, kind);
    }

    #[rstest]
    #[case(json!({"Nexus Unit": 2, "C1 Harness": 1}))]
    #[case(json!("{\"Nexus Unit\":2,\"C1 Harness\":1}"))]
    fn from_stored_normalises_both_representations(#[case] stored: Value) {
        let map = EquipmentMap::from_stored(&stored).expect("normalises");
        assert_eq!(map.get("Nexus Unit"), Some(2));
        assert_eq!(map.get("C1 Harness"), Some(1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn from_stored_treats_null_as_empty() {
        let map = EquipmentMap::from_stored(&Value::Null).expect("normalises");
        assert!(map.is_empty());
    }

    #[test]
    fn set_overwrites_and_zero_removes() {
        let mut map = EquipmentMap::default();
        map.set("Nexus Unit", 2);
        map.set("Nexus Unit", 5);
        assert_eq!(map.get("Nexus Unit"), Some(5));
        map.set("Nexus Unit", 0);
        assert!(map.is_empty());
    }

    #[test]
    fn to_value_round_trips_through_from_stored() {
        let map: EquipmentMap = [("Wifi Repeater".to_owned(), 3)].into_iter().collect();
        let restored = EquipmentMap::from_stored(&map.to_value()).expect("round trip");
        assert_eq!(restored, map);
    }

    #[rstest]
    #[case("")]
    #[case(".hidden")]
    #[case("..")]
    #[case("../submissions.json")]
    #[case("nested/plan.pdf")]
    #[case("nested\\plan.pdf")]
    #[case("nul\0byte")]
    fn stored_name_rejects_escaping_names(#[case] raw: &str) {
        assert!(StoredName::parse(raw).is_err());
    }

    #[rstest]
    #[case(r#""../../etc/passwd""#)]
    #[case(r#"".submissions.json""#)]
    #[case(r#""""#)]
    fn stored_name_deserialisation_validates(#[case] encoded: &str) {
        assert!(serde_json::from_str::<StoredName>(encoded).is_err());
    }

    #[test]
    fn stored_name_serialises_as_plain_string() {
        let name: StoredName =
            serde_json::from_str(r#""1700000000000-7-plan.pdf""#).expect("valid name");
        assert_eq!(
            serde_json::to_string(&name).expect("serialises"),
            r#""1700000000000-7-plan.pdf""#
        );
    }

    #[test]
    fn stored_name_accepts_generated_shape() {
        let name = StoredName::parse("1700000000000-123456789-plan.pdf").expect("valid");
        assert_eq!(name.as_str(), "1700000000000-123456789-plan.pdf");
    }

    #[rstest]
    #[case(AttachmentSlot::IntersectionPhasing)]
    #[case(AttachmentSlot::SignalTiming)]
    fn slot_field_names_map_back(#[case] slot: AttachmentSlot) {
        assert_eq!(AttachmentSlot::from_field_name(slot.field_name()), Some(slot));
    }

    #[test]
    fn submission_serialises_with_flat_address() {
        let submission = Submission {
            id: SubmissionId::FIRST,
            cabinet_type: "ATC Cabinet".to_owned(),
            detection_io: "NTCIP".to_owned(),
            tls_connection: "None".to_owned(),
            intersection_phasing_file: None,
            signal_timing_file: None,
            equipment: EquipmentMap::default(),
            auxiliary_equipment: EquipmentMap::default(),
            distributor: "Acme Co".to_owned(),
            end_user: "City of Springfield".to_owned(),
            address: PostalAddress {
                street: "742 Evergreen Terrace".to_owned(),
                city: "Springfield".to_owned(),
                state: "OR".to_owned(),
                zip: "97477".to_owned(),
            },
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let value = serde_json::to_value(&submission).expect("serialises");
        assert_eq!(value["id"], 1);
        assert_eq!(value["address"], "742 Evergreen Terrace");
        assert_eq!(value["zip"], "97477");
        assert_eq!(value["intersection_phasing_file"], Value::Null);
        assert_eq!(value["equipment"], json!({}));
    }
}
