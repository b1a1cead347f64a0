//! Plain-text rendering of the review step.

use crate::answers::{Answers, AttachmentDraft, Quantities};

/// Shown for an upload step that was skipped.
pub const NO_FILE: &str = "No file uploaded";
/// Shown for an empty quantity step.
pub const NONE_SELECTED: &str = "None selected";

/// `<item>: <n> unit` or `<item>: <n> units`.
#[must_use]
pub fn format_quantity(item: &str, quantity: u32) -> String {
    let plural = if quantity > 1 { "s" } else { "" };
    format!("{item}: {quantity} unit{plural}")
}

fn file_line(draft: Option<&AttachmentDraft>) -> &str {
    draft.map_or(NO_FILE, |d| d.file_name.as_str())
}

fn push_quantities(lines: &mut Vec<String>, heading: &str, quantities: &Quantities) {
    lines.push(format!("{heading}:"));
    if quantities.is_empty() {
        lines.push(format!("  - {NONE_SELECTED}"));
    }
    lines.extend(
        quantities
            .iter()
            .map(|(item, quantity)| format!("  - {}", format_quantity(item, quantity))),
    );
}

/// Summary of every answer given so far, as shown on the review step.
///
/// # Examples
/// ```
/// use questionnaire::{Answers, render_review};
///
/// let mut answers = Answers::default();
/// answers.cabinet_type.select("ATC Cabinet");
/// answers.equipment.set_from_input("Type 1 Sensor", "1");
///
/// let text = render_review(&answers);
/// assert!(text.contains("Cabinet Type: ATC Cabinet"));
/// assert!(text.contains("Intersection Phasing: No file uploaded"));
/// assert!(text.contains("  - Type 1 Sensor: 1 unit\n"));
/// ```
#[must_use]
pub fn render_review(answers: &Answers) -> String {
    let mut lines = vec![
        format!("Cabinet Type: {}", answers.cabinet_type.resolved()),
        format!("Detection I/O: {}", answers.detection_io.resolved()),
        format!("TLS Connection: {}", answers.tls_connection.resolved()),
        format!(
            "Intersection Phasing: {}",
            file_line(answers.intersection_phasing.as_ref())
        ),
        format!(
            "Signal Timing: {}",
            file_line(answers.signal_timing.as_ref())
        ),
    ];
    push_quantities(&mut lines, "Equipment", &answers.equipment);
    push_quantities(&mut lines, "Auxiliary Equipment", &answers.auxiliary_equipment);
    lines.into_iter().map(|line| line + "\n").collect()
}
