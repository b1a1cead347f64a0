//! Administrative listing of stored submissions.
//!
//! The view keeps the last fetched list and at most one expanded record.
//! Deleting always re-fetches, so the list shows what the service holds.

use std::collections::BTreeMap;

use crate::error::GatewayError;
use crate::gateway::{SubmissionGateway, SubmissionRecord};
use crate::review::{NO_FILE, format_quantity};

/// Shown when the service holds nothing.
pub const EMPTY_LIST: &str = "No submissions yet.";

/// One line of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRow {
    /// Identifier.
    pub id: u64,
    /// Distributor.
    pub distributor: String,
    /// End user.
    pub end_user: String,
    /// `city, state`.
    pub location: String,
    /// Cabinet type.
    pub cabinet_type: String,
    /// Creation time, `YYYY-MM-DD HH:MM UTC`.
    pub submitted: String,
}

impl From<&SubmissionRecord> for AdminRow {
    fn from(record: &SubmissionRecord) -> Self {
        Self {
            id: record.id,
            distributor: record.distributor.clone(),
            end_user: record.end_user.clone(),
            location: format!("{}, {}", record.city, record.state),
            cabinet_type: record.cabinet_type.clone(),
            submitted: record.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

/// List and detail state for the admin commands.
#[derive(Debug, Clone)]
pub struct AdminView {
    base_url: String,
    records: Vec<SubmissionRecord>,
    expanded: Option<u64>,
}

impl AdminView {
    /// Empty view whose attachment links point at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            records: Vec::new(),
            expanded: None,
        }
    }

    /// Replace the listing. The expanded row survives if it is still listed.
    pub fn load(&mut self, records: Vec<SubmissionRecord>) {
        self.records = records;
        if self.expanded.is_some_and(|id| self.record(id).is_none()) {
            self.expanded = None;
        }
    }

    /// Records as last fetched.
    #[must_use]
    pub fn records(&self) -> &[SubmissionRecord] {
        &self.records
    }

    /// Record with `id`, if listed.
    #[must_use]
    pub fn record(&self, id: u64) -> Option<&SubmissionRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Listing rows in service order.
    #[must_use]
    pub fn rows(&self) -> Vec<AdminRow> {
        self.records.iter().map(AdminRow::from).collect()
    }

    /// Expand `id`, or collapse it if already expanded. Only one record is
    /// expanded at a time.
    pub fn toggle(&mut self, id: u64) {
        self.expanded = if self.expanded == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    /// The expanded record id.
    #[must_use]
    pub fn expanded(&self) -> Option<u64> {
        self.expanded
    }

    /// Link for a stored attachment.
    #[must_use]
    pub fn attachment_url(&self, stored_name: &str) -> String {
        format!("{}/uploads/{stored_name}", self.base_url)
    }

    /// Fetch the listing again.
    ///
    /// # Errors
    /// Propagates gateway failures; the previous listing is kept.
    pub async fn refresh(&mut self, gateway: &dyn SubmissionGateway) -> Result<(), GatewayError> {
        let records = gateway.list().await?;
        self.load(records);
        Ok(())
    }

    /// Delete `id`, then re-fetch the listing.
    ///
    /// # Errors
    /// Propagates gateway failures from either call.
    pub async fn delete(
        &mut self,
        gateway: &dyn SubmissionGateway,
        id: u64,
    ) -> Result<(), GatewayError> {
        gateway.delete(id).await?;
        self.refresh(gateway).await
    }

    /// Text table of every row.
    #[must_use]
    pub fn render_table(&self) -> String {
        if self.records.is_empty() {
            return format!("{EMPTY_LIST}\n");
        }
        let header = format!(
            "{:>5}  {:<24} {:<24} {:<22} {:<20} {}\n",
            "ID", "Distributor", "End-User", "City, State", "Cabinet Type", "Submitted"
        );
        let body: String = self
            .rows()
            .iter()
            .map(|row| {
                format!(
                    "{:>5}  {:<24} {:<24} {:<22} {:<20} {}\n",
                    row.id,
                    row.distributor,
                    row.end_user,
                    row.location,
                    row.cabinet_type,
                    row.submitted
                )
            })
            .collect();
        header + &body
    }

    /// Detail text for the expanded record.
    #[must_use]
    pub fn render_expanded(&self) -> Option<String> {
        self.expanded
            .and_then(|id| self.record(id))
            .map(|record| self.render_detail(record))
    }

    /// Detail text: technical info, attachment links, equipment, auxiliary
    /// equipment and contact info.
    #[must_use]
    pub fn render_detail(&self, record: &SubmissionRecord) -> String {
        let link = |stored: Option<&String>| {
            stored.map_or_else(|| NO_FILE.to_owned(), |name| self.attachment_url(name))
        };
        let mut lines = vec![
            format!("Submission #{}", record.id),
            "Technical Information".to_owned(),
            format!("  Cabinet Type: {}", record.cabinet_type),
            format!("  Detection I/O: {}", record.detection_io),
            format!("  TLS Connection: {}", record.tls_connection),
            format!(
                "  Intersection Phasing: {}",
                link(record.intersection_phasing_file.as_ref())
            ),
            format!(
                "  Signal Timing: {}",
                link(record.signal_timing_file.as_ref())
            ),
        ];
        push_equipment(&mut lines, "Equipment", "No equipment selected", &record.equipment);
        push_equipment(
            &mut lines,
            "Auxiliary Equipment",
            "No auxiliary equipment selected",
            &record.auxiliary_equipment,
        );
        lines.extend([
            "Contact Information".to_owned(),
            format!("  Distributor: {}", record.distributor),
            format!("  End-User: {}", record.end_user),
            format!("  Address: {}", record.address),
            format!("  City: {}", record.city),
            format!("  State: {}", record.state),
            format!("  ZIP: {}", record.zip),
        ]);
        lines.into_iter().map(|line| line + "\n").collect()
    }
}

fn push_equipment(
    lines: &mut Vec<String>,
    heading: &str,
    empty: &str,
    quantities: &BTreeMap<String, u32>,
) {
    lines.push(heading.to_owned());
    if quantities.is_empty() {
        lines.push(format!("  {empty}"));
    }
    lines.extend(
        quantities
            .iter()
            .map(|(item, qty)| format!("  - {}", format_quantity(item, *qty))),
    );
}
