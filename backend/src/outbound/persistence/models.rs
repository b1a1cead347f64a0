//! Serde model of the record document.

use serde::{Deserialize, Serialize};

use crate::domain::SubmissionId;
use crate::domain::ports::SubmissionRecord;

/// The whole persisted collection: `{ "submissions": [...], "nextId": n }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoreDocument {
    #[serde(default)]
    pub submissions: Vec<SubmissionRecord>,
    #[serde(rename = "nextId")]
    pub next_id: u64,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            submissions: Vec::new(),
            next_id: SubmissionId::FIRST.get(),
        }
    }
}

impl StoreDocument {
    /// Check that the identifier counter is ahead of every stored id and
    /// that ids are unique.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for record in &self.submissions {
            if !seen.insert(record.id) {
                return Err(format!("duplicate submission id {}", record.id));
            }
        }
        let max_id = self
            .submissions
            .iter()
            .map(|record| record.id.get())
            .max()
            .unwrap_or(0);
        if self.next_id <= max_id || self.next_id == 0 {
            return Err(format!(
                "nextId {} must exceed the largest stored id {max_id}",
                self.next_id
            ));
        }
        Ok(())
    }
}
