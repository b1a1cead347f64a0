//! Driven port for the submission record store.
//!
//! The store exclusively owns the canonical collection. Records come back in
//! their persisted shape: equipment mappings are raw JSON because historical
//! documents hold them either as objects or as serialized strings. The
//! submission service normalises them on every read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{NewSubmission, PostalAddress, StoredName, SubmissionId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by record store adapters.
    pub enum SubmissionRepositoryError {
        /// The backing document could not be read or durably written.
        Io { message: String } => "record store I/O failed: {message}",
        /// The backing document exists but cannot be understood.
        Corruption { message: String } => "record store is corrupted: {message}",
    }
}

/// A submission exactly as the record store persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Identifier assigned on append.
    pub id: SubmissionId,
    /// Resolved cabinet type.
    pub cabinet_type: String,
    /// Resolved detection I/O type.
    pub detection_io: String,
    /// Resolved TLS connection type.
    pub tls_connection: String,
    /// Stored intersection phasing attachment.
    #[serde(default)]
    pub intersection_phasing_file: Option<StoredName>,
    /// Stored signal timing attachment.
    #[serde(default)]
    pub signal_timing_file: Option<StoredName>,
    /// Equipment mapping as persisted.
    #[serde(default)]
    pub equipment: Value,
    /// Auxiliary equipment mapping as persisted.
    #[serde(default)]
    pub auxiliary_equipment: Value,
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

impl SubmissionRecord {
    /// Build the persisted form of `submission` under `id`.
    #[must_use]
    pub fn from_new(id: SubmissionId, submission: &NewSubmission) -> Self {
        Self {
            id,
            cabinet_type: submission.cabinet_type.clone(),
            detection_io: submission.detection_io.clone(),
            tls_connection: submission.tls_connection.clone(),
            intersection_phasing_file: submission.intersection_phasing_file.clone(),
            signal_timing_file: submission.signal_timing_file.clone(),
            equipment: submission.equipment.to_value(),
            auxiliary_equipment: submission.auxiliary_equipment.to_value(),
            distributor: submission.distributor.clone(),
            end_user: submission.end_user.clone(),
            address: submission.address.clone(),
            created_at: submission.created_at,
        }
    }

    /// Stored names of every attachment this record references.
    pub fn attachments(&self) -> impl Iterator<Item = &StoredName> {
        self.intersection_phasing_file
            .iter()
            .chain(self.signal_timing_file.iter())
    }
}

/// Port for the durable submission collection.
///
/// Mutations are serialized with respect to each other and persisted before
/// they return. Reads observe a complete snapshot, never a partial document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Assign the next unused identifier to `submission` and persist it.
    ///
    /// Prior state is unchanged when the durable write fails.
    async fn append(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionId, SubmissionRepositoryError>;

    /// Every record, newest first, ties broken by identifier descending.
    async fn list_all(&self) -> Result<Vec<SubmissionRecord>, SubmissionRepositoryError>;

    /// Point lookup by identifier.
    async fn find_by_id(
        &self,
        id: SubmissionId,
    ) -> Result<Option<SubmissionRecord>, SubmissionRepositoryError>;

    /// Remove the record with `id` and hand it back, or `None` when no record
    /// carries that identifier.
    async fn delete_by_id(
        &self,
        id: SubmissionId,
    ) -> Result<Option<SubmissionRecord>, SubmissionRepositoryError>;
}

/// Fixture repository holding no records.
///
/// Appends succeed with [`SubmissionId::FIRST`] and are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSubmissionRepository;

#[async_trait]
impl SubmissionRepository for FixtureSubmissionRepository {
    async fn append(
        &self,
        _submission: &NewSubmission,
    ) -> Result<SubmissionId, SubmissionRepositoryError> {
        Ok(SubmissionId::FIRST)
    }

    async fn list_all(&self) -> Result<Vec<SubmissionRecord>, SubmissionRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_by_id(
        &self,
        _id: SubmissionId,
    ) -> Result<Option<SubmissionRecord>, SubmissionRepositoryError> {
        Ok(None)
    }

    async fn delete_by_id(
        &self,
        _id: SubmissionId,
    ) -> Result<Option<SubmissionRecord>, SubmissionRepositoryError> {
        Ok(None)
    }
}
