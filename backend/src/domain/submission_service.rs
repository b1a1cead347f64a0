//! Submission domain service.
//!
//! Implements the driving ports on top of the record store and attachment
//! store. Writes coordinate both stores so that a failed append leaves no
//! orphan attachments behind. Reads normalise persisted equipment mappings
//! into [`EquipmentMap`] values.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    AttachmentQuery, AttachmentStore, AttachmentStoreError, SubmissionCommand, SubmissionQuery,
    SubmissionRecord, SubmissionRepository, SubmissionRepositoryError,
};
use crate::domain::{
    AttachmentSlot, EquipmentMap, Error, NewSubmission, StoredName, Submission, SubmissionForm,
    SubmissionId, UploadedFile,
};

/// Submission service implementing the command and query ports.
#[derive(Clone)]
pub struct SubmissionService<R, A> {
    records: Arc<R>,
    attachments: Arc<A>,
    clock: Arc<dyn Clock>,
}

impl<R, A> SubmissionService<R, A> {
    /// Create a service over the given stores.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// use intake_backend::domain::SubmissionService;
    /// use intake_backend::domain::ports::{FixtureAttachmentStore, FixtureSubmissionRepository};
    ///
    /// let service = SubmissionService::new(
    ///     Arc::new(FixtureSubmissionRepository),
    ///     Arc::new(FixtureAttachmentStore),
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(records: Arc<R>, attachments: Arc<A>, clock: Arc<dyn Clock>) -> Self {
        Self {
            records,
            attachments,
            clock,
        }
    }
}

impl<R, A> SubmissionService<R, A>
where
    R: SubmissionRepository,
    A: AttachmentStore,
{
    fn map_repository_error(operation: &str, error: SubmissionRepositoryError) -> Error {
        warn!(operation, error = %error, "record store operation failed");
        match error {
            SubmissionRepositoryError::Io { message } => {
                Error::storage_unavailable(format!("record store unavailable: {message}"))
            }
            SubmissionRepositoryError::Corruption { message } => {
                Error::storage_corrupted(format!("record store is corrupted: {message}"))
            }
        }
    }

    fn map_attachment_error(error: AttachmentStoreError) -> Error {
        match error {
            AttachmentStoreError::NotFound { name } => {
                Error::not_found(format!("attachment '{name}' was not found"))
            }
            AttachmentStoreError::Io { message } => {
                Error::storage_unavailable(format!("attachment store unavailable: {message}"))
            }
        }
    }

    /// Store every uploaded file, removing the ones already written if a
    /// later write fails.
    async fn store_attachments(
        &self,
        files: &[UploadedFile],
    ) -> Result<StoredAttachments, Error> {
        let mut stored = StoredAttachments::default();
        for file in files {
            match self
                .attachments
                .store(file.slot, &file.original_name, &file.bytes)
                .await
            {
                Ok(name) => {
                    debug!(stored_name = %name, slot = ?file.slot, "attachment stored");
                    stored.insert(file.slot, name);
                }
                Err(error) => {
                    warn!(
                        operation = "submit",
                        original_name = %file.original_name,
                        error = %error,
                        "attachment write failed"
                    );
                    self.discard(stored.names()).await;
                    return Err(Self::map_attachment_error(error));
                }
            }
        }
        Ok(stored)
    }

    /// Best-effort removal of attachments that will not be referenced.
    async fn discard<'a>(&self, names: impl IntoIterator<Item = &'a StoredName> + Send) {
        for name in names {
            if let Err(error) = self.attachments.remove(name).await {
                warn!(stored_name = %name, error = %error, "attachment cleanup failed");
            }
        }
    }

    fn normalise(record: SubmissionRecord) -> Result<Submission, Error> {
        let id = record.id;
        let equipment = Self::normalise_mapping(id, "equipment", &record.equipment)?;
        let auxiliary_equipment =
            Self::normalise_mapping(id, "auxiliary_equipment", &record.auxiliary_equipment)?;
        Ok(Submission {
            id,
            cabinet_type: record.cabinet_type,
            detection_io: record.detection_io,
            tls_connection: record.tls_connection,
            intersection_phasing_file: record.intersection_phasing_file,
            signal_timing_file: record.signal_timing_file,
            equipment,
            auxiliary_equipment,
            distributor: record.distributor,
            end_user: record.end_user,
            address: record.address,
            created_at: record.created_at,
        })
    }

    fn normalise_mapping(
        id: SubmissionId,
        field: &'static str,
        stored: &serde_json::Value,
    ) -> Result<EquipmentMap, Error> {
        EquipmentMap::from_stored(stored).map_err(|err| {
            warn!(operation = "list", submission_id = %id, field, error = %err, "stored mapping is unreadable");
            Error::storage_corrupted(format!("submission {id} has an unreadable {field}: {err}"))
                .with_details(json!({ "id": id, "field": field }))
        })
    }
}

fn ensure_distinct_slots(files: &[UploadedFile]) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for file in files {
        if !seen.insert(file.slot) {
            let field = file.slot.field_name();
            return Err(
                Error::invalid_request(format!("{field} was uploaded more than once"))
                    .with_details(json!({ "field": field, "code": "duplicate_file" })),
            );
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct StoredAttachments {
    intersection_phasing: Option<StoredName>,
    signal_timing: Option<StoredName>,
}

impl StoredAttachments {
    fn insert(&mut self, slot: AttachmentSlot, name: StoredName) {
        match slot {
            AttachmentSlot::IntersectionPhasing => self.intersection_phasing = Some(name),
            AttachmentSlot::SignalTiming => self.signal_timing = Some(name),
        }
    }

    fn names(&self) -> impl Iterator<Item = &StoredName> + Send {
        self.intersection_phasing
            .iter()
            .chain(self.signal_timing.iter())
    }
}

#[async_trait]
impl<R, A> SubmissionCommand for SubmissionService<R, A>
where
    R: SubmissionRepository,
    A: AttachmentStore,
{
    async fn submit(&self, form: SubmissionForm) -> Result<SubmissionId, Error> {
        let fields = form.validate().inspect_err(|err| {
            debug!(operation = "submit", error = %err, "submission rejected");
        })?;
        ensure_distinct_slots(&form.files)?;
        let stored = self.store_attachments(&form.files).await?;

        let submission = NewSubmission {
            cabinet_type: fields.cabinet_type,
            detection_io: fields.detection_io,
            tls_connection: fields.tls_connection,
            intersection_phasing_file: stored.intersection_phasing.clone(),
            signal_timing_file: stored.signal_timing.clone(),
            equipment: fields.equipment,
            auxiliary_equipment: fields.auxiliary_equipment,
            distributor: fields.distributor,
            end_user: fields.end_user,
            address: fields.address,
            created_at: self.clock.utc(),
        };

        match self.records.append(&submission).await {
            Ok(id) => {
                info!(operation = "submit", submission_id = %id, "submission stored");
                Ok(id)
            }
            Err(error) => {
                self.discard(submission.attachments()).await;
                Err(Self::map_repository_error("submit", error))
            }
        }
    }

    async fn remove(&self, id: SubmissionId) -> Result<bool, Error> {
        let removed = self
            .records
            .delete_by_id(id)
            .await
            .map_err(|err| Self::map_repository_error("remove", err))?;
        let Some(record) = removed else {
            debug!(operation = "remove", submission_id = %id, "submission already absent");
            return Ok(false);
        };
        info!(operation = "remove", submission_id = %id, "submission deleted");
        self.discard(record.attachments()).await;
        Ok(true)
    }
}

#[async_trait]
impl<R, A> SubmissionQuery for SubmissionService<R, A>
where
    R: SubmissionRepository,
    A: AttachmentStore,
{
    async fn list(&self) -> Result<Vec<Submission>, Error> {
        let records = self
            .records
            .list_all()
            .await
            .map_err(|err| Self::map_repository_error("list", err))?;
        records.into_iter().map(Self::normalise).collect()
    }
}

#[async_trait]
impl<R, A> AttachmentQuery for SubmissionService<R, A>
where
    R: SubmissionRepository,
    A: AttachmentStore,
{
    async fn fetch(&self, name: &StoredName) -> Result<Vec<u8>, Error> {
        self.attachments.resolve(name).await.map_err(|err| {
            debug!(operation = "fetch", stored_name = %name, error = %err, "attachment unavailable");
            Self::map_attachment_error(err)
        })
    }
}

#[cfg(test)]
#[path = "submission_service_tests.rs"]
mod tests;
