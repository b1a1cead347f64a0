//! Driven port for attachment blob storage.

use async_trait::async_trait;

use crate::domain::{AttachmentSlot, StoredName};

use super::define_port_error;

define_port_error! {
    /// Errors raised by attachment store adapters.
    pub enum AttachmentStoreError {
        /// The attachment directory could not be read or written.
        Io { message: String } => "attachment store I/O failed: {message}",
        /// No attachment is stored under the requested name.
        NotFound { name: String } => "attachment '{name}' was not found",
    }
}

/// Port for storing and serving uploaded files.
///
/// Names handed out by [`AttachmentStore::store`] are unique against both
/// concurrent and historical uploads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Persist `bytes` for `slot` and return the generated stored name.
    async fn store(
        &self,
        slot: AttachmentSlot,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredName, AttachmentStoreError>;

    /// Read back the bytes stored under `name`.
    async fn resolve(&self, name: &StoredName) -> Result<Vec<u8>, AttachmentStoreError>;

    /// Delete the attachment stored under `name`. Missing files succeed.
    async fn remove(&self, name: &StoredName) -> Result<(), AttachmentStoreError>;
}

/// Fixture store that accepts uploads without keeping them.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAttachmentStore;

#[async_trait]
impl AttachmentStore for FixtureAttachmentStore {
    async fn store(
        &self,
        _slot: AttachmentSlot,
        original_name: &str,
        _bytes: &[u8],
    ) -> Result<StoredName, AttachmentStoreError> {
        StoredName::parse(&format!("0-0-{original_name}"))
            .map_err(|err| AttachmentStoreError::io(err.to_string()))
    }

    async fn resolve(&self, name: &StoredName) -> Result<Vec<u8>, AttachmentStoreError> {
        Err(AttachmentStoreError::not_found(name.as_str()))
    }

    async fn remove(&self, _name: &StoredName) -> Result<(), AttachmentStoreError> {
        Ok(())
    }
}
