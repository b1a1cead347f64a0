//! Driving port for serving stored attachments.

use async_trait::async_trait;

use crate::domain::{Error, StoredName};

/// Domain use-case port for attachment retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentQuery: Send + Sync {
    /// Bytes stored under `name`, or a not-found error.
    async fn fetch(&self, name: &StoredName) -> Result<Vec<u8>, Error>;
}

/// Fixture query that knows no attachments.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAttachmentQuery;

#[async_trait]
impl AttachmentQuery for FixtureAttachmentQuery {
    async fn fetch(&self, name: &StoredName) -> Result<Vec<u8>, Error> {
        Err(Error::not_found(format!("attachment '{name}' was not found")))
    }
}
