//! Driving port for reading submissions.

use async_trait::async_trait;

use crate::domain::{Error, Submission};

/// Domain use-case port for the admin listing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionQuery: Send + Sync {
    /// Every submission, newest first, with normalised equipment mappings.
    async fn list(&self) -> Result<Vec<Submission>, Error>;
}

/// Fixture query returning an empty listing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSubmissionQuery;

#[async_trait]
impl SubmissionQuery for FixtureSubmissionQuery {
    async fn list(&self) -> Result<Vec<Submission>, Error> {
        Ok(Vec::new())
    }
}
