//! Driving port for submission mutations.
//!
//! Inbound adapters hand the raw multipart form to this port and receive the
//! new identifier, keeping storage concerns out of HTTP handlers.

use async_trait::async_trait;

use crate::domain::{Error, SubmissionForm, SubmissionId};

/// Domain use-case port for creating and deleting submissions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionCommand: Send + Sync {
    /// Validate `form`, store its attachments and persist the submission.
    async fn submit(&self, form: SubmissionForm) -> Result<SubmissionId, Error>;

    /// Delete the submission with `id`, returning whether one existed.
    async fn remove(&self, id: SubmissionId) -> Result<bool, Error>;
}

/// Fixture command that accepts every form as the first submission.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSubmissionCommand;

#[async_trait]
impl SubmissionCommand for FixtureSubmissionCommand {
    async fn submit(&self, form: SubmissionForm) -> Result<SubmissionId, Error> {
        form.validate()?;
        Ok(SubmissionId::FIRST)
    }

    async fn remove(&self, _id: SubmissionId) -> Result<bool, Error> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[tokio::test]
    async fn fixture_command_still_validates() {
        let err = FixtureSubmissionCommand
            .submit(SubmissionForm::default())
            .await
            .expect_err("empty form is invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
