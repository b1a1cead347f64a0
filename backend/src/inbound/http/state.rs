//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AttachmentQuery, FixtureAttachmentQuery, FixtureSubmissionCommand, FixtureSubmissionQuery,
    SubmissionCommand, SubmissionQuery,
};

/// Upload limit applied when none is configured: 25 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Submission creation and deletion.
    pub submissions: Arc<dyn SubmissionCommand>,
    /// Admin listing.
    pub submissions_query: Arc<dyn SubmissionQuery>,
    /// Attachment downloads.
    pub attachments: Arc<dyn AttachmentQuery>,
    /// Largest accepted multipart part, in bytes.
    pub max_upload_bytes: usize,
}

impl HttpState {
    /// Build state from one service implementing every driving port.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// use intake_backend::domain::SubmissionService;
    /// use intake_backend::domain::ports::{FixtureAttachmentStore, FixtureSubmissionRepository};
    /// use intake_backend::inbound::http::state::HttpState;
    ///
    /// let service = Arc::new(SubmissionService::new(
    ///     Arc::new(FixtureSubmissionRepository),
    ///     Arc::new(FixtureAttachmentStore),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let state = HttpState::from_service(service);
    /// # let _ = state;
    /// ```
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: SubmissionCommand + SubmissionQuery + AttachmentQuery + 'static,
    {
        Self {
            submissions: service.clone(),
            submissions_query: service.clone(),
            attachments: service,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Override the per-part upload limit.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

impl Default for HttpState {
    /// Fixture ports that touch no storage.
    fn default() -> Self {
        Self {
            submissions: Arc::new(FixtureSubmissionCommand),
            submissions_query: Arc::new(FixtureSubmissionQuery),
            attachments: Arc::new(FixtureAttachmentQuery),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
