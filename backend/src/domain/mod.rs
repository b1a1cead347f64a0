//! Domain primitives, ports and services.
//!
//! Purpose: define the submission aggregate, its validation rules and the
//! use-case service behind the hexagonal ports. Nothing here knows about HTTP
//! or the filesystem.
//!
//! Public surface:
//! - [`Submission`], [`NewSubmission`] and their value types.
//! - [`SubmissionForm`]: raw multipart input and its validation.
//! - [`SubmissionService`]: implements the driving ports.
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failures.

pub mod error;
pub mod ports;
pub mod submission;
pub mod submission_form;
pub mod submission_service;
pub mod trace_id;

pub use self::error::{Error, ErrorCode};
pub use self::submission::{
    AttachmentSlot, EquipmentMap, EquipmentMapError, NewSubmission, OTHER_CHOICE, PostalAddress,
    StoredName, StoredNameError, Submission, SubmissionId, resolve_choice,
};
pub use self::submission_form::{SubmissionForm, UploadedFile, ValidatedFields};
pub use self::submission_service::SubmissionService;
pub use self::trace_id::TraceId;

/// HTTP header name used to propagate trace identifiers.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient result alias for adapters.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use intake_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
