//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their structure for documentation only.

use std::collections::BTreeMap;

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// Storage could not be read or written; retrying may succeed.
    #[schema(rename = "storage_unavailable")]
    StorageUnavailable,
    /// The record document cannot be understood.
    #[schema(rename = "storage_corrupted")]
    StorageCorrupted,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Submission`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Submission)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct SubmissionSchema {
    /// Identifier, unique and never reused.
    #[schema(example = 1)]
    id: u64,
    /// Resolved cabinet type.
    #[schema(example = "NEMA TS-2 Type 1")]
    cabinet_type: String,
    /// Resolved detection I/O type.
    #[schema(example = "Custom Harness V2")]
    detection_io: String,
    /// Resolved TLS connection type.
    #[schema(example = "NTCIP")]
    tls_connection: String,
    /// Stored name of the intersection phasing attachment.
    #[schema(example = "1714564800000-482913-plan.pdf")]
    intersection_phasing_file: Option<String>,
    /// Stored name of the signal timing attachment.
    signal_timing_file: Option<String>,
    /// Item name to positive quantity.
    equipment: BTreeMap<String, u32>,
    /// Auxiliary item name to positive quantity.
    auxiliary_equipment: BTreeMap<String, u32>,
    /// Distributor name.
    distributor: String,
    /// End-user name.
    end_user: String,
    /// Street address.
    address: String,
    /// City.
    city: String,
    /// State.
    state: String,
    /// ZIP code.
    zip: String,
    /// Persistence timestamp, RFC 3339 UTC.
    #[schema(example = "2024-05-01T12:00:00Z")]
    created_at: String,
}
