//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into the `{ success: false, ... }`
//! envelope and a matching status code.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};
use crate::inbound::http::schemas::ErrorCodeSchema;

pub use crate::domain::ApiResult;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message.
    pub error: String,
    /// Stable machine-readable code.
    #[schema(value_type = ErrorCodeSchema, example = "invalid_request")]
    pub code: ErrorCode,
    /// Request trace identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Structured details, such as the offending field.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::StorageCorrupted | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Server-side failures keep their detail in the logs, not the response.
fn public_message(error: &Error) -> (String, Option<Value>) {
    match error.code() {
        ErrorCode::InternalError => ("Internal server error".to_owned(), None),
        ErrorCode::StorageCorrupted => ("Stored submissions could not be read".to_owned(), None),
        _ => (error.message().to_owned(), error.details().cloned()),
    }
}

impl From<&Error> for ErrorEnvelope {
    fn from(error: &Error) -> Self {
        let (message, details) = public_message(error);
        Self {
            success: false,
            error: message,
            code: error.code(),
            trace_id: error.trace_id().map(str::to_owned),
            details,
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(ErrorEnvelope::from(self))
    }
}

#[cfg(test)]
mod tests {
    //! Status and envelope mapping for domain errors.

    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;
    use serde_json::json;

    async fn envelope(error: &Error) -> (StatusCode, Value) {
        let response = error.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[rstest]
    #[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
    #[case(Error::not_found("gone"), StatusCode::NOT_FOUND)]
    #[case(Error::storage_unavailable("eio"), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(Error::storage_corrupted("bad doc"), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_codes_to_statuses(#[case] error: Error, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[actix_web::test]
    async fn validation_envelope_keeps_message_and_details() {
        let error = Error::invalid_request("missing required field: zip")
            .with_details(json!({ "field": "zip" }));
        let (status, body) = envelope(&error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "missing required field: zip",
                "code": "invalid_request",
                "details": { "field": "zip" }
            })
        );
    }

    #[actix_web::test]
    async fn corruption_envelope_hides_paths() {
        let error = Error::storage_corrupted("/srv/data/submissions.json is not valid")
            .with_trace_id("00000000-0000-0000-0000-000000000000");
        let (_, body) = envelope(&error).await;
        assert_eq!(body["error"], "Stored submissions could not be read");
        assert_eq!(body["traceId"], "00000000-0000-0000-0000-000000000000");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn trace_id_is_echoed_as_header() {
        let error = Error::not_found("gone").with_trace_id("abc");
        let response = error.error_response();
        let header = response
            .headers()
            .get(TRACE_ID_HEADER)
            .expect("trace id header");
        assert_eq!(header, "abc");
    }
}
