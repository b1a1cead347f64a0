//! Submission HTTP handlers.
//!
//! ```text
//! POST   /api/submissions
//! GET    /api/submissions
//! DELETE /api/submissions/{id}
//! ```

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, web};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{Error, Submission, SubmissionId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::multipart::read_submission_form;
use crate::inbound::http::schemas::SubmissionSchema;
use crate::inbound::http::state::HttpState;

/// Body returned after a submission is stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    /// Always `true`.
    pub success: bool,
    /// Identifier of the new submission.
    #[schema(example = 1)]
    pub id: u64,
}

/// Body returned by the admin listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    /// Always `true`.
    pub success: bool,
    /// Every submission, newest first.
    #[schema(value_type = Vec<SubmissionSchema>)]
    pub data: Vec<Submission>,
}

/// Body returned by a delete.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    /// Always `true`, whether or not the record existed.
    pub success: bool,
}

fn parse_submission_id(raw: &str) -> Result<SubmissionId, Error> {
    raw.parse::<u64>().map(SubmissionId::new).map_err(|_| {
        Error::invalid_request(format!("submission id must be a positive integer: {raw}"))
            .with_details(json!({ "field": "id", "value": raw, "code": "invalid_id" }))
    })
}

/// Store a questionnaire submission.
#[utoipa::path(
    post,
    path = "/api/submissions",
    description = "Multipart form with the questionnaire answers and up to two attachments.",
    request_body(content_type = "multipart/form-data", description = "Questionnaire answers"),
    responses(
        (status = 200, description = "Submission stored", body = CreatedResponse),
        (status = 400, description = "Invalid form", body = ErrorEnvelope),
        (status = 503, description = "Storage unavailable", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope)
    ),
    tags = ["submissions"],
    operation_id = "createSubmission"
)]
#[post("/submissions")]
pub async fn create_submission(
    state: web::Data<HttpState>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let form = read_submission_form(payload, state.max_upload_bytes).await?;
    let id = state.submissions.submit(form).await?;
    Ok(HttpResponse::Ok().json(CreatedResponse {
        success: true,
        id: id.get(),
    }))
}

/// List every submission, newest first.
#[utoipa::path(
    get,
    path = "/api/submissions",
    responses(
        (status = 200, description = "Submissions", body = ListResponse),
        (status = 503, description = "Storage unavailable", body = ErrorEnvelope),
        (status = 500, description = "Record document unreadable", body = ErrorEnvelope)
    ),
    tags = ["submissions"],
    operation_id = "listSubmissions"
)]
#[get("/submissions")]
pub async fn list_submissions(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let data = state.submissions_query.list().await?;
    Ok(HttpResponse::Ok().json(ListResponse {
        success: true,
        data,
    }))
}

/// Delete a submission. Deleting an absent id succeeds.
#[utoipa::path(
    delete,
    path = "/api/submissions/{id}",
    params(("id" = u64, Path, description = "Submission identifier")),
    responses(
        (status = 200, description = "Submission absent", body = DeletedResponse),
        (status = 400, description = "Identifier is not an integer", body = ErrorEnvelope),
        (status = 503, description = "Storage unavailable", body = ErrorEnvelope)
    ),
    tags = ["submissions"],
    operation_id = "deleteSubmission"
)]
#[delete("/submissions/{id}")]
pub async fn delete_submission(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_submission_id(&path.into_inner())?;
    state.submissions.remove(id).await?;
    Ok(HttpResponse::Ok().json(DeletedResponse { success: true }))
}

#[cfg(test)]
#[path = "submissions_tests.rs"]
mod tests;
