//! Attachment download handler.
//!
//! ```text
//! GET /uploads/{stored_name}
//! ```

use actix_web::http::header::{self, CacheControl, CacheDirective};
use actix_web::{HttpResponse, get, web};
use tracing::debug;

use crate::domain::{Error, StoredName};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::state::HttpState;

/// Download a stored attachment by its stored name.
///
/// Names that could not have been issued by the attachment store, including
/// anything with a path separator, answer 404 without touching storage.
#[utoipa::path(
    get,
    path = "/uploads/{stored_name}",
    params(("stored_name" = String, Path, description = "Name issued when the file was stored")),
    responses(
        (status = 200, description = "Attachment bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown attachment", body = ErrorEnvelope),
        (status = 503, description = "Storage unavailable", body = ErrorEnvelope)
    ),
    tags = ["uploads"],
    operation_id = "downloadAttachment"
)]
#[get("/uploads/{stored_name}")]
pub async fn download_attachment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let raw = path.into_inner();
    let name = StoredName::parse(&raw).map_err(|err| {
        debug!(stored_name = %raw, error = %err, "attachment name rejected");
        Error::not_found(format!("attachment not found: {raw}"))
    })?;
    let bytes = state.attachments.fetch(&name).await?;
    let mime = mime_guess::from_path(name.as_str()).first_or_octet_stream();
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, mime.essence_str().to_owned()))
        .insert_header(CacheControl(vec![
            CacheDirective::Private,
            CacheDirective::MaxAge(0),
        ]))
        .body(bytes))
}
