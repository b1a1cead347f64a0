//! Decoding of `multipart/form-data` submissions into [`SubmissionForm`].
//!
//! Text parts become form fields. Parts named after an attachment slot become
//! uploaded files; an empty file part with no file name is what browsers send
//! for an untouched file input and is skipped. Every part is capped at the
//! configured upload limit while it streams in.

use actix_multipart::{Field, Multipart, MultipartError};
use futures_util::StreamExt;
use serde_json::json;
use tracing::debug;

use crate::domain::{AttachmentSlot, Error, SubmissionForm, UploadedFile};

fn malformed_body(err: &MultipartError) -> Error {
    debug!(error = %err, "multipart body rejected");
    Error::invalid_request(format!("malformed multipart body: {err}"))
        .with_details(json!({ "code": "malformed_multipart" }))
}

fn too_large(name: &str, limit: usize) -> Error {
    Error::invalid_request(format!("{name} exceeds the {limit} byte upload limit")).with_details(
        json!({
            "field": name,
            "code": "too_large",
            "limit": limit,
        }),
    )
}

async fn read_part(field: &mut Field, name: &str, limit: usize) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|err| malformed_body(&err))?;
        if bytes.len() + chunk.len() > limit {
            return Err(too_large(name, limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Drain `payload` into a [`SubmissionForm`].
///
/// # Errors
/// Returns an invalid-request error for malformed bodies, unnamed parts,
/// parts over `max_part_bytes`, non UTF-8 text, and file parts under a name
/// that is not an attachment slot.
pub async fn read_submission_form(
    mut payload: Multipart,
    max_part_bytes: usize,
) -> Result<SubmissionForm, Error> {
    let mut form = SubmissionForm::default();
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|err| malformed_body(&err))?;
        let Some(name) = field.name().map(str::to_owned) else {
            return Err(Error::invalid_request("multipart part has no name"));
        };
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_owned);
        let bytes = read_part(&mut field, &name, max_part_bytes).await?;

        if let Some(slot) = AttachmentSlot::from_field_name(&name) {
            let original_name = file_name.unwrap_or_default();
            if original_name.is_empty() && bytes.is_empty() {
                continue;
            }
            form.files.push(UploadedFile {
                slot,
                original_name,
                bytes,
            });
        } else if file_name.is_some() {
            return Err(
                Error::invalid_request(format!("unexpected file part: {name}"))
                    .with_details(json!({ "field": name, "code": "unexpected_file" })),
            );
        } else {
            let text = String::from_utf8(bytes).map_err(|_| {
                Error::invalid_request(format!("{name} is not valid UTF-8"))
                    .with_details(json!({ "field": name, "code": "invalid_encoding" }))
            })?;
            form.fields.insert(name, text);
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    //! Decoding coverage using the actix test harness.

    use actix_web::{App, HttpResponse, http::header, test, web};
    use serde_json::Value;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::test_support::MultipartBody;

    /// Echo the decoded form as JSON, or the error code.
    async fn echo(payload: Multipart) -> HttpResponse {
        match read_submission_form(payload, 16).await {
            Ok(form) => {
                let files: Vec<Value> = form
                    .files
                    .iter()
                    .map(|file| {
                        json!({
                            "slot": file.slot.field_name(),
                            "name": file.original_name,
                            "size": file.bytes.len(),
                        })
                    })
                    .collect();
                HttpResponse::Ok().json(json!({ "fields": form.fields, "files": files }))
            }
            Err(err) => HttpResponse::BadRequest().json(json!({
                "code": err.code(),
                "details": err.details(),
            })),
        }
    }

    async fn decode(body: MultipartBody) -> (bool, Value) {
        let app = test::init_service(App::new().route("/", web::post().to(echo))).await;
        let req = test::TestRequest::post()
            .uri("/")
            .insert_header((header::CONTENT_TYPE, body.content_type()))
            .set_payload(body.finish())
            .to_request();
        let res = test::call_service(&app, req).await;
        let ok = res.status().is_success();
        (ok, test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn collects_text_fields_and_files() {
        let body = MultipartBody::default()
            .text("distributor", "Acme Co")
            .file("intersectionPhasingFile", "plan.pdf", b"%PDF");
        let (ok, decoded) = decode(body).await;
        assert!(ok);
        assert_eq!(decoded["fields"]["distributor"], "Acme Co");
        assert_eq!(decoded["files"][0]["slot"], "intersectionPhasingFile");
        assert_eq!(decoded["files"][0]["name"], "plan.pdf");
        assert_eq!(decoded["files"][0]["size"], 4);
    }

    #[actix_web::test]
    async fn skips_untouched_file_inputs() {
        let body = MultipartBody::default().file("signalTimingFile", "", b"");
        let (ok, decoded) = decode(body).await;
        assert!(ok);
        assert_eq!(decoded["files"], json!([]));
    }

    #[actix_web::test]
    async fn rejects_oversized_parts() {
        let body = MultipartBody::default().file("signalTimingFile", "t.xlsx", &[0_u8; 17]);
        let (ok, decoded) = decode(body).await;
        assert!(!ok);
        assert_eq!(decoded["code"], json!(ErrorCode::InvalidRequest));
        assert_eq!(decoded["details"]["code"], "too_large");
    }

    #[actix_web::test]
    async fn rejects_files_under_unknown_names() {
        let body = MultipartBody::default().file("avatar", "me.png", b"png");
        let (ok, decoded) = decode(body).await;
        assert!(!ok);
        assert_eq!(decoded["details"]["code"], "unexpected_file");
    }
}
