//! Client side of the intake service's HTTP surface.
//!
//! [`SubmissionGateway`] is the seam the wizard and admin view talk through;
//! [`HttpSubmissionGateway`] implements it with reqwest. Every response is
//! read as a `{ success, ... }` envelope: failure envelopes and non-success
//! statuses become [`GatewayError::Rejected`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::de::{DeserializeOwned, Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::payload::SubmissionPayload;

/// A stored submission as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmissionRecord {
    /// Identifier.
    pub id: u64,
    /// Resolved cabinet type.
    pub cabinet_type: String,
    /// Resolved detection I/O.
    pub detection_io: String,
    /// Resolved TLS connection.
    pub tls_connection: String,
    /// Stored name of the intersection phasing attachment.
    #[serde(default)]
    pub intersection_phasing_file: Option<String>,
    /// Stored name of the signal timing attachment.
    #[serde(default)]
    pub signal_timing_file: Option<String>,
    /// Equipment quantities.
    #[serde(default, deserialize_with = "quantities")]
    pub equipment: BTreeMap<String, u32>,
    /// Auxiliary equipment quantities.
    #[serde(default, deserialize_with = "quantities")]
    pub auxiliary_equipment: BTreeMap<String, u32>,
    /// Distributor.
    pub distributor: String,
    /// End user.
    pub end_user: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// ZIP code.
    pub zip: String,
    /// When the service stored the submission.
    pub created_at: DateTime<Utc>,
}

/// Accept a quantity map as an object, a JSON string holding one, or null.
fn quantities<'de, D>(deserializer: D) -> Result<BTreeMap<String, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(BTreeMap::new()),
        Some(Value::String(text)) => serde_json::from_str(&text).map_err(D::Error::custom),
        Some(other) => serde_json::from_value(other).map_err(D::Error::custom),
    }
}

/// Operations the client needs from the intake service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    /// Send a submission and return its new identifier.
    async fn submit(&self, payload: SubmissionPayload) -> Result<u64, GatewayError>;

    /// Every stored submission, newest first.
    async fn list(&self) -> Result<Vec<SubmissionRecord>, GatewayError>;

    /// Delete a submission. Deleting an absent id succeeds.
    async fn delete(&self, id: u64) -> Result<(), GatewayError>;
}

#[derive(Deserialize)]
struct Created {
    id: u64,
}

#[derive(Deserialize)]
struct Listed {
    data: Vec<SubmissionRecord>,
}

/// reqwest implementation of [`SubmissionGateway`].
#[derive(Debug, Clone)]
pub struct HttpSubmissionGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSubmissionGateway {
    /// Gateway for the service rooted at `base_url`.
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidUrl`] unless `base_url` is an `http` or
    /// `https` URL, and [`GatewayError::Transport`] when the HTTP client
    /// cannot be built.
    ///
    /// # Examples
    /// ```
    /// use questionnaire::HttpSubmissionGateway;
    ///
    /// let gateway = HttpSubmissionGateway::new("http://localhost:3001/").expect("valid url");
    /// assert_eq!(
    ///     gateway.upload_url("1714564800000-42-plan.pdf"),
    ///     "http://localhost:3001/uploads/1714564800000-42-plan.pdf"
    /// );
    /// assert!(HttpSubmissionGateway::new("localhost:3001").is_err());
    /// ```
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
        if !has_scheme {
            return Err(GatewayError::InvalidUrl(base_url.to_owned()));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("questionnaire/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: trimmed.to_owned(),
        })
    }

    /// The service root, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Download link for a stored attachment.
    #[must_use]
    pub fn upload_url(&self, stored_name: &str) -> String {
        format!("{}/uploads/{stored_name}", self.base_url)
    }

    fn submissions_url(&self) -> String {
        format!("{}/api/submissions", self.base_url)
    }
}

fn build_form(payload: SubmissionPayload) -> Form {
    let SubmissionPayload { fields, files } = payload;
    let form = fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value));
    files.into_iter().fold(form, |form, (name, draft)| {
        form.part(name, Part::bytes(draft.bytes).file_name(draft.file_name))
    })
}

/// Decode a `{ success, ... }` envelope into `T`.
pub(crate) async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.bytes().await?;
    let parsed: Option<Value> = serde_json::from_slice(&body).ok();
    match parsed {
        Some(value)
            if status.is_success()
                && value.get("success").and_then(Value::as_bool) == Some(true) =>
        {
            serde_json::from_value(value).map_err(|err| GatewayError::Decode(err.to_string()))
        }
        Some(value) => {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .map_or_else(|| status.to_string(), str::to_owned);
            let code = value
                .get("code")
                .and_then(Value::as_str)
                .map(str::to_owned);
            Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
                code,
            })
        }
        None if status.is_success() => Err(GatewayError::Decode(format!(
            "expected a JSON envelope, got {} bytes",
            body.len()
        ))),
        None => {
            let text = String::from_utf8_lossy(&body).trim().to_owned();
            Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: if text.is_empty() {
                    status.to_string()
                } else {
                    text
                },
                code: None,
            })
        }
    }
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn submit(&self, payload: SubmissionPayload) -> Result<u64, GatewayError> {
        let files = payload.files.len();
        let response = self
            .client
            .post(self.submissions_url())
            .multipart(build_form(payload))
            .send()
            .await?;
        let created: Created = read_envelope(response).await.inspect_err(|err| {
            warn!(operation = "submit", error = %err, "submission rejected");
        })?;
        info!(operation = "submit", submission_id = created.id, files, "submission stored");
        Ok(created.id)
    }

    async fn list(&self) -> Result<Vec<SubmissionRecord>, GatewayError> {
        let response = self.client.get(self.submissions_url()).send().await?;
        let listed: Listed = read_envelope(response).await?;
        debug!(operation = "list", count = listed.data.len(), "submissions fetched");
        Ok(listed.data)
    }

    async fn delete(&self, id: u64) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(format!("{}/{id}", self.submissions_url()))
            .send()
            .await?;
        read_envelope::<IgnoredAny>(response).await?;
        info!(operation = "delete", submission_id = id, "submission deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Envelope decoding against canned responses.

    use super::*;
    use rstest::rstest;

    fn canned(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(
            http::Response::builder()
                .status(status)
                .body(body)
                .expect("valid response"),
        )
    }

    const LISTED: &str = r#"{
        "success": true,
        "data": [{
            "id": 3,
            "cabinet_type": "ATC Cabinet",
            "detection_io": "NTCIP",
            "tls_connection": "None",
            "intersection_phasing_file": "1714564800000-7-plan.pdf",
            "signal_timing_file": null,
            "equipment": "{\"Nexus Unit\":2}",
            "auxiliary_equipment": {"Wifi Repeater": 1},
            "distributor": "Acme Co",
            "end_user": "City of Springfield",
            "address": "742 Evergreen Terrace",
            "city": "Springfield",
            "state": "OR",
            "zip": "97477",
            "created_at": "2024-05-01T12:00:00Z"
        }]
    }"#;

    #[tokio::test]
    async fn success_envelopes_decode_into_the_payload() {
        let created: Created = read_envelope(canned(200, r#"{"success":true,"id":4}"#))
            .await
            .expect("created");
        assert_eq!(created.id, 4);
    }

    #[tokio::test]
    async fn listed_records_accept_string_and_object_quantities() {
        let listed: Listed = read_envelope(canned(200, LISTED)).await.expect("listed");
        let record = listed.data.first().expect("one record");
        assert_eq!(record.equipment.get("Nexus Unit"), Some(&2));
        assert_eq!(record.auxiliary_equipment.get("Wifi Repeater"), Some(&1));
        assert_eq!(record.signal_timing_file, None);
    }

    #[rstest]
    #[case(
        400,
        r#"{"success":false,"error":"missing field: city","code":"invalid_request"}"#,
        "missing field: city",
        Some("invalid_request")
    )]
    #[case(200, r#"{"success":false,"error":"Database error"}"#, "Database error", None)]
    #[case(502, "Bad Gateway", "Bad Gateway", None)]
    #[case(503, "", "503 Service Unavailable", None)]
    #[tokio::test]
    async fn failures_become_rejections(
        #[case] status: u16,
        #[case] body: &'static str,
        #[case] expected_message: &str,
        #[case] expected_code: Option<&str>,
    ) {
        let err = read_envelope::<IgnoredAny>(canned(status, body))
            .await
            .expect_err("rejected");
        match err {
            GatewayError::Rejected {
                status: got,
                message,
                code,
            } => {
                assert_eq!(got, status);
                assert_eq!(message, expected_message);
                assert_eq!(code.as_deref(), expected_code);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_is_a_decode_error() {
        let err = read_envelope::<IgnoredAny>(canned(200, "<html>"))
            .await
            .expect_err("decode failure");
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn urls_are_normalised() {
        let gateway = HttpSubmissionGateway::new(" https://intake.example/ ").expect("gateway");
        assert_eq!(gateway.base_url(), "https://intake.example");
        assert_eq!(
            gateway.submissions_url(),
            "https://intake.example/api/submissions"
        );
    }
}
