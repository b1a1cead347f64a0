//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for `cfg(test)` and when the `test-support` feature is enabled.

use std::sync::{Arc, Mutex};

use camino::Utf8PathBuf;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use tempfile::TempDir;

use crate::domain::{EquipmentMap, NewSubmission, PostalAddress, SubmissionService};
use crate::outbound::attachments::LocalAttachmentStore;
use crate::outbound::persistence::{CorruptionPolicy, JsonSubmissionStore};

/// Clock pinned to an instant that tests may move forward.
#[derive(Debug, Clone)]
pub struct FixedClock(Arc<Mutex<DateTime<Utc>>>);

impl FixedClock {
    /// Clock reading `now` until advanced.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    /// Move the clock forward by `seconds`.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for FixedClock {
    /// 2024-05-01T12:00:00Z.
    fn default() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        )
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// A complete submission for the Acme Co scenario, persisted at `created_at`.
#[must_use]
pub fn sample_submission(created_at: DateTime<Utc>) -> NewSubmission {
    NewSubmission {
        cabinet_type: "NEMA TS-2 Type 1".to_owned(),
        detection_io: "Custom Harness V2".to_owned(),
        tls_connection: "NTCIP".to_owned(),
        intersection_phasing_file: None,
        signal_timing_file: None,
        equipment: [("Nexus Unit".to_owned(), 2)].into_iter().collect(),
        auxiliary_equipment: EquipmentMap::default(),
        distributor: "Acme Co".to_owned(),
        end_user: "City of Springfield".to_owned(),
        address: PostalAddress {
            street: "742 Evergreen Terrace".to_owned(),
            city: "Springfield".to_owned(),
            state: "OR".to_owned(),
            zip: "97477".to_owned(),
        },
        created_at,
    }
}

/// Service wired to real on-disk stores inside a temporary directory.
pub struct TempStores {
    /// Keeps the directory alive for the lifetime of the stores.
    pub dir: TempDir,
    /// Path of the record document.
    pub data_file: Utf8PathBuf,
    /// Path of the attachment directory.
    pub uploads_dir: Utf8PathBuf,
    /// Clock shared by the service and attachment store.
    pub clock: FixedClock,
    /// The wired service.
    pub service: Arc<SubmissionService<JsonSubmissionStore, LocalAttachmentStore>>,
}

impl TempStores {
    /// Create empty stores in a fresh temporary directory.
    ///
    /// # Panics
    /// Panics when the temporary directory or either store cannot be
    /// created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        let data_file = root.join("data/submissions.json");
        let uploads_dir = root.join("data/uploads");
        let clock = FixedClock::default();
        let records = JsonSubmissionStore::open(&data_file, CorruptionPolicy::Fail)
            .expect("record store opens");
        let attachments = LocalAttachmentStore::open(&uploads_dir, Arc::new(clock.clone()))
            .expect("attachment store opens");
        let service = Arc::new(SubmissionService::new(
            Arc::new(records),
            Arc::new(attachments),
            Arc::new(clock.clone()),
        ));
        Self {
            dir,
            data_file,
            uploads_dir,
            clock,
            service,
        }
    }
}

impl Default for TempStores {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `multipart/form-data` request bodies.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self {
            boundary: "----intake-test-boundary".to_owned(),
            body: Vec::new(),
        }
    }
}

impl MultipartBody {
    /// Append a text part.
    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Append a file part.
    #[must_use]
    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Every text field of the Acme Co scenario.
    #[must_use]
    pub fn acme() -> Self {
        Self::default()
            .text("cabinetType", "NEMA TS-2 Type 1")
            .text("detectionIO", "Other")
            .text("detectionIOOther", "Custom Harness V2")
            .text("tlsConnection", "NTCIP")
            .text("equipment", r#"{"Nexus Unit":2}"#)
            .text("auxiliaryEquipment", "{}")
            .text("distributor", "Acme Co")
            .text("endUser", "City of Springfield")
            .text("address", "742 Evergreen Terrace")
            .text("city", "Springfield")
            .text("state", "OR")
            .text("zip", "97477")
    }

    /// `Content-Type` header value for this body.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Finish the body with the closing boundary.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}
