//! Service configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `INTAKE_*` environment variables and an
//! optional configuration file. Unset keys fall back to the defaults exposed
//! by the accessors.

use std::net::{Ipv4Addr, SocketAddr};

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::inbound::http::state::DEFAULT_MAX_UPLOAD_BYTES;
use crate::outbound::persistence::CorruptionPolicy;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATA_FILE: &str = "data/submissions.json";
const DEFAULT_UPLOADS_DIR: &str = "data/uploads";

/// Configuration for the intake service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "INTAKE")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// Path of the JSON record document.
    pub data_file: Option<String>,
    /// Directory holding uploaded attachments.
    pub uploads_dir: Option<String>,
    /// Largest accepted multipart part, in bytes.
    pub max_upload_bytes: Option<usize>,
    /// Quarantine an unreadable record document at startup instead of
    /// refusing to start.
    #[ortho_config(default = false)]
    pub recover_corrupt_store: bool,
}

impl AppSettings {
    /// Bind address, defaulting to `0.0.0.0:3001`.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }

    /// Record document path, defaulting to `data/submissions.json`.
    #[must_use]
    pub fn data_file(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.data_file.as_deref().unwrap_or(DEFAULT_DATA_FILE))
    }

    /// Attachment directory, defaulting to `data/uploads`.
    #[must_use]
    pub fn uploads_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.uploads_dir.as_deref().unwrap_or(DEFAULT_UPLOADS_DIR))
    }

    /// Per-part upload limit, defaulting to 25 MiB.
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    /// How the record store treats an unreadable document at startup.
    #[must_use]
    pub fn corruption_policy(&self) -> CorruptionPolicy {
        if self.recover_corrupt_store {
            CorruptionPolicy::Quarantine
        } else {
            CorruptionPolicy::Fail
        }
    }
}
