//! Attachment store backed by a local directory.
//!
//! Stored names have the shape `<unix-millis>-<random>-<sanitized name>`.
//! Files are created with create-new semantics, so a name collision retries
//! with a fresh random suffix instead of overwriting another upload. All
//! access goes through a `cap_std` directory handle, which refuses paths that
//! leave the attachment directory.

use std::io::{self, Write};
use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use mockable::Clock;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::domain::ports::{AttachmentStore, AttachmentStoreError};
use crate::domain::{AttachmentSlot, StoredName};

/// Longest sanitized original name kept in a stored name.
const MAX_NAME_CHARS: usize = 100;
/// Fallback when nothing of the original name survives sanitization.
const FALLBACK_NAME: &str = "upload";
const SUFFIX_BOUND: u32 = 1_000_000_000;
const MAX_ATTEMPTS: usize = 8;

/// Reduce a client-supplied file name to a safe single path component.
///
/// # Examples
/// ```
/// use intake_backend::outbound::attachments::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("site plan (v2).pdf"), "site_plan__v2_.pdf");
/// assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
/// assert_eq!(sanitize_file_name("..."), "upload");
/// ```
#[must_use]
pub fn sanitize_file_name(original: &str) -> String {
    let mapped: String = original
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let trimmed: String = mapped
        .trim_start_matches('.')
        .chars()
        .take(MAX_NAME_CHARS)
        .collect();
    if trimmed.is_empty() {
        FALLBACK_NAME.to_owned()
    } else {
        trimmed
    }
}

/// Local directory implementation of [`AttachmentStore`].
#[derive(Clone)]
pub struct LocalAttachmentStore {
    dir: Arc<Dir>,
    path: Utf8PathBuf,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LocalAttachmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAttachmentStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl LocalAttachmentStore {
    /// Open the attachment directory at `path`, creating it when absent.
    ///
    /// # Errors
    /// Returns [`AttachmentStoreError::Io`] when the directory cannot be
    /// created or opened.
    pub fn open(path: &Utf8Path, clock: Arc<dyn Clock>) -> Result<Self, AttachmentStoreError> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(path, ambient_authority()))
            .map(|dir| {
                info!(path = %path, "attachment store opened");
                Self {
                    dir: Arc::new(dir),
                    path: path.to_path_buf(),
                    clock,
                }
            })
            .map_err(|err| AttachmentStoreError::io(format!("open {path}: {err}")))
    }

    /// Location of the attachment directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn candidate_name(&self, sanitized: &str) -> String {
        let millis = self.clock.utc().timestamp_millis();
        let suffix = rand::thread_rng().gen_range(0..SUFFIX_BOUND);
        format!("{millis}-{suffix}-{sanitized}")
    }
}

fn write_new(dir: &Dir, name: &str, bytes: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(name, &options)?;
    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    if written.is_err() {
        drop(file);
        drop(dir.remove_file(name));
    }
    written
}

async fn run_blocking<T, F>(work: F) -> Result<T, AttachmentStoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AttachmentStoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| AttachmentStoreError::io(format!("attachment task failed: {err}")))?
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    async fn store(
        &self,
        slot: AttachmentSlot,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredName, AttachmentStoreError> {
        let sanitized = sanitize_file_name(original_name);
        let candidates: Vec<String> = (0..MAX_ATTEMPTS)
            .map(|_| self.candidate_name(&sanitized))
            .collect();
        let dir = Arc::clone(&self.dir);
        let size = bytes.len();
        let bytes = bytes.to_vec();

        let name = run_blocking(move || {
            for candidate in candidates {
                match write_new(&dir, &candidate, &bytes) {
                    Ok(()) => return Ok(candidate),
                    Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                        debug!(stored_name = %candidate, "stored name collision; retrying");
                    }
                    Err(err) => {
                        return Err(AttachmentStoreError::io(format!(
                            "write {candidate}: {err}"
                        )));
                    }
                }
            }
            Err(AttachmentStoreError::io("could not find an unused stored name"))
        })
        .await?;

        let stored = StoredName::parse(&name)
            .map_err(|err| AttachmentStoreError::io(err.to_string()))?;
        info!(stored_name = %stored, slot = ?slot, size, "attachment stored");
        Ok(stored)
    }

    async fn resolve(&self, name: &StoredName) -> Result<Vec<u8>, AttachmentStoreError> {
        let dir = Arc::clone(&self.dir);
        let name = name.clone();
        run_blocking(move || {
            let is_file = match dir.metadata(name.as_str()) {
                Ok(meta) => meta.is_file(),
                Err(err) if err.kind() == io::ErrorKind::NotFound => false,
                Err(err) => {
                    return Err(AttachmentStoreError::io(format!("stat {name}: {err}")));
                }
            };
            if !is_file {
                return Err(AttachmentStoreError::not_found(name.as_str()));
            }
            dir.read(name.as_str())
                .map_err(|err| AttachmentStoreError::io(format!("read {name}: {err}")))
        })
        .await
    }

    async fn remove(&self, name: &StoredName) -> Result<(), AttachmentStoreError> {
        let dir = Arc::clone(&self.dir);
        let name = name.clone();
        run_blocking(move || match dir.remove_file(name.as_str()) {
            Ok(()) => {
                debug!(stored_name = %name, "attachment removed");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                warn!(stored_name = %name, error = %err, "attachment removal failed");
                Err(AttachmentStoreError::io(format!("remove {name}: {err}")))
            }
        })
        .await
    }
}

#[cfg(test)]
#[path = "local_store_tests.rs"]
mod tests;
