//! Record store backed by a single JSON document.
//!
//! Every mutation reads the document, applies the change and atomically
//! replaces the file. Mutations are serialized by an async mutex so
//! concurrent appends never lose an update or reuse an identifier. Reads take
//! no lock; the atomic rename means they observe a complete document.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::atomic_io::write_atomic;
use super::models::StoreDocument;
use crate::domain::ports::{SubmissionRecord, SubmissionRepository, SubmissionRepositoryError};
use crate::domain::{NewSubmission, SubmissionId};

/// What to do when the document is malformed at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorruptionPolicy {
    /// Refuse to open the store.
    #[default]
    Fail,
    /// Move the bad document aside as `<name>.corrupt-<millis>` and start
    /// with an empty collection.
    Quarantine,
}

/// JSON document implementation of [`SubmissionRepository`].
#[derive(Clone)]
pub struct JsonSubmissionStore {
    dir: Arc<Dir>,
    file_name: Arc<str>,
    path: Utf8PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for JsonSubmissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSubmissionStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl JsonSubmissionStore {
    /// Open the document at `path`, creating it and its parent directory when
    /// absent.
    ///
    /// # Errors
    /// Returns [`SubmissionRepositoryError::Io`] when the directory or file
    /// cannot be created, and [`SubmissionRepositoryError::Corruption`] when
    /// an existing document is malformed and `policy` is
    /// [`CorruptionPolicy::Fail`].
    pub fn open(path: &Utf8Path, policy: CorruptionPolicy) -> Result<Self, SubmissionRepositoryError> {
        let file_name = path.file_name().ok_or_else(|| {
            SubmissionRepositoryError::io(format!("record store path '{path}' has no file name"))
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|err| io_error("create directory", parent, &err))?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|err| io_error("open directory", parent, &err))?;

        let store = Self {
            dir: Arc::new(dir),
            file_name: Arc::from(file_name),
            path: path.to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        };
        store.initialise(policy)?;
        Ok(store)
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn initialise(&self, policy: CorruptionPolicy) -> Result<(), SubmissionRepositoryError> {
        match load(&self.dir, &self.file_name, &self.path) {
            Ok(doc) => {
                info!(path = %self.path, records = doc.submissions.len(), "record store opened");
                Ok(())
            }
            Err(Load::Missing) => {
                info!(path = %self.path, "creating empty record store");
                persist(&self.dir, &self.file_name, &self.path, &StoreDocument::default())
            }
            Err(Load::Failed(err @ SubmissionRepositoryError::Corruption { .. }))
                if policy == CorruptionPolicy::Quarantine =>
            {
                self.quarantine(&err)
            }
            Err(Load::Failed(err)) => Err(err),
        }
    }

    fn quarantine(&self, cause: &SubmissionRepositoryError) -> Result<(), SubmissionRepositoryError> {
        let aside = format!("{}.corrupt-{}", self.file_name, Utc::now().timestamp_millis());
        error!(
            path = %self.path,
            moved_to = %aside,
            error = %cause,
            "record document is corrupted; moving it aside and starting empty"
        );
        self.dir
            .rename(&*self.file_name, &self.dir, &aside)
            .map_err(|err| io_error("quarantine", &self.path, &err))?;
        persist(&self.dir, &self.file_name, &self.path, &StoreDocument::default())
    }

    async fn read(&self) -> Result<StoreDocument, SubmissionRepositoryError> {
        let (dir, file_name, path) = self.handles();
        run_blocking(move || load_existing(&dir, &file_name, &path)).await
    }

    /// Apply `change` to the document under the write lock and persist the
    /// result when `change` asks for it.
    ///
    /// The guard moves into the blocking task, so the lock is held until the
    /// write finishes even if the caller stops waiting for it.
    async fn mutate<T, F>(&self, change: F) -> Result<T, SubmissionRepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreDocument) -> Result<(T, bool), SubmissionRepositoryError>
            + Send
            + 'static,
    {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        let (dir, file_name, path) = self.handles();
        run_blocking(move || {
            let outcome = apply(&dir, &file_name, &path, change);
            drop(guard);
            outcome
        })
        .await
    }

    fn handles(&self) -> (Arc<Dir>, Arc<str>, Utf8PathBuf) {
        (
            Arc::clone(&self.dir),
            Arc::clone(&self.file_name),
            self.path.clone(),
        )
    }
}

#[async_trait]
impl SubmissionRepository for JsonSubmissionStore {
    async fn append(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionId, SubmissionRepositoryError> {
        let submission = submission.clone();
        let id = self
            .mutate(move |doc| {
                let id = SubmissionId::new(doc.next_id);
                doc.next_id = doc.next_id.checked_add(1).ok_or_else(|| {
                    SubmissionRepositoryError::corruption("identifier counter overflowed")
                })?;
                doc.submissions.push(SubmissionRecord::from_new(id, &submission));
                Ok((id, true))
            })
            .await?;
        debug!(submission_id = %id, path = %self.path, "record appended");
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<SubmissionRecord>, SubmissionRepositoryError> {
        let mut records = self.read().await?.submissions;
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }

    async fn find_by_id(
        &self,
        id: SubmissionId,
    ) -> Result<Option<SubmissionRecord>, SubmissionRepositoryError> {
        let doc = self.read().await?;
        Ok(doc.submissions.into_iter().find(|record| record.id == id))
    }

    async fn delete_by_id(
        &self,
        id: SubmissionId,
    ) -> Result<Option<SubmissionRecord>, SubmissionRepositoryError> {
        let removed = self
            .mutate(move |doc| {
                let position = doc.submissions.iter().position(|record| record.id == id);
                let removed = position.map(|index| doc.submissions.remove(index));
                let dirty = removed.is_some();
                Ok((removed, dirty))
            })
            .await?;
        debug!(submission_id = %id, removed = removed.is_some(), "record delete processed");
        Ok(removed)
    }
}

enum Load {
    Missing,
    Failed(SubmissionRepositoryError),
}

fn load(dir: &Dir, file_name: &str, path: &Utf8Path) -> Result<StoreDocument, Load> {
    let contents = match dir.read_to_string(file_name) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(Load::Missing),
        Err(err) => return Err(Load::Failed(io_error("read", path, &err))),
    };
    let doc: StoreDocument = serde_json::from_str(&contents).map_err(|err| {
        Load::Failed(SubmissionRepositoryError::corruption(format!(
            "{path} is not a valid record document: {err}"
        )))
    })?;
    doc.check_consistency().map_err(|reason| {
        Load::Failed(SubmissionRepositoryError::corruption(format!("{path}: {reason}")))
    })?;
    Ok(doc)
}

fn load_existing(
    dir: &Dir,
    file_name: &str,
    path: &Utf8Path,
) -> Result<StoreDocument, SubmissionRepositoryError> {
    load(dir, file_name, path).map_err(|load| match load {
        Load::Missing => SubmissionRepositoryError::io(format!("{path} has disappeared")),
        Load::Failed(err) => err,
    })
}

fn apply<T, F>(
    dir: &Dir,
    file_name: &str,
    path: &Utf8Path,
    change: F,
) -> Result<T, SubmissionRepositoryError>
where
    F: FnOnce(&mut StoreDocument) -> Result<(T, bool), SubmissionRepositoryError>,
{
    let mut doc = load_existing(dir, file_name, path)?;
    let (outcome, dirty) = change(&mut doc)?;
    if dirty {
        persist(dir, file_name, path, &doc)?;
    }
    Ok(outcome)
}

fn persist(
    dir: &Dir,
    file_name: &str,
    path: &Utf8Path,
    doc: &StoreDocument,
) -> Result<(), SubmissionRepositoryError> {
    let contents = serde_json::to_vec_pretty(doc).map_err(|err| {
        SubmissionRepositoryError::io(format!("failed to encode {path}: {err}"))
    })?;
    write_atomic(dir, file_name, &contents).map_err(|err| io_error("write", path, &err))
}

async fn run_blocking<T, F>(work: F) -> Result<T, SubmissionRepositoryError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SubmissionRepositoryError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| SubmissionRepositoryError::io(format!("record store task failed: {err}")))?
}

fn io_error(operation: &str, path: &Utf8Path, err: &io::Error) -> SubmissionRepositoryError {
    SubmissionRepositoryError::io(format!("{operation} {path}: {err}"))
}

#[cfg(test)]
#[path = "json_submission_store_tests.rs"]
mod tests;
