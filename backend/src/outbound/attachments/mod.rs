//! Filesystem attachment storage.

mod local_store;

pub use local_store::{LocalAttachmentStore, sanitize_file_name};
