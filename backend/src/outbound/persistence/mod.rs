//! Record store persistence.
//!
//! The whole collection lives in one pretty-printed JSON document that is
//! atomically replaced on every mutation. There is no indexing or paging.

mod atomic_io;
mod json_submission_store;
mod models;

pub use json_submission_store::{CorruptionPolicy, JsonSubmissionStore};
