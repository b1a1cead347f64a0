//! Outbound adapters implementing domain ports on the local filesystem.
//!
//! - **persistence**: the JSON document record store.
//! - **attachments**: the uploaded-file directory.
//!
//! Adapters translate between domain types and files. They contain no
//! business logic.

pub mod attachments;
pub mod persistence;
