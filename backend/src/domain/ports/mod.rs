//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`SubmissionRepository`], [`AttachmentStore`]) are
//! implemented by outbound adapters. Driving ports ([`SubmissionCommand`],
//! [`SubmissionQuery`], [`AttachmentQuery`]) are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod attachment_query;
mod attachment_store;
mod submission_command;
mod submission_query;
mod submission_repository;

#[cfg(test)]
pub use attachment_query::MockAttachmentQuery;
pub use attachment_query::{AttachmentQuery, FixtureAttachmentQuery};
#[cfg(test)]
pub use attachment_store::MockAttachmentStore;
pub use attachment_store::{AttachmentStore, AttachmentStoreError, FixtureAttachmentStore};
#[cfg(test)]
pub use submission_command::MockSubmissionCommand;
pub use submission_command::{FixtureSubmissionCommand, SubmissionCommand};
#[cfg(test)]
pub use submission_query::MockSubmissionQuery;
pub use submission_query::{FixtureSubmissionQuery, SubmissionQuery};
#[cfg(test)]
pub use submission_repository::MockSubmissionRepository;
pub use submission_repository::{
    FixtureSubmissionRepository, SubmissionRecord, SubmissionRepository,
    SubmissionRepositoryError,
};
