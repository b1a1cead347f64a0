//! Client for the detection equipment intake service.
//!
//! The crate has two halves. The questionnaire half walks a customer through
//! nine [`Step`]s, keeps every answer in one [`Answers`] draft and turns it
//! into a multipart [`SubmissionPayload`] when the last step is passed. The
//! admin half lists, expands and deletes stored submissions through an
//! [`AdminView`].
//!
//! Both halves reach the service only through the [`SubmissionGateway`]
//! trait; [`HttpSubmissionGateway`] is the reqwest implementation used by the
//! `questionnaire` binary.
//!
//! ```
//! use questionnaire::{Step, Transition, Wizard};
//!
//! let mut wizard = Wizard::new();
//! wizard.answers_mut().cabinet_type.select("ATC Cabinet");
//! while wizard.step() != Some(Step::Authorization) {
//!     wizard.next();
//! }
//! match wizard.next() {
//!     Transition::Submit(payload) => {
//!         assert_eq!(payload.field("cabinetType"), Some("ATC Cabinet"));
//!     }
//!     other => panic!("expected a submission, got {other:?}"),
//! }
//! ```

pub mod admin;
pub mod answers;
pub mod error;
pub mod gateway;
pub mod options;
pub mod payload;
pub mod prompt;
pub mod review;
pub mod step;
pub mod wizard;

pub use admin::{AdminRow, AdminView};
pub use answers::{Answers, AttachmentDraft, ChoiceAnswer, Contact, Quantities, parse_quantity};
pub use error::{GatewayError, WizardError};
pub use gateway::{HttpSubmissionGateway, SubmissionGateway, SubmissionRecord};
pub use payload::SubmissionPayload;
pub use prompt::{Navigation, Prompter};
pub use review::render_review;
pub use step::Step;
pub use wizard::{Advance, Phase, Transition, Wizard};
