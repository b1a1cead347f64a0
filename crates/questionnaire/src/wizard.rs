//! The questionnaire state machine.
//!
//! The wizard walks the nine [`Step`]s in order, one at a time in either
//! direction. Moving forward from the last step packages the answers into a
//! [`SubmissionPayload`] and parks the wizard in [`Phase::Submitting`] until
//! the outcome is reported back. Success discards the draft; failure returns
//! to the last step with the draft intact and the error kept for display.

use tracing::{info, warn};

use crate::answers::Answers;
use crate::error::{GatewayError, WizardError};
use crate::gateway::SubmissionGateway;
use crate::payload::SubmissionPayload;
use crate::step::Step;

/// Where the wizard is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Answering `Step`.
    Editing(Step),
    /// Waiting for the service to answer a submission.
    Submitting,
    /// Stored under `id`.
    Submitted {
        /// Identifier assigned by the service.
        id: u64,
    },
}

/// Result of [`Wizard::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved forward to the step.
    Advanced(Step),
    /// Send this payload, then call [`Wizard::finish_submission`].
    Submit(SubmissionPayload),
    /// A submission is already in flight; nothing was sent.
    InFlight,
    /// Already submitted; call [`Wizard::reset`] to start again.
    Finished,
}

/// Result of [`Wizard::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved forward to the step.
    Moved(Step),
    /// Submitted and stored under the identifier.
    Submitted(u64),
    /// A submission is already in flight; nothing was sent.
    InFlight,
    /// Already submitted.
    Finished,
}

/// Questionnaire controller holding the single draft.
#[derive(Debug, Clone)]
pub struct Wizard {
    phase: Phase,
    answers: Answers,
    last_error: Option<String>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self {
            phase: Phase::Editing(Step::FIRST),
            answers: Answers::default(),
            last_error: None,
        }
    }
}

impl Wizard {
    /// A fresh wizard on step 1 with empty answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Step being edited, if any.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self.phase {
            Phase::Editing(step) => Some(step),
            Phase::Submitting | Phase::Submitted { .. } => None,
        }
    }

    /// The draft.
    #[must_use]
    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    /// Mutable access to the draft.
    pub fn answers_mut(&mut self) -> &mut Answers {
        &mut self.answers
    }

    /// Message from the last failed submission.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// `Step n of 9` while editing.
    #[must_use]
    pub fn progress(&self) -> Option<String> {
        self.step().map(Step::progress)
    }

    /// Move forward one step, or start the submission from the last step.
    ///
    /// # Examples
    /// ```
    /// use questionnaire::{Step, Transition, Wizard};
    ///
    /// let mut wizard = Wizard::new();
    /// assert_eq!(wizard.next(), Transition::Advanced(Step::DetectionIo));
    /// ```
    pub fn next(&mut self) -> Transition {
        match self.phase {
            Phase::Editing(step) => match step.next() {
                Some(following) => {
                    self.phase = Phase::Editing(following);
                    Transition::Advanced(following)
                }
                None => {
                    self.phase = Phase::Submitting;
                    self.last_error = None;
                    Transition::Submit(SubmissionPayload::from_answers(&self.answers))
                }
            },
            Phase::Submitting => Transition::InFlight,
            Phase::Submitted { .. } => Transition::Finished,
        }
    }

    /// Move back one step. A no-op on step 1 and outside editing.
    pub fn previous(&mut self) -> Phase {
        if let Some(preceding) = self.step().and_then(Step::previous) {
            self.phase = Phase::Editing(preceding);
        }
        self.phase
    }

    /// Report the outcome of the in-flight submission.
    ///
    /// # Errors
    /// Returns [`WizardError::NotSubmitting`] when nothing is in flight, and
    /// [`WizardError::Submission`] carrying the gateway failure, in which case
    /// the wizard is back on the last step with its draft.
    pub fn finish_submission(
        &mut self,
        outcome: Result<u64, GatewayError>,
    ) -> Result<u64, WizardError> {
        if self.phase != Phase::Submitting {
            return Err(WizardError::NotSubmitting);
        }
        match outcome {
            Ok(id) => {
                info!(submission_id = id, "questionnaire submitted");
                self.phase = Phase::Submitted { id };
                self.answers = Answers::default();
                self.last_error = None;
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "questionnaire submission failed");
                self.phase = Phase::Editing(Step::Authorization);
                self.last_error = Some(err.to_string());
                Err(WizardError::Submission(err))
            }
        }
    }

    /// Start over on step 1 with empty answers.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// [`Self::next`], sending the submission through `gateway` when the
    /// last step is passed.
    ///
    /// # Errors
    /// Propagates [`Self::finish_submission`] failures.
    pub async fn advance(
        &mut self,
        gateway: &dyn SubmissionGateway,
    ) -> Result<Advance, WizardError> {
        match self.next() {
            Transition::Advanced(step) => Ok(Advance::Moved(step)),
            Transition::Submit(payload) => {
                let outcome = gateway.submit(payload).await;
                self.finish_submission(outcome).map(Advance::Submitted)
            }
            Transition::InFlight => Ok(Advance::InFlight),
            Transition::Finished => Ok(Advance::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockSubmissionGateway;
    use rstest::{fixture, rstest};

    #[fixture]
    fn on_last_step() -> Wizard {
        let mut wizard = Wizard::new();
        while wizard.step() != Some(Step::Authorization) {
            wizard.next();
        }
        wizard
    }

    fn rejected() -> GatewayError {
        GatewayError::Rejected {
            status: 503,
            message: "record store unavailable".to_owned(),
            code: Some("storage_unavailable".to_owned()),
        }
    }

    #[test]
    fn steps_advance_one_at_a_time() {
        let mut wizard = Wizard::new();
        let visited: Vec<Step> = (0..8)
            .map(|_| match wizard.next() {
                Transition::Advanced(step) => step,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(visited.as_slice(), Step::ALL.get(1..).expect("steps"));
    }

    #[test]
    fn previous_stops_at_the_first_step() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.previous(), Phase::Editing(Step::CabinetType));
        wizard.next();
        wizard.next();
        assert_eq!(wizard.previous(), Phase::Editing(Step::DetectionIo));
    }

    #[rstest]
    fn last_step_packages_answers(mut on_last_step: Wizard) {
        on_last_step.answers_mut().contact.city = "Springfield".to_owned();
        match on_last_step.next() {
            Transition::Submit(payload) => assert_eq!(payload.field("city"), Some("Springfield")),
            other => panic!("expected submit, got {other:?}"),
        }
        assert_eq!(on_last_step.phase(), Phase::Submitting);
    }

    #[rstest]
    fn in_flight_submissions_are_not_repeated(mut on_last_step: Wizard) {
        assert!(matches!(on_last_step.next(), Transition::Submit(_)));
        assert_eq!(on_last_step.next(), Transition::InFlight);
        assert_eq!(on_last_step.previous(), Phase::Submitting);
    }

    #[rstest]
    fn success_discards_the_draft(mut on_last_step: Wizard) {
        on_last_step.answers_mut().contact.distributor = "Acme Co".to_owned();
        on_last_step.next();

        let id = on_last_step.finish_submission(Ok(1)).expect("stored");
        assert_eq!(id, 1);
        assert_eq!(on_last_step.phase(), Phase::Submitted { id: 1 });
        assert_eq!(on_last_step.answers(), &Answers::default());
        assert_eq!(on_last_step.next(), Transition::Finished);

        on_last_step.reset();
        assert_eq!(on_last_step.phase(), Phase::Editing(Step::CabinetType));
    }

    #[rstest]
    fn failure_keeps_the_draft_on_the_last_step(mut on_last_step: Wizard) {
        on_last_step.answers_mut().contact.distributor = "Acme Co".to_owned();
        on_last_step.next();

        let err = on_last_step
            .finish_submission(Err(rejected()))
            .expect_err("failure surfaces");
        assert!(matches!(err, WizardError::Submission(_)));
        assert_eq!(on_last_step.phase(), Phase::Editing(Step::Authorization));
        assert_eq!(on_last_step.answers().contact.distributor, "Acme Co");
        assert!(
            on_last_step
                .last_error()
                .is_some_and(|msg| msg.contains("record store unavailable"))
        );
    }

    #[test]
    fn outcomes_without_a_submission_are_refused() {
        let mut wizard = Wizard::new();
        assert!(matches!(
            wizard.finish_submission(Ok(5)),
            Err(WizardError::NotSubmitting)
        ));
        assert_eq!(wizard.phase(), Phase::Editing(Step::CabinetType));
    }

    #[rstest]
    #[tokio::test]
    async fn advance_sends_through_the_gateway(mut on_last_step: Wizard) {
        on_last_step.answers_mut().equipment.set_from_input("Nexus Unit", "2");
        let mut gateway = MockSubmissionGateway::new();
        gateway
            .expect_submit()
            .withf(|payload| payload.field("equipment") == Some(r#"{"Nexus Unit":2}"#))
            .times(1)
            .returning(|_| Ok(7));

        let outcome = on_last_step.advance(&gateway).await.expect("submitted");
        assert_eq!(outcome, Advance::Submitted(7));
    }

    #[rstest]
    #[tokio::test]
    async fn advance_surfaces_gateway_failures(mut on_last_step: Wizard) {
        let mut gateway = MockSubmissionGateway::new();
        gateway
            .expect_submit()
            .times(1)
            .returning(|_| Err(rejected()));

        let result = on_last_step.advance(&gateway).await;
        assert!(matches!(result, Err(WizardError::Submission(_))));
        assert_eq!(on_last_step.step(), Some(Step::Authorization));
    }
}
