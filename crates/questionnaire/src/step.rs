//! The nine ordered questionnaire steps.

use crate::answers::Answers;

/// One screen of the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Cabinet type choice.
    CabinetType,
    /// Detection I/O choice.
    DetectionIo,
    /// TLS connection choice.
    TlsConnection,
    /// Intersection phasing upload.
    IntersectionPhasing,
    /// Signal timing upload.
    SignalTiming,
    /// Equipment quantities.
    Equipment,
    /// Auxiliary equipment quantities.
    AuxiliaryEquipment,
    /// Read-only summary.
    Review,
    /// Distributor, end user and address; the last step.
    Authorization,
}

impl Step {
    /// Every step in order.
    pub const ALL: [Self; 9] = [
        Self::CabinetType,
        Self::DetectionIo,
        Self::TlsConnection,
        Self::IntersectionPhasing,
        Self::SignalTiming,
        Self::Equipment,
        Self::AuxiliaryEquipment,
        Self::Review,
        Self::Authorization,
    ];

    /// Number of steps.
    pub const COUNT: usize = Self::ALL.len();

    /// First step.
    pub const FIRST: Self = Self::CabinetType;

    /// 1-based position.
    #[must_use]
    pub const fn number(self) -> usize {
        match self {
            Self::CabinetType => 1,
            Self::DetectionIo => 2,
            Self::TlsConnection => 3,
            Self::IntersectionPhasing => 4,
            Self::SignalTiming => 5,
            Self::Equipment => 6,
            Self::AuxiliaryEquipment => 7,
            Self::Review => 8,
            Self::Authorization => 9,
        }
    }

    /// Step at 1-based `number`.
    #[must_use]
    pub fn from_number(number: usize) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// The following step, or `None` on the last one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// The preceding step, or `None` on the first one.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    /// Whether this is the step that submits.
    #[must_use]
    pub const fn is_last(self) -> bool {
        matches!(self, Self::Authorization)
    }

    /// Heading shown for the step.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::CabinetType => "Cabinet Type",
            Self::DetectionIo => "Detection I/O",
            Self::TlsConnection => "TLS Connection",
            Self::IntersectionPhasing => "Intersection Phasing",
            Self::SignalTiming => "Signal Timing",
            Self::Equipment => "Equipment",
            Self::AuxiliaryEquipment => "Auxiliary Equipment",
            Self::Review => "Review Your Selections",
            Self::Authorization => "Authorization Form",
        }
    }

    /// One-line instruction shown under the heading.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::CabinetType => "Please select your cabinet type",
            Self::DetectionIo => "Specify the detection input/output configuration",
            Self::TlsConnection => "Select the TLS connection type",
            Self::IntersectionPhasing => "Upload intersection phasing file",
            Self::SignalTiming => "Upload signal timing file",
            Self::Equipment => "Enter quantity needed for each equipment type",
            Self::AuxiliaryEquipment => {
                "Enter quantity needed for each auxiliary equipment type"
            }
            Self::Review => "Please review your selections before proceeding to authorization",
            Self::Authorization => "Complete the checkout information",
        }
    }

    /// Whether `answers` satisfy this step.
    ///
    /// No step gates forward progress yet; every answer set is accepted.
    #[must_use]
    pub fn is_valid(self, _answers: &Answers) -> bool {
        true
    }

    /// `Step n of 9`.
    #[must_use]
    pub fn progress(self) -> String {
        format!("Step {} of {}", self.number(), Self::COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn numbers_follow_declaration_order() {
        for (index, step) in Step::ALL.iter().enumerate() {
            assert_eq!(step.number(), index + 1);
            assert_eq!(Step::from_number(index + 1), Some(*step));
        }
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(10), None);
    }

    #[rstest]
    #[case(Step::CabinetType, Some(Step::DetectionIo), None)]
    #[case(Step::SignalTiming, Some(Step::Equipment), Some(Step::IntersectionPhasing))]
    #[case(Step::Authorization, None, Some(Step::Review))]
    fn neighbours(
        #[case] step: Step,
        #[case] next: Option<Step>,
        #[case] previous: Option<Step>,
    ) {
        assert_eq!(step.next(), next);
        assert_eq!(step.previous(), previous);
    }

    #[test]
    fn every_step_accepts_empty_answers() {
        let answers = Answers::default();
        assert!(Step::ALL.iter().all(|step| step.is_valid(&answers)));
    }

    #[test]
    fn progress_counts_from_one() {
        assert_eq!(Step::Review.progress(), "Step 8 of 9");
    }
}
