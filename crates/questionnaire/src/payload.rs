//! Serialization of [`Answers`] into the intake service's multipart form.

use crate::answers::{Answers, AttachmentDraft, ChoiceAnswer};

/// Multipart field names understood by the intake service.
pub mod field {
    /// Cabinet type.
    pub const CABINET_TYPE: &str = "cabinetType";
    /// Cabinet type override.
    pub const CABINET_TYPE_OTHER: &str = "cabinetTypeOther";
    /// Detection I/O.
    pub const DETECTION_IO: &str = "detectionIO";
    /// Detection I/O override.
    pub const DETECTION_IO_OTHER: &str = "detectionIOOther";
    /// TLS connection.
    pub const TLS_CONNECTION: &str = "tlsConnection";
    /// TLS connection override.
    pub const TLS_CONNECTION_OTHER: &str = "tlsConnectionOther";
    /// Equipment quantities as a JSON object.
    pub const EQUIPMENT: &str = "equipment";
    /// Auxiliary equipment quantities as a JSON object.
    pub const AUXILIARY_EQUIPMENT: &str = "auxiliaryEquipment";
    /// Distributor.
    pub const DISTRIBUTOR: &str = "distributor";
    /// End user.
    pub const END_USER: &str = "endUser";
    /// Street address.
    pub const ADDRESS: &str = "address";
    /// City.
    pub const CITY: &str = "city";
    /// State.
    pub const STATE: &str = "state";
    /// ZIP code.
    pub const ZIP: &str = "zip";
    /// Intersection phasing file part.
    pub const INTERSECTION_PHASING_FILE: &str = "intersectionPhasingFile";
    /// Signal timing file part.
    pub const SIGNAL_TIMING_FILE: &str = "signalTimingFile";
}

/// Everything sent by one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    /// Text parts in send order.
    pub fields: Vec<(&'static str, String)>,
    /// File parts in send order.
    pub files: Vec<(&'static str, AttachmentDraft)>,
}

fn push_choice(
    fields: &mut Vec<(&'static str, String)>,
    name: &'static str,
    other_name: &'static str,
    choice: &ChoiceAnswer,
) {
    fields.push((name, choice.resolved().to_owned()));
    // An override typed as "Other" must still resolve to itself server-side.
    if choice.is_other() {
        fields.push((other_name, choice.other().to_owned()));
    }
}

impl SubmissionPayload {
    /// Serialize `answers`, resolving "Other" choices to their overrides.
    ///
    /// # Examples
    /// ```
    /// use questionnaire::{Answers, SubmissionPayload};
    ///
    /// let mut answers = Answers::default();
    /// answers.detection_io.select("Other");
    /// answers.detection_io.set_other("Custom Harness V2");
    /// answers.equipment.set_from_input("Nexus Unit", "2");
    ///
    /// let payload = SubmissionPayload::from_answers(&answers);
    /// assert_eq!(payload.field("detectionIO"), Some("Custom Harness V2"));
    /// assert_eq!(payload.field("equipment"), Some(r#"{"Nexus Unit":2}"#));
    /// assert!(payload.files.is_empty());
    /// ```
    #[must_use]
    pub fn from_answers(answers: &Answers) -> Self {
        let mut fields = Vec::with_capacity(14);
        push_choice(
            &mut fields,
            field::CABINET_TYPE,
            field::CABINET_TYPE_OTHER,
            &answers.cabinet_type,
        );
        push_choice(
            &mut fields,
            field::DETECTION_IO,
            field::DETECTION_IO_OTHER,
            &answers.detection_io,
        );
        push_choice(
            &mut fields,
            field::TLS_CONNECTION,
            field::TLS_CONNECTION_OTHER,
            &answers.tls_connection,
        );
        fields.push((field::EQUIPMENT, answers.equipment.to_json()));
        fields.push((
            field::AUXILIARY_EQUIPMENT,
            answers.auxiliary_equipment.to_json(),
        ));
        let contact = &answers.contact;
        fields.extend([
            (field::DISTRIBUTOR, contact.distributor.clone()),
            (field::END_USER, contact.end_user.clone()),
            (field::ADDRESS, contact.address.clone()),
            (field::CITY, contact.city.clone()),
            (field::STATE, contact.state.clone()),
            (field::ZIP, contact.zip.clone()),
        ]);

        let files = [
            (
                field::INTERSECTION_PHASING_FILE,
                answers.intersection_phasing.as_ref(),
            ),
            (field::SIGNAL_TIMING_FILE, answers.signal_timing.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, draft)| draft.map(|d| (name, d.clone())))
        .collect();

        Self { fields, files }
    }

    /// Value of text part `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}
