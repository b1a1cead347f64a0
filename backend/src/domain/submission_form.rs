//! Raw multipart form model and its validation into submission fields.
//!
//! Inbound adapters collect text parts into [`SubmissionForm::fields`] and
//! file parts into [`SubmissionForm::files`]. [`SubmissionForm::validate`]
//! resolves "Other" overrides and parses the equipment mappings.

use std::collections::HashMap;

use serde_json::json;

use super::{AttachmentSlot, EquipmentMap, EquipmentMapError, Error, PostalAddress, resolve_choice};

/// Multipart field names understood by the intake endpoint.
pub mod field {
    /// Cabinet type choice.
    pub const CABINET_TYPE: &str = "cabinetType";
    /// Cabinet type override used when the choice is "Other".
    pub const CABINET_TYPE_OTHER: &str = "cabinetTypeOther";
    /// Detection I/O choice.
    pub const DETECTION_IO: &str = "detectionIO";
    /// Detection I/O override.
    pub const DETECTION_IO_OTHER: &str = "detectionIOOther";
    /// TLS connection choice.
    pub const TLS_CONNECTION: &str = "tlsConnection";
    /// TLS connection override.
    pub const TLS_CONNECTION_OTHER: &str = "tlsConnectionOther";
    /// Serialized equipment mapping.
    pub const EQUIPMENT: &str = "equipment";
    /// Serialized auxiliary equipment mapping.
    pub const AUXILIARY_EQUIPMENT: &str = "auxiliaryEquipment";
    /// Distributor name.
    pub const DISTRIBUTOR: &str = "distributor";
    /// End-user name.
    pub const END_USER: &str = "endUser";
    /// Street address.
    pub const ADDRESS: &str = "address";
    /// City.
    pub const CITY: &str = "city";
    /// State.
    pub const STATE: &str = "state";
    /// ZIP code.
    pub const ZIP: &str = "zip";
}

/// A file part received for one of the attachment slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Slot the file was uploaded for.
    pub slot: AttachmentSlot,
    /// Client-supplied file name.
    pub original_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Raw multipart submission as received from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    /// Text parts keyed by field name.
    pub fields: HashMap<String, String>,
    /// File parts, at most one per slot.
    pub files: Vec<UploadedFile>,
}

/// Text fields of a submission after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    /// Resolved cabinet type.
    pub cabinet_type: String,
    /// Resolved detection I/O type.
    pub detection_io: String,
    /// Resolved TLS connection type.
    pub tls_connection: String,
    /// Equipment quantities.
    pub equipment: EquipmentMap,
    /// Auxiliary equipment quantities.
    pub auxiliary_equipment: EquipmentMap,
    /// Distributor name.
    pub distributor: String,
    /// End-user name.
    pub end_user: String,
    /// End-user postal address.
    pub address: PostalAddress,
}

impl SubmissionForm {
    /// Insert a text field, returning `self` for chaining.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_owned(), value.into());
        self
    }

    /// Attach a file, returning `self` for chaining.
    #[must_use]
    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Validate and normalise the text fields.
    ///
    /// # Errors
    /// Returns an [`crate::domain::ErrorCode::InvalidRequest`] error when a
    /// required field is missing or an equipment mapping is malformed.
    pub fn validate(&self) -> Result<ValidatedFields, Error> {
        Ok(ValidatedFields {
            cabinet_type: self.choice(field::CABINET_TYPE, field::CABINET_TYPE_OTHER)?,
            detection_io: self.choice(field::DETECTION_IO, field::DETECTION_IO_OTHER)?,
            tls_connection: self.choice(field::TLS_CONNECTION, field::TLS_CONNECTION_OTHER)?,
            equipment: self.equipment(field::EQUIPMENT)?,
            auxiliary_equipment: self.equipment(field::AUXILIARY_EQUIPMENT)?,
            distributor: self.required(field::DISTRIBUTOR)?.to_owned(),
            end_user: self.required(field::END_USER)?.to_owned(),
            address: PostalAddress {
                street: self.required(field::ADDRESS)?.to_owned(),
                city: self.required(field::CITY)?.to_owned(),
                state: self.required(field::STATE)?.to_owned(),
                zip: self.required(field::ZIP)?.to_owned(),
            },
        })
    }

    fn required(&self, name: &'static str) -> Result<&str, Error> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| missing_field_error(name))
    }

    fn choice(&self, name: &'static str, other: &'static str) -> Result<String, Error> {
        let selection = self.required(name)?;
        Ok(resolve_choice(
            selection,
            self.fields.get(other).map(String::as_str),
        ))
    }

    fn equipment(&self, name: &'static str) -> Result<EquipmentMap, Error> {
        let Some(raw) = self.fields.get(name) else {
            return Ok(EquipmentMap::default());
        };
        EquipmentMap::parse_serialized(raw).map_err(|err| malformed_equipment_error(name, &err))
    }
}

fn missing_field_error(name: &str) -> Error {
    Error::invalid_request(format!("missing required field: {name}")).with_details(json!({
        "field": name,
        "code": "missing_field",
    }))
}

fn malformed_equipment_error(name: &str, err: &EquipmentMapError) -> Error {
    Error::invalid_request(format!("{name} is malformed: {err}")).with_details(json!({
        "field": name,
        "code": "malformed_equipment",
    }))
}
