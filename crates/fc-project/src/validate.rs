//! Document validation.

use std::collections::HashSet;

use fc_core::StreamTags;

use crate::schema::FlowsheetDoc;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_doc(doc: &FlowsheetDoc) -> Result<(), ValidationError> {
    if doc.version == 0 || doc.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: doc.version,
        });
    }

    if let Some(notation) = &doc.notation {
        if !doc.units.is_empty() || !doc.streams.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "notation".to_string(),
                value: notation.clone(),
                reason: "document also lists units or streams".to_string(),
            });
        }
        if notation.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "notation".to_string(),
                value: notation.clone(),
                reason: "empty".to_string(),
            });
        }
        return Ok(());
    }

    let mut unit_ids = HashSet::new();
    for unit in &doc.units {
        if !unit_ids.insert(unit.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: unit.id.clone(),
                context: "units".to_string(),
            });
        }
    }

    for (i, stream) in doc.streams.iter().enumerate() {
        for end in [&stream.from, &stream.to] {
            if !unit_ids.contains(end.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: end.clone(),
                    context: format!("streams[{i}]"),
                });
            }
        }
        if let Err(err) = StreamTags::from_labels(&stream.tags) {
            return Err(ValidationError::InvalidValue {
                field: format!("streams[{i}].tags"),
                value: stream.tags.join(","),
                reason: err.to_string(),
            });
        }
    }

    Ok(())
}
