//! Graph validation logic.

use std::collections::HashSet;

use fc_core::StreamTags;

use crate::builder::{PendingStream, PendingUnit};
use crate::error::{GraphError, GraphResult};

const RESERVED: &[char] = &['(', ')', '[', ']', '{', '}', '<', '>', '&', '|', '%'];

/// Unit ids must be non-empty and free of notation delimiters and whitespace.
pub(crate) fn validate_unit_id(id: &str) -> GraphResult<()> {
    if id.is_empty() || id.chars().any(|c| c.is_whitespace() || RESERVED.contains(&c)) {
        return Err(GraphError::InvalidUnitId { id: id.to_string() });
    }
    Ok(())
}

/// Check ids, references and tag labels before anything is inserted.
pub(crate) fn validate_pending(
    units: &[PendingUnit],
    streams: &[PendingStream],
) -> GraphResult<Vec<StreamTags>> {
    let mut seen = HashSet::new();
    for unit in units {
        validate_unit_id(&unit.id)?;
        if !seen.insert(unit.id.as_str()) {
            return Err(GraphError::DuplicateUnit {
                id: unit.id.clone(),
            });
        }
    }

    let mut resolved = Vec::with_capacity(streams.len());
    for stream in streams {
        for end in [&stream.from, &stream.to] {
            if !seen.contains(end.as_str()) {
                return Err(GraphError::UnknownUnit { id: end.clone() });
            }
        }
        let tags =
            StreamTags::from_labels(&stream.labels).map_err(|source| GraphError::InvalidTags {
                from: stream.from.clone(),
                to: stream.to.clone(),
                source,
            })?;
        resolved.push(tags);
    }
    Ok(resolved)
}
