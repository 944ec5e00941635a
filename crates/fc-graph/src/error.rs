//! Graph-specific error types.

use fc_core::CodecError;

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two units share the same id.
    DuplicateUnit { id: String },

    /// A stream refers to a unit that doesn't exist.
    UnknownUnit { id: String },

    /// A stream's tag labels could not be resolved to one tag per category.
    InvalidTags {
        from: String,
        to: String,
        source: CodecError,
    },

    /// A unit id is empty or contains notation delimiters.
    InvalidUnitId { id: String },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::DuplicateUnit { id } => write!(f, "Unit {} is defined twice", id),
            GraphError::UnknownUnit { id } => {
                write!(f, "Stream refers to non-existent unit {}", id)
            }
            GraphError::InvalidTags { from, to, source } => {
                write!(f, "Stream {} -> {} has invalid tags: {}", from, to, source)
            }
            GraphError::InvalidUnitId { id } => {
                write!(f, "Unit id '{}' is empty or contains ()[]{{}}<>&|%", id)
            }
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::InvalidTags { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<GraphError> for CodecError {
    fn from(err: GraphError) -> Self {
        match err {
            // Tag problems keep their own taxonomy entry.
            GraphError::InvalidTags { from, to, source } => match source {
                CodecError::AmbiguousTag {
                    category,
                    first,
                    second,
                    ..
                } => CodecError::AmbiguousTag {
                    stream: format!("{from} -> {to}"),
                    category,
                    first,
                    second,
                },
                other => other,
            },
            other => CodecError::Graph {
                what: other.to_string(),
            },
        }
    }
}
