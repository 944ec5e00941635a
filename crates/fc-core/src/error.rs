use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

/// Failures that abort an encode or decode call.
///
/// None of these carry a partial result: a half-built graph or a truncated
/// notation string is never returned alongside an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The tokenizer could not classify a substring.
    ///
    /// `position` is a byte offset for text input and a token index for
    /// pre-tokenized input.
    #[error("Grammar error at {position}: cannot classify '{fragment}'")]
    Grammar { position: usize, fragment: String },

    /// Unmatched bracket, orphan cycle or incoming-branch marker, broken nesting.
    #[error("Structural error: {what}")]
    Structural { what: String },

    /// Two tags resolve the same role category on one stream.
    #[error("Ambiguous {category} tags on stream {stream}: '{first}' and '{second}'")]
    AmbiguousTag {
        stream: String,
        category: &'static str,
        first: String,
        second: String,
    },

    /// A tag label outside the closed vocabulary.
    #[error("Unknown stream tag '{label}'")]
    UnknownTag { label: String },

    #[error("Empty input")]
    EmptyInput,

    /// Graph construction failed while materializing a decoded flowsheet.
    #[error("Graph error: {what}")]
    Graph { what: String },
}

impl CodecError {
    pub fn structural(what: impl Into<String>) -> Self {
        CodecError::Structural { what: what.into() }
    }
}
