//! Notation tokens.

use std::fmt;

use fc_core::{CodecError, CodecResult, Tag};

/// Numbering namespace of a cycle marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Material recycles: `n`, `<n`.
    Material,
    /// Control signals to non-adjacent units: `_n`, `<_n`.
    Signal,
}

/// Which end of a stream a marker sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerSide {
    /// Written after the unit the stream leaves (`n`, `_n`).
    Source,
    /// Written after the unit the stream enters (`<n`, `<_n`).
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleRef {
    pub namespace: Namespace,
    pub number: u32,
    pub side: MarkerSide,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// `(id)`
    Unit(String),
    /// `{text}`
    Tag(String),
    /// `[`
    BranchOpen,
    /// `]`
    BranchClose,
    Cycle(CycleRef),
    /// `<&|`
    IncomingOpen,
    /// `&`
    Join,
    /// `|`
    IncomingClose,
    /// `n|`
    SegmentBreak,
}

impl Token {
    pub fn unit(id: impl Into<String>) -> Self {
        Token::Unit(id.into())
    }

    pub fn tag(text: impl Into<String>) -> Self {
        Token::Tag(text.into())
    }

    pub fn cycle(namespace: Namespace, number: u32, side: MarkerSide) -> Self {
        Token::Cycle(CycleRef {
            namespace,
            number,
            side,
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Unit(id) => write!(f, "({id})"),
            Token::Tag(text) => write!(f, "{{{text}}}"),
            Token::BranchOpen => f.write_str("["),
            Token::BranchClose => f.write_str("]"),
            Token::Cycle(cycle) => {
                if cycle.side == MarkerSide::Target {
                    f.write_str("<")?;
                }
                if cycle.namespace == Namespace::Signal {
                    f.write_str("_")?;
                }
                if cycle.number > 9 {
                    f.write_str("%")?;
                }
                write!(f, "{}", cycle.number)
            }
            Token::IncomingOpen => f.write_str("<&|"),
            Token::Join => f.write_str("&"),
            Token::IncomingClose => f.write_str("|"),
            Token::SegmentBreak => f.write_str("n|"),
        }
    }
}

/// Concatenate tokens into notation text.
pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(Token::to_string).collect()
}

/// Meaning of a `{...}` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind<'a> {
    /// `{k}`: heat-integration group of the preceding shadow unit.
    HeatGroup(u32),
    /// `{CODE}`: control-loop type of the preceding control unit.
    ControlCode(&'a str),
    /// A stream role tag.
    Stream(Tag),
}

pub fn classify_tag(text: &str) -> CodecResult<TagKind<'_>> {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(k) = text.parse() {
            return Ok(TagKind::HeatGroup(k));
        }
    }
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_uppercase()) {
        return Ok(TagKind::ControlCode(text));
    }
    Tag::parse(text)
        .map(TagKind::Stream)
        .ok_or_else(|| CodecError::UnknownTag {
            label: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::ColumnRole;

    #[test]
    fn markers_render_with_escape() {
        let tokens = [
            Token::cycle(Namespace::Material, 3, MarkerSide::Source),
            Token::cycle(Namespace::Material, 12, MarkerSide::Target),
            Token::cycle(Namespace::Signal, 1, MarkerSide::Target),
            Token::cycle(Namespace::Signal, 10, MarkerSide::Source),
        ];
        assert_eq!(render(&tokens), "3<%12<_1_%10");
    }

    #[test]
    fn structure_tokens_render() {
        let tokens = [
            Token::unit("mix-1"),
            Token::IncomingOpen,
            Token::unit("raw-2"),
            Token::Join,
            Token::IncomingClose,
            Token::SegmentBreak,
            Token::tag("tout"),
        ];
        assert_eq!(render(&tokens), "(mix-1)<&|(raw-2)&|n|{tout}");
    }

    #[test]
    fn tag_classes() {
        assert_eq!(classify_tag("2").unwrap(), TagKind::HeatGroup(2));
        assert_eq!(classify_tag("TIR").unwrap(), TagKind::ControlCode("TIR"));
        assert_eq!(
            classify_tag("bout").unwrap(),
            TagKind::Stream(Tag::Column(ColumnRole::BottomOut))
        );
        assert!(matches!(
            classify_tag("Hot_In"),
            Err(CodecError::UnknownTag { .. })
        ));
    }
}
