//! Tokenizer for notation text.
//!
//! Grammar (informal):
//!
//! ```text
//! unit     := "(" id ")"
//! tag      := "{" text "}"
//! marker   := "<"? "_"? ( "%" digit+ | digit )
//! incoming := "<&|" ... ( "&" | "&|" ) ... "|"
//! break    := "n|"
//! ```
//!
//! Without the `%` escape a marker number is a single digit, so `12` is two
//! markers.

use fc_core::{CodecError, CodecResult};

use crate::token::{MarkerSide, Namespace, Token};

const DELIMITERS: &[char] = &['(', ')', '[', ']', '{', '}', '<', '>', '&', '|', '%'];

/// Split notation text into tokens.
///
/// Leading and trailing whitespace is ignored; whitespace anywhere else is a
/// grammar error. Positions in errors are byte offsets into `input`.
pub fn tokenize(input: &str) -> CodecResult<Vec<Token>> {
    let text = input.trim();
    if text.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    let offset = input.len() - input.trim_start().len();
    Lexer {
        text,
        offset,
        pos: 0,
    }
    .run()
}

struct Lexer<'a> {
    text: &'a str,
    offset: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> CodecResult<Vec<Token>> {
        let text = self.text;
        let mut tokens = Vec::new();
        while self.pos < text.len() {
            let rest = &text[self.pos..];
            if rest.starts_with('(') {
                let id = self.enclosed(')')?;
                tokens.push(Token::Unit(id.to_string()));
            } else if rest.starts_with('{') {
                let text = self.enclosed('}')?;
                tokens.push(Token::Tag(text.to_string()));
            } else if rest.starts_with('[') {
                self.pos += 1;
                tokens.push(Token::BranchOpen);
            } else if rest.starts_with(']') {
                self.pos += 1;
                tokens.push(Token::BranchClose);
            } else if rest.starts_with("<&|") {
                self.pos += 3;
                tokens.push(Token::IncomingOpen);
            } else if rest.starts_with("&|") {
                self.pos += 2;
                tokens.push(Token::Join);
                tokens.push(Token::IncomingClose);
            } else if rest.starts_with('&') {
                self.pos += 1;
                tokens.push(Token::Join);
            } else if rest.starts_with("n|") {
                self.pos += 2;
                tokens.push(Token::SegmentBreak);
            } else if rest.starts_with('|') {
                self.pos += 1;
                tokens.push(Token::IncomingClose);
            } else if rest.starts_with(&['<', '_', '%'][..])
                || rest.starts_with(|c: char| c.is_ascii_digit())
            {
                tokens.push(self.marker()?);
            } else {
                return Err(self.error(self.pos, fragment(rest)));
            }
        }
        Ok(tokens)
    }

    /// Contents of `(..)` or `{..}`; must be non-empty and free of delimiters.
    fn enclosed(&mut self, close: char) -> CodecResult<&'a str> {
        let text = self.text;
        let start = self.pos;
        let rest = &text[start + 1..];
        let Some(end) = rest.find(close) else {
            return Err(self.error(start, &text[start..]));
        };
        let inner = &rest[..end];
        if inner.is_empty()
            || inner
                .chars()
                .any(|c| c.is_whitespace() || DELIMITERS.contains(&c))
        {
            return Err(self.error(start, &text[start..start + end + 2]));
        }
        self.pos = start + end + 2;
        Ok(inner)
    }

    fn marker(&mut self) -> CodecResult<Token> {
        let start = self.pos;
        let bytes = self.text.as_bytes();
        let mut side = MarkerSide::Source;
        let mut namespace = Namespace::Material;
        if bytes.get(self.pos) == Some(&b'<') {
            side = MarkerSide::Target;
            self.pos += 1;
        }
        if bytes.get(self.pos) == Some(&b'_') {
            namespace = Namespace::Signal;
            self.pos += 1;
        }
        let escaped = bytes.get(self.pos) == Some(&b'%');
        if escaped {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
            if !escaped {
                break;
            }
        }
        let digits = &self.text[digits_start..self.pos];
        let number = digits.parse::<u32>().map_err(|_| {
            let end = self.pos + fragment(&self.text[self.pos..]).len();
            self.error(start, &self.text[start..end])
        })?;
        Ok(Token::cycle(namespace, number, side))
    }

    fn error(&self, pos: usize, fragment: &str) -> CodecError {
        CodecError::Grammar {
            position: self.offset + pos,
            fragment: fragment.to_string(),
        }
    }
}

/// First character of an unclassifiable remainder, for error messages.
fn fragment(rest: &str) -> &str {
    let end = rest.chars().next().map(char::len_utf8).unwrap_or(0);
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(s: &str) -> Vec<Token> {
        tokenize(s).unwrap()
    }

    #[test]
    fn chain() {
        assert_eq!(
            lex("(raw-1)(pump-1)(product-1)"),
            vec![
                Token::unit("raw-1"),
                Token::unit("pump-1"),
                Token::unit("product-1")
            ]
        );
    }

    #[test]
    fn markers_and_escapes() {
        assert_eq!(
            lex("(a)<1(b)1"),
            vec![
                Token::unit("a"),
                Token::cycle(Namespace::Material, 1, MarkerSide::Target),
                Token::unit("b"),
                Token::cycle(Namespace::Material, 1, MarkerSide::Source),
            ]
        );
        assert_eq!(
            lex("(a)%12<%12"),
            vec![
                Token::unit("a"),
                Token::cycle(Namespace::Material, 12, MarkerSide::Source),
                Token::cycle(Namespace::Material, 12, MarkerSide::Target),
            ]
        );
        assert_eq!(
            lex("(c)_1<_%10"),
            vec![
                Token::unit("c"),
                Token::cycle(Namespace::Signal, 1, MarkerSide::Source),
                Token::cycle(Namespace::Signal, 10, MarkerSide::Target),
            ]
        );
    }

    #[test]
    fn unescaped_digits_are_single_markers() {
        let tokens = lex("(a)12");
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens[2],
            Token::cycle(Namespace::Material, 2, MarkerSide::Source)
        );
    }

    #[test]
    fn incoming_branch_and_break() {
        assert_eq!(
            lex("(m)<&|(r)&|n|(x)"),
            vec![
                Token::unit("m"),
                Token::IncomingOpen,
                Token::unit("r"),
                Token::Join,
                Token::IncomingClose,
                Token::SegmentBreak,
                Token::unit("x"),
            ]
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(lex("  (a)\n").len(), 1);
    }

    #[test]
    fn empty_input() {
        assert_eq!(tokenize("   ").unwrap_err(), CodecError::EmptyInput);
    }

    #[test]
    fn non_ascii_after_a_marker_prefix_is_a_grammar_error() {
        assert_eq!(
            tokenize("(a)<é").unwrap_err(),
            CodecError::Grammar {
                position: 3,
                fragment: "<é".into()
            }
        );
        assert_eq!(
            tokenize("(raw)%€").unwrap_err(),
            CodecError::Grammar {
                position: 5,
                fragment: "%€".into()
            }
        );
        assert!(matches!(
            tokenize("(a)ü"),
            Err(CodecError::Grammar { position: 3, .. })
        ));
    }

    #[test]
    fn grammar_errors_report_position() {
        assert_eq!(
            tokenize("(a) (b)").unwrap_err(),
            CodecError::Grammar {
                position: 3,
                fragment: " ".into()
            }
        );
        assert!(matches!(
            tokenize("(a)(b"),
            Err(CodecError::Grammar { position: 3, .. })
        ));
        assert!(matches!(
            tokenize("(a)()"),
            Err(CodecError::Grammar { position: 3, .. })
        ));
        assert!(matches!(
            tokenize("(a)<x"),
            Err(CodecError::Grammar { position: 3, .. })
        ));
        assert!(matches!(
            tokenize(" (a)n"),
            Err(CodecError::Grammar { position: 4, .. })
        ));
    }
}
