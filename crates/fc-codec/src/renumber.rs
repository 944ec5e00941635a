//! Instance numbering for generalized notation.

use std::collections::{BTreeSet, HashMap};

use fc_core::{UnitId, UnitSuffix};

use crate::token::{TagKind, Token, classify_tag};

/// Instance counters for one decode call.
///
/// Numbers already present in the input are reserved, so partially numbered
/// input keeps its ids and new numbers never collide with them.
#[derive(Debug, Default)]
pub struct NamingContext {
    used: HashMap<String, BTreeSet<u32>>,
    /// Heat-integration group `(kind, k)` to its instance and shadow count.
    groups: HashMap<(String, u32), (u32, u32)>,
}

impl NamingContext {
    pub fn for_tokens(tokens: &[Token]) -> Self {
        let mut ctx = Self::default();
        for token in tokens {
            if let Token::Unit(text) = token {
                let id = UnitId::new(text.as_str());
                if let Some(n) = id.instance() {
                    ctx.used.entry(id.kind().to_string()).or_default().insert(n);
                }
            }
        }
        ctx
    }

    /// Smallest unused instance number of `kind`, reserved on return.
    pub fn fresh(&mut self, kind: &str) -> u32 {
        let used = self.used.entry(kind.to_string()).or_default();
        let mut n = 1;
        while used.contains(&n) {
            n += 1;
        }
        used.insert(n);
        n
    }

    /// Id for the next shadow of heat-integration group `k` of `kind`.
    fn shadow(&mut self, kind: &str, k: u32) -> UnitId {
        let key = (kind.to_string(), k);
        let (instance, count) = match self.groups.get(&key) {
            Some(&(instance, count)) => (instance, count + 1),
            None => (self.fresh(kind), 1),
        };
        self.groups.insert(key, (instance, count));
        UnitId::compose(kind, instance, Some(&UnitSuffix::Stream(count)))
    }
}

/// Give every unit without an instance number a fresh one.
///
/// A `{k}` tag right after such a unit marks it as a shadow of
/// heat-integration group `k`: the first shadow of a group takes a new
/// instance and `/1`, later ones reuse the instance with `/2`, `/3`, ...
/// A `{CODE}` tag appends `/CODE`. Already numbered units are left alone.
pub fn renumber(tokens: &[Token]) -> Vec<Token> {
    let mut ctx = NamingContext::for_tokens(tokens);
    renumber_with(&mut ctx, tokens)
}

pub fn renumber_with(ctx: &mut NamingContext, tokens: &[Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let Token::Unit(text) = token else {
            out.push(token.clone());
            continue;
        };
        let id = UnitId::new(text.as_str());
        if id.instance().is_some() {
            out.push(token.clone());
            continue;
        }
        let next = match tokens.get(i + 1) {
            Some(Token::Tag(tag)) => classify_tag(tag).ok(),
            _ => None,
        };
        let kind = id.kind();
        let numbered = match next {
            Some(TagKind::HeatGroup(k)) => ctx.shadow(kind, k),
            Some(TagKind::ControlCode(code)) => {
                let n = ctx.fresh(kind);
                UnitId::compose(kind, n, Some(&UnitSuffix::Control(code.to_string())))
            }
            _ => {
                let n = ctx.fresh(kind);
                UnitId::compose(kind, n, id.suffix())
            }
        };
        out.push(Token::unit(numbered.as_str()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::token::render;

    fn renumbered(s: &str) -> String {
        render(&renumber(&tokenize(s).unwrap()))
    }

    #[test]
    fn first_seen_order() {
        assert_eq!(
            renumbered("(raw)(pump)(raw)(pump)"),
            "(raw-1)(pump-1)(raw-2)(pump-2)"
        );
    }

    #[test]
    fn heat_groups_share_an_instance() {
        assert_eq!(
            renumbered("(raw)(hex){1}(dist)n|(raw)(hex){1}(product)(hex)"),
            "(raw-1)(hex-1/1){1}(dist-1)n|(raw-2)(hex-1/2){1}(product-1)(hex-2)"
        );
    }

    #[test]
    fn control_codes_become_suffixes() {
        assert_eq!(
            renumbered("(v)(C){FC}_1(C){TIR}"),
            "(v-1)(C-1/FC){FC}_1(C-2/TIR){TIR}"
        );
    }

    #[test]
    fn existing_numbers_are_reserved() {
        assert_eq!(renumbered("(pump)(pump-1)(pump)"), "(pump-2)(pump-1)(pump-3)");
    }

    #[test]
    fn contexts_are_independent() {
        let tokens = tokenize("(raw)").unwrap();
        assert_eq!(render(&renumber(&tokens)), "(raw-1)");
        assert_eq!(render(&renumber(&tokens)), "(raw-1)");
    }
}
