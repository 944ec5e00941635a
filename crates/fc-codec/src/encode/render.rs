//! Layout to tokens.

use std::collections::HashMap;

use fc_core::{SignalRole, Tag, UnitId};
use fc_graph::{FlowsheetGraph, StreamIx, UnitIx};

use super::walk::{Item, Layout, Mark};
use crate::options::{EncodeOptions, NotationVersion};
use crate::token::{MarkerSide, Token};

pub(crate) struct Renderer<'a> {
    graph: &'a FlowsheetGraph,
    layout: &'a Layout,
    options: &'a EncodeOptions,
    /// Heat-integration group per base id, numbered by first appearance.
    groups: HashMap<String, u32>,
    tokens: Vec<Token>,
}

impl<'a> Renderer<'a> {
    pub fn new(graph: &'a FlowsheetGraph, layout: &'a Layout, options: &'a EncodeOptions) -> Self {
        Self {
            graph,
            layout,
            options,
            groups: HashMap::new(),
            tokens: Vec::new(),
        }
    }

    pub fn render(mut self) -> Vec<Token> {
        let layout = self.layout;
        self.items(&layout.items);
        self.tokens
    }

    fn items(&mut self, items: &'a [Item]) {
        for item in items {
            match item {
                Item::Unit(ix) => self.unit(*ix),
                Item::Open => self.tokens.push(Token::BranchOpen),
                Item::Close => self.tokens.push(Token::BranchClose),
                Item::Break => self.tokens.push(Token::SegmentBreak),
            }
        }
    }

    fn unit(&mut self, ix: UnitIx) {
        if let Some(&stream) = self.layout.tree_edge.get(&ix) {
            self.stream_tags(stream);
        }
        let graph = self.graph;
        let Some(unit) = graph.unit(ix) else {
            return;
        };
        self.tokens.push(Token::unit(unit.id.as_str()));
        if self.options.version == NotationVersion::V2 {
            self.unit_tags(&unit.id);
        }

        let layout = self.layout;
        let Some(slot) = layout.slot(ix) else {
            return;
        };
        for mark in &slot.source {
            match mark {
                Mark::Cycle {
                    namespace,
                    number,
                    stream,
                } => {
                    self.stream_tags(*stream);
                    self.tokens
                        .push(Token::cycle(*namespace, *number, MarkerSide::Source));
                }
                Mark::Join { stream } => {
                    self.stream_tags(*stream);
                    self.tokens.push(Token::Join);
                }
                Mark::CycleTarget { .. } | Mark::Incoming(_) => {}
            }
        }
        for mark in &slot.target {
            match mark {
                Mark::CycleTarget { namespace, number } => {
                    self.tokens
                        .push(Token::cycle(*namespace, *number, MarkerSide::Target));
                }
                Mark::Incoming(items) => {
                    self.tokens.push(Token::IncomingOpen);
                    self.items(items);
                    self.tokens.push(Token::IncomingClose);
                }
                Mark::Cycle { .. } | Mark::Join { .. } => {}
            }
        }
    }

    /// `{k}` after heat-integration shadows, `{CODE}` after control units.
    fn unit_tags(&mut self, id: &UnitId) {
        if id.stream_slot().is_some() {
            let next = self.groups.len() as u32 + 1;
            let group = *self.groups.entry(id.base().to_string()).or_insert(next);
            self.tokens.push(Token::tag(group.to_string()));
        } else if let Some(code) = id.control_code() {
            self.tokens.push(Token::tag(code));
        }
    }

    /// Role tags of a stream in heat, column, signal order. Non-adjacent
    /// signals are implied by their `_n` markers and never written.
    fn stream_tags(&mut self, stream: StreamIx) {
        if self.options.version == NotationVersion::V1 {
            return;
        }
        let Some(weight) = self.graph.stream(stream) else {
            return;
        };
        for tag in weight.tags.iter() {
            let skip = match tag {
                Tag::Heat(_) => !self.options.include_heat_tags,
                Tag::Signal(role) => role == SignalRole::NonAdjacent,
                Tag::Column(_) => false,
            };
            if !skip {
                self.tokens.push(Token::tag(tag.label()));
            }
        }
    }
}

/// Type-level form: every unit reduced to its kind.
pub(crate) fn generalize(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .map(|token| match token {
            Token::Unit(id) => Token::unit(UnitId::new(id.as_str()).generalized()),
            other => other.clone(),
        })
        .collect()
}
