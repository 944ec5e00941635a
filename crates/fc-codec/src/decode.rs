//! Notation to graph.

use std::collections::HashMap;

use fc_core::{CodecError, CodecResult, DegradedMerge, SignalRole, StreamTags, Tag};
use fc_graph::{FlowsheetGraph, Stream, Unit};
use tracing::debug;

use crate::heat::merge_heat_integration;
use crate::lexer::tokenize;
use crate::options::DecodeOptions;
use crate::renumber::renumber;
use crate::token::{CycleRef, MarkerSide, Namespace, TagKind, Token, classify_tag};

/// Output of one decode call.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub graph: FlowsheetGraph,
    /// Shadow groups that could not be merged cleanly.
    pub warnings: Vec<DegradedMerge>,
}

/// Decode notation text.
///
/// # Errors
///
/// `EmptyInput`, `Grammar` from the tokenizer, `Structural` for broken
/// nesting or unpaired markers, `UnknownTag` / `AmbiguousTag` for bad tags.
/// No partial graph is returned on error.
pub fn decode(input: &str, options: &DecodeOptions) -> CodecResult<Decoded> {
    let tokens = tokenize(input)?;
    decode_tokens(&tokens, options)
}

/// Decode an already tokenized notation.
pub fn decode_tokens(tokens: &[Token], options: &DecodeOptions) -> CodecResult<Decoded> {
    if tokens.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    let tokens = renumber(tokens);
    let parsed = Parser::default().run(&tokens)?;
    let graph = parsed.assemble()?;
    debug!(
        units = graph.unit_count(),
        streams = graph.stream_count(),
        "decoded notation"
    );

    if !options.merge_heat_integration {
        return Ok(Decoded {
            graph,
            warnings: Vec::new(),
        });
    }
    let merged = merge_heat_integration(&graph);
    Ok(Decoded {
        graph: merged.graph,
        warnings: merged.warnings,
    })
}

#[derive(Debug)]
enum Frame {
    Root,
    /// `[`: returns to `parent` on close; must create a stream first.
    Branch { parent: usize, resolved: bool },
    /// `<&|`: the enclosed units feed `anchor` through `&`.
    Incoming { anchor: usize, joined: bool },
}

#[derive(Debug)]
struct OpenMarker {
    unit: usize,
    side: MarkerSide,
    tags: StreamTags,
}

#[derive(Debug)]
struct Parser {
    units: Vec<String>,
    index: HashMap<String, usize>,
    streams: Vec<(usize, usize, StreamTags)>,
    frames: Vec<Frame>,
    current: Option<usize>,
    pending: StreamTags,
    markers: HashMap<(Namespace, u32), OpenMarker>,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            units: Vec::new(),
            index: HashMap::new(),
            streams: Vec::new(),
            frames: vec![Frame::Root],
            current: None,
            pending: StreamTags::new(),
            markers: HashMap::new(),
        }
    }
}

impl Parser {
    fn run(mut self, tokens: &[Token]) -> CodecResult<Self> {
        for (pos, token) in tokens.iter().enumerate() {
            match token {
                Token::Unit(id) => self.unit(id, pos)?,
                Token::Tag(text) => self.tag(text, pos)?,
                Token::BranchOpen => {
                    let parent = self.require_current(pos, "[")?;
                    self.frames.push(Frame::Branch {
                        parent,
                        resolved: false,
                    });
                }
                Token::BranchClose => {
                    self.no_pending(pos, "]")?;
                    match self.frames.pop() {
                        Some(Frame::Branch {
                            parent,
                            resolved: true,
                        }) => self.current = Some(parent),
                        Some(Frame::Branch { .. }) => {
                            return Err(structural(pos, "branch closed before reaching a unit"));
                        }
                        _ => return Err(structural(pos, "']' without matching '['")),
                    }
                }
                Token::Cycle(cycle) => self.marker(*cycle, pos)?,
                Token::IncomingOpen => {
                    self.no_pending(pos, "<&|")?;
                    let anchor = self.require_current(pos, "<&|")?;
                    self.frames.push(Frame::Incoming {
                        anchor,
                        joined: false,
                    });
                    self.current = None;
                }
                Token::Join => self.join(pos)?,
                Token::IncomingClose => {
                    self.no_pending(pos, "|")?;
                    match self.frames.pop() {
                        Some(Frame::Incoming {
                            anchor,
                            joined: true,
                        }) => self.current = Some(anchor),
                        Some(Frame::Incoming { .. }) => {
                            return Err(structural(pos, "incoming branch closed without '&'"));
                        }
                        _ => return Err(structural(pos, "'|' without matching '<&|'")),
                    }
                }
                Token::SegmentBreak => {
                    self.no_pending(pos, "n|")?;
                    if self.frames.len() != 1 {
                        return Err(structural(pos, "'n|' inside a branch"));
                    }
                    self.current = None;
                }
            }
        }
        self.finish(tokens.len())?;
        Ok(self)
    }

    fn unit(&mut self, id: &str, pos: usize) -> CodecResult<()> {
        let ix = match self.index.get(id) {
            Some(&ix) => ix,
            None => {
                self.units.push(id.to_string());
                self.index.insert(id.to_string(), self.units.len() - 1);
                self.units.len() - 1
            }
        };
        match self.current {
            Some(from) => {
                let tags = std::mem::take(&mut self.pending);
                self.streams.push((from, ix, tags));
                if let Some(Frame::Branch { resolved, .. }) = self.frames.last_mut() {
                    *resolved = true;
                }
            }
            None if !self.pending.is_empty() => {
                return Err(structural(pos, "tags before a unit without predecessor"));
            }
            None => {}
        }
        self.current = Some(ix);
        Ok(())
    }

    fn tag(&mut self, text: &str, pos: usize) -> CodecResult<()> {
        match classify_tag(text)? {
            // Already folded into unit ids by renumbering.
            TagKind::HeatGroup(_) | TagKind::ControlCode(_) => Ok(()),
            TagKind::Stream(tag) => self
                .pending
                .insert(tag)
                .map_err(|err| with_stream(err, format!("at token {pos}"))),
        }
    }

    fn marker(&mut self, cycle: CycleRef, pos: usize) -> CodecResult<()> {
        let unit = self.require_current(pos, "cycle marker")?;
        let key = (cycle.namespace, cycle.number);
        let tags = std::mem::take(&mut self.pending);
        let Some(open) = self.markers.remove(&key) else {
            self.markers.insert(
                key,
                OpenMarker {
                    unit,
                    side: cycle.side,
                    tags,
                },
            );
            return Ok(());
        };
        if open.side == cycle.side {
            return Err(structural(
                pos,
                format!("marker {} used twice on the same side", cycle.number),
            ));
        }
        let (from, to) = match cycle.side {
            MarkerSide::Source => (unit, open.unit),
            MarkerSide::Target => (open.unit, unit),
        };
        let mut merged = open.tags;
        for tag in tags.iter() {
            merged
                .insert(tag)
                .map_err(|err| with_stream(err, self.stream_name(from, to)))?;
        }
        if cycle.namespace == Namespace::Signal {
            merged
                .insert(Tag::Signal(SignalRole::NonAdjacent))
                .map_err(|err| with_stream(err, self.stream_name(from, to)))?;
        }
        self.streams.push((from, to, merged));
        Ok(())
    }

    fn join(&mut self, pos: usize) -> CodecResult<()> {
        let from = self.require_current(pos, "&")?;
        let anchor = self
            .frames
            .iter_mut()
            .rev()
            .find_map(|frame| match frame {
                Frame::Incoming { anchor, joined } => {
                    *joined = true;
                    Some(*anchor)
                }
                _ => None,
            })
            .ok_or_else(|| structural(pos, "'&' outside an incoming branch"))?;
        let tags = std::mem::take(&mut self.pending);
        self.streams.push((from, anchor, tags));
        Ok(())
    }

    fn finish(&self, end: usize) -> CodecResult<()> {
        match self.frames.last() {
            Some(Frame::Root) if self.frames.len() == 1 => {}
            Some(Frame::Branch { .. }) => return Err(structural(end, "unclosed '['")),
            _ => return Err(structural(end, "unclosed incoming branch")),
        }
        let mut open: Vec<&(Namespace, u32)> = self.markers.keys().collect();
        open.sort();
        if let Some((namespace, number)) = open.first() {
            let prefix = if *namespace == Namespace::Signal { "_" } else { "" };
            return Err(structural(end, format!("cycle marker {prefix}{number} is never closed")));
        }
        self.no_pending(end, "end of input")
    }

    fn require_current(&self, pos: usize, what: &str) -> CodecResult<usize> {
        self.current
            .ok_or_else(|| structural(pos, format!("{what} without a preceding unit")))
    }

    fn no_pending(&self, pos: usize, what: &str) -> CodecResult<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(structural(pos, format!("dangling tags before {what}")))
        }
    }

    fn stream_name(&self, from: usize, to: usize) -> String {
        format!("{} -> {}", self.units[from], self.units[to])
    }

    fn assemble(self) -> CodecResult<FlowsheetGraph> {
        let mut graph = FlowsheetGraph::new();
        let mut ixs = Vec::with_capacity(self.units.len());
        for id in self.units {
            ixs.push(graph.add_unit(Unit::new(id))?);
        }
        for (from, to, tags) in self.streams {
            graph.add_stream(ixs[from], ixs[to], Stream::tagged(tags));
        }
        Ok(graph)
    }
}

fn structural(pos: usize, what: impl AsRef<str>) -> CodecError {
    CodecError::structural(format!("{} (token {pos})", what.as_ref()))
}

fn with_stream(err: CodecError, name: String) -> CodecError {
    match err {
        CodecError::AmbiguousTag {
            category,
            first,
            second,
            ..
        } => CodecError::AmbiguousTag {
            stream: name,
            category,
            first,
            second,
        },
        other => other,
    }
}
