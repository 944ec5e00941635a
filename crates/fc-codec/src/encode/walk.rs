//! Depth-first layout of the walkable graph.
//!
//! The walk produces a tree rather than a flat token list: the main item
//! sequence holds units, branch brackets and segment breaks, while every
//! unit owns a `Slot` with the markers written right after it. Incoming
//! branches are item sequences stored in the slot of the unit they join, so
//! inserting one never shifts anything else.

use std::collections::{HashMap, HashSet};

use fc_graph::{FlowsheetGraph, StreamIx, StreamRef, Structure, UnitIx};
use tracing::trace;

use crate::rank::Ranks;
use crate::token::Namespace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Item {
    Unit(UnitIx),
    Open,
    Close,
    Break,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mark {
    /// Source end of a cycle: `n` or `_n`.
    Cycle {
        namespace: Namespace,
        number: u32,
        stream: StreamIx,
    },
    /// Target end of a cycle: `<n` or `<_n`.
    CycleTarget { namespace: Namespace, number: u32 },
    /// `&`: the stream into the unit an incoming branch hangs off.
    Join { stream: StreamIx },
    /// `<&|...|`: a later traversal that feeds into this unit.
    Incoming(Vec<Item>),
}

/// Markers written after one unit: source-side first, then target-side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Slot {
    pub source: Vec<Mark>,
    pub target: Vec<Mark>,
}

#[derive(Debug, Default)]
pub(crate) struct Layout {
    pub items: Vec<Item>,
    pub slots: HashMap<UnitIx, Slot>,
    /// Stream through which the walk first reached each unit.
    pub tree_edge: HashMap<UnitIx, StreamIx>,
    cycles: u32,
    signals: u32,
}

impl Layout {
    pub fn slot(&self, ix: UnitIx) -> Option<&Slot> {
        self.slots.get(&ix)
    }

    fn slot_mut(&mut self, ix: UnitIx) -> &mut Slot {
        self.slots.entry(ix).or_default()
    }

    fn cycle(&mut self, namespace: Namespace, stream: StreamIx, from: UnitIx, to: UnitIx) {
        let counter = match namespace {
            Namespace::Material => &mut self.cycles,
            Namespace::Signal => &mut self.signals,
        };
        *counter += 1;
        let number = *counter;
        self.slot_mut(from).source.push(Mark::Cycle {
            namespace,
            number,
            stream,
        });
        self.slot_mut(to)
            .target
            .push(Mark::CycleTarget { namespace, number });
    }
}

/// Walk every ranked unit of `view` once.
///
/// Traversals start at units without inlets in rank order, then at the
/// lowest-ranked unit left over (pure recycles). The first traversal forms
/// the main sequence. A later traversal that reaches an earlier one becomes an
/// incoming branch on the first unit it reaches; further references back use
/// numbered cycles. A traversal that reaches nothing earlier is appended
/// after a segment break.
pub(crate) fn layout(view: Structure<'_>, ranks: &Ranks) -> Layout {
    let mut walker = Walker {
        view,
        ranks,
        visited: HashSet::new(),
        prior: HashSet::new(),
        anchor: None,
        layout: Layout::default(),
    };

    let ordered = ranks.ordered();
    let roots = ordered.iter().filter(|&&ix| view.in_degree(ix) == 0);
    for &root in roots {
        if !walker.visited.contains(&root) {
            walker.traverse(root);
        }
    }
    for ix in ordered {
        if !walker.visited.contains(&ix) {
            walker.traverse(ix);
        }
    }
    walker.layout
}

/// Attach withheld non-adjacent signal streams between ranked units as
/// `_n` / `<_n` pairs, numbered in order of source rank, then target rank.
pub(crate) fn place_signals(layout: &mut Layout, graph: &FlowsheetGraph, ranks: &Ranks) {
    let mut signals: Vec<StreamRef<'_>> = graph
        .streams()
        .filter(|s| s.stream.tags.is_non_adjacent_signal())
        .filter(|s| ranks.contains(s.from) && ranks.contains(s.to))
        .collect();
    signals.sort_by_key(|s| (ranks.get(s.from), ranks.get(s.to), s.ix));
    for s in signals {
        layout.cycle(Namespace::Signal, s.ix, s.from, s.to);
    }
}

struct Walker<'a> {
    view: Structure<'a>,
    ranks: &'a Ranks,
    visited: HashSet<UnitIx>,
    /// Units of completed traversals.
    prior: HashSet<UnitIx>,
    /// Unit the current traversal joins, once found.
    anchor: Option<UnitIx>,
    layout: Layout,
}

impl<'a> Walker<'a> {
    fn traverse(&mut self, start: UnitIx) {
        self.anchor = None;
        let items = self.visit(start);
        match self.anchor.take() {
            Some(anchor) => {
                trace!(start = ?start, anchor = ?anchor, "incoming branch");
                self.layout.slot_mut(anchor).target.push(Mark::Incoming(items));
            }
            None => {
                if !self.layout.items.is_empty() {
                    self.layout.items.push(Item::Break);
                }
                self.layout.items.extend(items);
            }
        }
        self.prior.extend(self.visited.iter().copied());
    }

    /// Depth-first from `start` on an explicit stack of frames.
    fn visit(&mut self, start: UnitIx) -> Vec<Item> {
        let mut stack = vec![self.enter(start)];
        loop {
            let Some(top) = stack.last_mut() else {
                return Vec::new();
            };
            if let Some(s) = top.outs.next() {
                let ix = top.ix;
                if self.prior.contains(&s.to) {
                    if self.anchor.is_none() {
                        self.anchor = Some(s.to);
                        self.layout
                            .slot_mut(ix)
                            .source
                            .push(Mark::Join { stream: s.ix });
                    } else {
                        self.layout.cycle(Namespace::Material, s.ix, ix, s.to);
                    }
                } else if self.visited.contains(&s.to) {
                    self.layout.cycle(Namespace::Material, s.ix, ix, s.to);
                } else {
                    self.layout.tree_edge.insert(s.to, s.ix);
                    let frame = self.enter(s.to);
                    stack.push(frame);
                }
                continue;
            }

            let Some(done) = stack.pop() else {
                return Vec::new();
            };
            let items = done.finish();
            match stack.last_mut() {
                Some(parent) => parent.branches.push(items),
                None => return items,
            }
        }
    }

    fn enter(&mut self, ix: UnitIx) -> Frame<'a> {
        self.visited.insert(ix);
        // Already-visited targets first so back references are settled before
        // descending, then by rank.
        let mut outs = self.view.out_streams(ix);
        outs.sort_by_cached_key(|s| {
            (
                !self.visited.contains(&s.to),
                self.ranks.get(s.to),
                s.stream.tags.sort_key(),
                s.ix,
            )
        });
        Frame {
            ix,
            outs: outs.into_iter(),
            branches: Vec::new(),
        }
    }
}

/// One unit on the walk stack.
struct Frame<'a> {
    ix: UnitIx,
    outs: std::vec::IntoIter<StreamRef<'a>>,
    branches: Vec<Vec<Item>>,
}

impl Frame<'_> {
    /// Every branch but the last is bracketed.
    fn finish(mut self) -> Vec<Item> {
        let mut items = vec![Item::Unit(self.ix)];
        let last = self.branches.pop();
        for branch in self.branches {
            items.push(Item::Open);
            items.extend(branch);
            items.push(Item::Close);
        }
        if let Some(branch) = last {
            items.extend(branch);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::rank;
    use fc_graph::FlowsheetBuilder;

    fn build(streams: &[(&str, &str)]) -> FlowsheetGraph {
        let mut b = FlowsheetBuilder::new();
        let mut seen = Vec::new();
        for (from, to) in streams {
            for id in [from, to] {
                if !seen.contains(id) {
                    seen.push(*id);
                    b.add_unit(*id);
                }
            }
        }
        for (from, to) in streams {
            b.add_stream(*from, *to, &[] as &[&str]);
        }
        b.build().unwrap()
    }

    fn ids(graph: &FlowsheetGraph, items: &[Item]) -> Vec<String> {
        items
            .iter()
            .map(|item| match item {
                Item::Unit(ix) => graph.id_of(*ix).to_string(),
                Item::Open => "[".into(),
                Item::Close => "]".into(),
                Item::Break => "n|".into(),
            })
            .collect()
    }

    #[test]
    fn branches_are_bracketed_except_the_last() {
        let g = build(&[("a-1", "b-1"), ("a-1", "c-1"), ("c-1", "d-1")]);
        let ranks = rank(&g);
        let layout = layout(Structure::walkable(&g), &ranks);
        assert_eq!(
            ids(&g, &layout.items),
            vec!["a-1", "[", "b-1", "]", "c-1", "d-1"]
        );
    }

    #[test]
    fn back_edge_becomes_cycle_pair() {
        let g = build(&[("pump-1", "flash-1"), ("flash-1", "pump-1")]);
        let ranks = rank(&g);
        let layout = layout(Structure::walkable(&g), &ranks);
        let pump = g.find("pump-1").unwrap();
        let flash = g.find("flash-1").unwrap();
        assert!(matches!(
            layout.slot(pump).unwrap().source[0],
            Mark::Cycle { number: 1, .. }
        ));
        assert_eq!(
            layout.slot(flash).unwrap().target,
            vec![Mark::CycleTarget {
                namespace: Namespace::Material,
                number: 1
            }]
        );
    }

    #[test]
    fn second_feed_joins_as_incoming_branch() {
        let g = build(&[("raw-1", "mix-1"), ("raw-2", "mix-1"), ("mix-1", "prod-1")]);
        let ranks = rank(&g);
        let layout = layout(Structure::walkable(&g), &ranks);
        assert_eq!(ids(&g, &layout.items), vec!["raw-1", "mix-1", "prod-1"]);
        let mix = g.find("mix-1").unwrap();
        let raw2 = g.find("raw-2").unwrap();
        assert_eq!(
            layout.slot(mix).unwrap().target,
            vec![Mark::Incoming(vec![Item::Unit(raw2)])]
        );
        assert!(matches!(
            layout.slot(raw2).unwrap().source[0],
            Mark::Join { .. }
        ));
    }

    #[test]
    fn unrelated_trains_are_separated() {
        let g = build(&[("raw-1", "pump-1"), ("pump-1", "prod-1"), ("raw-2", "prod-2")]);
        let ranks = rank(&g);
        let layout = layout(Structure::walkable(&g), &ranks);
        assert_eq!(
            ids(&g, &layout.items),
            vec!["raw-1", "pump-1", "prod-1", "n|", "raw-2", "prod-2"]
        );
    }

    #[test]
    fn long_chains_are_walked_without_recursion() {
        let ids: Vec<String> = (1..=50_000).map(|i| format!("pump-{i}")).collect();
        let mut b = FlowsheetBuilder::new();
        for id in &ids {
            b.add_unit(id.clone());
        }
        for pair in ids.windows(2) {
            b.add_stream(pair[0].clone(), pair[1].clone(), &[] as &[&str]);
        }
        let g = b.build().unwrap();
        let ranks = Ranks::from_orders([g.unit_indices().as_slice()]);
        let layout = layout(Structure::walkable(&g), &ranks);
        assert_eq!(layout.items.len(), ids.len());
        assert_eq!(layout.items[0], Item::Unit(g.find("pump-1").unwrap()));
        assert_eq!(
            layout.items.last(),
            Some(&Item::Unit(g.find("pump-50000").unwrap()))
        );
    }

    #[test]
    fn layout_covers_only_ranked_units() {
        let g = build(&[("raw-1", "pump-1"), ("raw-2", "prod-2")]);
        let only = [g.find("raw-2").unwrap(), g.find("prod-2").unwrap()];
        let ranks = Ranks::from_orders([only.as_slice()]);
        let layout = layout(Structure::walkable(&g), &ranks);
        assert_eq!(ids(&g, &layout.items), vec!["raw-2", "prod-2"]);
    }
}
