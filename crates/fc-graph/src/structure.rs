//! Structural queries over the walkable part of a flowsheet.
//!
//! The codec ranks and traverses a graph with non-adjacent control signals
//! withheld; `Structure` presents that view without copying the graph.

use std::collections::{BTreeSet, HashSet, VecDeque};

use petgraph::visit::{Dfs, EdgeFiltered};

use crate::graph::{FlowsheetGraph, Stream, StreamRef, UnitIx};

/// Read-only view of a `FlowsheetGraph` restricted to a subset of streams.
#[derive(Clone, Copy)]
pub struct Structure<'g> {
    graph: &'g FlowsheetGraph,
    keep: fn(&Stream) -> bool,
}

fn every(_: &Stream) -> bool {
    true
}

fn walkable(stream: &Stream) -> bool {
    !stream.tags.is_non_adjacent_signal()
}

impl<'g> Structure<'g> {
    /// View over every stream.
    pub fn all(graph: &'g FlowsheetGraph) -> Self {
        Self { graph, keep: every }
    }

    /// View without non-adjacent signal streams, the graph the encoder walks.
    pub fn walkable(graph: &'g FlowsheetGraph) -> Self {
        Self {
            graph,
            keep: walkable,
        }
    }

    pub fn graph(&self) -> &'g FlowsheetGraph {
        self.graph
    }

    pub fn keeps(&self, stream: &Stream) -> bool {
        (self.keep)(stream)
    }

    pub fn streams(&self) -> Vec<StreamRef<'g>> {
        self.graph.streams().filter(|s| self.keeps(s.stream)).collect()
    }

    pub fn out_streams(&self, ix: UnitIx) -> Vec<StreamRef<'g>> {
        let mut out = self.graph.out_streams(ix);
        out.retain(|s| self.keeps(s.stream));
        out
    }

    pub fn in_streams(&self, ix: UnitIx) -> Vec<StreamRef<'g>> {
        let mut ins = self.graph.in_streams(ix);
        ins.retain(|s| self.keeps(s.stream));
        ins
    }

    pub fn in_degree(&self, ix: UnitIx) -> usize {
        self.in_streams(ix).len()
    }

    pub fn out_degree(&self, ix: UnitIx) -> usize {
        self.out_streams(ix).len()
    }

    /// Distinct undirected neighbours; a unit with a self-loop neighbours itself.
    pub fn adjacency(&self, ix: UnitIx) -> Vec<UnitIx> {
        let mut set = BTreeSet::new();
        for s in self.out_streams(ix) {
            set.insert(s.to);
        }
        for s in self.in_streams(ix) {
            set.insert(s.from);
        }
        set.into_iter().collect()
    }

    /// Weakly connected components, each sorted by handle, in order of their
    /// smallest member.
    pub fn weak_components(&self) -> Vec<Vec<UnitIx>> {
        let mut seen = HashSet::new();
        let mut components = Vec::new();
        for start in self.graph.unit_indices() {
            if !seen.insert(start) {
                continue;
            }
            let mut members = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(ix) = queue.pop_front() {
                for next in self.adjacency(ix) {
                    if seen.insert(next) {
                        members.push(next);
                        queue.push_back(next);
                    }
                }
            }
            members.sort();
            components.push(members);
        }
        components
    }

    /// Units reachable from `start` along stream direction, `start` included.
    pub fn reachable(&self, start: UnitIx) -> Vec<UnitIx> {
        let keep = self.keep;
        let filtered = EdgeFiltered::from_fn(&self.graph.inner, move |e| keep(e.weight()));
        let mut dfs = Dfs::new(&filtered, start);
        let mut out = Vec::new();
        while let Some(ix) = dfs.next(&filtered) {
            out.push(ix);
        }
        out.sort();
        out
    }

    /// Sorted `kind>kind` pairs of the streams leaving `members`, joined by `,`.
    ///
    /// Instance numbers and suffixes are ignored, so two numberings of the
    /// same structure share a signature.
    pub fn kind_signature(&self, members: &[UnitIx]) -> String {
        let set: HashSet<UnitIx> = members.iter().copied().collect();
        let mut pairs: Vec<String> = self
            .streams()
            .into_iter()
            .filter(|s| set.contains(&s.from))
            .map(|s| format!("{}>{}", self.kind(s.from), self.kind(s.to)))
            .collect();
        pairs.sort();
        pairs.join(",")
    }

    /// Kinds met walking forward from `ix`, layer by layer.
    ///
    /// Layer `d` holds the sorted kinds of units first reached after `d`
    /// streams; layers are joined by `|`, kinds within a layer by `,`. Units on
    /// a shared cycle see the cycle from different positions, so their
    /// signatures differ even though they reach the same units.
    pub fn subtree_signature(&self, ix: UnitIx) -> String {
        let mut seen: HashSet<UnitIx> = HashSet::from([ix]);
        let mut layer = vec![ix];
        let mut layers = Vec::new();
        while !layer.is_empty() {
            let mut kinds: Vec<&str> = layer.iter().map(|&u| self.kind(u)).collect();
            kinds.sort_unstable();
            layers.push(kinds.join(","));
            let mut next = Vec::new();
            for &u in &layer {
                for s in self.out_streams(u) {
                    if seen.insert(s.to) {
                        next.push(s.to);
                    }
                }
            }
            layer = next;
        }
        layers.join("|")
    }

    pub fn kind(&self, ix: UnitIx) -> &'g str {
        self.graph.unit(ix).map(|u| u.id.kind()).unwrap_or("")
    }
}

impl std::fmt::Debug for Structure<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Structure")
            .field("units", &self.graph.unit_count())
            .field("streams", &self.streams().len())
            .finish()
    }
}
