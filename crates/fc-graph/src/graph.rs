//! Core graph data structures.

use std::collections::{BTreeMap, HashMap};

use fc_core::{StreamTags, UnitId};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::error::{GraphError, GraphResult};
use crate::validate;

/// Handle of a unit inside one `FlowsheetGraph`.
pub type UnitIx = NodeIndex;
/// Handle of a stream inside one `FlowsheetGraph`.
pub type StreamIx = EdgeIndex;

/// String attributes attached to units and streams.
pub type Attrs = BTreeMap<String, String>;

/// A unit operation instance (node).
///
/// Units own no streams; streams reference units by handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub attrs: Attrs,
    /// Attributes of individual streams of a merged heat-integrated unit, kept
    /// per stream slot when its shadow nodes disagreed.
    pub stream_attrs: BTreeMap<u32, Attrs>,
}

impl Unit {
    pub fn new(id: impl Into<UnitId>) -> Self {
        Self {
            id: id.into(),
            attrs: Attrs::new(),
            stream_attrs: BTreeMap::new(),
        }
    }
}

/// A directed material or signal stream (edge).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stream {
    pub tags: StreamTags,
    pub attrs: Attrs,
}

impl Stream {
    pub fn tagged(tags: StreamTags) -> Self {
        Self {
            tags,
            attrs: Attrs::new(),
        }
    }
}

/// A stream together with its resolved endpoints.
#[derive(Debug, Clone, Copy)]
pub struct StreamRef<'a> {
    pub ix: StreamIx,
    pub from: UnitIx,
    pub to: UnitIx,
    pub stream: &'a Stream,
}

/// The flowsheet: units and tagged streams.
///
/// Unit ids are unique. The graph may be cyclic, disconnected, and may hold
/// parallel streams between the same pair of units.
#[derive(Debug, Clone, Default)]
pub struct FlowsheetGraph {
    pub(crate) inner: StableDiGraph<Unit, Stream>,
    pub(crate) by_id: HashMap<String, UnitIx>,
}

impl FlowsheetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit and return its handle.
    pub fn add_unit(&mut self, unit: Unit) -> GraphResult<UnitIx> {
        validate::validate_unit_id(unit.id.as_str())?;
        if self.by_id.contains_key(unit.id.as_str()) {
            return Err(GraphError::DuplicateUnit {
                id: unit.id.to_string(),
            });
        }
        let key = unit.id.to_string();
        let ix = self.inner.add_node(unit);
        self.by_id.insert(key, ix);
        Ok(ix)
    }

    /// Return the handle of `id`, adding a bare unit if it doesn't exist yet.
    pub fn ensure_unit(&mut self, id: &str) -> GraphResult<UnitIx> {
        match self.by_id.get(id) {
            Some(&ix) => Ok(ix),
            None => self.add_unit(Unit::new(id)),
        }
    }

    /// Add a stream between two existing units.
    pub fn add_stream(&mut self, from: UnitIx, to: UnitIx, stream: Stream) -> StreamIx {
        self.inner.add_edge(from, to, stream)
    }

    /// Add a stream between two units referenced by id.
    pub fn connect(&mut self, from: &str, to: &str, tags: StreamTags) -> GraphResult<StreamIx> {
        let from_ix = self.require(from)?;
        let to_ix = self.require(to)?;
        Ok(self.add_stream(from_ix, to_ix, Stream::tagged(tags)))
    }

    /// Remove a unit together with all of its streams.
    pub fn remove_unit(&mut self, ix: UnitIx) -> Option<Unit> {
        let unit = self.inner.remove_node(ix)?;
        self.by_id.remove(unit.id.as_str());
        Some(unit)
    }

    pub fn remove_stream(&mut self, ix: StreamIx) -> Option<Stream> {
        self.inner.remove_edge(ix)
    }

    pub fn find(&self, id: &str) -> Option<UnitIx> {
        self.by_id.get(id).copied()
    }

    fn require(&self, id: &str) -> GraphResult<UnitIx> {
        self.find(id)
            .ok_or_else(|| GraphError::UnknownUnit { id: id.to_string() })
    }

    pub fn unit(&self, ix: UnitIx) -> Option<&Unit> {
        self.inner.node_weight(ix)
    }

    pub fn unit_mut(&mut self, ix: UnitIx) -> Option<&mut Unit> {
        self.inner.node_weight_mut(ix)
    }

    /// Id text of a unit; empty for a stale handle.
    pub fn id_of(&self, ix: UnitIx) -> &str {
        self.unit(ix).map(|u| u.id.as_str()).unwrap_or("")
    }

    pub fn stream(&self, ix: StreamIx) -> Option<&Stream> {
        self.inner.edge_weight(ix)
    }

    pub fn stream_mut(&mut self, ix: StreamIx) -> Option<&mut Stream> {
        self.inner.edge_weight_mut(ix)
    }

    pub fn endpoints(&self, ix: StreamIx) -> Option<(UnitIx, UnitIx)> {
        self.inner.edge_endpoints(ix)
    }

    pub fn unit_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn stream_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// All unit handles, in insertion order.
    pub fn unit_indices(&self) -> Vec<UnitIx> {
        self.inner.node_indices().collect()
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitIx, &Unit)> {
        self.inner
            .node_indices()
            .filter_map(move |ix| self.inner.node_weight(ix).map(|u| (ix, u)))
    }

    pub fn streams(&self) -> impl Iterator<Item = StreamRef<'_>> {
        self.inner.edge_indices().filter_map(move |ix| self.stream_ref(ix))
    }

    pub fn stream_ref(&self, ix: StreamIx) -> Option<StreamRef<'_>> {
        let (from, to) = self.inner.edge_endpoints(ix)?;
        let stream = self.inner.edge_weight(ix)?;
        Some(StreamRef {
            ix,
            from,
            to,
            stream,
        })
    }

    /// Streams leaving `ix`, self-loops included.
    pub fn out_streams(&self, ix: UnitIx) -> Vec<StreamRef<'_>> {
        self.directed(ix, Direction::Outgoing)
    }

    /// Streams entering `ix`, self-loops included.
    pub fn in_streams(&self, ix: UnitIx) -> Vec<StreamRef<'_>> {
        self.directed(ix, Direction::Incoming)
    }

    fn directed(&self, ix: UnitIx, dir: Direction) -> Vec<StreamRef<'_>> {
        let mut refs: Vec<StreamRef<'_>> = self
            .inner
            .edges_directed(ix, dir)
            .filter_map(|e| self.stream_ref(e.id()))
            .collect();
        // petgraph yields adjacency lists newest first
        refs.sort_by_key(|r| r.ix);
        refs
    }

    /// Distinct neighbours ignoring direction, self excluded.
    pub fn neighbors_undirected(&self, ix: UnitIx) -> Vec<UnitIx> {
        let mut out: Vec<UnitIx> = self
            .inner
            .neighbors_undirected(ix)
            .filter(|&n| n != ix)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn has_self_loop(&self, ix: UnitIx) -> bool {
        self.inner.edges_directed(ix, Direction::Outgoing).any(|e| {
            self.inner
                .edge_endpoints(e.id())
                .is_some_and(|(_, to)| to == ix)
        })
    }

    /// Sorted `from -> to [tags]` lines; equal for graphs with identical ids
    /// and streams regardless of construction order.
    pub fn edge_listing(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .streams()
            .map(|s| {
                format!(
                    "{} -> {} [{}]",
                    self.id_of(s.from),
                    self.id_of(s.to),
                    s.stream.tags.sort_key()
                )
            })
            .collect();
        lines.sort();
        lines
    }

    /// Sorted unit ids.
    pub fn unit_listing(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.units().map(|(_, u)| u.id.to_string()).collect();
        ids.sort();
        ids
    }
}
