//! Incremental flowsheet builder.

use crate::error::GraphResult;
use crate::graph::{Attrs, FlowsheetGraph, Stream, Unit};
use crate::validate;

#[derive(Debug, Clone)]
pub(crate) struct PendingUnit {
    pub(crate) id: String,
    pub(crate) attrs: Attrs,
}

#[derive(Debug, Clone)]
pub(crate) struct PendingStream {
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) labels: Vec<String>,
}

/// Builder for constructing a flowsheet from ids and tag labels.
///
/// Nothing is checked until `build()`, which validates every unit id, stream
/// endpoint and tag label and only then materializes the graph.
#[derive(Debug, Default)]
pub struct FlowsheetBuilder {
    units: Vec<PendingUnit>,
    streams: Vec<PendingStream>,
}

impl FlowsheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, id: impl Into<String>) -> &mut Self {
        self.add_unit_with_attrs(id, Attrs::new())
    }

    pub fn add_unit_with_attrs(&mut self, id: impl Into<String>, attrs: Attrs) -> &mut Self {
        self.units.push(PendingUnit {
            id: id.into(),
            attrs,
        });
        self
    }

    /// Add a directed stream with textual tag labels (`hot_in`, `tout`, ...).
    pub fn add_stream<S: AsRef<str>>(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        labels: &[S],
    ) -> &mut Self {
        self.streams.push(PendingStream {
            from: from.into(),
            to: to.into(),
            labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
        });
        self
    }

    /// Validate and build the graph.
    pub fn build(self) -> GraphResult<FlowsheetGraph> {
        let tags = validate::validate_pending(&self.units, &self.streams)?;

        let mut graph = FlowsheetGraph::new();
        for pending in self.units {
            let mut unit = Unit::new(pending.id);
            unit.attrs = pending.attrs;
            graph.add_unit(unit)?;
        }
        for (pending, tags) in self.streams.iter().zip(tags) {
            let from = graph.ensure_unit(&pending.from)?;
            let to = graph.ensure_unit(&pending.to)?;
            graph.add_stream(from, to, Stream::tagged(tags));
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use fc_core::{CodecError, HeatRole};

    #[test]
    fn builds_tagged_streams() {
        let mut builder = FlowsheetBuilder::new();
        builder.add_unit("dist-1").add_unit("hex-1");
        builder.add_stream("dist-1", "hex-1", &["hot_in"]);
        let graph = builder.build().unwrap();
        let stream = graph.streams().next().unwrap();
        assert_eq!(stream.stream.tags.heat, Some(HeatRole::HotIn));
    }

    #[test]
    fn unknown_endpoint_fails() {
        let mut builder = FlowsheetBuilder::new();
        builder.add_unit("a-1");
        builder.add_stream("a-1", "b-1", &[] as &[&str]);
        assert_eq!(
            builder.build().unwrap_err(),
            GraphError::UnknownUnit { id: "b-1".into() }
        );
    }

    #[test]
    fn conflicting_labels_become_ambiguous_tag() {
        let mut builder = FlowsheetBuilder::new();
        builder.add_unit("a-1").add_unit("b-1");
        builder.add_stream("a-1", "b-1", &["tin", "bout"]);
        let err: CodecError = builder.build().unwrap_err().into();
        match err {
            CodecError::AmbiguousTag {
                stream, category, ..
            } => {
                assert_eq!(stream, "a-1 -> b-1");
                assert_eq!(category, "column");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
