//! Conversion between documents and flowsheet graphs.

use fc_codec::decode;
use fc_core::StreamTags;
use fc_graph::{FlowsheetGraph, Unit};

use crate::ProjectResult;
use crate::schema::{CodecDef, FlowsheetDoc, StreamDef, UnitDef};
use crate::validate::{LATEST_VERSION, validate_doc};

/// Build the graph a document describes, decoding `notation` if present.
pub fn doc_to_graph(doc: &FlowsheetDoc) -> ProjectResult<FlowsheetGraph> {
    validate_doc(doc)?;
    if let Some(notation) = &doc.notation {
        let decoded = decode(notation, &doc.codec.decode)?;
        return Ok(decoded.graph);
    }

    let mut graph = FlowsheetGraph::new();
    for def in &doc.units {
        let mut unit = Unit::new(def.id.as_str());
        unit.attrs = def.attrs.clone();
        unit.stream_attrs = def.stream_attrs.clone();
        graph.add_unit(unit)?;
    }
    for def in &doc.streams {
        let tags = StreamTags::from_labels(&def.tags)?;
        let ix = graph.connect(&def.from, &def.to, tags)?;
        if let Some(stream) = graph.stream_mut(ix) {
            stream.attrs = def.attrs.clone();
        }
    }
    Ok(graph)
}

/// Describe `graph` as an explicit unit/stream document.
pub fn graph_to_doc(name: &str, graph: &FlowsheetGraph, codec: CodecDef) -> FlowsheetDoc {
    let units = graph
        .units()
        .map(|(_, unit)| UnitDef {
            id: unit.id.to_string(),
            attrs: unit.attrs.clone(),
            stream_attrs: unit.stream_attrs.clone(),
        })
        .collect();
    let streams = graph
        .streams()
        .map(|s| StreamDef {
            from: graph.id_of(s.from).to_string(),
            to: graph.id_of(s.to).to_string(),
            tags: s.stream.tags.labels(),
            attrs: s.stream.attrs.clone(),
        })
        .collect();
    FlowsheetDoc {
        version: LATEST_VERSION,
        name: name.to_string(),
        codec,
        units,
        streams,
        notation: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProjectError;
    use fc_core::CodecError;

    fn doc() -> FlowsheetDoc {
        let mut pump = UnitDef::new("pump-1");
        pump.attrs.insert("power_kw".into(), "15".into());
        let mut feed = StreamDef::new("raw-1", "pump-1");
        feed.attrs.insert("phase".into(), "liquid".into());
        FlowsheetDoc {
            version: LATEST_VERSION,
            name: "feed pump".to_string(),
            codec: CodecDef::default(),
            units: vec![UnitDef::new("raw-1"), pump, UnitDef::new("dist-1")],
            streams: vec![
                feed,
                StreamDef::new("pump-1", "dist-1").with_tags(&["tin"]),
            ],
            notation: None,
        }
    }

    #[test]
    fn explicit_document_builds_graph() {
        let graph = doc_to_graph(&doc()).unwrap();
        assert_eq!(
            graph.edge_listing(),
            vec!["pump-1 -> dist-1 [tin]", "raw-1 -> pump-1 []"]
        );
        let pump = graph.find("pump-1").unwrap();
        assert_eq!(graph.unit(pump).unwrap().attrs["power_kw"], "15");
        let feed = graph.in_streams(pump)[0].stream;
        assert_eq!(feed.attrs["phase"], "liquid");
    }

    #[test]
    fn graph_to_doc_round_trips() {
        let graph = doc_to_graph(&doc()).unwrap();
        let back = graph_to_doc("feed pump", &graph, CodecDef::default());
        assert_eq!(back, doc());
    }

    #[test]
    fn notation_document_is_decoded() {
        let d = FlowsheetDoc {
            version: LATEST_VERSION,
            name: "recycle".to_string(),
            codec: CodecDef::default(),
            units: vec![],
            streams: vec![],
            notation: Some("(flash)<1(pump)1".to_string()),
        };
        let graph = doc_to_graph(&d).unwrap();
        assert_eq!(graph.unit_listing(), vec!["flash-1", "pump-1"]);
        assert_eq!(graph.stream_count(), 2);
    }

    #[test]
    fn bad_notation_surfaces_codec_error() {
        let d = FlowsheetDoc {
            version: LATEST_VERSION,
            name: "broken".to_string(),
            codec: CodecDef::default(),
            units: vec![],
            streams: vec![],
            notation: Some("(a)[(b)".to_string()),
        };
        assert!(matches!(
            doc_to_graph(&d),
            Err(ProjectError::Codec(CodecError::Structural { .. }))
        ));
    }

    #[test]
    fn invalid_unit_id_surfaces_graph_error() {
        let mut d = doc();
        d.units.push(UnitDef::new("bad id"));
        assert!(matches!(doc_to_graph(&d), Err(ProjectError::Graph(_))));
    }
}
