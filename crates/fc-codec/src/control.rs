//! Material-only views of flowsheets with control structure.

use fc_core::CodecResult;
use fc_graph::FlowsheetGraph;
use tracing::debug;

use crate::decode::decode;
use crate::encode::{Encoded, encode};
use crate::options::{DecodeOptions, EncodeOptions};

/// Copy of `graph` without control units and signal streams.
pub fn strip_control(graph: &FlowsheetGraph) -> FlowsheetGraph {
    let mut out = graph.clone();
    let controls: Vec<_> = out
        .units()
        .filter(|(_, unit)| unit.id.is_control())
        .map(|(ix, _)| ix)
        .collect();
    for ix in &controls {
        out.remove_unit(*ix);
    }
    let signals: Vec<_> = out
        .streams()
        .filter(|s| s.stream.tags.is_signal())
        .map(|s| s.ix)
        .collect();
    for ix in &signals {
        out.remove_stream(*ix);
    }
    debug!(
        units = controls.len(),
        streams = signals.len(),
        "removed control structure"
    );
    out
}

/// Canonical notation of the material part of `graph`.
pub fn material_notation(graph: &FlowsheetGraph, options: &EncodeOptions) -> CodecResult<Encoded> {
    encode(&strip_control(graph), options)
}

/// Decode `input`, drop its control structure and encode it again.
pub fn strip_notation(
    input: &str,
    encode_options: &EncodeOptions,
    decode_options: &DecodeOptions,
) -> CodecResult<Encoded> {
    let decoded = decode(input, decode_options)?;
    material_notation(&decoded.graph, encode_options)
}
