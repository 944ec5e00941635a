//! Parallel corpus helpers.
//!
//! Every call is independent, so batches fan out over the rayon pool and
//! return one result per input, in input order. A failing item does not stop
//! the others.

use fc_core::CodecResult;
use fc_graph::FlowsheetGraph;
use rayon::prelude::*;
use tracing::debug;

use crate::decode::{Decoded, decode};
use crate::encode::{Encoded, encode};
use crate::options::{DecodeOptions, EncodeOptions, Traversal};

pub fn encode_batch(graphs: &[FlowsheetGraph], options: &EncodeOptions) -> Vec<CodecResult<Encoded>> {
    let results: Vec<_> = graphs.par_iter().map(|g| encode(g, options)).collect();
    debug!(
        items = results.len(),
        failed = results.iter().filter(|r| r.is_err()).count(),
        "encoded batch"
    );
    results
}

pub fn decode_batch<S>(inputs: &[S], options: &DecodeOptions) -> Vec<CodecResult<Decoded>>
where
    S: AsRef<str> + Sync,
{
    let results: Vec<_> = inputs
        .par_iter()
        .map(|s| decode(s.as_ref(), options))
        .collect();
    debug!(
        items = results.len(),
        failed = results.iter().filter(|r| r.is_err()).count(),
        "decoded batch"
    );
    results
}

/// `count` randomized encodings of one graph, seeded `0..count`.
///
/// Used for augmenting training corpora; every variant decodes to the same
/// flowsheet.
pub fn encode_variants(
    graph: &FlowsheetGraph,
    options: &EncodeOptions,
    count: u64,
) -> CodecResult<Vec<Encoded>> {
    (0..count)
        .into_par_iter()
        .map(|seed| encode(graph, &options.with_traversal(Traversal::Randomized { seed })))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::CodecError;

    #[test]
    fn results_keep_input_order() {
        let inputs = ["(a)(b)", "(a)[(b)", "(x)(y)(z)"];
        let out = decode_batch(&inputs, &DecodeOptions::default());
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_ref().unwrap().graph.unit_count(), 2);
        assert!(matches!(out[1], Err(CodecError::Structural { .. })));
        assert_eq!(out[2].as_ref().unwrap().graph.unit_count(), 3);
    }

    #[test]
    fn encode_batch_matches_single_calls() {
        let graphs: Vec<FlowsheetGraph> = ["(raw)(pump)(product)", "(pump-1)<1(flash-1)1"]
            .iter()
            .map(|s| decode(s, &DecodeOptions::default()).unwrap().graph)
            .collect();
        let opts = EncodeOptions::default();
        let batch = encode_batch(&graphs, &opts);
        for (g, r) in graphs.iter().zip(batch) {
            assert_eq!(r.unwrap(), encode(g, &opts).unwrap());
        }
    }

    #[test]
    fn variants_all_decode_to_the_same_flowsheet() {
        let g = decode("(raw)(mix)<&|(raw)&|(split)[(prod)](prod)", &DecodeOptions::default())
            .unwrap()
            .graph;
        let variants = encode_variants(&g, &EncodeOptions::default(), 6).unwrap();
        assert_eq!(variants.len(), 6);
        for v in variants {
            let back = decode(&v.notation, &DecodeOptions::default()).unwrap().graph;
            assert_eq!(back.edge_listing(), g.edge_listing());
        }
    }
}
