//! Graph to notation.

mod render;
mod walk;

use std::cmp::Reverse;

use fc_core::{CodecError, CodecResult, DegradedMerge};
use fc_graph::{FlowsheetGraph, Structure, UnitIx};
use tracing::{debug, trace};

use crate::heat::split_heat_integration;
use crate::options::{EncodeOptions, Traversal};
use crate::rank::{self, MAX_CANDIDATES, Ranks, rank_structure};
use crate::token::{self, Token};

/// Output of one encode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Tokens with full unit ids.
    pub tokens: Vec<Token>,
    pub notation: String,
    /// Tokens with unit ids reduced to their type.
    pub generalized_tokens: Vec<Token>,
    /// Type-level canonical form, comparable across numberings.
    pub generalized: String,
    /// Heat-integrated units that had to be encoded unsplit.
    pub warnings: Vec<DegradedMerge>,
}

/// Encode a flowsheet.
///
/// Heat-integrated units are split into shadows, units are ranked (for the
/// canonical traversal, each component takes the candidate order with the
/// smallest generalized rendering), the walkable graph is laid out depth-first, withheld control signals are added
/// as signal markers, and the layout is rendered to tokens.
///
/// # Errors
///
/// `EmptyInput` for a graph without units. Tag ambiguity is rejected when the
/// graph is built, so a constructed graph always encodes.
pub fn encode(graph: &FlowsheetGraph, options: &EncodeOptions) -> CodecResult<Encoded> {
    if graph.is_empty() {
        return Err(CodecError::EmptyInput);
    }

    let split = split_heat_integration(graph);
    let view = Structure::walkable(&split.graph);
    let ranks = match options.traversal {
        Traversal::Canonical => canonical_ranks(view, options),
        Traversal::Randomized { seed } => rank_structure(view).shuffled(seed),
    };

    let mut layout = walk::layout(view, &ranks);
    walk::place_signals(&mut layout, &split.graph, &ranks);

    let tokens = render::Renderer::new(&split.graph, &layout, options).render();
    let generalized_tokens = render::generalize(&tokens);
    let notation = token::render(&tokens);
    let generalized = token::render(&generalized_tokens);
    debug!(
        units = graph.unit_count(),
        shadows = split.shadows.values().map(Vec::len).sum::<usize>(),
        tokens = tokens.len(),
        "encoded flowsheet"
    );

    Ok(Encoded {
        tokens,
        notation,
        generalized_tokens,
        generalized,
        warnings: split.warnings,
    })
}

/// Pick one candidate order per component by its generalized rendering, then
/// order components by size, signature and that rendering.
fn canonical_ranks(view: Structure<'_>, options: &EncodeOptions) -> Ranks {
    let mut chosen: Vec<(usize, String, String, Vec<UnitIx>)> =
        rank::components(view, MAX_CANDIDATES)
            .into_iter()
            .filter_map(|component| {
                let size = component.size();
                let mut best: Option<(String, Vec<UnitIx>)> = None;
                for order in component.candidates {
                    let form = generalized_form(view, &order, options);
                    if best.as_ref().is_none_or(|(current, _)| form < *current) {
                        best = Some((form, order));
                    }
                }
                best.map(|(form, order)| (size, component.signature, form, order))
            })
            .collect();
    chosen.sort_by(|a, b| (Reverse(a.0), &a.1, &a.2).cmp(&(Reverse(b.0), &b.1, &b.2)));
    trace!(components = chosen.len(), "chose canonical orders");
    Ranks::from_orders(chosen.iter().map(|(_, _, _, order)| order.as_slice()))
}

/// Generalized string of the units in `order` laid out on their own.
fn generalized_form(view: Structure<'_>, order: &[UnitIx], options: &EncodeOptions) -> String {
    let ranks = Ranks::from_orders([order]);
    let mut layout = walk::layout(view, &ranks);
    walk::place_signals(&mut layout, view.graph(), &ranks);
    let tokens = render::Renderer::new(view.graph(), &layout, options).render();
    token::render(&render::generalize(&tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::NotationVersion;
    use fc_graph::FlowsheetBuilder;

    fn graph(units: &[&str], streams: &[(&str, &str, &[&str])]) -> FlowsheetGraph {
        let mut b = FlowsheetBuilder::new();
        for u in units {
            b.add_unit(*u);
        }
        for (from, to, tags) in streams {
            b.add_stream(*from, *to, tags);
        }
        b.build().unwrap()
    }

    fn exchanger() -> FlowsheetGraph {
        graph(
            &["raw-1", "raw-2", "hex-1", "dist-1", "product-1"],
            &[
                ("raw-1", "hex-1", &["hot_in"]),
                ("raw-2", "hex-1", &["cold_in"]),
                ("hex-1", "dist-1", &["hot_out"]),
                ("hex-1", "product-1", &["cold_out"]),
            ],
        )
    }

    #[test]
    fn chain() {
        let g = graph(
            &["raw-1", "pump-1", "product-1"],
            &[("raw-1", "pump-1", &[]), ("pump-1", "product-1", &[])],
        );
        let out = encode(&g, &EncodeOptions::default()).unwrap();
        assert_eq!(out.notation, "(raw-1)(pump-1)(product-1)");
        assert_eq!(out.generalized, "(raw)(pump)(product)");
    }

    #[test]
    fn two_unit_recycle() {
        let g = graph(
            &["pump-1", "flash-1"],
            &[("pump-1", "flash-1", &[]), ("flash-1", "pump-1", &[])],
        );
        let out = encode(&g, &EncodeOptions::default()).unwrap();
        assert_eq!(out.notation, "(flash-1)<1(pump-1)1");
    }

    #[test]
    fn heat_exchanger_is_split() {
        let out = encode(&exchanger(), &EncodeOptions::default()).unwrap();
        assert_eq!(
            out.notation,
            "(raw-1){hot_in}(hex-1/2){1}{hot_out}(dist-1)n|(raw-2){cold_in}(hex-1/1){1}{cold_out}(product-1)"
        );
        assert_eq!(
            out.generalized,
            "(raw){hot_in}(hex){1}{hot_out}(dist)n|(raw){cold_in}(hex){1}{cold_out}(product)"
        );
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn heat_tags_can_be_dropped() {
        let opts = EncodeOptions::default().with_heat_tags(false);
        let out = encode(&exchanger(), &opts).unwrap();
        assert_eq!(
            out.generalized,
            "(raw)(hex){1}(dist)n|(raw)(hex){1}(product)"
        );
    }

    #[test]
    fn v1_has_no_tags() {
        let opts = EncodeOptions::default().with_version(NotationVersion::V1);
        let out = encode(&exchanger(), &opts).unwrap();
        assert_eq!(out.generalized, "(raw)(hex)(dist)n|(raw)(hex)(product)");
    }

    #[test]
    fn mixer_uses_incoming_branch() {
        let g = graph(
            &["raw-1", "raw-2", "mix-1", "prod-1"],
            &[
                ("raw-1", "mix-1", &[]),
                ("raw-2", "mix-1", &[]),
                ("mix-1", "prod-1", &[]),
            ],
        );
        let out = encode(&g, &EncodeOptions::default()).unwrap();
        assert_eq!(out.notation, "(raw-1)(mix-1)<&|(raw-2)&|(prod-1)");
    }

    #[test]
    fn control_loop_uses_signal_markers() {
        let g = graph(
            &["raw-1", "v-1", "prod-1", "C-1/FC"],
            &[
                ("raw-1", "v-1", &[]),
                ("v-1", "prod-1", &[]),
                ("v-1", "C-1/FC", &[]),
                ("C-1/FC", "v-1", &["not_next_unitop"]),
            ],
        );
        let out = encode(&g, &EncodeOptions::default()).unwrap();
        assert_eq!(out.notation, "(raw-1)(v-1)<_1[(prod-1)](C-1/FC){FC}_1");
        assert_eq!(out.generalized, "(raw)(v)<_1[(prod)](C){FC}_1");
    }

    #[test]
    fn column_tags_precede_the_target() {
        let g = graph(
            &["dist-1", "prod-1", "prod-2"],
            &[
                ("dist-1", "prod-1", &["tout"]),
                ("dist-1", "prod-2", &["bout"]),
            ],
        );
        let out = encode(&g, &EncodeOptions::default()).unwrap();
        assert_eq!(out.notation, "(dist-1)[{bout}(prod-2)]{tout}(prod-1)");
    }

    #[test]
    fn cycle_members_of_one_type_are_told_apart_by_position() {
        let first = graph(
            &["raw-1", "flash-1", "flash-2"],
            &[
                ("raw-1", "flash-1", &[]),
                ("flash-1", "flash-2", &[]),
                ("flash-2", "raw-1", &[]),
            ],
        );
        let second = graph(
            &["raw-1", "flash-1", "flash-2"],
            &[
                ("raw-1", "flash-2", &[]),
                ("flash-2", "flash-1", &[]),
                ("flash-1", "raw-1", &[]),
            ],
        );
        let a = encode(&first, &EncodeOptions::default()).unwrap();
        let b = encode(&second, &EncodeOptions::default()).unwrap();
        assert_eq!(a.notation, "(flash-1)<1(flash-2)(raw-1)1");
        assert_eq!(b.notation, "(flash-2)<1(flash-1)(raw-1)1");
        assert_eq!(a.generalized, "(flash)<1(flash)(raw)1");
        assert_eq!(a.generalized, b.generalized);
    }

    #[test]
    fn mirror_symmetric_feeds_encode_one_way() {
        let g = graph(
            &["raw-2", "raw-3", "raw-4", "pump-1", "pump-5"],
            &[
                ("raw-2", "pump-1", &[]),
                ("raw-2", "pump-5", &[]),
                ("raw-3", "pump-5", &[]),
                ("raw-4", "pump-1", &[]),
            ],
        );
        let out = encode(&g, &EncodeOptions::default()).unwrap();
        assert_eq!(out.notation, "(raw-3)(pump-5)<&|(raw-2)&1|n|(raw-4)(pump-1)<1");
        assert_eq!(out.generalized, "(raw)(pump)<&|(raw)&1|n|(raw)(pump)<1");

        let renumbered = graph(
            &["raw-1", "raw-2", "raw-3", "pump-1", "pump-2"],
            &[
                ("raw-1", "pump-1", &[]),
                ("raw-1", "pump-2", &[]),
                ("raw-2", "pump-1", &[]),
                ("raw-3", "pump-2", &[]),
            ],
        );
        let again = encode(&renumbered, &EncodeOptions::default()).unwrap();
        assert_eq!(again.generalized, out.generalized);
    }

    #[test]
    fn empty_graph_is_rejected() {
        let err = encode(&FlowsheetGraph::new(), &EncodeOptions::default()).unwrap_err();
        assert_eq!(err, CodecError::EmptyInput);
    }

    #[test]
    fn randomized_traversal_is_reproducible() {
        let g = graph(
            &["raw-1", "a-1", "b-1", "c-1", "d-1"],
            &[
                ("raw-1", "a-1", &[]),
                ("a-1", "b-1", &[]),
                ("a-1", "c-1", &[]),
                ("c-1", "d-1", &[]),
                ("d-1", "a-1", &[]),
            ],
        );
        let opts = EncodeOptions::default().with_traversal(Traversal::Randomized { seed: 3 });
        let first = encode(&g, &opts).unwrap();
        let second = encode(&g, &opts).unwrap();
        assert_eq!(first.notation, second.notation);
    }
}
