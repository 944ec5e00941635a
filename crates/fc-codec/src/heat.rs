//! Heat-integration split and merge.
//!
//! A multi-stream unit (typically a heat exchanger serving several process
//! streams) does not fit a single-in/single-out traversal. Before encoding,
//! each such unit `u` is replaced by shadow units `u/1`, `u/2`, ..., one per
//! stream slot, each carrying exactly that slot's inlet and outlet. After
//! decoding, shadows sharing a base id are folded back into one unit.
//!
//! Neither direction fails: a unit that cannot be split or merged is kept as
//! a plain multi-stream unit and reported as a `DegradedMerge`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use fc_core::{DegradedMerge, HeatRole, HeatSlot};
use fc_graph::{FlowsheetGraph, Stream, StreamIx, StreamRef, Unit, UnitIx};
use tracing::{debug, warn};

/// Result of `split_heat_integration`.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub graph: FlowsheetGraph,
    /// Base id to its shadow ids, in slot order.
    pub shadows: BTreeMap<String, Vec<String>>,
    pub warnings: Vec<DegradedMerge>,
}

/// Result of `merge_heat_integration`.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub graph: FlowsheetGraph,
    pub warnings: Vec<DegradedMerge>,
}

/// Unit type that is always treated as heat-integrated once it has several
/// inlets, tagged or not.
const EXCHANGER_KIND: &str = "hex";

fn is_material(stream: &StreamRef<'_>) -> bool {
    stream.stream.tags.signal.is_none()
}

/// Replace every heat-integrated unit with one shadow unit per stream slot.
pub fn split_heat_integration(graph: &FlowsheetGraph) -> SplitOutcome {
    let mut out = graph.clone();
    let mut shadows = BTreeMap::new();
    let mut warnings = Vec::new();

    let mut candidates: Vec<(String, UnitIx)> = graph
        .units()
        .filter(|(ix, _)| is_candidate(graph, *ix))
        .map(|(ix, u)| (u.id.to_string(), ix))
        .collect();
    candidates.sort();

    for (id, ix) in candidates {
        // Plan against the current state; earlier splits may have rewired
        // streams shared with this unit.
        let plan = match plan_split(&out, ix) {
            Ok(plan) => plan,
            Err(reason) => {
                let warning = DegradedMerge::split(&id, reason);
                warn!(%warning, "heat-integrated unit kept whole");
                warnings.push(warning);
                continue;
            }
        };
        match apply_split(&mut out, ix, &plan) {
            Ok(ids) => {
                debug!(unit = %id, streams = ids.len(), "split heat-integrated unit");
                shadows.insert(id, ids);
            }
            Err(reason) => {
                let warning = DegradedMerge::split(&id, reason);
                warn!(%warning, "heat-integrated unit kept whole");
                warnings.push(warning);
            }
        }
    }

    SplitOutcome {
        graph: out,
        shadows,
        warnings,
    }
}

/// Units with more than one material inlet and at least one heat-tagged
/// stream, plus every multi-inlet `hex`. Suffixed units (shadows, control
/// units) are never split. An untagged `hex` then fails to plan and is
/// reported instead of passing silently as a mixer.
fn is_candidate(graph: &FlowsheetGraph, ix: UnitIx) -> bool {
    let Some(unit) = graph.unit(ix) else {
        return false;
    };
    if unit.id.suffix().is_some() {
        return false;
    }
    let inlets: Vec<_> = graph.in_streams(ix).into_iter().filter(is_material).collect();
    if inlets.len() < 2 {
        return false;
    }
    if unit.id.kind() == EXCHANGER_KIND {
        return true;
    }
    inlets
        .iter()
        .chain(graph.out_streams(ix).iter().filter(|s| is_material(s)))
        .any(|s| s.stream.tags.heat.is_some())
}

#[derive(Debug, Default)]
struct SplitPlan {
    /// Slot to (inlet stream, outlet stream).
    slots: BTreeMap<HeatSlot, (StreamIx, StreamIx)>,
}

fn plan_split(graph: &FlowsheetGraph, ix: UnitIx) -> Result<SplitPlan, String> {
    let mut inlets: BTreeMap<HeatSlot, StreamIx> = BTreeMap::new();
    let mut outlets: BTreeMap<HeatSlot, StreamIx> = BTreeMap::new();
    let mut loops = Vec::new();

    for s in graph.in_streams(ix).into_iter().filter(is_material) {
        if s.from == ix {
            loops.push(s);
            continue;
        }
        let role = role_of(graph, &s)?;
        if !role.is_inlet() {
            return Err(format!(
                "stream from {} enters with outlet role {}",
                graph.id_of(s.from),
                role.label()
            ));
        }
        claim(&mut inlets, role.slot(), s.ix, "inlet")?;
    }
    for s in graph.out_streams(ix).into_iter().filter(is_material) {
        if s.to == ix {
            continue;
        }
        let role = role_of(graph, &s)?;
        if role.is_inlet() {
            return Err(format!(
                "stream to {} leaves with inlet role {}",
                graph.id_of(s.to),
                role.label()
            ));
        }
        claim(&mut outlets, role.slot(), s.ix, "outlet")?;
    }

    // A self-loop leaves one slot and enters another; its role names one end,
    // the other end takes the first slot still missing that side.
    for s in loops {
        let role = role_of(graph, &s)?;
        if role.is_inlet() {
            claim(&mut inlets, role.slot(), s.ix, "inlet")?;
            let free = first_missing(&inlets, &outlets, role.slot())
                .ok_or_else(|| "self-loop has no free outlet slot".to_string())?;
            outlets.insert(free, s.ix);
        } else {
            claim(&mut outlets, role.slot(), s.ix, "outlet")?;
            let free = first_missing(&outlets, &inlets, role.slot())
                .ok_or_else(|| "self-loop has no free inlet slot".to_string())?;
            inlets.insert(free, s.ix);
        }
    }

    let mut plan = SplitPlan::default();
    let all: BTreeSet<HeatSlot> = inlets.keys().chain(outlets.keys()).copied().collect();
    for slot in all {
        match (inlets.get(&slot), outlets.get(&slot)) {
            (Some(&i), Some(&o)) => {
                plan.slots.insert(slot, (i, o));
            }
            (Some(_), None) => return Err(format!("{} has no outlet", slot_name(slot))),
            (None, _) => return Err(format!("{} has no inlet", slot_name(slot))),
        }
    }
    Ok(plan)
}

fn role_of(graph: &FlowsheetGraph, s: &StreamRef<'_>) -> Result<HeatRole, String> {
    s.stream.tags.heat.ok_or_else(|| {
        format!(
            "stream {} -> {} has no heat-exchange role",
            graph.id_of(s.from),
            graph.id_of(s.to)
        )
    })
}

fn claim(
    side: &mut BTreeMap<HeatSlot, StreamIx>,
    slot: HeatSlot,
    stream: StreamIx,
    what: &str,
) -> Result<(), String> {
    if side.insert(slot, stream).is_some() {
        return Err(format!("{} has more than one {what}", slot_name(slot)));
    }
    Ok(())
}

/// First slot present in `have` but missing from `need`, other than `skip`.
fn first_missing(
    have: &BTreeMap<HeatSlot, StreamIx>,
    need: &BTreeMap<HeatSlot, StreamIx>,
    skip: HeatSlot,
) -> Option<HeatSlot> {
    have.keys()
        .copied()
        .find(|slot| *slot != skip && !need.contains_key(slot))
}

fn slot_name(slot: HeatSlot) -> String {
    match slot {
        HeatSlot::Numbered(k) => format!("slot {k}"),
        HeatSlot::Cold => "cold side".to_string(),
        HeatSlot::Hot => "hot side".to_string(),
    }
}

fn apply_split(
    graph: &mut FlowsheetGraph,
    ix: UnitIx,
    plan: &SplitPlan,
) -> Result<Vec<String>, String> {
    let unit = graph
        .unit(ix)
        .cloned()
        .ok_or_else(|| "unit vanished during split".to_string())?;

    let ids: Vec<String> = (1..=plan.slots.len())
        .map(|k| format!("{}/{}", unit.id, k))
        .collect();
    if let Some(taken) = ids.iter().find(|id| graph.find(id).is_some()) {
        return Err(format!("shadow id {taken} is already in use"));
    }

    let mut enters: HashMap<StreamIx, usize> = HashMap::new();
    let mut leaves: HashMap<StreamIx, usize> = HashMap::new();
    for (pos, (inlet, outlet)) in plan.slots.values().enumerate() {
        enters.insert(*inlet, pos);
        leaves.insert(*outlet, pos);
    }

    let mut shadow_ix = Vec::with_capacity(ids.len());
    for (pos, id) in ids.iter().enumerate() {
        let slot = pos as u32 + 1;
        let mut shadow = Unit::new(id.as_str());
        shadow.attrs = unit
            .stream_attrs
            .get(&slot)
            .cloned()
            .unwrap_or_else(|| unit.attrs.clone());
        let added = graph.add_unit(shadow).map_err(|e| e.to_string())?;
        shadow_ix.push(added);
    }

    // Material streams follow their slot; signals attach to the first shadow.
    for (stream, from, to) in incident(graph, ix) {
        let new_from = match leaves.get(&stream) {
            Some(&pos) => shadow_ix[pos],
            None if from == ix => shadow_ix[0],
            None => from,
        };
        let new_to = match enters.get(&stream) {
            Some(&pos) => shadow_ix[pos],
            None if to == ix => shadow_ix[0],
            None => to,
        };
        let weight = graph.stream(stream).cloned().unwrap_or_default();
        graph.add_stream(new_from, new_to, weight);
    }
    graph.remove_unit(ix);
    Ok(ids)
}

/// Streams touching `ix`, each once, by ascending handle.
fn incident(graph: &FlowsheetGraph, ix: UnitIx) -> Vec<(StreamIx, UnitIx, UnitIx)> {
    let mut all: Vec<(StreamIx, UnitIx, UnitIx)> = graph
        .in_streams(ix)
        .into_iter()
        .chain(graph.out_streams(ix))
        .map(|s| (s.ix, s.from, s.to))
        .collect();
    all.sort();
    all.dedup();
    all
}

/// Fold `base/k` shadow units back into `base`.
pub fn merge_heat_integration(graph: &FlowsheetGraph) -> MergeOutcome {
    let mut out = graph.clone();
    let mut warnings = Vec::new();

    let mut groups: BTreeMap<String, Vec<(u32, UnitIx)>> = BTreeMap::new();
    for (ix, unit) in graph.units() {
        if let Some(k) = unit.id.stream_slot() {
            groups
                .entry(unit.id.base().to_string())
                .or_default()
                .push((k, ix));
        }
    }

    for (base, mut members) in groups {
        members.sort();
        if out.find(&base).is_some() {
            let warning = DegradedMerge::merge(&base, "a unit with the base id already exists");
            warn!(%warning, "shadow units left unmerged");
            warnings.push(warning);
            continue;
        }

        let irregular = members.iter().find_map(|&(k, ix)| {
            let ins = out.in_streams(ix).into_iter().filter(is_material).count();
            let outs = out.out_streams(ix).into_iter().filter(is_material).count();
            (ins != 1 || outs != 1).then(|| {
                format!("shadow {base}/{k} has {ins} material inlets and {outs} outlets")
            })
        });
        if let Some(reason) = &irregular {
            // Merged anyway, but slot roles cannot be trusted.
            let warning = DegradedMerge::merge(&base, reason.clone());
            warn!(%warning, "merged without deriving slot roles");
            warnings.push(warning);
        }

        match fold_group(&mut out, &base, &members, irregular.is_none()) {
            Ok(streams) => debug!(unit = %base, shadows = members.len(), streams, "merged heat-integrated unit"),
            Err(reason) => {
                let warning = DegradedMerge::merge(&base, reason);
                warn!(%warning, "shadow units left unmerged");
                warnings.push(warning);
            }
        }
    }

    MergeOutcome {
        graph: out,
        warnings,
    }
}

fn fold_group(
    graph: &mut FlowsheetGraph,
    base: &str,
    members: &[(u32, UnitIx)],
    derive_roles: bool,
) -> Result<usize, String> {
    let slot_of: HashMap<UnitIx, u32> = members.iter().map(|&(k, ix)| (ix, k)).collect();

    let shadow_attrs: Vec<(u32, _)> = members
        .iter()
        .filter_map(|&(k, ix)| graph.unit(ix).map(|u| (k, u.attrs.clone())))
        .collect();
    let mut unit = Unit::new(base);
    if let Some((_, first)) = shadow_attrs.first() {
        unit.attrs = first.clone();
        if shadow_attrs.iter().any(|(_, attrs)| attrs != first) {
            unit.stream_attrs = shadow_attrs.into_iter().collect();
        }
    }
    let merged = graph.add_unit(unit).map_err(|e| e.to_string())?;

    let mut streams: Vec<(StreamIx, UnitIx, UnitIx)> = members
        .iter()
        .flat_map(|&(_, ix)| incident(graph, ix))
        .collect();
    streams.sort();
    streams.dedup();

    for &(stream, from, to) in &streams {
        let mut weight: Stream = graph.stream(stream).cloned().unwrap_or_default();
        if derive_roles && weight.tags.heat.is_none() && weight.tags.signal.is_none() {
            weight.tags.heat = match (slot_of.get(&from), slot_of.get(&to)) {
                (Some(&j), _) => Some(HeatRole::SlotOut(j)),
                (None, Some(&k)) => Some(HeatRole::SlotIn(k)),
                (None, None) => None,
            };
        }
        let new_from = if slot_of.contains_key(&from) { merged } else { from };
        let new_to = if slot_of.contains_key(&to) { merged } else { to };
        graph.add_stream(new_from, new_to, weight);
    }
    for &(_, ix) in members {
        graph.remove_unit(ix);
    }
    Ok(streams.len())
}
