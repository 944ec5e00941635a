//! Canonical unit ranking.
//!
//! Ranks only steer traversal order. Within each weakly connected component
//! an extended-connectivity refinement (Morgan) separates units by their
//! neighbourhood; units it cannot separate are ordered by role class,
//! reachable-subtree size and a layered type signature. The resulting cells
//! are refined further by the cells of each unit's neighbours and the tags on
//! the connecting streams. Units still tied after that are individualized one
//! at a time, which yields one candidate order per choice; the encoder picks
//! among them by rendered form. Components are ranked largest first with a
//! running offset, so ranks are unique across the whole graph.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use fc_graph::{FlowsheetGraph, Structure, UnitIx};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

/// Refinement stops after this many rounds without a new distinct value.
const STALE_ROUNDS: usize = 5;
/// Hard cap on refinement rounds.
const MAX_ROUNDS: usize = 100;
/// Candidate orders explored per component when the encoder asks for all.
pub(crate) const MAX_CANDIDATES: usize = 256;

/// Dense rank (1-based) per unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranks {
    by_unit: HashMap<UnitIx, usize>,
}

impl Ranks {
    /// Concatenate per-component orders into one ranking.
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a [UnitIx]>) -> Ranks {
        let by_unit = orders
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(pos, &ix)| (ix, pos + 1))
            .collect();
        Ranks { by_unit }
    }

    /// Rank of `ix`; unranked units sort last.
    pub fn get(&self, ix: UnitIx) -> usize {
        self.by_unit.get(&ix).copied().unwrap_or(usize::MAX)
    }

    pub fn contains(&self, ix: UnitIx) -> bool {
        self.by_unit.contains_key(&ix)
    }

    pub fn len(&self) -> usize {
        self.by_unit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_unit.is_empty()
    }

    /// Units in ascending rank.
    pub fn ordered(&self) -> Vec<UnitIx> {
        let mut units: Vec<UnitIx> = self.by_unit.keys().copied().collect();
        units.sort_by_key(|&ix| self.get(ix));
        units
    }

    /// The same units with ranks permuted by a seeded generator.
    pub fn shuffled(&self, seed: u64) -> Ranks {
        let mut order = self.ordered();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
        Ranks::from_orders([order.as_slice()])
    }
}

/// One weakly connected component with its candidate unit orders.
#[derive(Debug, Clone)]
pub(crate) struct Component {
    /// Type-level stream signature; numbering independent.
    pub signature: String,
    /// Never empty. The first candidate follows instance numbers wherever a
    /// choice had to be made.
    pub candidates: Vec<Vec<UnitIx>>,
}

impl Component {
    pub fn size(&self) -> usize {
        self.candidates.first().map_or(0, Vec::len)
    }
}

/// Rank the units of `graph` as the encoder sees it (non-adjacent signals
/// withheld).
pub fn rank(graph: &FlowsheetGraph) -> Ranks {
    rank_structure(Structure::walkable(graph))
}

/// Ranks from the first candidate of every component.
pub fn rank_structure(view: Structure<'_>) -> Ranks {
    let components = components(view, 1);
    let ranks = Ranks::from_orders(
        components
            .iter()
            .filter_map(|c| c.candidates.first().map(Vec::as_slice)),
    );
    debug!(
        components = components.len(),
        units = ranks.len(),
        "ranked flowsheet"
    );
    ranks
}

/// Components largest first, then by signature and smallest id, each with
/// up to `limit` candidate orders.
pub(crate) fn components(view: Structure<'_>, limit: usize) -> Vec<Component> {
    let graph = view.graph();
    let mut keyed: Vec<(Vec<UnitIx>, String, String)> = view
        .weak_components()
        .into_iter()
        .map(|members| {
            let signature = view.kind_signature(&members);
            let smallest = members
                .iter()
                .map(|&ix| graph.id_of(ix).to_string())
                .min()
                .unwrap_or_default();
            (members, signature, smallest)
        })
        .collect();
    keyed.sort_by(|a, b| {
        (Reverse(a.0.len()), &a.1, &a.2).cmp(&(Reverse(b.0.len()), &b.1, &b.2))
    });

    keyed
        .into_iter()
        .map(|(members, signature, _)| {
            let cells = Cells::new(view, &members);
            let mut candidates = Vec::new();
            cells.search(cells.initial(view, &members), limit.max(1), &mut candidates);
            trace!(
                size = members.len(),
                candidates = candidates.len(),
                "ordered component"
            );
            Component {
                signature,
                candidates,
            }
        })
        .collect()
}

/// Neighbour cells seen from one unit: outgoing then incoming, each as sorted
/// `(cell, tag key)` pairs.
type Profile = (Vec<(usize, String)>, Vec<(usize, String)>);

/// Ordered partition refinement over one component.
struct Cells {
    outs: HashMap<UnitIx, Vec<(UnitIx, String)>>,
    ins: HashMap<UnitIx, Vec<(UnitIx, String)>>,
}

impl Cells {
    fn new(view: Structure<'_>, members: &[UnitIx]) -> Self {
        let mut outs = HashMap::with_capacity(members.len());
        let mut ins = HashMap::with_capacity(members.len());
        for &ix in members {
            let out = view
                .out_streams(ix)
                .into_iter()
                .map(|s| (s.to, s.stream.tags.sort_key()))
                .collect();
            let inn = view
                .in_streams(ix)
                .into_iter()
                .map(|s| (s.from, s.stream.tags.sort_key()))
                .collect();
            outs.insert(ix, out);
            ins.insert(ix, inn);
        }
        Self { outs, ins }
    }

    /// Cells by Morgan value, then by invariant tie key. Members of one cell
    /// keep instance order, which only decides which choice is explored first.
    fn initial(&self, view: Structure<'_>, members: &[UnitIx]) -> Vec<Vec<UnitIx>> {
        let values = refine(view, members);
        let mut groups: BTreeMap<u128, Vec<UnitIx>> = BTreeMap::new();
        for (&ix, &value) in members.iter().zip(&values) {
            groups.entry(value).or_default().push(ix);
        }

        let mut cells = Vec::with_capacity(members.len());
        for (value, tied) in groups {
            if tied.len() == 1 {
                cells.push(tied);
                continue;
            }
            let mut keyed: Vec<(TieKey, Explore, UnitIx)> = tied
                .iter()
                .map(|&ix| (TieKey::new(view, ix), Explore::new(view, ix), ix))
                .collect();
            keyed.sort();
            trace!(
                value = %value,
                order = ?keyed.iter().map(|(_, e, _)| e.id.as_str()).collect::<Vec<_>>(),
                "broke rank tie"
            );
            for run in keyed.chunk_by(|a, b| a.0 == b.0) {
                cells.push(run.iter().map(|(_, _, ix)| *ix).collect());
            }
        }
        cells
    }

    /// Split cells by neighbour profile until nothing changes.
    fn refine(&self, mut cells: Vec<Vec<UnitIx>>) -> Vec<Vec<UnitIx>> {
        loop {
            let cell_of: HashMap<UnitIx, usize> = cells
                .iter()
                .enumerate()
                .flat_map(|(c, cell)| cell.iter().map(move |&ix| (ix, c)))
                .collect();
            let mut next = Vec::with_capacity(cells.len());
            for cell in &cells {
                if cell.len() == 1 {
                    next.push(cell.clone());
                    continue;
                }
                let mut keyed: Vec<(Profile, UnitIx)> = cell
                    .iter()
                    .map(|&ix| (self.profile(ix, &cell_of), ix))
                    .collect();
                keyed.sort_by(|a, b| a.0.cmp(&b.0));
                for run in keyed.chunk_by(|a, b| a.0 == b.0) {
                    next.push(run.iter().map(|(_, ix)| *ix).collect());
                }
            }
            if next.len() == cells.len() {
                return next;
            }
            cells = next;
        }
    }

    fn profile(&self, ix: UnitIx, cell_of: &HashMap<UnitIx, usize>) -> Profile {
        let side = |links: Option<&Vec<(UnitIx, String)>>| {
            let mut seen: Vec<(usize, String)> = links
                .into_iter()
                .flatten()
                .map(|(n, tags)| (cell_of.get(n).copied().unwrap_or(usize::MAX), tags.clone()))
                .collect();
            seen.sort();
            seen
        };
        (side(self.outs.get(&ix)), side(self.ins.get(&ix)))
    }

    /// Refine, then individualize each member of the first tied cell in turn.
    /// Every fully separated partition is one candidate order.
    fn search(&self, cells: Vec<Vec<UnitIx>>, limit: usize, out: &mut Vec<Vec<UnitIx>>) {
        if out.len() >= limit {
            return;
        }
        let cells = self.refine(cells);
        let Some(target) = cells.iter().position(|c| c.len() > 1) else {
            out.push(cells.into_iter().flatten().collect());
            return;
        };
        for &pick in &cells[target] {
            let mut branch = Vec::with_capacity(cells.len() + 1);
            branch.extend_from_slice(&cells[..target]);
            branch.push(vec![pick]);
            branch.push(cells[target].iter().copied().filter(|&ix| ix != pick).collect());
            branch.extend_from_slice(&cells[target + 1..]);
            self.search(branch, limit, out);
            if out.len() >= limit {
                break;
            }
        }
    }
}

/// Extended-connectivity values, one per member.
///
/// Starts from the undirected degree and repeatedly sums neighbour values,
/// keeping the vector with the most distinct values seen. Stops when that
/// count has not grown for `STALE_ROUNDS` rounds, after `MAX_ROUNDS`, or when
/// the next round would overflow.
fn refine(view: Structure<'_>, members: &[UnitIx]) -> Vec<u128> {
    let index: HashMap<UnitIx, usize> = members
        .iter()
        .enumerate()
        .map(|(i, &ix)| (ix, i))
        .collect();
    let adjacency: Vec<Vec<usize>> = members
        .iter()
        .map(|&ix| {
            view.adjacency(ix)
                .into_iter()
                .filter_map(|n| index.get(&n).copied())
                .collect()
        })
        .collect();

    let mut current: Vec<u128> = adjacency.iter().map(|n| n.len() as u128).collect();
    let mut best = current.clone();
    let mut best_distinct = distinct(&best);
    let mut stale = 0;

    for _ in 0..MAX_ROUNDS {
        let Some(next) = step(&adjacency, &current) else {
            break;
        };
        let count = distinct(&next);
        if count > best_distinct {
            best_distinct = count;
            best = next.clone();
            stale = 0;
        } else {
            stale += 1;
            if stale >= STALE_ROUNDS {
                break;
            }
        }
        current = next;
    }
    best
}

fn step(adjacency: &[Vec<usize>], values: &[u128]) -> Option<Vec<u128>> {
    adjacency
        .iter()
        .map(|neighbours| {
            neighbours
                .iter()
                .try_fold(0u128, |acc, &j| acc.checked_add(values[j]))
        })
        .collect()
}

fn distinct(values: &[u128]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Role class for tie-breaking; earlier variants rank first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    /// No outgoing streams.
    Output,
    /// No incoming streams.
    Input,
    Other,
    /// Control units.
    Signal,
}

/// Numbering-independent tie key.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct TieKey {
    class: Class,
    /// Negated subtree size for inputs and outputs so long chains come first;
    /// plain size otherwise so short side branches come first.
    size: i64,
    signature: String,
}

impl TieKey {
    fn new(view: Structure<'_>, ix: UnitIx) -> Self {
        let unit = view.graph().unit(ix);
        let class = if unit.is_some_and(|u| u.id.is_control()) {
            Class::Signal
        } else if view.out_degree(ix) == 0 {
            Class::Output
        } else if view.in_degree(ix) == 0 {
            Class::Input
        } else {
            Class::Other
        };
        let reach = view.reachable(ix).len() as i64;
        let size = match class {
            Class::Input | Class::Output => -reach,
            Class::Other | Class::Signal => reach,
        };
        TieKey {
            class,
            size,
            signature: view.subtree_signature(ix),
        }
    }
}

/// Exploration order inside a tied cell.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Explore {
    instance: u32,
    slot: u32,
    id: String,
}

impl Explore {
    fn new(view: Structure<'_>, ix: UnitIx) -> Self {
        let graph = view.graph();
        let unit = graph.unit(ix);
        Explore {
            instance: unit.and_then(|u| u.id.instance()).unwrap_or(0),
            slot: unit.and_then(|u| u.id.stream_slot()).unwrap_or(0),
            id: graph.id_of(ix).to_string(),
        }
    }
}
