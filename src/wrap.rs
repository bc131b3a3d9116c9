//! Barline repetition across wrap and the system-wrap optimizer (spec
//! §4.14, §4.15), grounded on `belle-wrap.h`.
//!
//! This runs *before* the final typeset pass: it needs each measure's
//! width, which it gets by running the same leading-edge algorithm
//! [`crate::typeset`] uses, once, over the whole piece treated as a
//! single system (spec §4.13's procedure, reused here rather than
//! duplicated).

use log::debug;

use crate::engrave::tie::PartialTies;
use crate::geometry::Geometry;
use crate::graph::{EdgeKind, Graph, TokenKind};
use crate::state::EngraveState;
use crate::style::HouseStyle;
use crate::typeset::leading_edge_pass;

/// The chosen line breaks: one entry per system, each the ordered list
/// of instant indices it contains, plus any ties severed by a break.
#[derive(Debug, Clone, Default)]
pub struct SystemPlan {
    pub systems: Vec<Vec<usize>>,
    pub partial_ties: PartialTies,
}

/// Plans systems for the whole piece (spec §4.15) and records partial
/// ties at whatever breaks result (spec §4.14).
pub fn plan_systems(graph: &Graph, geom: &Geometry, state: &EngraveState, style: &HouseStyle) -> SystemPlan {
    let instant_count = geom.instant_count();
    if instant_count == 0 {
        return SystemPlan::default();
    }

    let all_instants: Vec<usize> = (0..instant_count).collect();
    let pass = leading_edge_pass(graph, geom, state, &all_instants);

    let measure_bounds = measure_boundaries(graph, geom, instant_count);
    let widths: Vec<f64> = measure_bounds
        .windows(2)
        .map(|w| {
            let (start, end) = (w[0], w[1]);
            let right_at = |instant: usize| pass.furthest_right_after.get(instant).copied().unwrap_or(0.0);
            let prior = if start == 0 { 0.0 } else { right_at(start - 1) };
            right_at(end - 1) - prior
        })
        .collect();

    let w0 = style.number("FirstLineWidth").max(1.0);
    let w = style.number("LineWidth").max(1.0);
    let exponent = style.number("WrapCostExponent").max(1.0);

    let breakpoints = shortest_breakpoints(&widths, w0, w, exponent);
    debug!("wrap: {} measures, breakpoints {:?}", widths.len(), breakpoints);

    let mut systems: Vec<Vec<usize>> = Vec::new();
    for pair in breakpoints.windows(2) {
        let (from_measure, to_measure) = (pair[0], pair[1]);
        let start_instant = measure_bounds[from_measure];
        let end_instant = measure_bounds[to_measure];
        systems.push((start_instant..end_instant).collect());
    }
    if systems.is_empty() {
        systems.push(all_instants);
    }

    let partial_ties = sever_ties(graph, geom, state, &systems);

    SystemPlan { systems, partial_ties }
}

/// Instant indices at which a measure begins, including `0` and
/// `instant_count` as the outer bounds (so `measure_boundaries[k]
/// ..measure_boundaries[k+1]` is measure `k`'s instant range). A
/// measure ends at (and includes) the instant whose part-0 island
/// carries a `Barline` token.
fn measure_boundaries(graph: &Graph, geom: &Geometry, instant_count: usize) -> Vec<usize> {
    let mut bounds = vec![0usize];
    for instant in 0..instant_count {
        if let Some(island) = geom.island_at(instant, 0) {
            let has_barline = graph.tokens_of(island).any(|t| graph.node(t).token_kind() == Some(TokenKind::Barline));
            if has_barline && instant + 1 < instant_count {
                bounds.push(instant + 1);
            }
        }
    }
    if *bounds.last().unwrap() != instant_count {
        bounds.push(instant_count);
    }
    bounds
}

/// Shortest-path line-break search (spec §4.15): a DAG over breakpoints
/// `0..=n`, edge `(i, j)` present when `sum(w[i..j]) <= limit(i)`, cost
/// `(limit(i) - sum(w[i..j]))^p`. Returns the chosen breakpoint
/// sequence, e.g. `[0, 3, 5]` for two lines of 3 and 2 measures.
fn shortest_breakpoints(widths: &[f64], w0: f64, w: f64, exponent: f64) -> Vec<usize> {
    let n = widths.len();
    if n == 0 {
        return vec![0, 0];
    }
    let mut dist = vec![f64::INFINITY; n + 1];
    let mut prev = vec![usize::MAX; n + 1];
    dist[0] = 0.0;

    for i in 0..=n {
        if !dist[i].is_finite() {
            continue;
        }
        let limit = if i == 0 { w0 } else { w };
        let mut sum = 0.0;
        for j in (i + 1)..=n {
            sum += widths[j - 1];
            if sum > limit {
                break;
            }
            let remaining = limit - sum;
            let cost = remaining.powf(exponent);
            if dist[i] + cost < dist[j] {
                dist[j] = dist[i] + cost;
                prev[j] = i;
            }
        }
    }

    if !dist[n].is_finite() {
        // No feasible partition (a single measure wider than the line):
        // fall back to one measure per line rather than panicking.
        return (0..=n).collect();
    }

    let mut path = vec![n];
    let mut cur = n;
    while cur != 0 {
        path.push(prev[cur]);
        cur = prev[cur];
    }
    path.reverse();
    path
}

/// Marks ties whose two notes land in different systems with partial-
/// tie bookkeeping (spec §4.14).
fn sever_ties(graph: &Graph, geom: &Geometry, state: &EngraveState, systems: &[Vec<usize>]) -> PartialTies {
    let mut ties = PartialTies::default();
    let system_of = |instant: usize| systems.iter().position(|s| s.contains(&instant));

    for n in graph.node_indices() {
        for edge in graph.outgoing_all_of_kind(n, |k| matches!(k, EdgeKind::Tie)) {
            let (Some(from_chord), Some(to_chord)) = (graph.owning_chord(n), graph.owning_chord(edge.to)) else { continue };
            let (Some(from_island), Some(to_island)) = (graph.owning_island(from_chord), graph.owning_island(to_chord)) else { continue };
            let (Some((_, from_instant)), Some((_, to_instant))) = (geom.coords_of(from_island), geom.coords_of(to_island)) else { continue };
            if system_of(from_instant) != system_of(to_instant) {
                let direction = state.tie_directions.get(&n).copied().unwrap_or(crate::concepts::Placement::Above);
                ties.outgoing.insert(n, direction);
                ties.incoming.insert(edge.to, direction);
            }
        }
    }
    ties
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_six_partition_by_cost() {
        let widths = vec![3.0, 3.0, 3.0, 3.0, 3.0];
        let path = shortest_breakpoints(&widths, 10.0, 7.0, 2.0);
        assert_eq!(path, vec![0, 3, 5]);
    }

    #[test]
    fn single_oversized_measure_falls_back_to_one_per_line() {
        let widths = vec![100.0];
        let path = shortest_breakpoints(&widths, 10.0, 7.0, 2.0);
        assert_eq!(path, vec![0, 1]);
    }
}
