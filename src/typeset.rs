//! Horizontal typesetter (spec §4.13), grounded on `System.h`'s
//! leading-edge collision resolution.
//!
//! [`leading_edge_pass`] is the reusable core: given an ordered run of
//! instants, it returns the x each instant must be placed at so that
//! no part's stamp overlaps the part's own prior content. [`wrap`]
//! calls it once over the whole piece to measure the widths the
//! system-wrap optimizer needs; [`typeset_systems`] calls it again,
//! once per chosen system, to actually place islands and shift their
//! stamps into absolute coordinates.

use crate::geometry::Geometry;
use crate::graph::{Graph, NodeIndex};
use crate::stamp::{Bounds, StampSet};
use crate::state::EngraveState;
use crate::style::HouseStyle;
use crate::wrap::SystemPlan;

/// Result of running the leading-edge algorithm over one ordered run
/// of instants: per-instant origin x, and the cumulative furthest
/// right edge reached after each instant (the running system width).
#[derive(Debug, Clone)]
pub struct LeadingEdgePass {
    pub origins: Vec<f64>,
    pub furthest_right_after: Vec<f64>,
}

/// Spec §4.13, steps 1-4, run over `instants` as a single system with
/// leading edges starting at zero.
pub fn leading_edge_pass(graph: &Graph, geom: &Geometry, state: &EngraveState, instants: &[usize]) -> LeadingEdgePass {
    let _ = graph;
    let part_count = geom.part_count();
    let mut leading_edge = vec![0.0f64; part_count];
    let mut origins = Vec::with_capacity(instants.len());
    let mut furthest_right_after = Vec::with_capacity(instants.len());
    let mut furthest_right = 0.0f64;

    for &instant in instants {
        let cells: Vec<(usize, NodeIndex, Bounds)> = geom
            .parts()
            .filter_map(|part| {
                let island = geom.island_at(instant, part)?;
                let bounds = state.island(island).map(|s| s.token_bounds).unwrap_or(Bounds::EMPTY);
                Some((part, island, bounds))
            })
            .collect();

        let instant_origin = cells.iter().fold(0.0f64, |acc, &(part, _, bounds)| acc.max(leading_edge[part] - bounds.left));

        for &(part, _, bounds) in &cells {
            leading_edge[part] = instant_origin + bounds.right;
        }
        furthest_right = leading_edge.iter().copied().fold(furthest_right, f64::max);

        origins.push(instant_origin);
        furthest_right_after.push(furthest_right);
    }

    LeadingEdgePass { origins, furthest_right_after }
}

/// Runs [`leading_edge_pass`] once per chosen system and commits the
/// result: each island's [`crate::state::IslandState::typeset_x`] /
/// `typeset_y` are set, and its already-built local [`crate::stamp::Stamp`]
/// is shifted into absolute coordinates. Systems stack vertically by
/// `StaffDistance` per part plus a blank system gap, and partial ties
/// severed by a wrap (spec §4.14) are drawn trailing off each system's
/// edge.
pub fn typeset_systems(graph: &Graph, geom: &Geometry, systems: &SystemPlan, state: &mut EngraveState, stamps: &mut StampSet, style: &HouseStyle) {
    let staff_distance = style.number("StaffDistance").max(1.0);
    let part_count = geom.part_count().max(1);
    let system_gap = staff_distance * 2.0;

    let mut system_top = 0.0f64;
    for instants in &systems.systems {
        let pass = leading_edge_pass(graph, geom, state, instants);

        for (i, &instant) in instants.iter().enumerate() {
            let origin = pass.origins[i];
            for part in geom.parts() {
                let Some(island) = geom.island_at(instant, part) else { continue };
                let y = system_top - part as f64 * staff_distance;
                if let Some(island_state) = state.island_mut(island) {
                    island_state.typeset_x = origin;
                    island_state.typeset_y = y;
                }
                if let Some(stamp) = stamps.get_mut(&island) {
                    stamp.shift(origin, y);
                }
            }
        }

        draw_partial_ties(graph, geom, instants, state, stamps, &systems.partial_ties, style);

        system_top -= (part_count - 1) as f64 * staff_distance + system_gap;
    }
}

fn draw_partial_ties(
    graph: &Graph,
    geom: &Geometry,
    instants: &[usize],
    state: &EngraveState,
    stamps: &mut StampSet,
    partial_ties: &crate::engrave::tie::PartialTies,
    style: &HouseStyle,
) {
    use crate::engrave::tie::engrave_partial;

    let Some(&first) = instants.first() else { return };
    let Some(&last) = instants.last() else { return };

    for part in geom.parts() {
        if let Some(island) = geom.island_at(last, part) {
            for chord in graph.tokens_of(island) {
                for note in graph.notes_of(chord) {
                    if let Some(&direction) = partial_ties.outgoing.get(&note) {
                        if let Some(geom_stem) = state.stems.get(&chord) {
                            let x = state.island(island).map(|s| s.typeset_x + geom_stem.x).unwrap_or(geom_stem.x);
                            let y = state.island(island).map(|s| s.typeset_y + geom_stem.notehead_y).unwrap_or(geom_stem.notehead_y);
                            let graphic = engrave_partial(note, x, y, direction, true, style);
                            if let Some(s) = stamps.get_mut(&island) {
                                s.push(graphic);
                            }
                        }
                    }
                }
            }
        }
        if let Some(island) = geom.island_at(first, part) {
            for chord in graph.tokens_of(island) {
                for note in graph.notes_of(chord) {
                    if let Some(&direction) = partial_ties.incoming.get(&note) {
                        if let Some(geom_stem) = state.stems.get(&chord) {
                            let x = state.island(island).map(|s| s.typeset_x + geom_stem.x).unwrap_or(geom_stem.x);
                            let y = state.island(island).map(|s| s.typeset_y + geom_stem.notehead_y).unwrap_or(geom_stem.notehead_y);
                            let graphic = engrave_partial(note, x, y, direction, false, style);
                            if let Some(s) = stamps.get_mut(&island) {
                                s.push(graphic);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use num_rational::Rational32;

    use super::*;
    use crate::concepts::{Accidental, Letter, Pitch};
    use crate::graph::Graph;
    use crate::state::island_state::IslandState;

    fn pitched_island(g: &mut Graph, width: f64) -> NodeIndex {
        let island = g.add_island();
        let chord = g.add_chord(Rational32::new(1, 4));
        g.add_note(chord, Pitch::new(Letter::C, Accidental::Natural, 4));
        g.place_token(island, chord);
        let _ = width;
        island
    }

    #[test]
    fn two_non_overlapping_instants_place_back_to_back() {
        let mut g = Graph::new();
        let a = pitched_island(&mut g, 2.0);
        let b = pitched_island(&mut g, 2.0);
        g.link_partwise(a, b);
        g.set_root(a);
        let geom = crate::geometry::parse(&g).unwrap();

        let mut state = EngraveState::default();
        state.islands.insert(a, IslandState { token_bounds: Bounds::new(0.0, -1.0, 2.0, 1.0), ..IslandState::default() });
        state.islands.insert(b, IslandState { token_bounds: Bounds::new(0.0, -1.0, 2.0, 1.0), ..IslandState::default() });

        let pass = leading_edge_pass(&g, &geom, &state, &[0, 1]);
        assert_eq!(pass.origins[0], 0.0);
        assert_eq!(pass.origins[1], 2.0);
        assert_eq!(pass.furthest_right_after[1], 4.0);
    }

    #[test]
    fn wide_left_bound_pushes_next_instant_right() {
        let mut g = Graph::new();
        let a = pitched_island(&mut g, 2.0);
        let b = pitched_island(&mut g, 2.0);
        g.link_partwise(a, b);
        g.set_root(a);
        let geom = crate::geometry::parse(&g).unwrap();

        let mut state = EngraveState::default();
        state.islands.insert(a, IslandState { token_bounds: Bounds::new(-0.5, -1.0, 3.0, 1.0), ..IslandState::default() });
        state.islands.insert(b, IslandState { token_bounds: Bounds::new(-1.0, -1.0, 1.0, 1.0), ..IslandState::default() });

        let pass = leading_edge_pass(&g, &geom, &state, &[0, 1]);
        // leading_edge after a = 0 + 3.0 = 3.0; origin for b = 3.0 - (-1.0) = 4.0
        assert_eq!(pass.origins[1], 4.0);
    }
}
