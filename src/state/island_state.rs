//! Pass 1 of state accumulation (spec §4.2): per-island measurements
//! that don't depend on partwise history.

use crate::geometry::Geometry;
use crate::graph::Graph;
use crate::stamp::Bounds;

use super::EngraveState;

/// Local-to-island measurements (spec §3.3 `IslandState`). `TokenBounds`
/// and `TypesetX` start empty/zero; the notehead engraver and
/// typesetter fill them in during later passes. `TypesetY` is this
/// core's own addition, needed once systems stack staves vertically —
/// the typesetter is the only writer.
#[derive(Debug, Clone)]
pub struct IslandState {
    pub token_bounds: Bounds,
    pub staff_lines: u8,
    pub staff_offset: f64,
    pub staff_scale: f64,
    pub typeset_x: f64,
    pub typeset_y: f64,
}

impl Default for IslandState {
    fn default() -> Self {
        IslandState { token_bounds: Bounds::EMPTY, staff_lines: 5, staff_offset: 0.0, staff_scale: 1.0, typeset_x: 0.0, typeset_y: 0.0 }
    }
}

pub fn accumulate(_graph: &Graph, geom: &Geometry, st: &mut EngraveState) {
    for instant in geom.instants() {
        for part in geom.parts() {
            if let Some(island) = geom.island_at(instant, part) {
                st.islands.entry(island).or_insert_with(IslandState::default);
            }
        }
    }
}
