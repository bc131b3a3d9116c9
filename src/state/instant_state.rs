//! Pass 3 of state accumulation (spec §4.2): cross-staff rollups.
//! Currently just the completeness flag and the tie-direction advice
//! table (spec §3.3 `InstantState`, §4.10).

use std::collections::HashMap;

use crate::concepts::{Placement, StemDirectionConcept};
use crate::geometry::Geometry;
use crate::graph::{EdgeKind, Graph, NodeIndex};

use super::EngraveState;

/// Per-instant cross-staff summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantState {
    pub is_complete: bool,
}

/// Ties curve away from the stem: a note with an up stem advises
/// `Below`, a down stem advises `Above` (spec §4.10: "Direction chosen
/// per note from the island state table"). This is the one place the
/// accumulation passes need a chord's stem direction before engraving
/// proper runs, so it reads `st.chords` (already filled by pass 2).
pub fn accumulate(graph: &Graph, geom: &Geometry, st: &mut EngraveState) {
    let mut tie_directions: HashMap<NodeIndex, Placement> = HashMap::new();

    for (&chord, info) in st.chords.clone().iter() {
        for note in graph.notes_of(chord) {
            if graph.outgoing_of_kind(note, |k| matches!(k, EdgeKind::Tie)).is_some() {
                let advice = if info.stem_direction == StemDirectionConcept::Up { Placement::Below } else { Placement::Above };
                tie_directions.insert(note, advice);
            }
        }
    }

    st.tie_directions = tie_directions;
    st.instants = (0..geom.instant_count()).map(|i| InstantState { is_complete: geom.is_complete(i) }).collect();
}
