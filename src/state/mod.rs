//! Ephemeral per-engrave state (spec §3.3, §4.2): three ordered
//! accumulation passes over the immutable structural graph, always
//! IslandState -> PartState -> InstantState (spec §4.2, §5).
//!
//! None of this lives inside `Node`/`Edge` labels (see the doc comment
//! on [`crate::graph::node::Node`]) — it's kept in maps here, keyed by
//! `NodeIndex`, so recomputing it from scratch can never disturb the
//! structural graph (spec §3.3: "All ephemeral state is derived;
//! discarding and recomputing from structural edges must yield
//! identical output").

pub mod accidentals;
pub mod instant_state;
pub mod island_state;
pub mod part_state;
pub mod voicing;

use std::collections::HashMap;

use crate::concepts::Placement;
use crate::geometry::Geometry;
use crate::graph::{Graph, NodeIndex};
use crate::style::HouseStyle;

pub use instant_state::InstantState;
pub use island_state::IslandState;
pub use part_state::{ChordInfo, PartState};

/// All accumulated ephemeral state for one engrave pass.
#[derive(Debug, Clone, Default)]
pub struct EngraveState {
    pub islands: HashMap<NodeIndex, IslandState>,
    pub parts: HashMap<NodeIndex, PartState>,
    pub chords: HashMap<NodeIndex, ChordInfo>,
    pub note_emits_accidental: HashMap<NodeIndex, bool>,
    pub tie_directions: HashMap<NodeIndex, Placement>,
    pub instants: Vec<InstantState>,
    /// Stem geometry recorded during per-island engraving (local,
    /// island-relative coordinates), read back by the beam engraver
    /// once islands have their final typeset x (spec §4.5, §4.6).
    pub stems: HashMap<NodeIndex, crate::engrave::stem_flag::StemGeometry>,
}

impl EngraveState {
    pub fn new() -> Self {
        EngraveState::default()
    }

    pub fn island(&self, idx: NodeIndex) -> Option<&IslandState> {
        self.islands.get(&idx)
    }

    pub fn island_mut(&mut self, idx: NodeIndex) -> Option<&mut IslandState> {
        self.islands.get_mut(&idx)
    }

    pub fn part_at(&self, island: NodeIndex) -> Option<&PartState> {
        self.parts.get(&island)
    }

    pub fn chord(&self, chord: NodeIndex) -> Option<&ChordInfo> {
        self.chords.get(&chord)
    }

    pub fn emits_accidental(&self, note: NodeIndex) -> bool {
        self.note_emits_accidental.get(&note).copied().unwrap_or(false)
    }
}

/// Runs all three passes, in order (spec §4.2, §5: "must complete in
/// that order before any engraving").
pub fn accumulate(graph: &Graph, geom: &Geometry, style: &HouseStyle) -> EngraveState {
    let mut st = EngraveState::new();
    island_state::accumulate(graph, geom, &mut st);
    part_state::accumulate(graph, geom, style, &mut st);
    instant_state::accumulate(graph, geom, &mut st);
    st
}
