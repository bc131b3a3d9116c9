//! Restartable iterators over `(node, edge-label)` walks (spec §9:
//! "the source uses many lazy walks over series (`Next(label)`
//! chains). Implementations should expose these as restartable
//! iterators."). Each of these is `Clone`, so a caller can checkpoint
//! a walk and resume it from that point without re-deriving state.

use super::edge::EdgeKind;
use super::{Graph, NodeIndex};

/// Walks `Partwise` edges starting at (and including) `start`.
#[derive(Clone)]
pub struct PartwiseWalk<'g> {
    graph: &'g Graph,
    current: Option<NodeIndex>,
}

impl<'g> Iterator for PartwiseWalk<'g> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let node = self.current?;
        self.current = self
            .graph
            .outgoing_of_kind(node, |k| matches!(k, EdgeKind::Partwise))
            .map(|e| e.to);
        Some(node)
    }
}

/// Walks a voice strand: a maximal chain of chords connected by
/// `Voice` or `Beam` edges, in partwise order (spec Glossary: "Voice
/// strand").
#[derive(Clone)]
pub struct StrandWalk<'g> {
    graph: &'g Graph,
    current: Option<NodeIndex>,
}

impl<'g> Iterator for StrandWalk<'g> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let node = self.current?;
        self.current = self
            .graph
            .outgoing_of_kind(node, |k| matches!(k, EdgeKind::Voice | EdgeKind::Beam))
            .map(|e| e.to);
        Some(node)
    }
}

impl Graph {
    pub fn partwise_from(&self, start: NodeIndex) -> PartwiseWalk<'_> {
        PartwiseWalk { graph: self, current: Some(start) }
    }

    pub fn strand_from(&self, start_chord: NodeIndex) -> StrandWalk<'_> {
        StrandWalk { graph: self, current: Some(start_chord) }
    }

    /// Tokens owned by an island, in insertion order.
    pub fn tokens_of(&self, island: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.outgoing_all_of_kind(island, |k| matches!(k, EdgeKind::Token)).map(|e| e.to)
    }

    /// Notes owned by a chord, in insertion order.
    pub fn notes_of(&self, chord: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.outgoing_all_of_kind(chord, |k| matches!(k, EdgeKind::Note)).map(|e| e.to)
    }

    /// Islands reachable from `island` by `Instantwise` edges
    /// (downward, i.e. the rest of this instant's column).
    pub fn instantwise_of(&self, island: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.outgoing_all_of_kind(island, |k| matches!(k, EdgeKind::Instantwise)).map(|e| e.to)
    }

    /// Whether `a` precedes `b` by following `Partwise` edges from
    /// `a` (used to check invariant 3: a `Voice`/`Beam` edge must
    /// point strictly forward in partwise order).
    pub fn partwise_precedes(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.partwise_from(a).skip(1).any(|n| n == b)
    }

    /// The island that owns a token, via its incoming `Token` edge.
    pub fn owning_island(&self, token: NodeIndex) -> Option<NodeIndex> {
        self.incoming_of_kind(token, |k| matches!(k, EdgeKind::Token)).map(|e| e.from)
    }

    /// The chord that owns a note, via its incoming `Note` edge.
    pub fn owning_chord(&self, note: NodeIndex) -> Option<NodeIndex> {
        self.incoming_of_kind(note, |k| matches!(k, EdgeKind::Note)).map(|e| e.from)
    }
}
