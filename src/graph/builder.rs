//! Construction helpers. These are the ordinary way to build a graph;
//! importers (graph-XML, shorthand, MusicXML) all funnel through them
//! so the structural invariants in [`super::validate`] stay true by
//! construction.

use num_rational::Rational32;

use crate::concepts::{Accidental, Clef as ClefConcept, Pitch};

use super::edge::{EdgeKind, SpanKind};
use super::node::{FloatKind, NodeKind, TokenKind};
use super::{Graph, NodeIndex};

impl Graph {
    pub fn add_island(&mut self) -> NodeIndex {
        self.add_node(NodeKind::Island)
    }

    pub fn add_chord(&mut self, duration: Rational32) -> NodeIndex {
        let n = self.add_node(NodeKind::Token(TokenKind::Chord));
        self.node_mut(n).label.set("NoteValue", duration);
        n
    }

    pub fn add_rest(&mut self, duration: Rational32) -> NodeIndex {
        let n = self.add_chord(duration);
        self.node_mut(n).label.set("Rest", true);
        n
    }

    pub fn add_clef(&mut self, clef: ClefConcept) -> NodeIndex {
        let n = self.add_node(NodeKind::Token(TokenKind::Clef));
        self.node_mut(n).label.set("Clef", super::ConceptValue::Clef(clef));
        n
    }

    pub fn add_key_signature(&mut self, fifths: i64) -> NodeIndex {
        let n = self.add_node(NodeKind::Token(TokenKind::KeySignature));
        self.node_mut(n).label.set("Fifths", fifths);
        n
    }

    pub fn add_time_signature(&mut self, numerator: i64, denominator: i64) -> NodeIndex {
        let n = self.add_node(NodeKind::Token(TokenKind::TimeSignature));
        self.node_mut(n).label.set("Numerator", numerator);
        self.node_mut(n).label.set("Denominator", denominator);
        n
    }

    pub fn add_barline(&mut self, style: crate::concepts::BarlineStyle) -> NodeIndex {
        let n = self.add_node(NodeKind::Token(TokenKind::Barline));
        self.node_mut(n).label.set("Style", super::ConceptValue::BarlineStyle(style));
        n
    }

    /// A note owned by `chord` via a `Note` edge.
    pub fn add_note(&mut self, chord: NodeIndex, pitch: Pitch) -> NodeIndex {
        let n = self.add_node(NodeKind::Note);
        self.node_mut(n).label.set("Value", super::ConceptValue::Pitch(pitch));
        self.add_edge(chord, n, EdgeKind::Note);
        n
    }

    /// A note with an explicit override accidental, visible or
    /// (per spec §4.2's accidental decision rule 4, `Accidental ==
    /// mica::Accidental`, here modeled as `visible = false`) silenced.
    pub fn add_note_with_override(
        &mut self,
        chord: NodeIndex,
        pitch: Pitch,
        override_accidental: Accidental,
        visible: bool,
    ) -> NodeIndex {
        let n = self.add_note(chord, pitch);
        self.node_mut(n).label.set("AccidentalOverride", super::ConceptValue::Accidental(override_accidental));
        self.node_mut(n).label.set("AccidentalOverrideVisible", visible);
        n
    }

    /// Owns a token at an island via a `Token` edge.
    pub fn place_token(&mut self, island: NodeIndex, token: NodeIndex) {
        self.add_edge(island, token, EdgeKind::Token);
    }

    pub fn link_partwise(&mut self, from: NodeIndex, to: NodeIndex) {
        self.add_edge(from, to, EdgeKind::Partwise);
    }

    pub fn link_instantwise(&mut self, from: NodeIndex, to: NodeIndex) {
        self.add_edge(from, to, EdgeKind::Instantwise);
    }

    pub fn link_voice(&mut self, from_chord: NodeIndex, to_chord: NodeIndex) {
        self.add_edge(from_chord, to_chord, EdgeKind::Voice);
    }

    pub fn link_beam(&mut self, from_chord: NodeIndex, to_chord: NodeIndex) {
        self.add_edge(from_chord, to_chord, EdgeKind::Beam);
    }

    pub fn link_tie(&mut self, from_note: NodeIndex, to_note: NodeIndex) {
        self.add_edge(from_note, to_note, EdgeKind::Tie);
    }

    pub fn link_slur(&mut self, from_chord: NodeIndex, to_chord: NodeIndex, placement: crate::concepts::Placement) {
        let e = self.add_edge(from_chord, to_chord, EdgeKind::Slur);
        self.edge_mut(e).label.set("Placement", super::ConceptValue::Placement(placement));
    }

    /// Anchors a tuplet info node to the chords of its strand, in
    /// order, tagged to disambiguate nested strands (spec §3.1
    /// invariant 5, §4.11).
    pub fn link_tuplet(&mut self, tuplet: NodeIndex, chord: NodeIndex, tag: &str) {
        self.add_edge(tuplet, chord, EdgeKind::Tuplet(tag.to_string()));
    }

    pub fn add_tuplet(&mut self, ratio: Rational32, tag: &str) -> NodeIndex {
        let n = self.add_node(NodeKind::Tuplet);
        self.node_mut(n).label.set("Value", ratio);
        self.node_mut(n).label.set("Tag", tag);
        n
    }

    pub fn add_float(&mut self, kind: FloatKind) -> NodeIndex {
        self.add_node(NodeKind::Float(kind))
    }

    pub fn anchor_float(&mut self, island: NodeIndex, float: NodeIndex) {
        self.add_edge(island, float, EdgeKind::Float);
    }

    pub fn link_span(&mut self, from: NodeIndex, to: NodeIndex, kind: SpanKind) {
        self.add_edge(from, to, EdgeKind::Span(kind));
    }

    /// Marks a measure rest spanning `from`..`to` covering `count`
    /// measures (spec §8: a 0-measure span still renders, as a whole
    /// rest rather than a multirest bar).
    pub fn link_measure_rest(&mut self, from: NodeIndex, to: NodeIndex, count: i64) {
        let e = self.add_edge(from, to, EdgeKind::Span(SpanKind::MeasureRest));
        self.edge_mut(e).label.set("Count", count);
    }

    /// Sets an articulation flag directly on a chord's label (spec §1's
    /// "articulations"; stored as an `Articulation:<name>` boolean, the
    /// same per-attribute prefix convention `style::set_island_override`
    /// uses for `Style:<name>`).
    pub fn add_articulation(&mut self, chord: NodeIndex, articulation: crate::concepts::Articulation) {
        self.node_mut(chord).label.set(articulation.attribute_key(), true);
    }
}
