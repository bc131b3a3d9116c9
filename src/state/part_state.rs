//! Pass 2 of state accumulation (spec §4.2): walks each part from its
//! start island, carrying clef/key/accidental history forward and
//! folding in each island's own tokens.

use crate::concepts::{staff_position as map_staff_position, Clef, StemDirectionConcept};
use crate::geometry::Geometry;
use crate::graph::validate::{override_accidental, override_visible, resolved_pitch};
use crate::graph::{ConceptValue, EdgeKind, Graph, NodeIndex, TokenKind};
use crate::style::HouseStyle;

use super::accidentals::{self, AlteredEntry};
use super::voicing;
use super::EngraveState;

/// The per-island snapshot of partwise state (spec §3.3 `PartState`):
/// clef, key signature, and running accidental history as they stand
/// immediately after folding this island's own tokens.
#[derive(Debug, Clone)]
pub struct PartState {
    pub clef: Clef,
    pub key_fifths: i64,
    pub altered: Vec<AlteredEntry>,
}

/// Per-chord derived state (spec §4.2 "Chord (keyed by chord node)").
#[derive(Debug, Clone, Copy)]
pub struct ChordInfo {
    pub highest: i32,
    pub lowest: i32,
    pub stem_has_beam: bool,
    pub stem_direction_single_voice: StemDirectionConcept,
    pub stem_direction_single_voice_beamed: StemDirectionConcept,
    pub stem_direction: StemDirectionConcept,
}

pub fn accumulate(graph: &Graph, geom: &Geometry, _style: &HouseStyle, st: &mut EngraveState) {
    for part in geom.parts() {
        accumulate_part(graph, geom, part, st);
    }
}

fn accumulate_part(graph: &Graph, geom: &Geometry, part: usize, st: &mut EngraveState) {
    // No clef token yet defaults to treble; a real score always opens
    // with one, but a malformed/partial graph shouldn't panic here.
    let mut clef = Clef::Treble;
    let mut key_fifths: i64 = 0;
    let mut altered: Vec<AlteredEntry> = Vec::new();

    let mut last_direction: Option<StemDirectionConcept> = None;
    let mut last_average: Option<f64> = None;
    let mut last_stem_has_beam = false;

    let start = geom.part_start(part);
    for island in graph.partwise_from(start) {
        for token in graph.tokens_of(island) {
            match graph.node(token).token_kind() {
                Some(TokenKind::Clef) => {
                    if let Some(ConceptValue::Clef(c)) = graph.node(token).label.get_concept("Clef") {
                        clef = c;
                    }
                }
                Some(TokenKind::KeySignature) => {
                    key_fifths = graph.node(token).label.get_integer("Fifths").unwrap_or(0);
                    accidentals::reset_for_key_signature(&mut altered);
                }
                Some(TokenKind::Barline) => {
                    accidentals::advance_measure(&mut altered);
                }
                _ => {}
            }
        }

        let chords: Vec<NodeIndex> =
            graph.tokens_of(island).filter(|&t| graph.node(t).token_kind() == Some(TokenKind::Chord)).collect();

        if chords.len() >= 2 && voicing::is_region_begin(graph, &chords) {
            voicing::enumerate_and_assign(graph, &chords, clef, st);
            for &chord in &chords {
                accumulate_chord_accidentals(graph, chord, clef, key_fifths, &mut altered, st);
            }
            last_direction = None;
            last_average = None;
            last_stem_has_beam = false;
        } else {
            for &chord in &chords {
                if !st.chords.contains_key(&chord) {
                    let info = single_voice_chord_info(graph, chord, clef, last_direction, last_average, last_stem_has_beam);
                    last_direction = Some(info.stem_direction);
                    last_average = Some((info.highest + info.lowest) as f64 / 2.0);
                    last_stem_has_beam = info.stem_has_beam;
                    st.chords.insert(chord, info);
                }
                accumulate_chord_accidentals(graph, chord, clef, key_fifths, &mut altered, st);
            }
        }

        st.parts.insert(island, PartState { clef, key_fifths, altered: altered.clone() });
    }
}

/// Stem direction for a chord outside a multivoice region (spec §4.2
/// "Stem direction (single-voice default)" plus its three context
/// overrides, in priority order: manual attribute, beam continuation,
/// near-middle averaging, else the staff-position rule).
fn single_voice_chord_info(
    graph: &Graph,
    chord: NodeIndex,
    clef: Clef,
    last_direction: Option<StemDirectionConcept>,
    last_average: Option<f64>,
    last_stem_has_beam: bool,
) -> ChordInfo {
    let (highest, lowest) = chord_extremes(graph, chord, clef);
    let stem_has_beam = chord_has_beam(graph, chord);
    let base = single_voice_direction(highest, lowest);

    let beam_continuation = stem_has_beam && last_stem_has_beam;
    let beamed = if beam_continuation { last_direction.unwrap_or(base) } else { base };

    let average = (highest + lowest) as f64 / 2.0;
    let near_middle_inherit = average.abs() <= 1.0 && last_average.map_or(false, |a| a.abs() <= 2.0);

    let manual = match graph.node(chord).label.get_concept("StemDirection") {
        Some(ConceptValue::StemDirection(d)) => Some(d),
        _ => None,
    };

    let stem_direction = if let Some(d) = manual {
        d
    } else if beam_continuation {
        last_direction.unwrap_or(base)
    } else if near_middle_inherit {
        last_direction.unwrap_or(base)
    } else {
        base
    };

    ChordInfo {
        highest,
        lowest,
        stem_has_beam,
        stem_direction_single_voice: base,
        stem_direction_single_voice_beamed: beamed,
        stem_direction,
    }
}

fn single_voice_direction(highest: i32, lowest: i32) -> StemDirectionConcept {
    use StemDirectionConcept::{Down, Up};
    if highest.abs() >= lowest.abs() {
        if highest <= 0 {
            Up
        } else {
            Down
        }
    } else if lowest <= 0 {
        Up
    } else {
        Down
    }
}

pub(super) fn chord_extremes(graph: &Graph, chord: NodeIndex, clef: Clef) -> (i32, i32) {
    let mut highest = i32::MIN;
    let mut lowest = i32::MAX;
    for note in graph.notes_of(chord) {
        if let Some(pitch) = resolved_pitch(graph, note) {
            let sp = map_staff_position(clef, pitch.diatonic_pitch());
            highest = highest.max(sp);
            lowest = lowest.min(sp);
        }
    }
    if highest == i32::MIN {
        (0, 0)
    } else {
        (highest, lowest)
    }
}

pub(super) fn chord_has_beam(graph: &Graph, chord: NodeIndex) -> bool {
    graph.outgoing(chord).iter().any(|&ix| matches!(graph.edge(ix).kind, EdgeKind::Beam))
        || graph.incoming(chord).iter().any(|&ix| matches!(graph.edge(ix).kind, EdgeKind::Beam))
}

fn accumulate_chord_accidentals(
    graph: &Graph,
    chord: NodeIndex,
    clef: Clef,
    key_fifths: i64,
    altered: &mut Vec<AlteredEntry>,
    st: &mut EngraveState,
) {
    for note in graph.notes_of(chord) {
        let Some(ConceptValue::Pitch(base)) = graph.node(note).label.get_concept("Value") else { continue };
        let staff_position = map_staff_position(clef, base.diatonic_pitch());
        let override_ = match (override_accidental(graph, note), override_visible(graph, note)) {
            (Some(a), Some(v)) => Some((a, v)),
            _ => None,
        };
        let mut emit = accidentals::accumulate_for_note(altered, base, override_, staff_position, key_fifths);

        // Spec §4.2 point 4: a tied-in note silences the emit but
        // keeps the alteration (already pushed above).
        if graph.incoming_of_kind(note, |k| matches!(k, EdgeKind::Tie)).is_some() {
            emit = false;
        }
        st.note_emits_accidental.insert(note, emit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::{Accidental, Letter, Pitch};
    use crate::geometry;
    use num_rational::Rational32;

    #[test]
    fn single_voice_direction_matches_scenario_one() {
        let mut g = Graph::new();
        let top = g.add_island();
        let clef_tok = g.add_clef(Clef::Treble);
        g.place_token(top, clef_tok);
        g.set_root(top);

        let chord_up = g.add_chord(Rational32::new(1, 4));
        g.add_note(chord_up, Pitch::new(Letter::E, Accidental::Natural, 4));
        g.place_token(top, chord_up);

        let geom = geometry::parse(&g).unwrap();
        let style = HouseStyle::engraver_defaults();
        let mut st = EngraveState::new();
        super::super::island_state::accumulate(&g, &geom, &mut st);
        accumulate(&g, &geom, &style, &mut st);

        let info = st.chord(chord_up).unwrap();
        assert_eq!(info.highest, -4);
        assert_eq!(info.stem_direction, StemDirectionConcept::Up);
    }
}
