//! Multivoice region detection and strand stem-direction alternation
//! (spec §4.2 "Voicing").
//!
//! Per the documented decision (see `DESIGN.md`, spec §9 open
//! question): strand alternation is the only rule implemented here.
//! No position-based fallback fires when a strand has only rests.

use crate::concepts::{staff_position as map_staff_position, Clef, StemDirectionConcept};
use crate::graph::validate::resolved_pitch;
use crate::graph::{EdgeKind, Graph, NodeIndex};

use super::part_state::{chord_extremes, chord_has_beam, ChordInfo};
use super::EngraveState;

/// An island begins a multivoice region when it owns 2+ chord tokens,
/// none of which has an incoming `Voice`/`Beam` edge — i.e. each is the
/// first chord of its own strand.
pub fn is_region_begin(graph: &Graph, chords: &[NodeIndex]) -> bool {
    chords
        .iter()
        .all(|&c| graph.incoming(c).iter().all(|&ix| !matches!(graph.edge(ix).kind, EdgeKind::Voice | EdgeKind::Beam)))
}

/// Enumerates the strand starting at each of `chords`, sorts the
/// strands by average staff position (descending: top strand first),
/// and assigns each an alternating stem direction by strand index
/// (spec §4.2: "multistrand uses alternating up/down by even/odd
/// strand ID").
pub fn enumerate_and_assign(graph: &Graph, chords: &[NodeIndex], clef: Clef, st: &mut EngraveState) {
    let strands: Vec<Vec<NodeIndex>> = chords.iter().map(|&start| graph.strand_from(start).collect()).collect();

    let averages: Vec<f64> = strands.iter().map(|strand| strand_average(graph, strand, clef)).collect();

    let mut order: Vec<usize> = (0..strands.len()).collect();
    order.sort_by(|&a, &b| averages[b].partial_cmp(&averages[a]).unwrap_or(std::cmp::Ordering::Equal));

    for (strand_id, &idx) in order.iter().enumerate() {
        let direction = if strand_id % 2 == 0 { StemDirectionConcept::Up } else { StemDirectionConcept::Down };
        for &chord in &strands[idx] {
            let (highest, lowest) = chord_extremes(graph, chord, clef);
            let stem_has_beam = chord_has_beam(graph, chord);
            st.chords.insert(
                chord,
                ChordInfo {
                    highest,
                    lowest,
                    stem_has_beam,
                    stem_direction_single_voice: direction,
                    stem_direction_single_voice_beamed: direction,
                    stem_direction: direction,
                },
            );
        }
    }
}

fn strand_average(graph: &Graph, strand: &[NodeIndex], clef: Clef) -> f64 {
    let positions: Vec<i32> = strand
        .iter()
        .flat_map(|&chord| graph.notes_of(chord))
        .filter_map(|note| resolved_pitch(graph, note))
        .map(|p| map_staff_position(clef, p.diatonic_pitch()))
        .collect();
    if positions.is_empty() {
        0.0
    } else {
        positions.iter().sum::<i32>() as f64 / positions.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::{Accidental, Letter, Pitch};
    use crate::graph::Graph;
    use num_rational::Rational32;

    #[test]
    fn two_voice_alternates_up_then_down() {
        let mut g = Graph::new();
        let island = g.add_island();

        let top_chord = g.add_chord(Rational32::new(1, 4));
        g.add_note(top_chord, Pitch::new(Letter::E, Accidental::Natural, 4));
        g.place_token(island, top_chord);

        let bottom_chord = g.add_chord(Rational32::new(1, 4));
        g.add_note(bottom_chord, Pitch::new(Letter::G, Accidental::Natural, 3));
        g.place_token(island, bottom_chord);

        let chords = vec![top_chord, bottom_chord];
        assert!(is_region_begin(&g, &chords));

        let mut st = EngraveState::new();
        enumerate_and_assign(&g, &chords, Clef::Treble, &mut st);

        assert_eq!(st.chord(top_chord).unwrap().stem_direction, StemDirectionConcept::Up);
        assert_eq!(st.chord(bottom_chord).unwrap().stem_direction, StemDirectionConcept::Down);
    }
}
