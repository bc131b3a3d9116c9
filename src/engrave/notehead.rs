//! Chord-pair fusion, clustering, column assignment and notehead glyph
//! selection (spec §4.3), grounded on `belle-chord-state.h`.

use num_rational::Rational32;

use crate::concepts::{staff_position as map_staff_position, Clef, StemDirectionConcept};
use crate::graph::validate::resolved_pitch;
use crate::graph::{Graph, NodeIndex};
use crate::stamp::{Bounds, GraphicPayload, Stamp, StampGraphic, Transform};
use crate::state::ChordInfo;
use crate::style::HouseStyle;

use super::stem_flag::undotted_duration;

/// A single notehead's derived placement, before horizontal offset.
#[derive(Debug, Clone, Copy)]
pub struct NoteheadInfo {
    pub note: NodeIndex,
    pub staff_position: i32,
    pub column: i32,
}

/// Notehead glyph by `UndottedDuration` thresholds (spec §4.3).
pub fn notehead_glyph(duration: Rational32) -> &'static str {
    let r = undotted_duration(duration);
    if r < Rational32::new(1, 2) {
        "noteheadBlack"
    } else if r < Rational32::new(1, 1) {
        "noteheadHalf"
    } else if r < Rational32::new(2, 1) {
        "noteheadWhole"
    } else if r < Rational32::new(4, 1) {
        "noteheadDoubleWhole"
    } else if r < Rational32::new(8, 1) {
        "noteheadLonga"
    } else {
        "noteheadMaxima"
    }
}

/// Whether two stem-opposite chords at the same island fuse into one
/// multichord (spec §4.3 "Chord-pair fusion").
pub fn should_fuse(graph: &Graph, clef: Clef, upper: NodeIndex, upper_info: &ChordInfo, lower: NodeIndex, lower_info: &ChordInfo) -> bool {
    if upper_info.stem_direction != StemDirectionConcept::Up || lower_info.stem_direction != StemDirectionConcept::Down {
        return false;
    }

    let upper_positions: Vec<i32> = positions_of(graph, upper, clef);
    let lower_positions: Vec<i32> = positions_of(graph, lower, clef);

    let no_adjacent = upper_positions
        .iter()
        .all(|&a| lower_positions.iter().all(|&b| (a - b).abs() > 1));
    if !no_adjacent {
        return false;
    }

    let shared: Vec<i32> = upper_positions.iter().copied().filter(|p| lower_positions.contains(p)).collect();
    if shared.is_empty() {
        return true;
    }
    if shared.len() != 1 {
        return false;
    }

    let upper_dur = graph.node(upper).label.get_rational("NoteValue").unwrap_or(Rational32::new(1, 4));
    let lower_dur = graph.node(lower).label.get_rational("NoteValue").unwrap_or(Rational32::new(1, 4));
    undotted_duration(upper_dur) < Rational32::new(1, 2) && undotted_duration(lower_dur) < Rational32::new(1, 2)
}

fn positions_of(graph: &Graph, chord: NodeIndex, clef: Clef) -> Vec<i32> {
    graph
        .notes_of(chord)
        .filter_map(|n| resolved_pitch(graph, n))
        .map(|p| map_staff_position(clef, p.diatonic_pitch()))
        .collect()
}

/// Clusters a chord's notes (adjacent staff positions, within 1 unit)
/// and assigns alternating columns within each cluster (spec §4.3
/// "Clustering", "Column assignment").
pub fn cluster_and_assign_columns(graph: &Graph, chord: NodeIndex, clef: Clef, stem_up: bool) -> Vec<NoteheadInfo> {
    let mut notes: Vec<(NodeIndex, i32)> = graph
        .notes_of(chord)
        .filter_map(|n| resolved_pitch(graph, n).map(|p| (n, map_staff_position(clef, p.diatonic_pitch()))))
        .collect();

    // Sort in stem direction: away from the stem tip first.
    if stem_up {
        notes.sort_by_key(|&(_, sp)| std::cmp::Reverse(sp));
    } else {
        notes.sort_by_key(|&(_, sp)| sp);
    }

    let mut out = Vec::with_capacity(notes.len());
    let mut i = 0;
    while i < notes.len() {
        let mut cluster = vec![notes[i]];
        let mut j = i + 1;
        while j < notes.len() && (notes[j].1 - notes[j - 1].1).abs() <= 1 {
            cluster.push(notes[j]);
            j += 1;
        }

        let side = if stem_up { 1 } else { -1 };
        let start = if !stem_up && cluster.len() % 2 == 1 { 1 } else { 0 };
        for (k, &(note, sp)) in cluster.iter().enumerate() {
            let column = if (k + start) % 2 == 0 { 0 } else { side };
            out.push(NoteheadInfo { note, staff_position: sp, column });
        }
        i = j;
    }
    out
}

/// Engraves one chord's noteheads at the given horizontal offset.
/// Returns the stamp plus the chord's notehead-attachment x (where the
/// stem should meet it — the column-0 notehead's right/left edge
/// depending on stem direction) and the horizontal extent consumed.
pub fn engrave_chord_noteheads(
    chord: NodeIndex,
    notes: &[NoteheadInfo],
    duration: Rational32,
    x_offset: f64,
    stem_up: bool,
    style: &HouseStyle,
) -> (Stamp, f64, Bounds) {
    let width = style.number("NoteheadWidth");
    let glyph = notehead_glyph(duration);
    let mut stamp = Stamp::new();
    let mut bounds = Bounds::EMPTY;

    let duration_glyph_width = width;
    for info in notes {
        let x = x_offset + info.column as f64 * duration_glyph_width;
        let y = info.staff_position as f64;
        let local = Bounds::new(-width / 2.0, -0.5, width / 2.0, 0.5);
        let transform = Transform::translate(x, y);
        stamp.push(StampGraphic::new(GraphicPayload::Glyph { smufl_name: glyph, local_bounds: local }, transform, chord));
        bounds = bounds.union(transform.apply_bounds(local));
    }

    // The stem attaches at column 0's edge (right edge if stem up,
    // left edge if stem down).
    let stem_x = x_offset + if stem_up { width / 2.0 } else { -width / 2.0 };
    (stamp, stem_x, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::{Accidental, Letter, Pitch};
    use crate::graph::Graph;

    #[test]
    fn single_note_chord_gets_column_zero() {
        let mut g = Graph::new();
        let chord = g.add_chord(Rational32::new(1, 4));
        g.add_note(chord, Pitch::new(Letter::E, Accidental::Natural, 4));
        let infos = cluster_and_assign_columns(&g, chord, Clef::Treble, true);
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].column, 0);
    }

    #[test]
    fn adjacent_pair_stem_up_gets_zero_and_plus_one() {
        let mut g = Graph::new();
        let chord = g.add_chord(Rational32::new(1, 4));
        g.add_note(chord, Pitch::new(Letter::E, Accidental::Natural, 4));
        g.add_note(chord, Pitch::new(Letter::F, Accidental::Natural, 4));
        let infos = cluster_and_assign_columns(&g, chord, Clef::Treble, true);
        let cols: Vec<i32> = infos.iter().map(|i| i.column).collect();
        assert!(cols.contains(&0) && cols.contains(&1));
    }

    #[test]
    fn notehead_glyph_by_duration() {
        assert_eq!(notehead_glyph(Rational32::new(1, 4)), "noteheadBlack");
        assert_eq!(notehead_glyph(Rational32::new(1, 2)), "noteheadHalf");
        assert_eq!(notehead_glyph(Rational32::new(1, 1)), "noteheadWhole");
    }
}
