//! Rhythmic dot slot assignment (spec §4.9), grounded on
//! `belle-dots.h`.

use std::collections::HashSet;

use num_rational::Rational32;

use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, Stamp, StampGraphic, Transform};
use crate::style::HouseStyle;

use super::stem_flag::undotted_duration;

/// Number of augmentation dots implied by `duration` relative to its
/// undotted base (single/double/triple dot only — anything beyond
/// triple-dotted is vanishingly rare in practice and clamped to 3).
pub fn dot_count(duration: Rational32) -> usize {
    let base = undotted_duration(duration);
    if base == Rational32::new(0, 1) {
        return 0;
    }
    let ratio = duration / base;
    if ratio == Rational32::new(15, 8) {
        3
    } else if ratio == Rational32::new(7, 4) {
        2
    } else if ratio == Rational32::new(3, 2) {
        1
    } else {
        0
    }
}

/// Picks the nearest unused odd (space) staff position for a dot
/// belonging to a notehead at `staff_position`, preferring the stem
/// side first (spec §4.9: "pick the nearest unused space above (if
/// stem up) or below (if stem down); if neither has a free slot, pick
/// the closest overall").
fn assign_slot(staff_position: i32, stem_up: bool, used: &mut HashSet<i32>) -> i32 {
    let to_space = |p: i32| if p % 2 == 0 { p + 1 } else { p };
    let preferred = if stem_up { [staff_position + 1, staff_position - 1] } else { [staff_position - 1, staff_position + 1] };
    for cand in preferred {
        let slot = to_space(cand);
        if !used.contains(&slot) {
            used.insert(slot);
            return slot;
        }
    }
    let mut delta = 2;
    loop {
        for cand in [staff_position + delta, staff_position - delta] {
            let slot = to_space(cand);
            if !used.contains(&slot) {
                used.insert(slot);
                return slot;
            }
        }
        delta += 1;
    }
}

/// Engraves the dots for one chord's noteheads. `positions` is one
/// entry per notehead needing dots; `chord_right` is the chord's right
/// extent after noteheads/accidentals.
pub fn engrave(chord: NodeIndex, positions: &[i32], dots: usize, chord_right: f64, stem_up: bool, style: &HouseStyle) -> Stamp {
    let mut stamp = Stamp::new();
    if dots == 0 {
        return stamp;
    }
    let distance = style.number("DotNoteheadDistance");
    let spacing = style.number("DotSpacing");
    let size = style.number("RhythmicDotSize");
    let mut used = HashSet::new();

    for &staff_position in positions {
        let slot = assign_slot(staff_position, stem_up, &mut used);
        for j in 0..dots {
            let x = chord_right + distance + j as f64 * spacing;
            let local = Bounds::new(-size / 2.0, -size / 2.0, size / 2.0, size / 2.0);
            let transform = Transform::translate(x, slot as f64);
            stamp.push(StampGraphic::new(GraphicPayload::Glyph { smufl_name: "augmentationDot", local_bounds: local }, transform, chord));
        }
    }
    stamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_quarter_has_one_dot() {
        assert_eq!(dot_count(Rational32::new(3, 8)), 1);
    }

    #[test]
    fn double_dotted_quarter_has_two_dots() {
        assert_eq!(dot_count(Rational32::new(7, 16)), 2);
    }

    #[test]
    fn line_note_dot_goes_to_adjacent_space() {
        let mut used = HashSet::new();
        let slot = assign_slot(0, true, &mut used);
        assert_eq!(slot, 1);
    }

    #[test]
    fn second_dot_on_same_line_finds_next_free_space() {
        let mut used = HashSet::new();
        assign_slot(0, true, &mut used);
        let slot2 = assign_slot(0, true, &mut used);
        assert_ne!(slot2, 1);
    }
}
