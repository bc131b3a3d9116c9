//! Outside-in accidental stacking against an accumulating left-side
//! hull (spec §4.4), grounded on `belle-accidentals.h`.

use crate::concepts::Accidental;
use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, Stamp, StampGraphic, Transform};
use crate::style::HouseStyle;

fn glyph_name(a: Accidental) -> &'static str {
    match a {
        Accidental::DoubleFlat => "accidentalDoubleFlat",
        Accidental::Flat => "accidentalFlat",
        Accidental::Natural => "accidentalNatural",
        Accidental::Sharp => "accidentalSharp",
        Accidental::DoubleSharp => "accidentalDoubleSharp",
    }
}

fn glyph_width(a: Accidental) -> f64 {
    match a {
        Accidental::DoubleFlat | Accidental::DoubleSharp => 1.4,
        _ => 1.0,
    }
}

/// Outside-in visiting order: 0, last, 1, last-1, ... (spec §4.4
/// "interleave outside-in").
fn outside_in_order(n: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(n);
    let (mut lo, mut hi) = (0i64, n as i64 - 1);
    let mut from_lo = true;
    while lo <= hi {
        if from_lo {
            order.push(lo as usize);
            lo += 1;
        } else {
            order.push(hi as usize);
            hi -= 1;
        }
        from_lo = !from_lo;
    }
    order
}

/// One accidental to place: the note it belongs to, its concept, and
/// its staff position.
pub struct AccidentalToEmit {
    pub note: NodeIndex,
    pub accidental: Accidental,
    pub staff_position: i32,
}

/// Stacks `accidentals` to the left of `notehead_left_x`, abutting each
/// one's right-side hull against the previous left edge plus a 0.3
/// unit gap (`AccidentalGap`). Returns the stamp and the resulting
/// leftmost x (the chord's new left extent).
pub fn engrave(chord: NodeIndex, accidentals: &[AccidentalToEmit], notehead_left_x: f64, style: &HouseStyle) -> (Stamp, f64) {
    let mut stamp = Stamp::new();
    let gap = style.number("AccidentalGap");
    let mut left_edge = notehead_left_x;

    for &idx in &outside_in_order(accidentals.len()) {
        let a = &accidentals[idx];
        let width = glyph_width(a.accidental);
        let right = left_edge - gap;
        let x = right - width;
        let y = a.staff_position as f64;
        let local = Bounds::new(-width / 2.0, -0.7, width / 2.0, 0.7);
        let transform = Transform::translate(x + width / 2.0, y);
        stamp.push(StampGraphic::new(
            GraphicPayload::Glyph { smufl_name: glyph_name(a.accidental), local_bounds: local },
            transform,
            chord,
        ));
        left_edge = x;
    }

    (stamp, left_edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn single_accidental_abuts_with_gap() {
        let mut g = Graph::new();
        let chord = g.add_chord(num_rational::Rational32::new(1, 4));
        let note = g.add_note(chord, crate::concepts::Pitch::new(crate::concepts::Letter::B, Accidental::Flat, 3));
        let style = HouseStyle::engraver_defaults();
        let accs = vec![AccidentalToEmit { note, accidental: Accidental::Flat, staff_position: -2 }];
        let (stamp, left) = engrave(chord, &accs, 0.0, &style);
        assert_eq!(stamp.graphics().len(), 1);
        assert!(left < 0.0);
    }

    #[test]
    fn outside_in_order_interleaves() {
        assert_eq!(outside_in_order(4), vec![0, 3, 1, 2]);
        assert_eq!(outside_in_order(5), vec![0, 4, 1, 3, 2]);
    }
}
