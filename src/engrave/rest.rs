//! Rest glyph lookup and voice-parity vertical offset (spec §4.8),
//! grounded on `belle-rests.h`.

use num_rational::Rational32;

use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, Stamp, StampGraphic, Transform};
use crate::style::HouseStyle;

use super::stem_flag::undotted_duration;

const TABLE: [(i32, i32, &str); 13] = [
    (4, 1, "restLonga"),
    (2, 1, "restDoubleWhole"),
    (1, 1, "restWhole"),
    (1, 2, "restHalf"),
    (1, 4, "restQuarter"),
    (1, 8, "rest8th"),
    (1, 16, "rest16th"),
    (1, 32, "rest32nd"),
    (1, 64, "rest64th"),
    (1, 128, "rest128th"),
    (1, 256, "rest256th"),
    (1, 512, "rest512th"),
    (1, 1024, "rest1024th"),
];

/// `RestIndexGivenDuration`: the glyph for a rest of this duration.
pub fn rest_glyph_name(duration: Rational32) -> &'static str {
    let r = undotted_duration(duration);
    for &(n, d, name) in TABLE.iter() {
        if r == Rational32::new(n, d) {
            return name;
        }
    }
    "rest1024th"
}

/// Vertical staff position for a rest of this glyph, in an even
/// (`strand_up`) or odd voice strand (spec §4.8: "even voice strands
/// go above, odd below"; whole rests get a `+1` offset).
fn vertical_position(glyph: &str, strand_up: bool, house_position: f64) -> f64 {
    let base = if glyph == "restWhole" || glyph == "restDoubleWhole" || glyph == "restLonga" { house_position + 1.0 } else { house_position };
    if strand_up {
        base
    } else {
        base - 4.0
    }
}

/// Engraves a rest glyph for `duration` at `x_offset`, offset
/// vertically per the chord's stem-direction-derived strand parity.
/// Returns the stamp and its bounds (for the typesetter/ledger pass).
pub fn engrave(chord: NodeIndex, duration: Rational32, x_offset: f64, strand_up: bool, style: &HouseStyle) -> (Stamp, Bounds) {
    let name = rest_glyph_name(duration);
    let house_position = style.number("MeasureRestVerticalPosition");
    let y = vertical_position(name, strand_up, house_position);

    let local = Bounds::new(-0.6, -1.0, 0.6, 1.0);
    let transform = Transform::translate(x_offset, y);
    let mut stamp = Stamp::new();
    stamp.push(StampGraphic::new(GraphicPayload::Glyph { smufl_name: name, local_bounds: local }, transform, chord));
    let bounds = transform.apply_bounds(local);
    (stamp, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_rest_glyph() {
        assert_eq!(rest_glyph_name(Rational32::new(1, 4)), "restQuarter");
    }

    #[test]
    fn whole_rest_glyph() {
        assert_eq!(rest_glyph_name(Rational32::new(1, 1)), "restWhole");
    }

    #[test]
    fn odd_strand_goes_below_even_goes_above() {
        let style = HouseStyle::engraver_defaults();
        let mut g = crate::graph::Graph::new();
        let chord = g.add_rest(Rational32::new(1, 4));
        let (_, up_bounds) = engrave(chord, Rational32::new(1, 4), 0.0, true, &style);
        let (_, down_bounds) = engrave(chord, Rational32::new(1, 4), 0.0, false, &style);
        assert!(up_bounds.top > down_bounds.top);
    }
}
