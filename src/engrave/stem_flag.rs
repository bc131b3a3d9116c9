//! Stem height/direction and flag glyph selection (spec §4.5), grounded
//! on `belle-stems.h`'s `StemHeightForPositionAndStemDirection` and
//! `belle-flags.h`'s flag-family indexing.

use num_rational::Rational32;

use crate::concepts::StemDirectionConcept;
use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, Stamp, StampGraphic, Transform};
use crate::style::HouseStyle;

/// Stem/flag geometry recorded in island-local coordinates, read back
/// by the beam engraver once absolute island x is known (spec §4.6:
/// "beamed chords still emit a virtual stem-line box ... for later
/// collision-based spacing").
#[derive(Debug, Clone, Copy)]
pub struct StemGeometry {
    pub x: f64,
    pub direction: StemDirectionConcept,
    pub notehead_y: f64,
    pub tip_y: f64,
    pub has_beam: bool,
    pub flags: u32,
}

/// The duration with its dots stripped: the greatest power of two not
/// exceeding `r`. Exactly recovers the base value for any legal
/// dot-count (a single dot multiplies by 3/2, a double dot by 7/4, a
/// triple dot by 15/8 — all of these still floor to the right base).
pub fn undotted_duration(r: Rational32) -> Rational32 {
    let one = Rational32::new(1, 1);
    let two = Rational32::new(2, 1);
    let mut v = one;
    if r >= one {
        while v * two <= r {
            v *= two;
        }
    } else {
        while v > r {
            v /= two;
        }
    }
    v
}

/// Number of doublings of `UndottedDuration(r)` needed to reach `1/4`
/// or larger: the flag count (eighth = 1, sixteenth = 2, ...).
pub fn flags_given_duration(r: Rational32) -> u32 {
    let quarter = Rational32::new(1, 4);
    let mut v = undotted_duration(r);
    let mut count = 0;
    while v > Rational32::new(0, 1) && v < quarter {
        v *= Rational32::new(2, 1);
        count += 1;
    }
    count
}

/// Whether a duration is stemmed at all (spec's `StemmedDuration`):
/// half note or shorter, or a double-whole or longer note needing the
/// breve-style double stem — in practice, notes strictly between a
/// whole and a half never take a stem.
pub fn stemmed_duration(r: Rational32) -> bool {
    let undotted = undotted_duration(r);
    undotted <= Rational32::new(1, 2) || undotted >= Rational32::new(4, 1)
}

/// Stem height in staff-space units (spec §4.5: "minimum 2.5 units;
/// 3.5 units for positions near the staff middle; extends
/// proportionally beyond ±8").
pub fn stem_height(staff_position: i32, stem_up: bool, duration: Rational32, is_beamed: bool) -> f64 {
    let flipped = if stem_up { staff_position } else { -staff_position };

    if !is_beamed && undotted_duration(duration) <= Rational32::new(1, 8) {
        return 3.5;
    }
    if flipped <= -8 {
        return (flipped.abs() as f64) / 2.0;
    }
    match flipped {
        -7..=-1 => 3.5,
        0 => 3.25,
        1 => 3.0,
        2 => 2.75,
        _ => 2.5,
    }
}

/// SMuFL flag glyph name for `flags` (1-based: eighth = 1) and stem
/// direction (spec: "choose the flag variant from a flags family
/// indexed by `FlagsGivenDuration(r) − 1`, keyed by stem direction").
pub fn flag_glyph_name(flags: u32, stem_up: bool) -> &'static str {
    const UP: [&str; 8] = [
        "flag8thUp",
        "flag16thUp",
        "flag32ndUp",
        "flag64thUp",
        "flag128thUp",
        "flag256thUp",
        "flag512thUp",
        "flag1024thUp",
    ];
    const DOWN: [&str; 8] = [
        "flag8thDown",
        "flag16thDown",
        "flag32ndDown",
        "flag64thDown",
        "flag128thDown",
        "flag256thDown",
        "flag512thDown",
        "flag1024thDown",
    ];
    let idx = (flags.saturating_sub(1) as usize).min(7);
    if stem_up { UP[idx] } else { DOWN[idx] }
}

/// Engraves the stem line and, for non-beamed short durations, its
/// flag glyph. Returns the graphics plus the geometry the beam
/// engraver needs later. `notehead_x`/`notehead_y` are island-local
/// coordinates of the chord's notehead attachment point (one staff
/// space per unit, matching [`Bounds`]).
pub fn engrave(
    chord: NodeIndex,
    notehead_x: f64,
    staff_position: i32,
    duration: Rational32,
    stem_up: bool,
    has_beam: bool,
    style: &HouseStyle,
) -> (Stamp, StemGeometry) {
    let mut stamp = Stamp::new();

    if !stemmed_duration(duration) {
        let geom = StemGeometry {
            x: notehead_x,
            direction: if stem_up { StemDirectionConcept::Up } else { StemDirectionConcept::Down },
            notehead_y: staff_position as f64,
            tip_y: staff_position as f64,
            has_beam: false,
            flags: 0,
        };
        return (stamp, geom);
    }

    let stem_width = style.number("StemWidth");
    let height = stem_height(staff_position, stem_up, duration, has_beam);
    let sign = if stem_up { 1.0 } else { -1.0 };
    let tip_y = staff_position as f64 + sign * height;

    let (bottom, top) = if stem_up { (staff_position as f64, tip_y) } else { (tip_y, staff_position as f64) };
    let stem_bounds = Bounds::new(notehead_x - stem_width / 2.0, bottom, notehead_x + stem_width / 2.0, top);
    stamp.push(StampGraphic::new(GraphicPayload::Path { local_bounds: stem_bounds }, Transform::IDENTITY, chord));

    let flags = if has_beam { 0 } else { flags_given_duration(duration) };
    if flags > 0 {
        let name = flag_glyph_name(flags, stem_up);
        let flag_bounds = Bounds::new(notehead_x, tip_y - sign * 0.1, notehead_x + 1.2, tip_y + sign * 2.5);
        stamp.push(StampGraphic::new(
            GraphicPayload::Glyph { smufl_name: name, local_bounds: flag_bounds },
            Transform::IDENTITY,
            chord,
        ));
    }

    let geom = StemGeometry {
        x: notehead_x,
        direction: if stem_up { StemDirectionConcept::Up } else { StemDirectionConcept::Down },
        notehead_y: staff_position as f64,
        tip_y,
        has_beam,
        flags,
    };
    (stamp, geom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undotted_strips_single_dot() {
        assert_eq!(undotted_duration(Rational32::new(3, 8)), Rational32::new(1, 4));
    }

    #[test]
    fn undotted_strips_double_dot() {
        assert_eq!(undotted_duration(Rational32::new(7, 16)), Rational32::new(1, 4));
    }

    #[test]
    fn flags_count_matches_eighth_and_sixteenth() {
        assert_eq!(flags_given_duration(Rational32::new(1, 8)), 1);
        assert_eq!(flags_given_duration(Rational32::new(1, 16)), 2);
        assert_eq!(flags_given_duration(Rational32::new(1, 4)), 0);
    }

    #[test]
    fn quarter_note_gets_default_height_near_middle() {
        assert_eq!(stem_height(0, true, Rational32::new(1, 4), false), 3.25);
        assert_eq!(stem_height(2, true, Rational32::new(1, 4), false), 2.75);
    }

    #[test]
    fn far_position_extends_proportionally() {
        assert_eq!(stem_height(10, true, Rational32::new(1, 4), false), 5.0);
    }
}
