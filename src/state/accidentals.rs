//! Accidental-state accumulation and the emit decision (spec §4.2
//! "Accidental decision"), grounded on `belle-accidental-state.h`'s
//! `AccidentalStateShouldAccidentalBeEmitted`.

use crate::concepts::{Accidental, DiatonicPitch, Letter, Pitch};

/// One entry of the running `Accidentals.Altered` list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlteredEntry {
    pub accidental: Accidental,
    pub diatonic: DiatonicPitch,
    pub staff_position: i32,
    pub measures_ago: u32,
}

const SHARP_ORDER: [Letter; 7] = [Letter::F, Letter::C, Letter::G, Letter::D, Letter::A, Letter::E, Letter::B];
const FLAT_ORDER: [Letter; 7] = [Letter::B, Letter::E, Letter::A, Letter::D, Letter::G, Letter::C, Letter::F];

/// The accidental a key signature of `fifths` (positive = sharps,
/// negative = flats) implies for `letter`.
pub fn key_signature_accidental_for_letter(fifths: i64, letter: Letter) -> Accidental {
    if fifths > 0 {
        let n = fifths.min(7) as usize;
        if SHARP_ORDER[..n].contains(&letter) { Accidental::Sharp } else { Accidental::Natural }
    } else if fifths < 0 {
        let n = (-fifths).min(7) as usize;
        if FLAT_ORDER[..n].contains(&letter) { Accidental::Flat } else { Accidental::Natural }
    } else {
        Accidental::Natural
    }
}

/// Resets `Accidentals.Altered` to match a new key signature (spec §4.2:
/// "reset `Accidentals.Altered` to match its sharps/flats").
pub fn reset_for_key_signature(altered: &mut Vec<AlteredEntry>) {
    altered.clear();
}

/// Increments `MeasuresAgo` for every entry, pruning those that reach 2
/// (spec §4.2, §9 "Accidentals.Altered").
pub fn advance_measure(altered: &mut Vec<AlteredEntry>) {
    for a in altered.iter_mut() {
        a.measures_ago += 1;
    }
    altered.retain(|a| a.measures_ago < 2);
}

/// Runs the emit decision for one note and, if it emits, appends to
/// `altered`. `override_` is `Some((accidental, visible))` when the
/// note carries an explicit override (spec §4.2 point 4 / boundary
/// case "a note with both override accidental and key-signature
/// accidental uses the override for emit decision").
///
/// Returns whether the accidental should be visually emitted (before
/// any tie-silencing, which the caller applies separately since it
/// depends on graph structure this module doesn't see).
pub fn accumulate_for_note(
    altered: &mut Vec<AlteredEntry>,
    base_pitch: Pitch,
    override_: Option<(Accidental, bool)>,
    staff_position: i32,
    key_fifths: i64,
) -> bool {
    let diatonic = base_pitch.diatonic_pitch();
    let accidental = override_.map(|(a, _)| a).unwrap_or_else(|| base_pitch.accidental());

    let mut emit = should_emit_against_key(altered, accidental, diatonic, staff_position, key_fifths);
    if let Some((_, visible)) = override_ {
        emit = visible;
    }

    if emit {
        let already_active = altered
            .iter()
            .any(|a| a.staff_position == staff_position && a.accidental == accidental && a.measures_ago == 0);
        if !already_active {
            altered.push(AlteredEntry { accidental, diatonic, staff_position, measures_ago: 0 });
        }
    }

    emit
}

fn should_emit_against_key(
    altered: &[AlteredEntry],
    accidental: Accidental,
    diatonic: DiatonicPitch,
    staff_position: i32,
    key_fifths: i64,
) -> bool {
    let letter = diatonic.letter();

    for a in altered.iter().rev() {
        let a_letter = a.diatonic.letter();
        if a_letter == letter && a.staff_position == staff_position && a.accidental != accidental {
            return true;
        } else if a_letter == letter && a.accidental == accidental {
            break;
        }
    }

    for a in altered.iter().rev() {
        if a.measures_ago > 0 {
            break;
        }
        if a.accidental == accidental && a.diatonic == diatonic && a.staff_position == staff_position {
            return false;
        }
    }

    accidental != key_signature_accidental_for_letter(key_fifths, letter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::Letter;

    #[test]
    fn key_implied_accidental_suppresses_emit() {
        // Key of two flats: B and E.
        let mut altered = Vec::new();
        let bb3 = Pitch::new(Letter::B, Accidental::Flat, 3);
        let emit = accumulate_for_note(&mut altered, bb3, None, -2, -2);
        assert!(!emit, "B-flat implied by a two-flat key should not re-emit");
    }

    #[test]
    fn naturalized_note_then_same_pitch_reemits() {
        let mut altered = Vec::new();
        let b3 = Pitch::new(Letter::B, Accidental::Natural, 3);
        assert!(accumulate_for_note(&mut altered, b3, None, -2, -2));

        let bb3 = Pitch::new(Letter::B, Accidental::Flat, 3);
        assert!(accumulate_for_note(&mut altered, bb3, None, -2, -2));
    }

    #[test]
    fn measures_ago_pruned_after_two_barlines() {
        let mut altered = vec![AlteredEntry {
            accidental: Accidental::Sharp,
            diatonic: DiatonicPitch { letter: Letter::F, octave: 4 },
            staff_position: 4,
            measures_ago: 0,
        }];
        advance_measure(&mut altered);
        assert_eq!(altered.len(), 1);
        advance_measure(&mut altered);
        assert!(altered.is_empty());
    }

    #[test]
    fn zero_fifths_key_resets_all_to_natural() {
        let mut altered = vec![AlteredEntry {
            accidental: Accidental::Sharp,
            diatonic: DiatonicPitch { letter: Letter::F, octave: 4 },
            staff_position: 4,
            measures_ago: 0,
        }];
        reset_for_key_signature(&mut altered);
        assert!(altered.is_empty());
    }
}
