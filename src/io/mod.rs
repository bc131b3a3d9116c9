//! External interfaces (spec §6): graph XML import/export, the
//! shorthand line grammar, and MusicXML import. All three funnel
//! through [`crate::graph::builder`] so the structural invariants in
//! [`crate::graph::validate`] hold by construction.

pub mod graph_xml;
pub mod musicxml;
pub mod shorthand;

use crate::concepts::{Accidental, Letter, Pitch};

/// `C4`, `F#5`, `Bbb3` — scientific pitch notation with the letter
/// first, then an accidental suffix (empty for natural), then the
/// octave. Shared by graph XML's `Value` attribute and shorthand's
/// note list.
pub(crate) fn pitch_to_string(pitch: Pitch) -> String {
    format!("{}{}{}", letter_char(pitch.letter), accidental_suffix(pitch.accidental), pitch.octave)
}

pub(crate) fn pitch_from_str(s: &str) -> Option<Pitch> {
    let mut chars = s.chars();
    let letter = letter_from_char(chars.next()?)?;
    let rest: String = chars.collect();

    let (accidental, octave_str) = if let Some(stripped) = rest.strip_prefix("bb") {
        (Accidental::DoubleFlat, stripped)
    } else if let Some(stripped) = rest.strip_prefix('b') {
        (Accidental::Flat, stripped)
    } else if let Some(stripped) = rest.strip_prefix('x') {
        (Accidental::DoubleSharp, stripped)
    } else if let Some(stripped) = rest.strip_prefix('#') {
        (Accidental::Sharp, stripped)
    } else {
        (Accidental::Natural, rest.as_str())
    };

    let octave: i32 = octave_str.parse().ok()?;
    Some(Pitch::new(letter, accidental, octave))
}

fn letter_char(letter: Letter) -> char {
    match letter {
        Letter::C => 'C',
        Letter::D => 'D',
        Letter::E => 'E',
        Letter::F => 'F',
        Letter::G => 'G',
        Letter::A => 'A',
        Letter::B => 'B',
    }
}

fn letter_from_char(c: char) -> Option<Letter> {
    match c.to_ascii_uppercase() {
        'C' => Some(Letter::C),
        'D' => Some(Letter::D),
        'E' => Some(Letter::E),
        'F' => Some(Letter::F),
        'G' => Some(Letter::G),
        'A' => Some(Letter::A),
        'B' => Some(Letter::B),
        _ => None,
    }
}

fn accidental_suffix(accidental: Accidental) -> &'static str {
    match accidental {
        Accidental::DoubleFlat => "bb",
        Accidental::Flat => "b",
        Accidental::Natural => "",
        Accidental::Sharp => "#",
        Accidental::DoubleSharp => "x",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_string_round_trips() {
        for pitch in [
            Pitch::new(Letter::C, Accidental::Natural, 4),
            Pitch::new(Letter::F, Accidental::Sharp, 5),
            Pitch::new(Letter::B, Accidental::Flat, 3),
            Pitch::new(Letter::A, Accidental::DoubleSharp, 2),
            Pitch::new(Letter::E, Accidental::DoubleFlat, 6),
        ] {
            let s = pitch_to_string(pitch);
            assert_eq!(pitch_from_str(&s), Some(pitch));
        }
    }
}
