//! The finite music-information algebra (spec §3.1, §3.6).
//!
//! Attribute values on graph nodes/edges are tagged concept tokens
//! drawn from this closed vocabulary, plus rationals, integers,
//! strings and booleans (see [`crate::graph::label`]). The algebraic
//! maps the spec calls for (`map(Pitch, DiatonicPitch)`, `map(Clef,
//! DiatonicPitch) -> StaffPosition`, ...) are implemented here as
//! ordinary Rust functions over static tables, mirroring the
//! `mica::map` concept-table pattern of the engraving library this
//! core was distilled from.

use std::fmt;

/// A diatonic letter name, A through G.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    /// 0-based position of this letter within the diatonic scale
    /// starting at C (used for staff-position and semitone math).
    pub const fn scale_degree(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 1,
            Letter::E => 2,
            Letter::F => 3,
            Letter::G => 4,
            Letter::A => 5,
            Letter::B => 6,
        }
    }

    /// Semitones above C within one octave (natural spelling).
    const fn natural_semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    pub fn from_scale_degree(d: i32) -> Letter {
        const LETTERS: [Letter; 7] =
            [Letter::C, Letter::D, Letter::E, Letter::F, Letter::G, Letter::A, Letter::B];
        LETTERS[d.rem_euclid(7) as usize]
    }
}

/// An accidental concept token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    pub const fn semitone_offset(self) -> i32 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }
}

impl fmt::Display for Accidental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "n",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "x",
        };
        write!(f, "{s}")
    }
}

/// A fully spelled pitch: letter + accidental + octave (scientific
/// pitch notation octave numbering, C4 = middle C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub letter: Letter,
    pub accidental: Accidental,
    pub octave: i32,
}

impl Pitch {
    pub const fn new(letter: Letter, accidental: Accidental, octave: i32) -> Self {
        Pitch { letter, accidental, octave }
    }

    /// `map(Pitch, DiatonicPitch)` — strips the accidental.
    pub const fn diatonic_pitch(self) -> DiatonicPitch {
        DiatonicPitch { letter: self.letter, octave: self.octave }
    }

    /// `map(Pitch, Accidental)`.
    pub const fn accidental(self) -> Accidental {
        self.accidental
    }

    /// MIDI note number, 0-127, clamped (C4 = 60).
    pub fn midi_note(self) -> u8 {
        let semi =
            self.letter.natural_semitone() + self.accidental.semitone_offset() + (self.octave + 1) * 12;
        semi.clamp(0, 127) as u8
    }
}

/// A diatonic pitch (letter + octave, accidental-free).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiatonicPitch {
    pub letter: Letter,
    pub octave: i32,
}

impl DiatonicPitch {
    /// `map(DiatonicPitch, Letter)`.
    pub const fn letter(self) -> Letter {
        self.letter
    }

    /// Absolute diatonic step count from C0, used for staff-position
    /// arithmetic (one diatonic step = one staff position).
    const fn absolute_step(self) -> i32 {
        self.octave * 7 + self.letter.scale_degree()
    }
}

/// A clef concept: which diatonic pitch sits on the staff's middle
/// line (the position-0 reference for `staff_position`, spec §4.1's
/// "Clef.Active").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clef {
    Treble,
    Bass,
    Alto,
    Tenor,
    Percussion,
}

impl Clef {
    /// The diatonic pitch notated on the middle staff line.
    const fn middle_line_pitch(self) -> DiatonicPitch {
        match self {
            Clef::Treble => DiatonicPitch { letter: Letter::B, octave: 4 },
            Clef::Bass => DiatonicPitch { letter: Letter::D, octave: 3 },
            Clef::Alto => DiatonicPitch { letter: Letter::C, octave: 4 },
            Clef::Tenor => DiatonicPitch { letter: Letter::A, octave: 3 },
            Clef::Percussion => DiatonicPitch { letter: Letter::B, octave: 4 },
        }
    }
}

/// `map(Clef, DiatonicPitch) -> StaffPosition`: signed diatonic-step
/// distance from the clef's middle line. Positive is up. One unit per
/// line or space (middle line = 0, next line up = +2, next space up =
/// +1, and so on); this is the convention load-bearing throughout the
/// engraver (ledger-line spacing, stem height, dot-slot parity).
pub fn staff_position(clef: Clef, pitch: DiatonicPitch) -> i32 {
    pitch.absolute_step() - clef.middle_line_pitch().absolute_step()
}

/// Placement of a graphic relative to the staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    Above,
    Below,
}

/// Barline rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarlineStyle {
    Normal,
    Final,
    RepeatStart,
    RepeatEnd,
    Double,
}

/// Stem direction, as a concept token an override attribute can carry
/// (distinct from the *derived* per-chord stem direction state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StemDirectionConcept {
    Up,
    Down,
}

/// A chord articulation mark (spec §1, §2's "rest, dot, articulation
/// engravers").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Articulation {
    Staccato,
    Staccatissimo,
    Accent,
    Tenuto,
    Marcato,
    Fermata,
}

impl Articulation {
    /// SMuFL glyph name, keyed by which side of the chord it sits on
    /// (the vocabulary's `mica::map(SMuFL, Articulation, Above|Below)`
    /// table, mirrored here as a plain match).
    pub fn smufl_name(self, above: bool) -> &'static str {
        match (self, above) {
            (Articulation::Staccato, true) => "articStaccatoAbove",
            (Articulation::Staccato, false) => "articStaccatoBelow",
            (Articulation::Staccatissimo, true) => "articStaccatissimoAbove",
            (Articulation::Staccatissimo, false) => "articStaccatissimoBelow",
            (Articulation::Accent, true) => "articAccentAbove",
            (Articulation::Accent, false) => "articAccentBelow",
            (Articulation::Tenuto, true) => "articTenutoAbove",
            (Articulation::Tenuto, false) => "articTenutoBelow",
            (Articulation::Marcato, true) => "articMarcatoAbove",
            (Articulation::Marcato, false) => "articMarcatoBelow",
            (Articulation::Fermata, true) => "fermataAbove",
            (Articulation::Fermata, false) => "fermataBelow",
        }
    }

    pub const ALL: [Articulation; 6] =
        [Articulation::Staccato, Articulation::Staccatissimo, Articulation::Accent, Articulation::Tenuto, Articulation::Marcato, Articulation::Fermata];

    fn name(self) -> &'static str {
        match self {
            Articulation::Staccato => "Staccato",
            Articulation::Staccatissimo => "Staccatissimo",
            Articulation::Accent => "Accent",
            Articulation::Tenuto => "Tenuto",
            Articulation::Marcato => "Marcato",
            Articulation::Fermata => "Fermata",
        }
    }

    pub fn attribute_key(self) -> String {
        format!("Articulation:{}", self.name())
    }

    pub fn from_attribute_key(key: &str) -> Option<Articulation> {
        let name = key.strip_prefix("Articulation:")?;
        Articulation::ALL.into_iter().find(|a| a.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_line_is_zero() {
        let b4 = Pitch::new(Letter::B, Accidental::Natural, 4).diatonic_pitch();
        assert_eq!(staff_position(Clef::Treble, b4), 0);
    }

    #[test]
    fn g3_is_nine_below_treble_middle_line() {
        // spec §8 scenario 1's literal value (-6) is internally
        // inconsistent with its own paired E4 value under this crate's
        // one-unit-per-diatonic-step convention; see DESIGN.md.
        let g3 = Pitch::new(Letter::G, Accidental::Natural, 3).diatonic_pitch();
        assert_eq!(staff_position(Clef::Treble, g3), -9);
    }

    #[test]
    fn bottom_and_top_treble_lines() {
        let e4 = Pitch::new(Letter::E, Accidental::Natural, 4).diatonic_pitch();
        let f5 = Pitch::new(Letter::F, Accidental::Natural, 5).diatonic_pitch();
        assert_eq!(staff_position(Clef::Treble, e4), -4);
        assert_eq!(staff_position(Clef::Treble, f5), 4);
    }

    #[test]
    fn midi_note_numbers() {
        assert_eq!(Pitch::new(Letter::C, Accidental::Natural, 4).midi_note(), 60);
        assert_eq!(Pitch::new(Letter::C, Accidental::Sharp, 4).midi_note(), 61);
        assert_eq!(Pitch::new(Letter::A, Accidental::Natural, 4).midi_note(), 69);
    }
}
