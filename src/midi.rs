//! MIDI projection and Standard MIDI File export (spec §4.16, §6.5),
//! grounded on the teacher's `renderers::midi::converter` (the
//! graph-to-notes walk and tie consolidation) and
//! `converters::musicxml::musicxml_to_midi::write` (the `midly`-based
//! SMF writer, reused here near-verbatim since it's format plumbing,
//! not notation logic).
//!
//! This is a separate entry point, not part of [`crate::engrave`] — a
//! caller wanting sound runs this directly against the same graph
//! instead of (or alongside) [`crate::engrave`].

use std::collections::HashMap;

use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use num_rational::Rational32;

use crate::error::EngraveError;
use crate::geometry::Geometry;
use crate::graph::validate::resolved_pitch;
use crate::graph::{EdgeKind, Graph, NodeIndex, TokenKind};

/// A startup pickup (spec: "onset = cumulative onset + a small startup
/// offset"), so the very first note isn't sounded exactly at tick 0.
const STARTUP_OFFSET_TICKS: u64 = 8;

#[derive(Debug, Clone)]
pub struct MidiNote {
    pub onset_tick: u64,
    pub dur_tick: u64,
    pub key: u8,
    pub velocity: u8,
}

#[derive(Debug, Clone)]
pub struct MidiPart {
    pub channel: u8,
    pub program: u8,
    pub notes: Vec<MidiNote>,
}

#[derive(Debug, Clone)]
pub struct MidiScore {
    pub tpq: u16,
    pub tempo_bpm: f64,
    pub parts: Vec<MidiPart>,
}

/// MIDI channel for a part index, skipping channel 9 (reserved for
/// percussion in General MIDI).
fn assign_channel(part_index: usize) -> u8 {
    let channel = part_index % 16;
    if channel >= 9 { ((channel + 1) % 16) as u8 } else { channel as u8 }
}

fn velocity_for(duration_quarters: f64, begins_beam_group: bool) -> u8 {
    let base = 64.0;
    let log_term = duration_quarters.max(1.0 / 16.0).log2() * 6.0;
    let beam_bonus = if begins_beam_group { 8.0 } else { 0.0 };
    (base + log_term + beam_bonus).clamp(1.0, 127.0) as u8
}

/// Whether a chord begins a beam group: no incoming `Beam` edge, but at
/// least one outgoing one (spec §4.6's beam-group start condition,
/// reused from [`crate::engrave::engrave_beam_groups`]'s definition).
fn begins_beam_group(graph: &Graph, chord: NodeIndex) -> bool {
    let has_incoming_beam = graph.incoming(chord).iter().any(|&ix| matches!(graph.edge(ix).kind, EdgeKind::Beam));
    let has_outgoing_beam = graph.outgoing_of_kind(chord, |k| matches!(k, EdgeKind::Beam)).is_some();
    !has_incoming_beam && has_outgoing_beam
}

/// Walks the rhythm matrix (spec §4.16) and projects one [`MidiPart`]
/// per part, aligning ties into single compound-duration notes.
pub fn project(graph: &Graph, geom: &Geometry, tpq: u16, tempo_bpm: f64) -> MidiScore {
    let ticks_per_whole = tpq as u64 * 4;
    let mut parts = Vec::with_capacity(geom.part_count());

    for part in geom.parts() {
        let mut notes: Vec<MidiNote> = Vec::new();
        // Maps the note that *continues* a tie to the index of the
        // MidiNote its onset already belongs to (spec: "tied-sequence
        // durations are summed from the first un-tied note").
        let mut pending_tie: HashMap<NodeIndex, usize> = HashMap::new();
        let mut tick = STARTUP_OFFSET_TICKS;

        for instant in geom.instants() {
            let Some(island) = geom.island_at(instant, part) else { continue };
            let Some(chord) = graph.tokens_of(island).find(|&t| graph.node(t).token_kind() == Some(TokenKind::Chord)) else { continue };

            let duration = graph.node(chord).label.get_rational("NoteValue").unwrap_or(Rational32::new(1, 4));
            let scalar = crate::engrave::tuplet::chord_time_scalar(graph, chord);
            let scaled = duration * scalar;
            let dur_quarters = *scaled.numer() as f64 * 4.0 / *scaled.denom() as f64;
            let dur_ticks = ((*scaled.numer() as u64) * ticks_per_whole) / (*scaled.denom() as u64).max(1);

            let is_rest = graph.node(chord).label.get_bool("Rest").unwrap_or(false);
            if !is_rest {
                let begins_group = begins_beam_group(graph, chord);
                let velocity = velocity_for(dur_quarters, begins_group);

                for note in graph.notes_of(chord) {
                    if let Some(&idx) = pending_tie.get(&note) {
                        notes[idx].dur_tick += dur_ticks;
                        pending_tie.remove(&note);
                        carry_tie(graph, &mut pending_tie, note, idx);
                        continue;
                    }
                    let Some(pitch) = resolved_pitch(graph, note) else { continue };
                    let idx = notes.len();
                    notes.push(MidiNote { onset_tick: tick, dur_tick: dur_ticks, key: pitch.midi_note(), velocity });
                    carry_tie(graph, &mut pending_tie, note, idx);
                }
            }

            tick += dur_ticks;
        }

        parts.push(MidiPart { channel: assign_channel(part), program: 0, notes });
    }

    MidiScore { tpq, tempo_bpm, parts }
}

fn carry_tie(graph: &Graph, pending_tie: &mut HashMap<NodeIndex, usize>, note: NodeIndex, idx: usize) {
    if let Some(tie_edge) = graph.outgoing_of_kind(note, |k| matches!(k, EdgeKind::Tie)) {
        pending_tie.insert(tie_edge.to, idx);
    }
}

/// Serializes a [`MidiScore`] as a Standard MIDI File, format 1: a
/// conductor track carrying tempo, then one track per part.
pub fn write_smf(score: &MidiScore) -> Result<Vec<u8>, EngraveError> {
    let mut tracks = Vec::with_capacity(score.parts.len() + 1);
    tracks.push(build_conductor_track(score));
    for part in &score.parts {
        tracks.push(build_part_track(part));
    }

    let smf = Smf { header: Header { format: Format::Parallel, timing: Timing::Metrical(score.tpq.into()) }, tracks };

    let mut out = Vec::new();
    smf.write(&mut out).map_err(|e| EngraveError::UnsupportedFeature(format!("could not write SMF: {e}")))?;
    Ok(out)
}

fn build_conductor_track(score: &MidiScore) -> Track<'static> {
    let microseconds_per_quarter = (60_000_000.0 / score.tempo_bpm) as u32;
    vec![
        TrackEvent { delta: 0.into(), kind: TrackEventKind::Meta(MetaMessage::Tempo(microseconds_per_quarter.into())) },
        TrackEvent { delta: 0.into(), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) },
    ]
}

fn build_part_track(part: &MidiPart) -> Track<'static> {
    let mut events: Vec<(u64, TrackEventKind<'static>)> = Vec::new();
    events.push((0, TrackEventKind::Midi { channel: part.channel.into(), message: MidiMessage::ProgramChange { program: part.program.into() } }));

    for note in &part.notes {
        events.push((note.onset_tick, TrackEventKind::Midi { channel: part.channel.into(), message: MidiMessage::NoteOn { key: note.key.into(), vel: note.velocity.into() } }));
        events.push((note.onset_tick + note.dur_tick, TrackEventKind::Midi { channel: part.channel.into(), message: MidiMessage::NoteOff { key: note.key.into(), vel: 0.into() } }));
    }

    events.sort_by_key(|(tick, _)| *tick);

    let mut track = Vec::with_capacity(events.len() + 1);
    let mut prev_tick = 0u64;
    for (tick, kind) in events {
        let delta = tick.saturating_sub(prev_tick);
        track.push(TrackEvent { delta: (delta as u32).into(), kind });
        prev_tick = tick;
    }
    track.push(TrackEvent { delta: 0.into(), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) });
    track
}

#[cfg(test)]
mod tests {
    use num_rational::Rational32;

    use super::*;
    use crate::concepts::{Accidental, Letter, Pitch};
    use crate::graph::Graph;

    fn two_note_line() -> (Graph, Geometry) {
        let mut g = Graph::new();
        let a = g.add_island();
        let b = g.add_island();
        g.link_partwise(a, b);
        g.set_root(a);

        let chord_a = g.add_chord(Rational32::new(1, 4));
        g.add_note(chord_a, Pitch::new(Letter::C, Accidental::Natural, 4));
        g.place_token(a, chord_a);

        let chord_b = g.add_chord(Rational32::new(1, 4));
        g.add_note(chord_b, Pitch::new(Letter::D, Accidental::Natural, 4));
        g.place_token(b, chord_b);

        let geom = crate::geometry::parse(&g).unwrap();
        (g, geom)
    }

    #[test]
    fn two_quarters_project_to_two_notes_a_quarter_apart() {
        let (g, geom) = two_note_line();
        let score = project(&g, &geom, 480, 120.0);
        assert_eq!(score.parts.len(), 1);
        let notes = &score.parts[0].notes;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].key, 60);
        assert_eq!(notes[1].key, 62);
        assert_eq!(notes[1].onset_tick - notes[0].onset_tick, 480);
    }

    #[test]
    fn tied_notes_consolidate_into_one() {
        let mut g = Graph::new();
        let a = g.add_island();
        let b = g.add_island();
        g.link_partwise(a, b);
        g.set_root(a);

        let chord_a = g.add_chord(Rational32::new(1, 4));
        let note_a = g.add_note(chord_a, Pitch::new(Letter::C, Accidental::Natural, 4));
        g.place_token(a, chord_a);

        let chord_b = g.add_chord(Rational32::new(1, 4));
        let note_b = g.add_note(chord_b, Pitch::new(Letter::C, Accidental::Natural, 4));
        g.place_token(b, chord_b);
        g.link_tie(note_a, note_b);

        let geom = crate::geometry::parse(&g).unwrap();
        let score = project(&g, &geom, 480, 120.0);
        let notes = &score.parts[0].notes;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].dur_tick, 960);
    }

    #[test]
    fn smf_bytes_start_with_header() {
        let (g, geom) = two_note_line();
        let score = project(&g, &geom, 480, 120.0);
        let bytes = write_smf(&score).unwrap();
        assert_eq!(&bytes[0..4], b"MThd");
    }
}
