//! MusicXML import (spec §6.3): "Parses the partwise MusicXML dialect
//! into the same graph. Unsupported features explicitly rejected:
//! time-modifications (tuplets not in this path), cross-staff
//! beaming."
//!
//! Grounded on the teacher's `converters::musicxml::musicxml_to_ir::parser`:
//! a `roxmltree` DOM walk, one `MeasureState` per measure carrying the
//! divisions/key/time/clef state that `<attributes>` mutates ahead of
//! the notes it applies to, mirrored here as [`MeasureState`]. Unlike
//! the teacher, this importer writes straight into a [`Graph`] via
//! [`crate::graph::builder`] rather than an intermediate IR, since the
//! graph already **is** the intermediate representation this core
//! wants (spec §3.1).
//!
//! Per spec §7: "MusicXML importer fails fast at the structural level
//! and aborts the import — the existing graph is not partially
//! populated." Every function here returns `Result` and the caller
//! only sees a finished [`Graph`] on success.

use log::warn;
use num_rational::Rational32;
use roxmltree::{Document, Node};

use crate::concepts::{Accidental, BarlineStyle, Clef, Letter, Pitch};
use crate::error::{EngraveError, XmlError};
use crate::graph::{Graph, NodeIndex};

/// Divisions-per-quarter default MusicXML assumes absent an explicit
/// `<divisions>` (matches the teacher's `MeasureState::default`).
const DEFAULT_DIVISIONS: u32 = 4;

struct MeasureState {
    divisions: u32,
    pending_clef: Option<Clef>,
    pending_key_fifths: Option<i64>,
    pending_time: Option<(i64, i64)>,
}

impl Default for MeasureState {
    fn default() -> Self {
        MeasureState { divisions: DEFAULT_DIVISIONS, pending_clef: None, pending_key_fifths: None, pending_time: None }
    }
}

/// One part's flattened event list: islands not yet linked to other
/// parts, in partwise order.
struct PartEvents {
    islands: Vec<NodeIndex>,
}

/// Parses a MusicXML document (`<score-partwise>`) into a [`Graph`].
pub fn parse(xml: &str) -> Result<Graph, EngraveError> {
    let doc = Document::parse(xml).map_err(|e| EngraveError::Xml(XmlError::Malformed(format!("{e}"))))?;
    let root = doc.root_element();

    if root.tag_name().name() != "score-partwise" {
        return Err(EngraveError::UnsupportedFeature(format!(
            "root element `{}`, only score-partwise is supported",
            root.tag_name().name()
        )));
    }

    let mut graph = Graph::new();
    let mut parts = Vec::new();

    for part_node in root.children().filter(|n| n.tag_name().name() == "part") {
        parts.push(parse_part(&mut graph, &part_node)?);
    }

    if parts.is_empty() {
        return Err(EngraveError::InvalidGraph("score has no parts".into()));
    }

    wire_score(&mut graph, &parts);

    Ok(graph)
}

fn parse_part(graph: &mut Graph, part_node: &Node) -> Result<PartEvents, EngraveError> {
    let mut state = MeasureState::default();
    let mut islands = Vec::new();

    for measure_node in part_node.children().filter(|n| n.tag_name().name() == "measure") {
        parse_measure(graph, &measure_node, &mut state, &mut islands)?;
    }

    Ok(PartEvents { islands })
}

fn parse_measure(
    graph: &mut Graph,
    measure_node: &Node,
    state: &mut MeasureState,
    islands: &mut Vec<NodeIndex>,
) -> Result<(), EngraveError> {
    let mut last_island: Option<NodeIndex> = None;
    let mut last_chord_by_staff: std::collections::HashMap<i64, NodeIndex> = std::collections::HashMap::new();
    let mut beam_staff_of_group: std::collections::HashMap<u32, i64> = std::collections::HashMap::new();

    for child in measure_node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "attributes" => parse_attributes(&child, state)?,
            "note" => {
                let staff = child
                    .children()
                    .find(|n| n.tag_name().name() == "staff")
                    .and_then(|n| n.text())
                    .and_then(|t| t.parse::<i64>().ok())
                    .unwrap_or(1);

                check_no_time_modification(&child)?;
                check_no_cross_staff_beam(&child, staff, &mut beam_staff_of_group)?;

                let is_chord_continuation = child.children().any(|n| n.tag_name().name() == "chord");
                if is_chord_continuation {
                    let Some(&chord) = last_chord_by_staff.get(&staff) else {
                        return Err(EngraveError::Xml(XmlError::Malformed("<chord/> with no preceding note in this measure".into())));
                    };
                    add_note_to_chord(graph, &child, chord)?;
                    continue;
                }

                let island = graph.add_island();
                flush_pending_tokens(graph, island, state);

                let chord = parse_note_to_chord(graph, &child, state)?;
                graph.place_token(island, chord);
                last_chord_by_staff.insert(staff, chord);

                islands.push(island);
                last_island = Some(island);
            }
            "barline" => {
                if let Some(island) = last_island {
                    if let Some(style) = parse_barline_style(&child) {
                        let token = graph.add_barline(style);
                        graph.place_token(island, token);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Attaches any attribute tokens (clef/key/time) accumulated since the
/// last island onto `island`, in a stable order, before the chord that
/// motivated `island`'s creation.
fn flush_pending_tokens(graph: &mut Graph, island: NodeIndex, state: &mut MeasureState) {
    if let Some(clef) = state.pending_clef.take() {
        let token = graph.add_clef(clef);
        graph.place_token(island, token);
    }
    if let Some(fifths) = state.pending_key_fifths.take() {
        let token = graph.add_key_signature(fifths);
        graph.place_token(island, token);
    }
    if let Some((num, den)) = state.pending_time.take() {
        let token = graph.add_time_signature(num, den);
        graph.place_token(island, token);
    }
}

fn parse_attributes(attr_node: &Node, state: &mut MeasureState) -> Result<(), EngraveError> {
    for child in attr_node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "divisions" => {
                if let Some(text) = child.text() {
                    state.divisions = text.parse().unwrap_or(DEFAULT_DIVISIONS).max(1);
                }
            }
            "key" => {
                if let Some(fifths_text) = child.children().find(|n| n.tag_name().name() == "fifths").and_then(|n| n.text()) {
                    if let Ok(fifths) = fifths_text.parse::<i64>() {
                        state.pending_key_fifths = Some(fifths);
                    }
                }
            }
            "time" => {
                let beats = child.children().find(|n| n.tag_name().name() == "beats").and_then(|n| n.text()).and_then(|t| t.parse::<i64>().ok());
                let beat_type = child.children().find(|n| n.tag_name().name() == "beat-type").and_then(|n| n.text()).and_then(|t| t.parse::<i64>().ok());
                if let (Some(b), Some(bt)) = (beats, beat_type) {
                    state.pending_time = Some((b, bt));
                }
            }
            "clef" => {
                if let Some(sign) = child.children().find(|n| n.tag_name().name() == "sign").and_then(|n| n.text()) {
                    state.pending_clef = Some(clef_from_sign(sign));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn clef_from_sign(sign: &str) -> Clef {
    match sign {
        "G" => Clef::Treble,
        "F" => Clef::Bass,
        "C" => Clef::Alto,
        "percussion" => Clef::Percussion,
        _ => Clef::Treble,
    }
}

fn parse_barline_style(barline_node: &Node) -> Option<BarlineStyle> {
    let bar_style = barline_node.children().find(|n| n.tag_name().name() == "bar-style").and_then(|n| n.text());
    let repeat_direction = barline_node
        .children()
        .find(|n| n.tag_name().name() == "repeat")
        .and_then(|n| n.attribute("direction"));

    match (bar_style, repeat_direction) {
        (_, Some("forward")) => Some(BarlineStyle::RepeatStart),
        (_, Some("backward")) => Some(BarlineStyle::RepeatEnd),
        (Some("light-heavy"), _) => Some(BarlineStyle::Final),
        (Some("light-light"), _) => Some(BarlineStyle::Double),
        (Some("regular"), _) | (None, _) => Some(BarlineStyle::Normal),
        _ => Some(BarlineStyle::Normal),
    }
}

fn parse_note_to_chord(graph: &mut Graph, note_node: &Node, state: &MeasureState) -> Result<NodeIndex, EngraveError> {
    let is_rest = note_node.children().any(|n| n.tag_name().name() == "rest");
    let duration = parse_duration(note_node, state)?;

    let chord = if is_rest { graph.add_rest(duration) } else { graph.add_chord(duration) };

    if !is_rest {
        let pitch_node = note_node
            .children()
            .find(|n| n.tag_name().name() == "pitch")
            .ok_or_else(|| EngraveError::Xml(XmlError::Malformed("<note> missing <pitch>".into())))?;
        let pitch = parse_pitch(&pitch_node)?;
        graph.add_note(chord, pitch);
    }

    Ok(chord)
}

fn add_note_to_chord(graph: &mut Graph, note_node: &Node, chord: NodeIndex) -> Result<(), EngraveError> {
    if note_node.children().any(|n| n.tag_name().name() == "rest") {
        return Ok(());
    }
    let pitch_node = note_node
        .children()
        .find(|n| n.tag_name().name() == "pitch")
        .ok_or_else(|| EngraveError::Xml(XmlError::Malformed("<note><chord/> missing <pitch>".into())))?;
    let pitch = parse_pitch(&pitch_node)?;
    graph.add_note(chord, pitch);
    Ok(())
}

fn parse_duration(note_node: &Node, state: &MeasureState) -> Result<Rational32, EngraveError> {
    let divs = note_node
        .children()
        .find(|n| n.tag_name().name() == "duration")
        .and_then(|n| n.text())
        .and_then(|t| t.parse::<i32>().ok())
        .ok_or_else(|| EngraveError::Xml(XmlError::Malformed("<note> missing <duration>".into())))?;
    // MusicXML's duration is in `divisions`-per-quarter units; a whole
    // note is `4 * divisions` of them.
    Ok(Rational32::new(divs, state.divisions as i32 * 4))
}

fn parse_pitch(pitch_node: &Node) -> Result<Pitch, EngraveError> {
    let step = pitch_node
        .children()
        .find(|n| n.tag_name().name() == "step")
        .and_then(|n| n.text())
        .ok_or_else(|| EngraveError::Xml(XmlError::Malformed("<pitch> missing <step>".into())))?;
    let letter = letter_from_step(step)?;

    let alter = pitch_node
        .children()
        .find(|n| n.tag_name().name() == "alter")
        .and_then(|n| n.text())
        .and_then(|t| t.parse::<i32>().ok())
        .unwrap_or(0);
    let accidental = accidental_from_alter(alter)?;

    let octave = pitch_node
        .children()
        .find(|n| n.tag_name().name() == "octave")
        .and_then(|n| n.text())
        .and_then(|t| t.parse::<i32>().ok())
        .ok_or_else(|| EngraveError::Xml(XmlError::Malformed("<pitch> missing <octave>".into())))?;

    Ok(Pitch::new(letter, accidental, octave))
}

fn letter_from_step(step: &str) -> Result<Letter, EngraveError> {
    Ok(match step {
        "C" => Letter::C,
        "D" => Letter::D,
        "E" => Letter::E,
        "F" => Letter::F,
        "G" => Letter::G,
        "A" => Letter::A,
        "B" => Letter::B,
        other => return Err(EngraveError::Xml(XmlError::Malformed(format!("bad pitch step `{other}`")))),
    })
}

fn accidental_from_alter(alter: i32) -> Result<Accidental, EngraveError> {
    Ok(match alter {
        -2 => Accidental::DoubleFlat,
        -1 => Accidental::Flat,
        0 => Accidental::Natural,
        1 => Accidental::Sharp,
        2 => Accidental::DoubleSharp,
        other => return Err(EngraveError::UnsupportedFeature(format!("microtonal alter `{other}` in MusicXML import"))),
    })
}

/// Spec §6.3/§7: time-modifications (tuplets on this import path) are
/// explicitly rejected, fail-fast.
fn check_no_time_modification(note_node: &Node) -> Result<(), EngraveError> {
    if note_node.children().any(|n| n.tag_name().name() == "time-modification") {
        warn!("musicxml import: rejecting <time-modification> (tuplets not supported on this import path)");
        return Err(EngraveError::UnsupportedFeature("time-modification (tuplet) in MusicXML import".into()));
    }
    Ok(())
}

/// Spec §6.3/§7: cross-staff beaming is explicitly rejected. Tracks,
/// per open beam-group number, the staff the group started on; a
/// later beam continuation/end on a different staff is cross-staff.
fn check_no_cross_staff_beam(
    note_node: &Node,
    staff: i64,
    beam_staff_of_group: &mut std::collections::HashMap<u32, i64>,
) -> Result<(), EngraveError> {
    for beam_node in note_node.children().filter(|n| n.tag_name().name() == "beam") {
        let number: u32 = beam_node.attribute("number").and_then(|s| s.parse().ok()).unwrap_or(1);
        let value = beam_node.text().unwrap_or("");

        match value {
            "begin" => {
                beam_staff_of_group.insert(number, staff);
            }
            "continue" | "end" | "forward hook" | "backward hook" => {
                if let Some(&started_on) = beam_staff_of_group.get(&number) {
                    if started_on != staff {
                        warn!("musicxml import: rejecting cross-staff beam (group {number} started on staff {started_on}, continues on staff {staff})");
                        return Err(EngraveError::UnsupportedFeature("cross-staff beaming in MusicXML import".into()));
                    }
                }
                if value == "end" {
                    beam_staff_of_group.remove(&number);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Wires the per-part island lists into the graph's structural shape:
/// a `Partwise` chain per part, an `Instantwise` chain per instant
/// (part 0 down through the last part), root at part 0's first
/// island. Parts of unequal length are truncated to the shortest,
/// with a warning (spec doesn't define ragged multi-part alignment;
/// positional alignment is this importer's simplifying assumption).
fn wire_score(graph: &mut Graph, parts: &[PartEvents]) {
    for part in parts {
        for pair in part.islands.windows(2) {
            graph.link_partwise(pair[0], pair[1]);
        }
    }

    let instant_count = parts.iter().map(|p| p.islands.len()).min().unwrap_or(0);
    if parts.iter().any(|p| p.islands.len() != instant_count) {
        warn!("musicxml import: parts have unequal instant counts, truncating to {instant_count}");
    }

    for instant in 0..instant_count {
        for pair in parts.windows(2) {
            graph.link_instantwise(pair[0].islands[instant], pair[1].islands[instant]);
        }
    }

    if let Some(first_part) = parts.first() {
        if let Some(&root) = first_part.islands.first() {
            graph.set_root(root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TokenKind;

    const SINGLE_PART: &str = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name>Piano</part-name></score-part></part-list>
  <part id="P1">
    <measure number="1">
      <attributes>
        <divisions>4</divisions>
        <key><fifths>0</fifths></key>
        <time><beats>4</beats><beat-type>4</beat-type></time>
        <clef><sign>G</sign><line>2</line></clef>
      </attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration><type>quarter</type></note>
      <note><pitch><step>E</step><alter>-1</alter><octave>4</octave></pitch><duration>4</duration><type>quarter</type></note>
      <barline location="right"><bar-style>light-heavy</bar-style></barline>
    </measure>
  </part>
</score-partwise>"#;

    #[test]
    fn parses_single_part_with_clef_key_time_and_barline() {
        let g = parse(SINGLE_PART).unwrap();
        let root = g.root().unwrap();

        let clef = g.tokens_of(root).find(|&t| g.node(t).token_kind() == Some(TokenKind::Clef));
        assert!(clef.is_some());
        let key = g.tokens_of(root).find(|&t| g.node(t).token_kind() == Some(TokenKind::KeySignature));
        assert!(key.is_some());
        let time = g.tokens_of(root).find(|&t| g.node(t).token_kind() == Some(TokenKind::TimeSignature));
        assert!(time.is_some());
        let chord = g.tokens_of(root).find(|&t| g.node(t).token_kind() == Some(TokenKind::Chord)).unwrap();
        assert_eq!(g.node(chord).label.get_rational("NoteValue"), Some(Rational32::new(1, 4)));

        let second = g.partwise_from(root).nth(1).unwrap();
        let barline_island = second;
        let has_barline = g.tokens_of(barline_island).any(|t| g.node(t).token_kind() == Some(TokenKind::Barline));
        assert!(has_barline);
    }

    const TIME_MODIFICATION: &str = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name>Piano</part-name></score-part></part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>6</divisions></attributes>
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>2</duration>
        <type>eighth</type>
        <time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    #[test]
    fn rejects_time_modification() {
        let result = parse(TIME_MODIFICATION);
        assert!(matches!(result, Err(EngraveError::UnsupportedFeature(_))));
    }

    const CROSS_STAFF_BEAM: &str = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name>Piano</part-name></score-part></part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>2</divisions></attributes>
      <note>
        <pitch><step>C</step><octave>5</octave></pitch>
        <duration>1</duration><type>eighth</type><staff>1</staff>
        <beam number="1">begin</beam>
      </note>
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration><type>eighth</type><staff>2</staff>
        <beam number="1">end</beam>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    #[test]
    fn rejects_cross_staff_beam() {
        let result = parse(CROSS_STAFF_BEAM);
        assert!(matches!(result, Err(EngraveError::UnsupportedFeature(_))));
    }

    const CHORD_NOTES: &str = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name>Piano</part-name></score-part></part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>4</divisions></attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration><type>quarter</type></note>
      <note><chord/><pitch><step>E</step><octave>4</octave></pitch><duration>4</duration><type>quarter</type></note>
      <note><chord/><pitch><step>G</step><octave>4</octave></pitch><duration>4</duration><type>quarter</type></note>
    </measure>
  </part>
</score-partwise>"#;

    #[test]
    fn chord_marker_adds_notes_to_same_chord() {
        let g = parse(CHORD_NOTES).unwrap();
        let root = g.root().unwrap();
        let chord = g.tokens_of(root).find(|&t| g.node(t).token_kind() == Some(TokenKind::Chord)).unwrap();
        assert_eq!(g.notes_of(chord).count(), 3);
    }
}
