//! Shorthand line grammar (spec §6.2): "A semicolon-delimited line per
//! island: `part,instant;Key:Val,...;Note1,Note2,...`; converts to
//! graph XML."
//!
//! Each line describes one island's token (and, for a chord, its
//! notes). Lines may arrive in any order; islands are wired into
//! `Partwise` chains per part and `Instantwise` chains per instant
//! after every line has been read, the same two-pass shape
//! [`crate::io::musicxml`] uses for the same reason (an island's
//! neighbors may not exist yet when its own line is parsed).

use std::collections::BTreeMap;

use num_rational::Rational32;

use crate::concepts::{BarlineStyle, Clef};
use crate::error::{EngraveError, XmlError};
use crate::graph::{Graph, NodeIndex};

use super::pitch_from_str;

struct ShorthandLine {
    part: usize,
    instant: usize,
    attrs: BTreeMap<String, String>,
    notes: Vec<String>,
}

fn parse_line(line: &str, line_no: usize) -> Result<ShorthandLine, EngraveError> {
    let mut fields = line.splitn(3, ';');
    let coord = fields.next().unwrap_or_default();
    let attrs_field = fields.next().unwrap_or_default();
    let notes_field = fields.next().unwrap_or_default();

    let (part_str, instant_str) = coord
        .split_once(',')
        .ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("line {line_no}: expected `part,instant`, got `{coord}`"))))?;
    let part: usize = part_str
        .trim()
        .parse()
        .map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("line {line_no}: bad part `{part_str}`"))))?;
    let instant: usize = instant_str
        .trim()
        .parse()
        .map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("line {line_no}: bad instant `{instant_str}`"))))?;

    let mut attrs = BTreeMap::new();
    for pair in attrs_field.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (k, v) = pair
            .split_once(':')
            .ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("line {line_no}: bad attribute `{pair}`"))))?;
        attrs.insert(k.trim().to_string(), v.trim().to_string());
    }

    let notes = notes_field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Ok(ShorthandLine { part, instant, attrs, notes })
}

/// Builds a [`Graph`] from a shorthand-grammar string, one island per
/// non-blank line.
pub fn parse(source: &str) -> Result<Graph, EngraveError> {
    let mut lines = Vec::new();
    for (i, raw) in source.lines().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        lines.push(parse_line(raw, i + 1)?);
    }

    let mut graph = Graph::new();
    // (part, instant) -> island, so partwise/instantwise chains can be
    // wired up once every line has created its island. Two lines
    // sharing a coordinate (e.g. a chord and its trailing barline)
    // place their tokens on the same island rather than each getting
    // their own.
    let mut islands: BTreeMap<(usize, usize), NodeIndex> = BTreeMap::new();

    for line in &lines {
        let island = *islands.entry((line.part, line.instant)).or_insert_with(|| graph.add_island());
        add_token(&mut graph, island, line)?;
    }

    link_partwise_chains(&mut graph, &islands);
    link_instantwise_chains(&mut graph, &islands);

    if let Some(&root) = islands.get(&(0, 0)) {
        graph.set_root(root);
    } else if let Some((_, &first)) = islands.iter().next() {
        graph.set_root(first);
    }

    Ok(graph)
}

fn add_token(graph: &mut Graph, island: NodeIndex, line: &ShorthandLine) -> Result<(), EngraveError> {
    let Some(type_) = line.attrs.get("Type") else { return Ok(()) };

    match type_.as_str() {
        "Chord" => {
            let duration = line
                .attrs
                .get("NoteValue")
                .map(|s| parse_rational(s, "NoteValue"))
                .transpose()?
                .unwrap_or(Rational32::new(1, 4));
            let is_rest = line.attrs.get("Rest").map(|s| s == "true").unwrap_or(false);
            let chord = if is_rest { graph.add_rest(duration) } else { graph.add_chord(duration) };
            graph.place_token(island, chord);
            for note in &line.notes {
                let pitch = pitch_from_str(note)
                    .ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad note `{note}`"))))?;
                graph.add_note(chord, pitch);
            }
        }
        "Clef" => {
            let clef_name = line.attrs.get("Clef").map(String::as_str).unwrap_or("Treble");
            let clef = clef_from_name(clef_name).ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad clef `{clef_name}`"))))?;
            let token = graph.add_clef(clef);
            graph.place_token(island, token);
        }
        "KeySignature" => {
            let fifths = line.attrs.get("Fifths").map(|s| parse_integer(s, "Fifths")).transpose()?.unwrap_or(0);
            let token = graph.add_key_signature(fifths);
            graph.place_token(island, token);
        }
        "TimeSignature" => {
            let num = line.attrs.get("Numerator").map(|s| parse_integer(s, "Numerator")).transpose()?.unwrap_or(4);
            let den = line.attrs.get("Denominator").map(|s| parse_integer(s, "Denominator")).transpose()?.unwrap_or(4);
            let token = graph.add_time_signature(num, den);
            graph.place_token(island, token);
        }
        "Barline" => {
            let style_name = line.attrs.get("Style").map(String::as_str).unwrap_or("Normal");
            let style = barline_style_from_name(style_name)
                .ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad barline style `{style_name}`"))))?;
            let token = graph.add_barline(style);
            graph.place_token(island, token);
        }
        other => return Err(EngraveError::Xml(XmlError::UnknownNodeKind(other.to_string()))),
    }

    Ok(())
}

fn parse_rational(s: &str, field: &str) -> Result<Rational32, EngraveError> {
    let (n, d) = s.split_once('/').ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad rational `{s}` for `{field}`"))))?;
    let n: i32 = n.parse().map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("bad rational `{s}` for `{field}`"))))?;
    let d: i32 = d.parse().map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("bad rational `{s}` for `{field}`"))))?;
    Ok(Rational32::new(n, d))
}

fn parse_integer(s: &str, field: &str) -> Result<i64, EngraveError> {
    s.parse().map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("bad integer `{s}` for `{field}`"))))
}

fn clef_from_name(s: &str) -> Option<Clef> {
    Some(match s {
        "Treble" => Clef::Treble,
        "Bass" => Clef::Bass,
        "Alto" => Clef::Alto,
        "Tenor" => Clef::Tenor,
        "Percussion" => Clef::Percussion,
        _ => return None,
    })
}

fn barline_style_from_name(s: &str) -> Option<BarlineStyle> {
    Some(match s {
        "Normal" => BarlineStyle::Normal,
        "Final" => BarlineStyle::Final,
        "RepeatStart" => BarlineStyle::RepeatStart,
        "RepeatEnd" => BarlineStyle::RepeatEnd,
        "Double" => BarlineStyle::Double,
        _ => return None,
    })
}

/// Links each part's islands, ordered by instant, into a `Partwise`
/// chain.
fn link_partwise_chains(graph: &mut Graph, islands: &BTreeMap<(usize, usize), NodeIndex>) {
    let mut by_part: BTreeMap<usize, Vec<(usize, NodeIndex)>> = BTreeMap::new();
    for (&(part, instant), &island) in islands {
        by_part.entry(part).or_default().push((instant, island));
    }
    for chain in by_part.values_mut() {
        chain.sort_by_key(|&(instant, _)| instant);
        for pair in chain.windows(2) {
            graph.link_partwise(pair[0].1, pair[1].1);
        }
    }
}

/// Links each instant's islands, ordered by part (top to bottom), into
/// an `Instantwise` chain (spec's per-instant vertical column).
fn link_instantwise_chains(graph: &mut Graph, islands: &BTreeMap<(usize, usize), NodeIndex>) {
    let mut by_instant: BTreeMap<usize, Vec<(usize, NodeIndex)>> = BTreeMap::new();
    for (&(part, instant), &island) in islands {
        by_instant.entry(instant).or_default().push((part, island));
    }
    for column in by_instant.values_mut() {
        column.sort_by_key(|&(part, _)| part);
        for pair in column.windows(2) {
            graph.link_instantwise(pair[0].1, pair[1].1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::{Accidental, Letter, Pitch};
    use crate::graph::TokenKind;

    #[test]
    fn two_islands_one_part_chain() {
        let source = "0,0;Type:Chord,NoteValue:1/4;C4\n0,1;Type:Chord,NoteValue:1/4;D4\n";
        let g = parse(source).unwrap();
        assert_eq!(g.node_count(), 2 /* islands */ + 2 /* chords */ + 2 /* notes */);

        let root = g.root().unwrap();
        let chord = g.tokens_of(root).find(|&t| g.node(t).token_kind() == Some(TokenKind::Chord)).unwrap();
        let note = g.notes_of(chord).next().unwrap();
        assert_eq!(g.node(note).label.get_concept("Value"), Some(crate::graph::ConceptValue::Pitch(Pitch::new(Letter::C, Accidental::Natural, 4))));

        let next_island = g.partwise_from(root).nth(1).unwrap();
        let next_chord = g.tokens_of(next_island).find(|&t| g.node(t).token_kind() == Some(TokenKind::Chord)).unwrap();
        let next_note = g.notes_of(next_chord).next().unwrap();
        assert_eq!(g.node(next_note).label.get_concept("Value"), Some(crate::graph::ConceptValue::Pitch(Pitch::new(Letter::D, Accidental::Natural, 4))));
    }

    #[test]
    fn two_parts_same_instant_link_vertically() {
        let source = "0,0;Type:Chord,NoteValue:1/4;E4\n1,0;Type:Chord,NoteValue:1/4;G3\n";
        let g = parse(source).unwrap();
        let root = g.root().unwrap();
        let below = g.instantwise_of(root).next().unwrap();
        let chord = g.tokens_of(below).find(|&t| g.node(t).token_kind() == Some(TokenKind::Chord)).unwrap();
        let note = g.notes_of(chord).next().unwrap();
        assert_eq!(g.node(note).label.get_concept("Value"), Some(crate::graph::ConceptValue::Pitch(Pitch::new(Letter::G, Accidental::Natural, 3))));
    }

    #[test]
    fn rejects_malformed_coordinate() {
        let result = parse("not-a-coordinate;Type:Chord;C4\n");
        assert!(result.is_err());
    }
}
