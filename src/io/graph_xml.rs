//! Graph XML import/export (spec §6.1): "a flat list of nodes and
//! edges with string attributes... lossless round-trip."
//!
//! The writer side is plain `quick_xml` event emission, grounded on
//! the teacher's event-based XML handling (`musicxml_to_midi::parse`
//! reads the same way quick_xml is used to write here). Every
//! attribute value is typed by a small per-`(NodeKind, key)` schema
//! baked into [`value_kind_of`]/[`edge_value_kind_of`] — the file
//! itself carries only strings, exactly as spec §6.1 describes, and
//! both sides of the round trip agree on how to read them back.

use std::io::Cursor;

use num_rational::Rational32;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::concepts::{Accidental, BarlineStyle, Clef, Letter, Placement, StemDirectionConcept};
use crate::error::{EngraveError, XmlError};
use crate::graph::{AttributeValue, ConceptValue, Edge, EdgeKind, FloatKind, Graph, NodeIndex, NodeKind, SpanKind, TokenKind};

use super::{pitch_from_str, pitch_to_string};

/// Serializes `graph` to the graph-XML exchange format.
pub fn to_xml(graph: &Graph) -> Result<String, EngraveError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Start(BytesStart::new("graph"))).map_err(xml_write_err)?;

    for idx in graph.node_indices() {
        write_node(&mut writer, graph, idx)?;
    }

    writer.write_event(Event::End(BytesEnd::new("graph"))).map_err(xml_write_err)?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| EngraveError::Xml(XmlError::Malformed(e.to_string())))
}

fn xml_write_err(e: quick_xml::Error) -> EngraveError {
    EngraveError::Xml(XmlError::Malformed(e.to_string()))
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, graph: &Graph, idx: NodeIndex) -> Result<(), EngraveError> {
    let node = graph.node(idx);
    let mut start = BytesStart::new("node");
    start.push_attribute(("id", node_id(idx).as_str()));
    if graph.root() == Some(idx) {
        start.push_attribute(("root", "true"));
    }
    for (k, v) in node_kind_attrs(&node.kind) {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    for (key, value) in node.label.iter() {
        start.push_attribute((key.as_str(), attr_to_string(value).as_str()));
    }

    let outgoing = graph.outgoing(idx);
    if outgoing.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_write_err)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_write_err)?;
    for &eidx in outgoing {
        write_edge(writer, graph.edge(eidx))?;
    }
    writer.write_event(Event::End(BytesEnd::new("node"))).map_err(xml_write_err)?;
    Ok(())
}

fn write_edge(writer: &mut Writer<Cursor<Vec<u8>>>, edge: &Edge) -> Result<(), EngraveError> {
    let mut start = BytesStart::new("edge");
    start.push_attribute(("to", node_id(edge.to).as_str()));
    for (k, v) in edge_kind_attrs(&edge.kind) {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    for (key, value) in edge.label.iter() {
        start.push_attribute((key.as_str(), attr_to_string(value).as_str()));
    }
    writer.write_event(Event::Empty(start)).map_err(xml_write_err)?;
    Ok(())
}

fn node_id(idx: NodeIndex) -> String {
    idx.index().to_string()
}

fn node_kind_attrs(kind: &NodeKind) -> Vec<(String, String)> {
    match kind {
        NodeKind::Island => vec![("Type".into(), "Island".into())],
        NodeKind::Token(t) => vec![("Type".into(), "Token".into()), ("Kind".into(), token_kind_name(*t).into())],
        NodeKind::Note => vec![("Type".into(), "Note".into())],
        NodeKind::Float(f) => vec![("Type".into(), "Float".into()), ("Kind".into(), float_kind_name(*f).into())],
        NodeKind::Tuplet => vec![("Type".into(), "Tuplet".into())],
        NodeKind::AnnotationTree => vec![("Type".into(), "AnnotationTree".into())],
        NodeKind::Annotation => vec![("Type".into(), "Annotation".into())],
    }
}

fn token_kind_name(t: TokenKind) -> &'static str {
    match t {
        TokenKind::Chord => "Chord",
        TokenKind::Clef => "Clef",
        TokenKind::KeySignature => "KeySignature",
        TokenKind::TimeSignature => "TimeSignature",
        TokenKind::Barline => "Barline",
    }
}

fn float_kind_name(f: FloatKind) -> &'static str {
    match f {
        FloatKind::Expression => "Expression",
        FloatKind::Pedal => "Pedal",
        FloatKind::OctaveTransposition => "OctaveTransposition",
    }
}

fn edge_kind_attrs(kind: &EdgeKind) -> Vec<(String, String)> {
    match kind {
        EdgeKind::Partwise => vec![("Type".into(), "Partwise".into())],
        EdgeKind::Instantwise => vec![("Type".into(), "Instantwise".into())],
        EdgeKind::Token => vec![("Type".into(), "Token".into())],
        EdgeKind::Note => vec![("Type".into(), "Note".into())],
        EdgeKind::Voice => vec![("Type".into(), "Voice".into())],
        EdgeKind::Beam => vec![("Type".into(), "Beam".into())],
        EdgeKind::Tie => vec![("Type".into(), "Tie".into())],
        EdgeKind::Slur => vec![("Type".into(), "Slur".into())],
        EdgeKind::Tuplet(tag) => vec![("Type".into(), "Tuplet".into()), ("Tag".into(), tag.clone())],
        EdgeKind::Span(s) => vec![("Type".into(), "Span".into()), ("SpanKind".into(), span_kind_name(*s).into())],
        EdgeKind::Float => vec![("Type".into(), "Float".into())],
        EdgeKind::Annotation => vec![("Type".into(), "Annotation".into())],
    }
}

fn span_kind_name(s: SpanKind) -> &'static str {
    match s {
        SpanKind::OctaveTransposition => "OctaveTransposition",
        SpanKind::Pedal => "Pedal",
        SpanKind::MeasureRest => "MeasureRest",
    }
}

fn attr_to_string(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Concept(c) => concept_to_string(*c),
        AttributeValue::Rational(r) => format!("{}/{}", r.numer(), r.denom()),
        AttributeValue::Integer(i) => i.to_string(),
        AttributeValue::Text(s) => s.clone(),
        AttributeValue::Bool(b) => b.to_string(),
    }
}

fn concept_to_string(c: ConceptValue) -> String {
    match c {
        ConceptValue::Pitch(p) => pitch_to_string(p),
        ConceptValue::DiatonicPitch(d) => format!("{}{}", letter_name(d.letter()), d.octave),
        ConceptValue::Letter(l) => letter_name(l).to_string(),
        ConceptValue::Accidental(a) => accidental_name(a).to_string(),
        ConceptValue::Clef(c) => clef_name(c).to_string(),
        ConceptValue::Placement(p) => placement_name(p).to_string(),
        ConceptValue::BarlineStyle(s) => barline_style_name(s).to_string(),
        ConceptValue::StemDirection(d) => stem_direction_name(d).to_string(),
    }
}

fn letter_name(l: Letter) -> &'static str {
    match l {
        Letter::C => "C",
        Letter::D => "D",
        Letter::E => "E",
        Letter::F => "F",
        Letter::G => "G",
        Letter::A => "A",
        Letter::B => "B",
    }
}

fn accidental_name(a: Accidental) -> &'static str {
    match a {
        Accidental::DoubleFlat => "DoubleFlat",
        Accidental::Flat => "Flat",
        Accidental::Natural => "Natural",
        Accidental::Sharp => "Sharp",
        Accidental::DoubleSharp => "DoubleSharp",
    }
}

fn clef_name(c: Clef) -> &'static str {
    match c {
        Clef::Treble => "Treble",
        Clef::Bass => "Bass",
        Clef::Alto => "Alto",
        Clef::Tenor => "Tenor",
        Clef::Percussion => "Percussion",
    }
}

fn placement_name(p: Placement) -> &'static str {
    match p {
        Placement::Above => "Above",
        Placement::Below => "Below",
    }
}

fn barline_style_name(s: BarlineStyle) -> &'static str {
    match s {
        BarlineStyle::Normal => "Normal",
        BarlineStyle::Final => "Final",
        BarlineStyle::RepeatStart => "RepeatStart",
        BarlineStyle::RepeatEnd => "RepeatEnd",
        BarlineStyle::Double => "Double",
    }
}

fn stem_direction_name(d: StemDirectionConcept) -> &'static str {
    match d {
        StemDirectionConcept::Up => "Up",
        StemDirectionConcept::Down => "Down",
    }
}

fn accidental_from_name(s: &str) -> Option<Accidental> {
    Some(match s {
        "DoubleFlat" => Accidental::DoubleFlat,
        "Flat" => Accidental::Flat,
        "Natural" => Accidental::Natural,
        "Sharp" => Accidental::Sharp,
        "DoubleSharp" => Accidental::DoubleSharp,
        _ => return None,
    })
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

fn placement_from_name(s: &str) -> Option<Placement> {
    Some(match s {
        "Above" => Placement::Above,
        "Below" => Placement::Below,
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

/// The attribute-value kind expected for `key` on a node of kind
/// `node_kind` (the schema that makes the string-only XML lossless).
enum ValueKind {
    Rational,
    Integer,
    Text,
    Bool,
    Pitch,
    Accidental,
    Clef,
    BarlineStyle,
    Placement,
}

fn node_value_kind(node_kind: &NodeKind, key: &str) -> Option<ValueKind> {
    if let Some(rest) = key.strip_prefix("Style:") {
        let _ = rest;
        return Some(ValueKind::Rational);
    }
    if key.starts_with("Articulation:") {
        return Some(ValueKind::Bool);
    }
    match (node_kind, key) {
        (NodeKind::Token(TokenKind::Chord), "NoteValue") => Some(ValueKind::Rational),
        (NodeKind::Token(TokenKind::Chord), "Rest") => Some(ValueKind::Bool),
        (NodeKind::Token(TokenKind::Chord), "ArticulationPlacement") => Some(ValueKind::Placement),
        (NodeKind::Token(TokenKind::Clef), "Clef") => Some(ValueKind::Clef),
        (NodeKind::Token(TokenKind::KeySignature), "Fifths") => Some(ValueKind::Integer),
        (NodeKind::Token(TokenKind::TimeSignature), "Numerator" | "Denominator") => Some(ValueKind::Integer),
        (NodeKind::Token(TokenKind::Barline), "Style") => Some(ValueKind::BarlineStyle),
        (NodeKind::Note, "Value") => Some(ValueKind::Pitch),
        (NodeKind::Note, "AccidentalOverride") => Some(ValueKind::Accidental),
        (NodeKind::Note, "AccidentalOverrideVisible") => Some(ValueKind::Bool),
        (NodeKind::Tuplet, "Value") => Some(ValueKind::Rational),
        (NodeKind::Tuplet, "Tag") => Some(ValueKind::Text),
        _ => None,
    }
}

fn parse_attr_value(node_kind: &NodeKind, key: &str, raw: &str) -> Result<AttributeValue, EngraveError> {
    let kind = node_value_kind(node_kind, key).unwrap_or(ValueKind::Text);
    Ok(match kind {
        ValueKind::Rational => AttributeValue::Rational(parse_rational(raw)?),
        ValueKind::Integer => AttributeValue::Integer(
            raw.parse().map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("bad integer `{raw}` for `{key}`"))))?,
        ),
        ValueKind::Text => AttributeValue::Text(raw.to_string()),
        ValueKind::Bool => AttributeValue::Bool(
            raw.parse().map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("bad bool `{raw}` for `{key}`"))))?,
        ),
        ValueKind::Pitch => {
            let pitch = pitch_from_str(raw).ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad pitch `{raw}`"))))?;
            AttributeValue::Concept(ConceptValue::Pitch(pitch))
        }
        ValueKind::Accidental => {
            let a = accidental_from_name(raw).ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad accidental `{raw}`"))))?;
            AttributeValue::Concept(ConceptValue::Accidental(a))
        }
        ValueKind::Clef => {
            let c = clef_from_name(raw).ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad clef `{raw}`"))))?;
            AttributeValue::Concept(ConceptValue::Clef(c))
        }
        ValueKind::BarlineStyle => {
            let s = barline_style_from_name(raw).ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad barline style `{raw}`"))))?;
            AttributeValue::Concept(ConceptValue::BarlineStyle(s))
        }
        ValueKind::Placement => {
            let p = placement_from_name(raw).ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad placement `{raw}`"))))?;
            AttributeValue::Concept(ConceptValue::Placement(p))
        }
    })
}

fn parse_edge_attr_value(kind: &EdgeKind, key: &str, raw: &str) -> Result<AttributeValue, EngraveError> {
    if matches!(kind, EdgeKind::Slur) && key == "Placement" {
        let p = placement_from_name(raw).ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad placement `{raw}`"))))?;
        return Ok(AttributeValue::Concept(ConceptValue::Placement(p)));
    }
    if matches!(kind, EdgeKind::Span(SpanKind::MeasureRest)) && key == "Count" {
        let n: i64 = raw.parse().map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("bad integer `{raw}` for `Count`"))))?;
        return Ok(AttributeValue::Integer(n));
    }
    Ok(AttributeValue::Text(raw.to_string()))
}

fn parse_rational(raw: &str) -> Result<Rational32, EngraveError> {
    let (n, d) = raw
        .split_once('/')
        .ok_or_else(|| EngraveError::Xml(XmlError::Malformed(format!("bad rational `{raw}`"))))?;
    let n: i32 = n.parse().map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("bad rational `{raw}`"))))?;
    let d: i32 = d.parse().map_err(|_| EngraveError::Xml(XmlError::Malformed(format!("bad rational `{raw}`"))))?;
    Ok(Rational32::new(n, d))
}

fn node_kind_from_attrs(type_: &str, kind_attr: Option<&str>) -> Result<NodeKind, EngraveError> {
    Ok(match type_ {
        "Island" => NodeKind::Island,
        "Token" => {
            let kind_attr = kind_attr.ok_or_else(|| EngraveError::Xml(XmlError::MissingAttribute { element: "node".into(), attr: "Kind".into() }))?;
            let t = match kind_attr {
                "Chord" => TokenKind::Chord,
                "Clef" => TokenKind::Clef,
                "KeySignature" => TokenKind::KeySignature,
                "TimeSignature" => TokenKind::TimeSignature,
                "Barline" => TokenKind::Barline,
                other => return Err(EngraveError::Xml(XmlError::UnknownNodeKind(other.to_string()))),
            };
            NodeKind::Token(t)
        }
        "Note" => NodeKind::Note,
        "Float" => {
            let kind_attr = kind_attr.ok_or_else(|| EngraveError::Xml(XmlError::MissingAttribute { element: "node".into(), attr: "Kind".into() }))?;
            let f = match kind_attr {
                "Expression" => FloatKind::Expression,
                "Pedal" => FloatKind::Pedal,
                "OctaveTransposition" => FloatKind::OctaveTransposition,
                other => return Err(EngraveError::Xml(XmlError::UnknownNodeKind(other.to_string()))),
            };
            NodeKind::Float(f)
        }
        "Tuplet" => NodeKind::Tuplet,
        "AnnotationTree" => NodeKind::AnnotationTree,
        "Annotation" => NodeKind::Annotation,
        other => return Err(EngraveError::Xml(XmlError::UnknownNodeKind(other.to_string()))),
    })
}

fn edge_kind_from_attrs(type_: &str, tag_attr: Option<&str>, span_kind_attr: Option<&str>) -> Result<EdgeKind, EngraveError> {
    Ok(match type_ {
        "Partwise" => EdgeKind::Partwise,
        "Instantwise" => EdgeKind::Instantwise,
        "Token" => EdgeKind::Token,
        "Note" => EdgeKind::Note,
        "Voice" => EdgeKind::Voice,
        "Beam" => EdgeKind::Beam,
        "Tie" => EdgeKind::Tie,
        "Slur" => EdgeKind::Slur,
        "Tuplet" => EdgeKind::Tuplet(tag_attr.unwrap_or_default().to_string()),
        "Span" => {
            let span_kind_attr = span_kind_attr.ok_or_else(|| EngraveError::Xml(XmlError::MissingAttribute { element: "edge".into(), attr: "SpanKind".into() }))?;
            let s = match span_kind_attr {
                "OctaveTransposition" => SpanKind::OctaveTransposition,
                "Pedal" => SpanKind::Pedal,
                "MeasureRest" => SpanKind::MeasureRest,
                other => return Err(EngraveError::Xml(XmlError::UnknownNodeKind(other.to_string()))),
            };
            EdgeKind::Span(s)
        }
        "Float" => EdgeKind::Float,
        "Annotation" => EdgeKind::Annotation,
        other => return Err(EngraveError::Xml(XmlError::UnknownNodeKind(other.to_string()))),
    })
}

/// One `<node>` as read off the wire, before its edges are linked
/// (edges reference ids that may not have been read yet).
struct PendingNode {
    id: String,
    is_root: bool,
    kind: NodeKind,
    attrs: Vec<(String, String)>,
    edges: Vec<PendingEdge>,
}

struct PendingEdge {
    to: String,
    kind: EdgeKind,
    attrs: Vec<(String, String)>,
}

/// Parses the graph-XML exchange format back into a [`Graph`].
pub fn from_xml(xml: &str) -> Result<Graph, EngraveError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut pending: Vec<PendingNode> = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<PendingNode> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"node" => {
                current = Some(read_pending_node(e)?);
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"node" => {
                pending.push(read_pending_node(e)?);
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"edge" => {
                let edge = read_pending_edge(e)?;
                current.as_mut().ok_or_else(|| EngraveError::Xml(XmlError::Malformed("<edge> outside <node>".into())))?.edges.push(edge);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"node" => {
                if let Some(node) = current.take() {
                    pending.push(node);
                }
            }
            Ok(Event::Eof) => break,
            Ok(Event::Text(BytesText { .. })) => {}
            Err(e) => return Err(EngraveError::Xml(XmlError::Malformed(format!("xml error at {}: {e}", reader.buffer_position())))),
            _ => {}
        }
        buf.clear();
    }

    build_graph(pending)
}

fn attr_str(e: &BytesStart, key: &str) -> Option<String> {
    e.attributes().flatten().find(|a| a.key.as_ref() == key.as_bytes()).and_then(|a| a.unescape_value().ok().map(|c| c.into_owned()))
}

fn read_pending_node(e: &BytesStart) -> Result<PendingNode, EngraveError> {
    let id = attr_str(e, "id").ok_or_else(|| EngraveError::Xml(XmlError::MissingAttribute { element: "node".into(), attr: "id".into() }))?;
    let type_ = attr_str(e, "Type").ok_or_else(|| EngraveError::Xml(XmlError::MissingAttribute { element: "node".into(), attr: "Type".into() }))?;
    let kind_attr = attr_str(e, "Kind");
    let kind = node_kind_from_attrs(&type_, kind_attr.as_deref())?;
    let is_root = attr_str(e, "root").as_deref() == Some("true");

    let mut attrs = Vec::new();
    for a in e.attributes().flatten() {
        let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
        if matches!(key.as_str(), "id" | "Type" | "Kind" | "root") {
            continue;
        }
        let value = a.unescape_value().map_err(|err| EngraveError::Xml(XmlError::Malformed(err.to_string())))?.into_owned();
        attrs.push((key, value));
    }

    Ok(PendingNode { id, is_root, kind, attrs, edges: Vec::new() })
}

fn read_pending_edge(e: &BytesStart) -> Result<PendingEdge, EngraveError> {
    let to = attr_str(e, "to").ok_or_else(|| EngraveError::Xml(XmlError::MissingAttribute { element: "edge".into(), attr: "to".into() }))?;
    let type_ = attr_str(e, "Type").ok_or_else(|| EngraveError::Xml(XmlError::MissingAttribute { element: "edge".into(), attr: "Type".into() }))?;
    let tag = attr_str(e, "Tag");
    let span_kind = attr_str(e, "SpanKind");
    let kind = edge_kind_from_attrs(&type_, tag.as_deref(), span_kind.as_deref())?;

    let mut attrs = Vec::new();
    for a in e.attributes().flatten() {
        let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
        if matches!(key.as_str(), "to" | "Type" | "Tag" | "SpanKind") {
            continue;
        }
        let value = a.unescape_value().map_err(|err| EngraveError::Xml(XmlError::Malformed(err.to_string())))?.into_owned();
        attrs.push((key, value));
    }

    Ok(PendingEdge { to, kind, attrs })
}

fn build_graph(pending: Vec<PendingNode>) -> Result<Graph, EngraveError> {
    let mut graph = Graph::new();
    let mut id_map = std::collections::HashMap::new();

    for p in &pending {
        let idx = graph.add_node(p.kind.clone());
        id_map.insert(p.id.clone(), idx);
    }

    for p in &pending {
        let idx = id_map[&p.id];
        for (key, raw) in &p.attrs {
            let value = parse_attr_value(&graph.node(idx).kind, key, raw)?;
            graph.node_mut(idx).label.set(key.clone(), value);
        }
        if p.is_root {
            graph.set_root(idx);
        }
        for pe in &p.edges {
            let to = *id_map.get(&pe.to).ok_or_else(|| EngraveError::Xml(XmlError::DanglingEdge(pe.to.clone())))?;
            let eidx = graph.add_edge(idx, to, pe.kind.clone());
            for (key, raw) in &pe.attrs {
                let value = parse_edge_attr_value(&pe.kind, key, raw)?;
                graph.edge_mut(eidx).label.set(key.clone(), value);
            }
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use num_rational::Rational32;

    use super::*;
    use crate::concepts::{Letter, Pitch};

    fn sample_graph() -> Graph {
        let mut g = Graph::new();
        let a = g.add_island();
        let b = g.add_island();
        g.link_partwise(a, b);

        let chord = g.add_chord(Rational32::new(1, 4));
        let note = g.add_note(chord, Pitch::new(Letter::C, Accidental::Sharp, 4));
        let _ = note;
        g.place_token(a, chord);

        let barline = g.add_barline(BarlineStyle::Final);
        g.place_token(b, barline);

        g.set_root(a);
        g
    }

    #[test]
    fn round_trips_through_xml() {
        let g = sample_graph();
        let xml = to_xml(&g).unwrap();
        let g2 = from_xml(&xml).unwrap();

        assert_eq!(g2.node_count(), g.node_count());
        assert!(g2.root().is_some());

        let root = g2.root().unwrap();
        assert!(g2.node(root).is_island());
        let chord = g2.tokens_of(root).find(|&t| g2.node(t).token_kind() == Some(TokenKind::Chord)).unwrap();
        assert_eq!(g2.node(chord).label.get_rational("NoteValue"), Some(Rational32::new(1, 4)));

        let note = g2.notes_of(chord).next().unwrap();
        assert_eq!(g2.node(note).label.get_concept("Value"), Some(ConceptValue::Pitch(Pitch::new(Letter::C, Accidental::Sharp, 4))));
    }
}
