//! Round-trip laws for the external interfaces (spec §8): "`graph →
//! xml → graph` is semantically identity (attribute-equivalent)" and
//! "`shorthand → graph → xml → graph` collapses to identity under
//! shorthand's expressible subset."

use std::io::Write;

use engrave_core::concepts::{Accidental, BarlineStyle, Clef, Letter, Pitch};
use engrave_core::graph::{ConceptValue, Graph, TokenKind};
use engrave_core::io::{graph_xml, musicxml, shorthand};

fn build_sample_graph() -> Graph {
    let mut g = Graph::new();

    let clef_island = g.add_island();
    let clef = g.add_clef(Clef::Treble);
    g.place_token(clef_island, clef);

    let a = g.add_island();
    let chord_a = g.add_chord(num_rational::Rational32::new(1, 4));
    g.add_note(chord_a, Pitch::new(Letter::C, Accidental::Sharp, 4));
    g.place_token(a, chord_a);

    let b = g.add_island();
    let chord_b = g.add_chord(num_rational::Rational32::new(1, 8));
    g.add_note(chord_b, Pitch::new(Letter::E, Accidental::Flat, 4));
    let barline = g.add_barline(BarlineStyle::Final);
    g.place_token(b, chord_b);
    g.place_token(b, barline);

    g.link_partwise(clef_island, a);
    g.link_partwise(a, b);
    g.set_root(clef_island);

    g
}

fn attribute_fingerprint(g: &Graph) -> Vec<String> {
    let mut lines = Vec::new();
    for idx in g.node_indices() {
        let node = g.node(idx);
        let mut attrs: Vec<String> = node.label.iter().map(|(k, v)| format!("{k}={v:?}")).collect();
        attrs.sort();
        lines.push(format!("{:?}:{}", node.kind, attrs.join(",")));
    }
    lines.sort();
    lines
}

#[test]
fn graph_to_xml_to_graph_is_attribute_equivalent() {
    let original = build_sample_graph();
    let xml = graph_xml::to_xml(&original).expect("serialize");
    let reconstructed = graph_xml::from_xml(&xml).expect("parse");

    assert_eq!(reconstructed.node_count(), original.node_count());
    assert_eq!(attribute_fingerprint(&reconstructed), attribute_fingerprint(&original));
}

#[test]
fn graph_xml_round_trips_through_a_temp_file() {
    let original = build_sample_graph();
    let xml = graph_xml::to_xml(&original).expect("serialize");

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(xml.as_bytes()).expect("write");

    let read_back = std::fs::read_to_string(file.path()).expect("read");
    let reconstructed = graph_xml::from_xml(&read_back).expect("parse");
    assert_eq!(reconstructed.node_count(), original.node_count());
}

#[test]
fn shorthand_to_graph_to_xml_to_graph_collapses_to_identity() {
    let source = "\
0,0;Type:Clef,Clef:Treble;
0,1;Type:Chord,NoteValue:1/4;C#4
0,2;Type:Chord,NoteValue:1/8;Eb4
0,2;Type:Barline,Style:Final;
";
    let via_shorthand = shorthand::parse(source).expect("shorthand parse");
    let xml = graph_xml::to_xml(&via_shorthand).expect("serialize");
    let round_tripped = graph_xml::from_xml(&xml).expect("parse back");

    assert_eq!(round_tripped.node_count(), via_shorthand.node_count());
    assert_eq!(attribute_fingerprint(&round_tripped), attribute_fingerprint(&via_shorthand));

    let root = round_tripped.root().expect("root");
    let clef = round_tripped.tokens_of(root).find(|&t| round_tripped.node(t).token_kind() == Some(TokenKind::Clef));
    assert!(clef.is_some());
}

#[test]
fn musicxml_import_produces_the_same_shape_as_shorthand() {
    let xml_source = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name>Piano</part-name></score-part></part-list>
  <part id="P1">
    <measure number="1">
      <attributes>
        <divisions>4</divisions>
        <clef><sign>G</sign><line>2</line></clef>
      </attributes>
      <note><pitch><step>C</step><alter>1</alter><octave>4</octave></pitch><duration>4</duration><type>quarter</type></note>
      <note><pitch><step>E</step><alter>-1</alter><octave>4</octave></pitch><duration>2</duration><type>eighth</type></note>
      <barline location="right"><bar-style>light-heavy</bar-style></barline>
    </measure>
  </part>
</score-partwise>"#;

    let g = musicxml::parse(xml_source).expect("musicxml parse");
    let root = g.root().expect("root");

    let clef_token = g.tokens_of(root).find(|&t| g.node(t).token_kind() == Some(TokenKind::Clef)).expect("clef");
    assert_eq!(g.node(clef_token).label.get_concept("Clef"), Some(ConceptValue::Clef(Clef::Treble)));

    let first_chord = g.partwise_from(root).nth(1).and_then(|isl| g.tokens_of(isl).find(|&t| g.node(t).token_kind() == Some(TokenKind::Chord)));
    let first_chord = first_chord.expect("first chord");
    let note = g.notes_of(first_chord).next().expect("note");
    assert_eq!(g.node(note).label.get_concept("Value"), Some(ConceptValue::Pitch(Pitch::new(Letter::C, Accidental::Sharp, 4))));

    let xml_out = graph_xml::to_xml(&g).expect("serialize");
    let reconstructed = graph_xml::from_xml(&xml_out).expect("parse back");
    assert_eq!(reconstructed.node_count(), g.node_count());
}
