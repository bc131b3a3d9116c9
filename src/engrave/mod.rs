//! Per-island engraving (spec §4.3-§4.12): turns each island's tokens
//! into a [`crate::stamp::Stamp`] in *local*, island-relative
//! coordinates. Cross-island graphics (beams, tuplet brackets, ties,
//! float spans) need absolute x and so are engraved in a later pass,
//! once [`crate::typeset`] has placed every island — see
//! [`engrave_cross_island`].
//!
//! Collision avoidance within an island uses whole-bounding-box
//! shifting rather than segmented-hull detail; see `DESIGN.md` for why
//! that simplification is safe at this scale (islands rarely host more
//! than two simultaneous voices, and those two are handled by the
//! explicit multichord-fusion rule in [`notehead::should_fuse`] rather
//! than generic collision shifting — fused pairs never register an
//! overlap here by construction, since the rule itself forbids
//! adjacent pitches between them).

pub mod accidental_stack;
pub mod articulation;
pub mod beam;
pub mod dots;
pub mod float_engraver;
pub mod ledger;
pub mod measure_rest;
pub mod notehead;
pub mod rest;
pub mod slur;
pub mod stem_flag;
pub mod tie;
pub mod tuplet;

use num_rational::Rational32;

use crate::concepts::{Accidental, Placement, StemDirectionConcept};
use crate::error::Diagnostic;
use crate::geometry::Geometry;
use crate::graph::validate::override_accidental;
use crate::graph::{ConceptValue, EdgeKind, FloatKind, Graph, NodeIndex, NodeKind, SpanKind, TokenKind};
use crate::stamp::{Bounds, GraphicPayload, Stamp, StampGraphic, StampSet, Transform};
use crate::state::{ChordInfo, EngraveState};
use crate::style::HouseStyle;

/// A 5-line staff's top/bottom line position, in staff-space units
/// (spec §3.6's convention: middle line 0, one unit per line/space).
const STAFF_TOP: f64 = 4.0;
const STAFF_BOTTOM: f64 = -4.0;

/// Engraves every island in `geom` into its own local-coordinate
/// [`Stamp`]. This is pass one of two (see module docs); the caller
/// runs [`engrave_cross_island`] after typesetting.
pub fn engrave_islands(
    graph: &Graph,
    geom: &Geometry,
    state: &mut EngraveState,
    style: &HouseStyle,
    diagnostics: &mut Vec<Diagnostic>,
) -> StampSet {
    let mut stamps = StampSet::new();

    let mut islands: Vec<NodeIndex> = Vec::new();
    for instant in geom.instants() {
        for part in geom.parts() {
            if let Some(island) = geom.island_at(instant, part) {
                if !islands.contains(&island) {
                    islands.push(island);
                }
            }
        }
    }

    for island in islands {
        let stamp = engrave_island(graph, island, state, style, diagnostics);
        stamps.insert(island, stamp);
    }
    stamps
}

fn engrave_island(graph: &Graph, island: NodeIndex, state: &mut EngraveState, style: &HouseStyle, diagnostics: &mut Vec<Diagnostic>) -> Stamp {
    let clef = state.part_at(island).map(|p| p.clef).unwrap_or(crate::concepts::Clef::Treble);
    let mut stamp = Stamp::new();
    let mut cursor_x = 0.0f64;
    let mut ledger_notes: Vec<ledger::LedgerNote> = Vec::new();
    let mut active_ranges: Vec<(i32, i32)> = Vec::new();

    let tokens: Vec<NodeIndex> = graph.tokens_of(island).collect();
    let chords: Vec<NodeIndex> = tokens.iter().copied().filter(|&t| graph.node(t).token_kind() == Some(TokenKind::Chord)).collect();

    for &token in &tokens {
        if matches!(
            graph.node(token).token_kind(),
            Some(TokenKind::Clef) | Some(TokenKind::KeySignature) | Some(TokenKind::TimeSignature) | Some(TokenKind::Barline)
        ) {
            let (sig_stamp, width) = engrave_signature_token(graph, token, cursor_x);
            stamp.append(sig_stamp);
            cursor_x += width;
        }
    }

    for &chord in &chords {
        let Some(info) = state.chord(chord).copied() else {
            diagnostics.push(Diagnostic::omitted("chord has no derived ChordInfo; skipped", chord));
            continue;
        };

        let range = (info.lowest, info.highest);
        if active_ranges.iter().any(|&(lo, hi)| range.0 <= hi && lo <= range.1) {
            cursor_x += 1.5;
        }
        active_ranges.push(range);

        let (chord_stamp, bounds, stem_geom) = engrave_chord(graph, chord, clef, &info, cursor_x, state, style, &mut ledger_notes, diagnostics);
        cursor_x = bounds.right.max(cursor_x);
        stamp.append(chord_stamp);
        if let Some(geom) = stem_geom {
            state.stems.insert(chord, geom);
        }
    }

    stamp.append(ledger::engrave(island, &ledger_notes, style));

    if let Some(island_state) = state.island_mut(island) {
        island_state.token_bounds = stamp.bounds();
    }

    stamp
}

fn engrave_signature_token(graph: &Graph, token: NodeIndex, x: f64) -> (Stamp, f64) {
    let mut stamp = Stamp::new();
    let (glyph, width): (&str, f64) = match graph.node(token).token_kind() {
        Some(TokenKind::Clef) => ("gClef", 2.5),
        Some(TokenKind::KeySignature) => {
            let fifths = graph.node(token).label.get_integer("Fifths").unwrap_or(0);
            let per = 0.8;
            (if fifths >= 0 { "accidentalSharp" } else { "accidentalFlat" }, per * fifths.unsigned_abs() as f64)
        }
        Some(TokenKind::TimeSignature) => ("timeSig", 2.0),
        Some(TokenKind::Barline) => ("barline", 0.3),
        _ => return (stamp, 0.0),
    };
    if width > 0.0 {
        let local = Bounds::new(0.0, -2.0, width.max(1.0), 2.0);
        stamp.push(StampGraphic::new(GraphicPayload::Glyph { smufl_name: glyph, local_bounds: local }, Transform::translate(x, 0.0), token));
    }
    (stamp, width + 0.5)
}

#[allow(clippy::too_many_arguments)]
fn engrave_chord(
    graph: &Graph,
    chord: NodeIndex,
    clef: crate::concepts::Clef,
    info: &ChordInfo,
    x: f64,
    state: &EngraveState,
    style: &HouseStyle,
    ledger_notes: &mut Vec<ledger::LedgerNote>,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Stamp, Bounds, Option<stem_flag::StemGeometry>) {
    let duration = graph.node(chord).label.get_rational("NoteValue").unwrap_or(Rational32::new(1, 4));
    let stem_up = info.stem_direction == StemDirectionConcept::Up;
    let is_rest = graph.node(chord).label.get_bool("Rest").unwrap_or(false);

    if is_rest {
        let (rest_stamp, bounds) = rest::engrave(chord, duration, x, stem_up, style);
        return (rest_stamp, bounds, None);
    }

    let notes = notehead::cluster_and_assign_columns(graph, chord, clef, stem_up);
    if notes.is_empty() {
        diagnostics.push(Diagnostic::omitted("chord has no pitched notes", chord));
        return (Stamp::new(), Bounds::EMPTY, None);
    }

    let (mut stamp, stem_x, notehead_bounds) = notehead::engrave_chord_noteheads(chord, &notes, duration, x, stem_up, style);

    let mut bounds = notehead_bounds;
    for n in &notes {
        ledger_notes.push(ledger::LedgerNote { staff_position: n.staff_position, left: notehead_bounds.left, right: notehead_bounds.right });
    }

    let to_emit: Vec<accidental_stack::AccidentalToEmit> = notes
        .iter()
        .filter(|n| state.emits_accidental(n.note))
        .filter_map(|n| {
            let base = match graph.node(n.note).label.get_concept("Value") {
                Some(ConceptValue::Pitch(p)) => p,
                _ => return None,
            };
            let accidental: Accidental = override_accidental(graph, n.note).unwrap_or(base.accidental);
            Some(accidental_stack::AccidentalToEmit { note: n.note, accidental, staff_position: n.staff_position })
        })
        .collect();

    if !to_emit.is_empty() {
        let (acc_stamp, new_left) = accidental_stack::engrave(chord, &to_emit, bounds.left, style);
        stamp.append(acc_stamp);
        bounds.left = new_left;
    }

    let dots = dots::dot_count(duration);
    if dots > 0 {
        let positions: Vec<i32> = {
            let mut p: Vec<i32> = notes.iter().map(|n| n.staff_position).collect();
            p.sort_unstable();
            p.dedup();
            p
        };
        let dot_stamp = dots::engrave(chord, &positions, dots, bounds.right, stem_up, style);
        bounds = bounds.union(dot_stamp.bounds());
        stamp.append(dot_stamp);
    }

    let attach_position = if stem_up { info.lowest } else { info.highest };
    let (stem_stamp, stem_geom) = stem_flag::engrave(chord, stem_x, attach_position, duration, stem_up, info.stem_has_beam, style);
    bounds = bounds.union(stem_stamp.bounds());
    stamp.append(stem_stamp);

    let marks = articulation::articulations_of(graph, chord);
    if !marks.is_empty() {
        let above = articulation::above(graph, chord, stem_up);
        let articulation_stamp = articulation::engrave(chord, &marks, stem_x, stem_geom.tip_y, above, STAFF_TOP, STAFF_BOTTOM);
        bounds = bounds.union(articulation_stamp.bounds());
        stamp.append(articulation_stamp);
    }

    (stamp, bounds, Some(stem_geom))
}

fn absolute_x(state: &EngraveState, island: NodeIndex, local_x: f64) -> f64 {
    state.island(island).map(|i| i.typeset_x).unwrap_or(0.0) + local_x
}

fn absolute_y(state: &EngraveState, island: NodeIndex, local_y: f64) -> f64 {
    state.island(island).map(|i| i.typeset_y).unwrap_or(0.0) + local_y
}

/// Pass two: cross-island graphics that need absolute (post-typeset)
/// positions — beam groups, tie curves, tuplet brackets, and float
/// spans. Each graphic is attached to the first island in its span.
pub fn engrave_cross_island(graph: &Graph, state: &EngraveState, stamps: &mut StampSet, style: &HouseStyle) {
    engrave_beam_groups(graph, state, stamps, style);
    engrave_ties(graph, state, stamps, style);
    engrave_slurs(graph, state, stamps, style);
    engrave_tuplets(graph, state, stamps, style);
    engrave_floats(graph, state, stamps);
    engrave_measure_rests(graph, state, stamps, style);
}

fn engrave_beam_groups(graph: &Graph, state: &EngraveState, stamps: &mut StampSet, style: &HouseStyle) {
    let mut visited = std::collections::HashSet::new();

    for node_idx in graph.node_indices() {
        if graph.node(node_idx).token_kind() != Some(TokenKind::Chord) {
            continue;
        }
        let begins = !graph.incoming(node_idx).iter().any(|&ix| matches!(graph.edge(ix).kind, EdgeKind::Beam));
        if !begins || visited.contains(&node_idx) {
            continue;
        }

        let mut strand: Vec<NodeIndex> = vec![node_idx];
        let mut cur = node_idx;
        while let Some(next) = graph.outgoing_of_kind(cur, |k| matches!(k, EdgeKind::Beam)).map(|e| e.to) {
            strand.push(next);
            cur = next;
        }
        if strand.len() < 2 {
            continue;
        }
        for &c in &strand {
            visited.insert(c);
        }

        let stems: Vec<beam::BeamStem> = strand
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| {
                let geom = state.stems.get(&c)?;
                let island = graph.owning_island(c)?;
                let duration = graph.node(c).label.get_rational("NoteValue").unwrap_or(Rational32::new(1, 8));
                let extra = stem_flag::flags_given_duration(duration).saturating_sub(1);
                Some(beam::BeamStem {
                    chord: c,
                    x: absolute_x(state, island, geom.x),
                    tip_y: absolute_y(state, island, geom.tip_y),
                    direction: geom.direction,
                    extra_levels: extra,
                    begins_group: i == 0,
                })
            })
            .collect();

        if stems.len() < 2 {
            continue;
        }
        let graphics = beam::engrave(&stems, style);
        if let Some(anchor_island) = graph.owning_island(node_idx) {
            if let Some(s) = stamps.get_mut(&anchor_island) {
                for g in graphics {
                    s.push(g);
                }
            }
        }
    }
}

fn engrave_ties(graph: &Graph, state: &EngraveState, stamps: &mut StampSet, style: &HouseStyle) {
    for (&note, &direction) in &state.tie_directions {
        let Some(chord) = graph.owning_chord(note) else { continue };
        let Some(island) = graph.owning_island(chord) else { continue };
        let Some(geom) = state.stems.get(&chord) else { continue };
        let Some(tie_edge) = graph.outgoing_of_kind(note, |k| matches!(k, EdgeKind::Tie)) else { continue };
        let Some(to_chord) = graph.owning_chord(tie_edge.to) else { continue };
        let Some(to_island) = graph.owning_island(to_chord) else { continue };
        let Some(to_geom) = state.stems.get(&to_chord) else { continue };

        let from_x = absolute_x(state, island, geom.x);
        let to_x = absolute_x(state, to_island, to_geom.x);
        let y = absolute_y(state, island, geom.notehead_y);
        let endpoints = tie::TieEndpoints { from: note, from_x, to_x, y, direction };
        let graphic = tie::engrave_curve(&endpoints, style);
        if let Some(s) = stamps.get_mut(&island) {
            s.push(graphic);
        }
    }
}

fn engrave_slurs(graph: &Graph, state: &EngraveState, stamps: &mut StampSet, style: &HouseStyle) {
    for node_idx in graph.node_indices() {
        if graph.node(node_idx).token_kind() != Some(TokenKind::Chord) {
            continue;
        }
        let (to, placement) = {
            let Some(e) = graph.outgoing_of_kind(node_idx, |k| matches!(k, EdgeKind::Slur)) else { continue };
            let placement = match e.label.get_concept("Placement") {
                Some(ConceptValue::Placement(p)) => p,
                _ => Placement::Above,
            };
            (e.to, placement)
        };

        let Some(from_island) = graph.owning_island(node_idx) else { continue };
        let Some(to_island) = graph.owning_island(to) else { continue };
        let Some(from_geom) = state.stems.get(&node_idx) else { continue };
        let Some(to_geom) = state.stems.get(&to) else { continue };

        let from_x = absolute_x(state, from_island, from_geom.x);
        let to_x = absolute_x(state, to_island, to_geom.x);
        let from_y = absolute_y(state, from_island, from_geom.notehead_y);
        let to_y = absolute_y(state, to_island, to_geom.notehead_y);
        let endpoints = slur::SlurEndpoints { anchor: node_idx, from_x, to_x, from_y, to_y, placement };
        let graphic = slur::engrave_curve(&endpoints, style);
        if let Some(s) = stamps.get_mut(&from_island) {
            s.push(graphic);
        }
    }
}

fn engrave_measure_rests(graph: &Graph, state: &EngraveState, stamps: &mut StampSet, style: &HouseStyle) {
    for node_idx in graph.node_indices() {
        if !graph.node(node_idx).is_island() {
            continue;
        }
        let (to, count) = {
            let Some(e) = graph.outgoing_of_kind(node_idx, |k| matches!(k, EdgeKind::Span(SpanKind::MeasureRest))) else { continue };
            (e.to, e.label.get_integer("Count").unwrap_or(0))
        };

        let Some(left_state) = state.island(node_idx) else { continue };
        let Some(right_state) = state.island(to) else { continue };

        let left_x = left_state.typeset_x + if left_state.token_bounds.is_empty() { 0.0 } else { left_state.token_bounds.right };
        let right_x = right_state.typeset_x + if right_state.token_bounds.is_empty() { 0.0 } else { right_state.token_bounds.left };

        let graphics = measure_rest::engrave(node_idx, count, left_x, right_x, style);
        if let Some(s) = stamps.get_mut(&node_idx) {
            for g in graphics {
                s.push(g);
            }
        }
    }
}

fn engrave_tuplets(graph: &Graph, state: &EngraveState, stamps: &mut StampSet, style: &HouseStyle) {
    let _ = style;
    for t in graph.node_indices() {
        if !matches!(graph.node(t).kind, NodeKind::Tuplet) {
            continue;
        }
        let tag = graph.node(t).label.get_text("Tag").unwrap_or("").to_string();
        let chords = tuplet::chords_of(graph, t, &tag);
        let (Some(&first), Some(&last)) = (chords.first(), chords.last()) else { continue };
        let (Some(first_island), Some(last_island)) = (graph.owning_island(first), graph.owning_island(last)) else { continue };

        let left_x = absolute_x(state, first_island, 0.0);
        let right_x = absolute_x(state, last_island, 0.0);
        let staff_top = absolute_y(state, first_island, STAFF_TOP);
        let staff_bottom = absolute_y(state, first_island, STAFF_BOTTOM);
        let first_info = state.chord(first);
        let beam_placed = first_info.map(|i| i.stem_has_beam).unwrap_or(false);
        let placement = tuplet::placement(graph, t, first_info, beam_placed);
        let label = tuplet::label_text(graph, t);
        let (bracket, text) = tuplet::engrave(t, left_x, right_x, staff_top, staff_bottom, placement, beam_placed, label);
        if let Some(s) = stamps.get_mut(&first_island) {
            s.push(bracket);
            s.push(text);
        }
    }
}

fn engrave_floats(graph: &Graph, state: &EngraveState, stamps: &mut StampSet) {
    for f in graph.node_indices() {
        let kind = match &graph.node(f).kind {
            NodeKind::Float(k) => *k,
            _ => continue,
        };
        let Some(start_island) = graph.incoming_of_kind(f, |k| matches!(k, EdgeKind::Float)).map(|e| e.from) else { continue };
        let start_x = absolute_x(state, start_island, 0.0);
        let staff_top = absolute_y(state, start_island, STAFF_TOP);
        let staff_bottom = absolute_y(state, start_island, STAFF_BOTTOM);
        let placement = match graph.node(f).label.get_concept("Placement") {
            Some(ConceptValue::Placement(p)) => p,
            _ => Placement::Above,
        };

        let stamp = match kind {
            FloatKind::Expression => {
                let text = graph.node(f).label.get_text("Text").unwrap_or("").to_string();
                Some(float_engraver::engrave_expression(f, &text, start_x, placement, staff_top, staff_bottom))
            }
            FloatKind::Pedal => graph
                .outgoing_of_kind(f, |k| matches!(k, EdgeKind::Span(SpanKind::Pedal)))
                .map(|e| e.to)
                .map(|end_island| float_engraver::engrave_pedal(f, start_x, absolute_x(state, end_island, 0.0), staff_bottom)),
            FloatKind::OctaveTransposition => graph
                .outgoing_of_kind(f, |k| matches!(k, EdgeKind::Span(SpanKind::OctaveTransposition)))
                .map(|e| e.to)
                .map(|end_island| {
                    let label = graph.node(f).label.get_text("Text").unwrap_or("8va").to_string();
                    float_engraver::engrave_octave(f, &label, start_x, absolute_x(state, end_island, 0.0), placement, staff_top, staff_bottom)
                }),
        };

        if let (Some(stamp), Some(s)) = (stamp, stamps.get_mut(&start_island)) {
            s.append(stamp);
        }
    }
}
