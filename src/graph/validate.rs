//! Structural invariant checks (spec §3.1). Run once before geometry
//! parsing; a failure here is the one case the engraving core raises
//! rather than degrades (§7: `InvalidGraph`).

use std::collections::HashSet;

use crate::concepts::{Accidental, ConceptValue, Pitch};
use crate::error::EngraveError;

use super::edge::EdgeKind;
use super::node::NodeKind;
use super::{Graph, NodeIndex};

pub fn validate(graph: &Graph) -> Result<(), EngraveError> {
    let root = graph.root().ok_or_else(|| EngraveError::InvalidGraph("no root island".into()))?;
    check_connected(graph, root)?;
    check_chord_ownership(graph)?;
    check_note_ownership(graph)?;
    check_voice_beam_order(graph)?;
    check_ties(graph)?;
    Ok(())
}

/// Invariant 1: the graph is connected via `Partwise ∪ Instantwise`
/// among islands, reachable from the unique root.
fn check_connected(graph: &Graph, root: NodeIndex) -> Result<(), EngraveError> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(n) = stack.pop() {
        if !seen.insert(n) {
            continue;
        }
        if !graph.node(n).is_island() {
            continue;
        }
        for e in graph.outgoing(n).iter().map(|&ix| graph.edge(ix)) {
            if matches!(e.kind, EdgeKind::Partwise | EdgeKind::Instantwise) {
                stack.push(e.to);
            }
        }
        for e in graph.incoming(n).iter().map(|&ix| graph.edge(ix)) {
            if matches!(e.kind, EdgeKind::Partwise | EdgeKind::Instantwise) {
                stack.push(e.from);
            }
        }
    }
    let island_count = graph.node_indices().filter(|&n| graph.node(n).is_island()).count();
    if seen.iter().filter(|&&n| graph.node(n).is_island()).count() != island_count {
        return Err(EngraveError::InvalidGraph(
            "not every island is reachable from the root via Partwise/Instantwise edges".into(),
        ));
    }
    Ok(())
}

/// Invariant 2 (chord half): every chord token is owned by exactly one
/// island via `Token`.
fn check_chord_ownership(graph: &Graph) -> Result<(), EngraveError> {
    for n in graph.node_indices() {
        if matches!(graph.node(n).kind, NodeKind::Token(_)) {
            let owners = graph.incoming(n).iter().map(|&ix| graph.edge(ix)).filter(|e| matches!(e.kind, EdgeKind::Token)).count();
            if owners != 1 {
                return Err(EngraveError::InvalidGraph(format!(
                    "token node {:?} is owned by {} islands, expected exactly 1",
                    n, owners
                )));
            }
        }
    }
    Ok(())
}

/// Invariant 2 (note half): every note is owned by exactly one chord
/// via `Note`.
fn check_note_ownership(graph: &Graph) -> Result<(), EngraveError> {
    for n in graph.node_indices() {
        if matches!(graph.node(n).kind, NodeKind::Note) {
            let owners = graph.incoming(n).iter().map(|&ix| graph.edge(ix)).filter(|e| matches!(e.kind, EdgeKind::Note)).count();
            if owners != 1 {
                return Err(EngraveError::InvalidGraph(format!(
                    "note node {:?} is owned by {} chords, expected exactly 1",
                    n, owners
                )));
            }
        }
    }
    Ok(())
}

/// Invariant 3: a `Voice`/`Beam` edge from chord A to chord B implies
/// A's island precedes B's island in partwise order (same staff).
fn check_voice_beam_order(graph: &Graph) -> Result<(), EngraveError> {
    for n in graph.node_indices() {
        for e in graph.outgoing_all_of_kind(n, |k| matches!(k, EdgeKind::Voice | EdgeKind::Beam)) {
            let (a, b) = (graph.owning_island(e.from), graph.owning_island(e.to));
            match (a, b) {
                (Some(ia), Some(ib)) if ia == ib || graph.partwise_precedes(ia, ib) => {}
                _ => {
                    return Err(EngraveError::InvalidGraph(format!(
                        "Voice/Beam edge {:?} -> {:?} does not follow partwise order",
                        e.from, e.to
                    )))
                }
            }
        }
    }
    Ok(())
}

/// Invariant 4: a `Tie` edge connects notes of equal (sounding) pitch,
/// after applying any override accidental.
fn check_ties(graph: &Graph) -> Result<(), EngraveError> {
    for n in graph.node_indices() {
        for e in graph.outgoing_all_of_kind(n, |k| matches!(k, EdgeKind::Tie)) {
            let (pa, pb) = (resolved_pitch(graph, e.from), resolved_pitch(graph, e.to));
            match (pa, pb) {
                (Some(pa), Some(pb)) if pa.midi_note() == pb.midi_note() => {}
                _ => {
                    return Err(EngraveError::InvalidGraph(format!(
                        "Tie edge {:?} -> {:?} connects notes of unequal pitch",
                        e.from, e.to
                    )))
                }
            }
        }
    }
    Ok(())
}

/// The pitch a note sounds at, with any override accidental applied.
pub fn resolved_pitch(graph: &Graph, note: NodeIndex) -> Option<Pitch> {
    let label = &graph.node(note).label;
    let ConceptValue::Pitch(base) = label.get_concept("Value")? else { return None };
    if let Some(ConceptValue::Accidental(over)) = label.get_concept("AccidentalOverride") {
        Some(Pitch::new(base.letter, over, base.octave))
    } else {
        Some(base)
    }
}

/// Whether a note's override accidental (if any) is visible, i.e.
/// should actually be emitted rather than silently resolved (spec
/// §4.2 accidental decision, step using the override).
pub fn override_visible(graph: &Graph, note: NodeIndex) -> Option<bool> {
    graph.node(note).label.get_bool("AccidentalOverrideVisible")
}

pub fn override_accidental(graph: &Graph, note: NodeIndex) -> Option<Accidental> {
    match graph.node(note).label.get_concept("AccidentalOverride") {
        Some(ConceptValue::Accidental(a)) => Some(a),
        _ => None,
    }
}
