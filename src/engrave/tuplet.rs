//! Tuplet time scalar and bracket placement (spec §4.11), grounded on
//! `belle-tuplets.h`.

use num_rational::Rational32;

use crate::concepts::{Placement, StemDirectionConcept};
use crate::graph::{EdgeKind, Graph, NodeIndex};
use crate::stamp::{Bounds, GraphicPayload, StampGraphic, Transform};
use crate::state::ChordInfo;

/// Every tuplet info-node anchored to `chord` via a (possibly nested)
/// `Tuplet` edge — one per ancestor tuplet strand the chord belongs to.
pub fn ancestor_tuplets(graph: &Graph, chord: NodeIndex) -> Vec<NodeIndex> {
    graph.incoming(chord).iter().map(|&ix| graph.edge(ix)).filter(|e| matches!(e.kind, EdgeKind::Tuplet(_))).map(|e| e.from).collect()
}

/// A chord's total time scalar: the product of every ancestor tuplet's
/// ratio (spec §4.11: "the product of all ancestor tuplet ratios").
pub fn chord_time_scalar(graph: &Graph, chord: NodeIndex) -> Rational32 {
    ancestor_tuplets(graph, chord)
        .into_iter()
        .filter_map(|t| graph.node(t).label.get_rational("Value"))
        .fold(Rational32::new(1, 1), |acc, r| acc * r)
}

/// The chords anchored to one tuplet, in strand order (via the tagged
/// `Tuplet` edge from the tuplet node).
pub fn chords_of(graph: &Graph, tuplet: NodeIndex, tag: &str) -> Vec<NodeIndex> {
    graph
        .outgoing_all_of_kind(tuplet, |k| matches!(k, EdgeKind::Tuplet(t) if t.as_str() == tag))
        .map(|e| e.to)
        .collect()
}

/// Nesting depth of `tuplet` among `all`: how many other tuplets'
/// chord-index spans strictly contain this one's (spec: "collect all
/// tuplets in a chord's strand recursively with their nesting depth").
pub fn nesting_depth(graph: &Graph, tuplet: NodeIndex, tag: &str, all: &[(NodeIndex, String)], chord_order: &[NodeIndex]) -> usize {
    let span = |t: NodeIndex, tg: &str| -> Option<(usize, usize)> {
        let chords = chords_of(graph, t, tg);
        let idxs: Vec<usize> = chords.iter().filter_map(|c| chord_order.iter().position(|x| x == c)).collect();
        Some((*idxs.iter().min()?, *idxs.iter().max()?))
    };
    let Some((lo, hi)) = span(tuplet, tag) else { return 0 };
    all.iter()
        .filter(|(t, tg)| *t != tuplet || tg.as_str() != tag)
        .filter_map(|(t, tg)| span(*t, tg))
        .filter(|&(o_lo, o_hi)| o_lo <= lo && o_hi >= hi && (o_lo, o_hi) != (lo, hi))
        .count()
}

/// The ratio's label: "n" normally, "n:m" when the tuplet node is
/// marked to show the full ratio (spec: "full-ratio flag").
pub fn label_text(graph: &Graph, tuplet: NodeIndex) -> String {
    let ratio = graph.node(tuplet).label.get_rational("Value").unwrap_or(Rational32::new(1, 1));
    let show_full = graph.node(tuplet).label.get_bool("ShowFullRatio").unwrap_or(false);
    if show_full {
        format!("{}:{}", ratio.numer(), ratio.denom())
    } else {
        format!("{}", ratio.numer())
    }
}

/// Bracket placement: above/below by stem direction if beam-placed,
/// else by the tuplet's own `Placement` attribute.
pub fn placement(graph: &Graph, tuplet: NodeIndex, first_chord_info: Option<&ChordInfo>, beam_placed: bool) -> Placement {
    if beam_placed {
        if let Some(info) = first_chord_info {
            return if info.stem_direction == StemDirectionConcept::Up { Placement::Below } else { Placement::Above };
        }
    }
    match graph.node(tuplet).label.get_concept("Placement") {
        Some(crate::graph::ConceptValue::Placement(p)) => p,
        _ => Placement::Above,
    }
}

/// Engraves one tuplet bracket spanning `left_x..right_x` at the given
/// staff top/bottom (absolute, post-typeset coordinates), with its
/// ratio label at the midpoint.
pub fn engrave(tuplet: NodeIndex, left_x: f64, right_x: f64, staff_top: f64, staff_bottom: f64, placement: Placement, beam_placed: bool, label: String) -> (StampGraphic, StampGraphic) {
    let margin = if beam_placed { 0.5 } else { 1.5 };
    let y = if placement == Placement::Above { staff_top + margin } else { staff_bottom - margin };
    let bracket_bounds = Bounds::new(left_x, y - 0.1, right_x, y + 0.1);
    let bracket = StampGraphic::new(GraphicPayload::Path { local_bounds: bracket_bounds }, Transform::IDENTITY, tuplet);

    let mid = (left_x + right_x) / 2.0;
    let label_bounds = Bounds::new(mid - 0.5, y - 0.4, mid + 0.5, y + 0.4);
    let text = StampGraphic::new(GraphicPayload::Text { content: label, local_bounds: label_bounds }, Transform::IDENTITY, tuplet);

    (bracket, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn simple_triplet_scalar_is_two_thirds() {
        let mut g = Graph::new();
        let chord = g.add_chord(Rational32::new(1, 8));
        let tuplet = g.add_tuplet(Rational32::new(2, 3), "t1");
        g.link_tuplet(tuplet, chord, "t1");
        assert_eq!(chord_time_scalar(&g, chord), Rational32::new(2, 3));
    }

    #[test]
    fn label_without_full_ratio_is_bare_numerator() {
        let mut g = Graph::new();
        let tuplet = g.add_tuplet(Rational32::new(2, 3), "t1");
        assert_eq!(label_text(&g, tuplet), "2");
    }
}
