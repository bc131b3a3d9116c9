//! Articulation glyph placement (spec §1 "articulations", §2's
//! rest/dot/articulation engraver line), grounded on
//! `belle-articulations.h`.

use crate::concepts::{Articulation, Placement};
use crate::graph::{ConceptValue, Graph, NodeIndex};
use crate::stamp::{Bounds, GraphicPayload, Stamp, StampGraphic, Transform};

/// Every articulation flagged on `chord`'s label, in the vocabulary's
/// fixed declaration order.
pub fn articulations_of(graph: &Graph, chord: NodeIndex) -> Vec<Articulation> {
    Articulation::ALL.into_iter().filter(|a| graph.node(chord).label.get_bool(&a.attribute_key()).unwrap_or(false)).collect()
}

/// Whether articulations sit above or below the chord: the chord's own
/// `ArticulationPlacement` override if set, else opposite the stem
/// (`belle-articulations.h`: "Above = not StemState[StemUp]").
pub fn above(graph: &Graph, chord: NodeIndex, stem_up: bool) -> bool {
    match graph.node(chord).label.get_concept("ArticulationPlacement") {
        Some(ConceptValue::Placement(Placement::Above)) => true,
        Some(ConceptValue::Placement(Placement::Below)) => false,
        _ => !stem_up,
    }
}

/// Stacks each flagged articulation outward from the notehead/stem,
/// starting just beyond the staff or the stem tip, whichever sits
/// further out.
pub fn engrave(chord: NodeIndex, marks: &[Articulation], x: f64, stem_tip_y: f64, above: bool, staff_top: f64, staff_bottom: f64) -> Stamp {
    let mut stamp = Stamp::new();
    let step = 1.0;
    let mut y = if above { staff_top.max(stem_tip_y).max(2.0) + 0.3 } else { staff_bottom.min(stem_tip_y).min(-2.0) - 0.3 };

    for &mark in marks {
        let name = mark.smufl_name(above);
        let local = Bounds::new(-0.5, -0.5, 0.5, 0.5);
        stamp.push(StampGraphic::new(GraphicPayload::Glyph { smufl_name: name, local_bounds: local }, Transform::translate(x, y), chord));
        y += if above { step } else { -step };
    }
    stamp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::Articulation;

    #[test]
    fn flagged_articulations_round_trip_through_the_label() {
        let mut g = Graph::new();
        let chord = g.add_chord(num_rational::Rational32::new(1, 4));
        g.add_articulation(chord, Articulation::Staccato);
        g.add_articulation(chord, Articulation::Accent);
        let marks = articulations_of(&g, chord);
        assert_eq!(marks.len(), 2);
        assert!(marks.contains(&Articulation::Staccato));
        assert!(marks.contains(&Articulation::Accent));
    }

    #[test]
    fn stem_up_places_articulations_below_by_default() {
        let mut g = Graph::new();
        let chord = g.add_chord(num_rational::Rational32::new(1, 4));
        assert!(!above(&g, chord, true));
        assert!(above(&g, chord, false));
    }

    #[test]
    fn glyph_name_depends_on_side() {
        assert_eq!(Articulation::Staccato.smufl_name(true), "articStaccatoAbove");
        assert_eq!(Articulation::Staccato.smufl_name(false), "articStaccatoBelow");
    }
}
