//! Tie direction and partial-tie state (spec §4.10). Direction itself
//! is computed during state accumulation (see
//! [`crate::state::instant_state`]); this module owns the actual curve
//! geometry and the partial-tie bookkeeping the wrap pass needs when a
//! tie's target island lands in a different system.

use std::collections::HashMap;

use crate::concepts::Placement;
use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, StampGraphic, Transform};
use crate::style::HouseStyle;

/// Per-note partial-tie flags, set by the wrap pass when a tie's
/// target lands on the other side of a system break (spec §4.14,
/// §8 scenario 5).
#[derive(Debug, Clone, Default)]
pub struct PartialTies {
    pub outgoing: HashMap<NodeIndex, Placement>,
    pub incoming: HashMap<NodeIndex, Placement>,
}

/// A tie's endpoints, in absolute (post-typeset) coordinates.
pub struct TieEndpoints {
    pub from: NodeIndex,
    pub from_x: f64,
    pub to_x: f64,
    pub y: f64,
    pub direction: Placement,
}

/// Draws a tie curve as a shallow arc (approximated here by its
/// bounding box, per this core's hull-level collision-detection
/// default — the actual bezier control points are the renderer's
/// concern, spec §6.4).
pub fn engrave_curve(tie: &TieEndpoints, style: &HouseStyle) -> StampGraphic {
    let bow = style.number("SpaceHeight").max(0.2);
    let sign = if tie.direction == Placement::Above { 1.0 } else { -1.0 };
    let bounds = Bounds::new(
        tie.from_x.min(tie.to_x),
        tie.y + if sign > 0.0 { 0.0 } else { -bow },
        tie.from_x.max(tie.to_x),
        tie.y + if sign > 0.0 { bow } else { 0.0 },
    );
    StampGraphic::new(GraphicPayload::Path { local_bounds: bounds }, Transform::IDENTITY, tie.from)
}

/// Draws a partial tie: a shorter curve trailing off toward the
/// system edge, for the side of the original tie that remains visible
/// after a wrap severs it.
pub fn engrave_partial(context: NodeIndex, x: f64, y: f64, direction: Placement, toward_edge_right: bool, style: &HouseStyle) -> StampGraphic {
    let bow = style.number("SpaceHeight").max(0.2);
    let length = 1.2;
    let (left, right) = if toward_edge_right { (x, x + length) } else { (x - length, x) };
    let sign = if direction == Placement::Above { 1.0 } else { -1.0 };
    let bounds = Bounds::new(left, y + if sign > 0.0 { 0.0 } else { -bow }, right, y + if sign > 0.0 { bow } else { 0.0 });
    StampGraphic::new(GraphicPayload::Path { local_bounds: bounds }, Transform::IDENTITY, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn tie_above_bows_upward() {
        let mut g = Graph::new();
        let note = g.add_chord(num_rational::Rational32::new(1, 4));
        let style = HouseStyle::engraver_defaults();
        let tie = TieEndpoints { from: note, from_x: 0.0, to_x: 3.0, y: 0.0, direction: Placement::Above };
        let graphic = engrave_curve(&tie, &style);
        let b = graphic.painted_bounds();
        assert!(b.top > 0.0);
        assert_eq!(b.bottom, 0.0);
    }
}
