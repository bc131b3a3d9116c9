//! Slur-curve engraving (spec §1 "ties/slurs", §2's float-engraver
//! line naming slurs), grounded on the teacher's `api/annotations/
//! slur.rs` placement convention and sharing [`crate::engrave::tie`]'s
//! bowed-path geometry.

use crate::concepts::Placement;
use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, StampGraphic, Transform};
use crate::style::HouseStyle;

/// A slur's endpoint chords, in absolute (post-typeset) coordinates.
pub struct SlurEndpoints {
    pub anchor: NodeIndex,
    pub from_x: f64,
    pub to_x: f64,
    pub from_y: f64,
    pub to_y: f64,
    pub placement: Placement,
}

/// Draws a slur as a shallow arc spanning its endpoint chords. Unlike
/// a tie's fixed bow (always between two adjacent same-pitch notes) a
/// slur commonly spans several notes, so its bow grows with the span.
pub fn engrave_curve(slur: &SlurEndpoints, style: &HouseStyle) -> StampGraphic {
    let span = (slur.to_x - slur.from_x).abs().max(1.0);
    let bow = style.number("SpaceHeight").max(0.2) + span * 0.08;
    let sign = if slur.placement == Placement::Above { 1.0 } else { -1.0 };
    let baseline = if slur.placement == Placement::Above { slur.from_y.max(slur.to_y) } else { slur.from_y.min(slur.to_y) };

    let bounds = Bounds::new(
        slur.from_x.min(slur.to_x),
        baseline + if sign > 0.0 { 0.0 } else { -bow },
        slur.from_x.max(slur.to_x),
        baseline + if sign > 0.0 { bow } else { 0.0 },
    );
    StampGraphic::new(GraphicPayload::Path { local_bounds: bounds }, Transform::IDENTITY, slur.anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn slur_above_bows_upward_and_widens_with_span() {
        let style = HouseStyle::engraver_defaults();
        let anchor = Graph::new().add_island();
        let short = engrave_curve(&SlurEndpoints { anchor, from_x: 0.0, to_x: 2.0, from_y: 0.0, to_y: 0.0, placement: Placement::Above }, &style);
        let long = engrave_curve(&SlurEndpoints { anchor, from_x: 0.0, to_x: 20.0, from_y: 0.0, to_y: 0.0, placement: Placement::Above }, &style);
        let short_bounds = short.painted_bounds();
        let long_bounds = long.painted_bounds();
        assert!(short_bounds.top > 0.0);
        assert!(long_bounds.top > short_bounds.top);
    }

    #[test]
    fn slur_below_bows_downward() {
        let style = HouseStyle::engraver_defaults();
        let anchor = Graph::new().add_island();
        let curve = engrave_curve(&SlurEndpoints { anchor, from_x: 0.0, to_x: 3.0, from_y: 0.0, to_y: 0.0, placement: Placement::Below }, &style);
        assert!(curve.painted_bounds().bottom < 0.0);
    }
}
