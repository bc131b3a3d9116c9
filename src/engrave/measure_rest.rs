//! Measure-rest span engraving (spec §4.12's float-engraver scope,
//! §8's zero-measure edge case), grounded on `belle-measure-rest.h`.

use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, StampGraphic, Transform};
use crate::style::HouseStyle;

/// Engraves a measure rest spanning `left_x..right_x` covering `count`
/// measures. A zero-measure span always renders as a single whole
/// rest (spec §8); a positive count renders as a multirest bar with a
/// numeral, falling back to a whole rest when the span is too narrow
/// to host the bar (`belle-measure-rest.h`'s `MultirestSpaceAvailable`
/// check).
pub fn engrave(anchor: NodeIndex, count: i64, left_x: f64, right_x: f64, style: &HouseStyle) -> Vec<StampGraphic> {
    let padding = style.number("MeasureRestPadding");
    let minimum_width = style.number("MeasureRestMinimumWidth");
    let extent = style.number("MeasureRestExtent");
    let thickness = style.number("MeasureRestThickness");

    let left_x = left_x + padding;
    let right_x = right_x - padding;

    let space_available = right_x - left_x >= minimum_width;
    let show_number = count > 0;
    let show_whole_rest = !show_number || !space_available;
    let show_multirest = !show_whole_rest;

    let mut out = Vec::new();

    if show_multirest {
        let bar = Bounds::new(left_x, -thickness / 2.0, right_x, thickness / 2.0);
        out.push(StampGraphic::new(GraphicPayload::Path { local_bounds: bar }, Transform::IDENTITY, anchor));
        for tick_x in [left_x, right_x] {
            let tick = Bounds::new(tick_x - thickness / 2.0, -extent, tick_x + thickness / 2.0, extent);
            out.push(StampGraphic::new(GraphicPayload::Path { local_bounds: tick }, Transform::IDENTITY, anchor));
        }
    }

    if show_whole_rest {
        let mid = (left_x + right_x) / 2.0;
        let local = Bounds::new(-0.6, -1.0, 0.6, 1.0);
        out.push(StampGraphic::new(GraphicPayload::Glyph { smufl_name: "restWhole", local_bounds: local }, Transform::translate(mid, 1.0), anchor));
    }

    if show_number {
        let mid = (left_x + right_x) / 2.0;
        let numeral_bounds = Bounds::new(mid - 0.6, 3.0, mid + 0.6, 5.0);
        out.push(StampGraphic::new(GraphicPayload::Text { content: count.to_string(), local_bounds: numeral_bounds }, Transform::IDENTITY, anchor));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn zero_measures_is_a_whole_rest_not_a_bar() {
        let style = HouseStyle::engraver_defaults();
        let island = Graph::new().add_island();
        let graphics = engrave(island, 0, 0.0, 10.0, &style);
        assert!(graphics.iter().any(|g| matches!(&g.payload, GraphicPayload::Glyph { smufl_name, .. } if *smufl_name == "restWhole")));
        assert!(!graphics.iter().any(|g| matches!(&g.payload, GraphicPayload::Text { .. })));
    }

    #[test]
    fn several_measures_with_room_show_a_bar_and_numeral() {
        let style = HouseStyle::engraver_defaults();
        let island = Graph::new().add_island();
        let graphics = engrave(island, 4, 0.0, 20.0, &style);
        assert!(graphics.iter().any(|g| matches!(&g.payload, GraphicPayload::Text { content, .. } if content == "4")));
        assert!(!graphics.iter().any(|g| matches!(&g.payload, GraphicPayload::Glyph { smufl_name, .. } if *smufl_name == "restWhole")));
    }

    #[test]
    fn several_measures_without_room_fall_back_to_a_whole_rest() {
        let style = HouseStyle::engraver_defaults();
        let island = Graph::new().add_island();
        let graphics = engrave(island, 4, 0.0, 3.0, &style);
        assert!(graphics.iter().any(|g| matches!(&g.payload, GraphicPayload::Glyph { smufl_name, .. } if *smufl_name == "restWhole")));
    }
}
