//! Expression, pedal, and octave-transposition span engraving (spec
//! §4.12), grounded on `belle-expressions.h`, `belle-pedal-markings.h`,
//! `belle-octave-transposition.h`.

use crate::concepts::Placement;
use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, Stamp, StampGraphic, Transform};

/// Common dynamic markings that substitute a single SMuFL glyph
/// instead of being laid out as plain text (spec: "dynamics
/// auto-substitute SMuFL glyphs `pp`, `f`, `sfz`, etc").
fn dynamic_glyph(text: &str) -> Option<&'static str> {
    match text {
        "pppp" => Some("dynamicPPPP"),
        "ppp" => Some("dynamicPPP"),
        "pp" => Some("dynamicPP"),
        "p" => Some("dynamicPiano"),
        "mp" => Some("dynamicMP"),
        "mf" => Some("dynamicMF"),
        "f" => Some("dynamicForte"),
        "ff" => Some("dynamicFF"),
        "fff" => Some("dynamicFFF"),
        "sfz" => Some("dynamicSforzato"),
        "fp" => Some("dynamicFortePiano"),
        _ => None,
    }
}

fn placement_y(placement: Placement, staff_top: f64, staff_bottom: f64, margin: f64) -> f64 {
    if placement == Placement::Above {
        staff_top + margin
    } else {
        staff_bottom - margin
    }
}

/// An expression text block (dynamics, tempo marks, free text).
pub fn engrave_expression(float: NodeIndex, text: &str, x: f64, placement: Placement, staff_top: f64, staff_bottom: f64) -> Stamp {
    let y = placement_y(placement, staff_top, staff_bottom, 2.0);
    let mut stamp = Stamp::new();
    let width = (text.len() as f64 * 0.6).max(1.0);
    let local = Bounds::new(-width / 2.0, -0.6, width / 2.0, 0.6);
    let transform = Transform::translate(x, y);
    let payload = match dynamic_glyph(text) {
        Some(name) => GraphicPayload::Glyph { smufl_name: name, local_bounds: local },
        None => GraphicPayload::Text { content: text.to_string(), local_bounds: local },
    };
    stamp.push(StampGraphic::new(payload, transform, float));
    stamp
}

/// A pedal marking: `Ped` at the span start, `*` at the span end
/// (spec: "`Ped` ... `*` over their span").
pub fn engrave_pedal(float: NodeIndex, start_x: f64, end_x: f64, staff_bottom: f64) -> Stamp {
    let y = staff_bottom - 1.5;
    let mut stamp = Stamp::new();
    let start_bounds = Bounds::new(-0.8, -0.6, 0.8, 0.6).shifted(start_x, y);
    stamp.push(StampGraphic::new(GraphicPayload::Glyph { smufl_name: "keyboardPedalPed", local_bounds: start_bounds }, Transform::IDENTITY, float));
    let end_bounds = Bounds::new(-0.4, -0.6, 0.4, 0.6).shifted(end_x, y);
    stamp.push(StampGraphic::new(GraphicPayload::Glyph { smufl_name: "keyboardPedalUp", local_bounds: end_bounds }, Transform::IDENTITY, float));
    stamp
}

/// An octave-transposition bracket: italic "8va"/"15ma" text, a dashed
/// line across the span, and a downward hook at the end (spec: "an
/// italic `8va`/`15ma` ... followed by a dashed line ... and a
/// downward hook at the span end").
pub fn engrave_octave(float: NodeIndex, label: &str, start_x: f64, end_x: f64, placement: Placement, staff_top: f64, staff_bottom: f64) -> Stamp {
    let y = placement_y(placement, staff_top, staff_bottom, 1.5);
    let mut stamp = Stamp::new();

    let label_width = label.len() as f64 * 0.6;
    let label_bounds = Bounds::new(-label_width / 2.0, -0.6, label_width / 2.0, 0.6).shifted(start_x + label_width / 2.0, y);
    stamp.push(StampGraphic::new(GraphicPayload::Text { content: label.to_string(), local_bounds: label_bounds }, Transform::IDENTITY, float));

    let line_left = start_x + label_width + 0.3;
    if line_left < end_x {
        let line_bounds = Bounds::new(line_left, y - 0.05, end_x, y + 0.05);
        stamp.push(StampGraphic::new(GraphicPayload::Path { local_bounds: line_bounds }, Transform::IDENTITY, float));
    }

    let hook_sign = if placement == Placement::Above { -1.0 } else { 1.0 };
    let hook_bounds = Bounds::new(end_x - 0.05, y.min(y + hook_sign), end_x + 0.05, y.max(y + hook_sign));
    stamp.push(StampGraphic::new(GraphicPayload::Path { local_bounds: hook_bounds }, Transform::IDENTITY, float));

    stamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_dynamic_substitutes_glyph() {
        assert_eq!(dynamic_glyph("pp"), Some("dynamicPP"));
        assert_eq!(dynamic_glyph("cresc."), None);
    }

    #[test]
    fn expression_above_sits_over_staff_top() {
        let stamp = engrave_expression(crate::graph::Graph::new().add_island(), "f", 0.0, Placement::Above, 4.0, -4.0);
        assert!(stamp.bounds().bottom > 4.0);
    }
}
