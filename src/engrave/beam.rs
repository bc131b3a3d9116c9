//! Beam-level sharing and left/right flag fallback (spec §4.6),
//! grounded on `belle-filter-beaming.h`'s beam-group structure (not its
//! auto-beaming heuristics, which are an importer concern).
//!
//! This module is geometry-only: it takes stems with their *absolute*
//! x/y (already placed by the typesetter) and returns beam/flag
//! graphics. The caller (see [`crate::engrave::engrave_beam_groups`])
//! attaches the result to whichever island anchors the group.

use crate::concepts::StemDirectionConcept;
use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, StampGraphic, Transform};
use crate::style::HouseStyle;

/// One stem within a beam group, in partwise order.
#[derive(Debug, Clone, Copy)]
pub struct BeamStem {
    pub chord: NodeIndex,
    pub x: f64,
    pub tip_y: f64,
    pub direction: StemDirectionConcept,
    /// Beam levels beyond the primary (an eighth contributes 0, a
    /// sixteenth 1, a 32nd 2, ...).
    pub extra_levels: u32,
    /// True for the first stem of the group, or any stem an importer
    /// marked as restarting sub-beaming (spec: "at group start or
    /// after a `BeginsGroup`").
    pub begins_group: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Levels {
    above: u32,
    below: u32,
}

/// Distributes extra beam levels above/below the primary for each
/// stem in a group (spec §4.6 "Beam-sharing algorithm").
fn compute_levels(stems: &[BeamStem]) -> Vec<Levels> {
    let mut out: Vec<Levels> = Vec::with_capacity(stems.len());
    for (i, stem) in stems.iter().enumerate() {
        if i == 0 || stem.begins_group {
            out.push(Levels { above: stem.extra_levels, below: 0 });
        } else {
            let prior = out[i - 1];
            let shared = stem.extra_levels.min(prior.above);
            let remainder = stem.extra_levels - shared;
            out.push(Levels { above: shared, below: remainder });
        }
    }
    out
}

/// Whether beam level `level` (0 = primary, positive = "above" extra
/// levels, negative = "below") connects stems `i` and `i+1`.
fn connects(levels: &[Levels], i: usize, level: i32) -> bool {
    if level == 0 {
        return true;
    }
    let (a, b) = (levels[i], levels[i + 1]);
    if level > 0 {
        level as u32 <= a.above && level as u32 <= b.above
    } else {
        (-level) as u32 <= a.below && (-level) as u32 <= b.below
    }
}

/// Whether stem `i` carries level `level` at all (used for flag
/// fallback on an unconnected level).
fn carries(levels: &Levels, level: i32) -> bool {
    if level >= 0 {
        level as u32 <= levels.above
    } else {
        (-level) as u32 <= levels.below
    }
}

/// Engraves a whole beam group: the primary beam, every secondary
/// level, and left/right flag stubs for levels a stem carries but
/// can't share with a neighbor (spec §4.6).
pub fn engrave(stems: &[BeamStem], style: &HouseStyle) -> Vec<StampGraphic> {
    if stems.len() < 2 {
        return Vec::new();
    }
    let levels = compute_levels(stems);
    let spacing = style.number("LevelSpacing");
    let thickness = style.number("LevelThickness");
    let max_extra = stems.iter().map(|s| s.extra_levels).max().unwrap_or(0) as i32;

    let mut graphics = Vec::new();
    let anchor = stems[0].chord;

    for level in -max_extra..=max_extra {
        let offset = level.unsigned_abs() as f64 * spacing;
        for i in 0..stems.len() - 1 {
            if connects(&levels, i, level) {
                let sign_a = if stems[i].direction == StemDirectionConcept::Up { 1.0 } else { -1.0 };
                let sign_b = if stems[i + 1].direction == StemDirectionConcept::Up { 1.0 } else { -1.0 };
                let y_a = stems[i].tip_y - sign_a * offset * level.signum() as f64;
                let y_b = stems[i + 1].tip_y - sign_b * offset * level.signum() as f64;
                let bounds = Bounds::new(stems[i].x, y_a.min(y_b) - thickness / 2.0, stems[i + 1].x, y_a.max(y_b) + thickness / 2.0);
                graphics.push(StampGraphic::new(GraphicPayload::Path { local_bounds: bounds }, Transform::IDENTITY, anchor));
            } else if level != 0 {
                // Flag-stub fallback for an unshared secondary level.
                for i_stem in [i, i + 1] {
                    if carries(&levels[i_stem], level) {
                        let left_ok = i_stem == 0 || !carries(&levels[i_stem - 1], level);
                        let stub_width = 1.0;
                        let sign = if stems[i_stem].direction == StemDirectionConcept::Up { 1.0 } else { -1.0 };
                        let y = stems[i_stem].tip_y - sign * offset * level.signum() as f64;
                        let x = if left_ok { stems[i_stem].x - stub_width } else { stems[i_stem].x };
                        let bounds = Bounds::new(x, y - thickness / 2.0, x + stub_width, y + thickness / 2.0);
                        graphics.push(StampGraphic::new(GraphicPayload::Path { local_bounds: bounds }, Transform::IDENTITY, anchor));
                    }
                }
            }
        }
    }
    graphics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn chord(g: &mut Graph) -> NodeIndex {
        g.add_chord(num_rational::Rational32::new(1, 8))
    }

    #[test]
    fn primary_beam_always_connects() {
        let mut g = Graph::new();
        let stems = vec![
            BeamStem { chord: chord(&mut g), x: 0.0, tip_y: 3.0, direction: StemDirectionConcept::Up, extra_levels: 0, begins_group: true },
            BeamStem { chord: chord(&mut g), x: 2.0, tip_y: 3.0, direction: StemDirectionConcept::Up, extra_levels: 1, begins_group: false },
            BeamStem { chord: chord(&mut g), x: 4.0, tip_y: 3.0, direction: StemDirectionConcept::Up, extra_levels: 0, begins_group: false },
        ];
        let style = HouseStyle::engraver_defaults();
        let graphics = engrave(&stems, &style);
        assert!(!graphics.is_empty());
    }

    #[test]
    fn scenario_three_sixteenth_shares_then_flags() {
        // 1/8, 1/16, 1/8: the middle stem's extra level can't share
        // with either neighbor (both have 0 extra levels), so it
        // should fall back to a flag stub rather than connecting.
        let mut g = Graph::new();
        let stems = vec![
            BeamStem { chord: chord(&mut g), x: 0.0, tip_y: 3.0, direction: StemDirectionConcept::Up, extra_levels: 0, begins_group: true },
            BeamStem { chord: chord(&mut g), x: 2.0, tip_y: 3.0, direction: StemDirectionConcept::Up, extra_levels: 1, begins_group: false },
            BeamStem { chord: chord(&mut g), x: 4.0, tip_y: 3.0, direction: StemDirectionConcept::Up, extra_levels: 0, begins_group: false },
        ];
        let levels = compute_levels(&stems);
        assert_eq!(levels[1].above, 0);
        assert_eq!(levels[1].below, 1);
        assert!(!connects(&levels, 0, -1));
        assert!(!connects(&levels, 1, -1));
    }
}
