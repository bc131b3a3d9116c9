//! Ledger line accumulation (spec §4.7), grounded on
//! `belle-ledger-lines.h`.

use crate::graph::NodeIndex;
use crate::stamp::{Bounds, GraphicPayload, Stamp, StampGraphic, Transform};
use crate::style::HouseStyle;

/// Staff positions (every 2 units, outward from the staff) a note at
/// `staff_position` needs ledger lines at. Empty if the note sits
/// within the staff (`|staff_position| <= 4`).
pub fn positions_for(staff_position: i32) -> Vec<i32> {
    let mut out = Vec::new();
    if staff_position > 4 {
        let mut p = 6;
        while p <= staff_position {
            out.push(p);
            p += 2;
        }
    } else if staff_position < -4 {
        let mut p = -6;
        while p >= staff_position {
            out.push(p);
            p -= 2;
        }
    }
    out
}

/// One note's horizontal extent, used to widen the ledger line(s) it
/// requires.
pub struct LedgerNote {
    pub staff_position: i32,
    pub left: f64,
    pub right: f64,
}

/// Accumulates ledger line records for a whole island: every note
/// sharing a ledger position widens that line's left/right extreme
/// (spec §4.7).
pub fn engrave(context: NodeIndex, notes: &[LedgerNote], style: &HouseStyle) -> Stamp {
    let extension = style.number("LedgerLineExtension");
    let mut by_position: std::collections::BTreeMap<i32, (f64, f64)> = std::collections::BTreeMap::new();

    for note in notes {
        for pos in positions_for(note.staff_position) {
            let entry = by_position.entry(pos).or_insert((f64::INFINITY, f64::NEG_INFINITY));
            entry.0 = entry.0.min(note.left - extension);
            entry.1 = entry.1.max(note.right + extension);
        }
    }

    let mut stamp = Stamp::new();
    for (pos, (left, right)) in by_position {
        let thickness = 0.12;
        let y = pos as f64;
        let local = Bounds::new(left, y - thickness / 2.0, right, y + thickness / 2.0);
        stamp.push(StampGraphic::new(GraphicPayload::Path { local_bounds: local }, Transform::IDENTITY, context));
    }
    stamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_within_staff_needs_no_ledger() {
        assert!(positions_for(4).is_empty());
        assert!(positions_for(-4).is_empty());
    }

    #[test]
    fn note_two_above_top_line_needs_two_ledgers() {
        assert_eq!(positions_for(8), vec![6, 8]);
    }

    #[test]
    fn note_one_above_top_line_needs_one_ledger() {
        assert_eq!(positions_for(7), vec![6]);
    }

    #[test]
    fn shared_ledger_widens_to_cover_both_notes() {
        let style = HouseStyle::engraver_defaults();
        let mut g = crate::graph::Graph::new();
        let island = g.add_island();
        let notes = vec![LedgerNote { staff_position: 6, left: -0.5, right: 0.5 }, LedgerNote { staff_position: 6, left: 2.0, right: 3.0 }];
        let stamp = engrave(island, &notes, &style);
        let b = stamp.bounds();
        assert!(b.left < -0.5);
        assert!(b.right > 3.0);
    }
}
