//! House style (spec §3.5) and its resolver (§4, "House-style
//! resolver" component).
//!
//! `HouseStyle` is an immutable value threaded through every
//! engraving call — per spec §9, "never a module-level singleton."
//! Per-island overrides live on the island's own label as
//! `Style:<name>` attributes (spec: "a child `Property` entry");
//! [`resolve`] checks there first and falls back to the shared
//! defaults.

use std::collections::HashMap;

use num_rational::Rational32;

use crate::graph::{AttributeValue, Graph, NodeIndex};

/// A resolved house-style property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Ratio(Rational32),
}

impl PropertyValue {
    pub fn as_f64(self) -> f64 {
        match self {
            PropertyValue::Number(n) => n,
            PropertyValue::Ratio(r) => *r.numer() as f64 / *r.denom() as f64,
        }
    }
}

/// The shared house-style object (spec §3.5): a mapping from property
/// name to property value.
#[derive(Debug, Clone)]
pub struct HouseStyle {
    defaults: HashMap<&'static str, PropertyValue>,
}

impl Default for HouseStyle {
    fn default() -> Self {
        HouseStyle::engraver_defaults()
    }
}

impl HouseStyle {
    /// A reasonable set of defaults, in staff-space units unless noted.
    pub fn engraver_defaults() -> Self {
        let mut defaults = HashMap::new();
        defaults.insert("SpaceHeight", PropertyValue::Number(0.25));
        defaults.insert("StaffDistance", PropertyValue::Number(12.0));
        defaults.insert("NoteheadWidth", PropertyValue::Number(1.3));
        defaults.insert("NoteheadAngle", PropertyValue::Number(20.0));
        defaults.insert("StemWidth", PropertyValue::Number(0.12));
        defaults.insert("DefaultStemHeight", PropertyValue::Number(3.5));
        defaults.insert("LedgerLineExtension", PropertyValue::Number(0.35));
        defaults.insert("RhythmicDotSize", PropertyValue::Number(0.2));
        defaults.insert("BarlineThickness", PropertyValue::Number(0.12));
        defaults.insert("NonInitialClefSize", PropertyValue::Number(0.8));
        defaults.insert("AccidentalGap", PropertyValue::Number(0.3));
        defaults.insert("DotSpacing", PropertyValue::Number(0.6));
        defaults.insert("DotNoteheadDistance", PropertyValue::Number(0.4));
        defaults.insert("LevelSpacing", PropertyValue::Number(0.3));
        defaults.insert("LevelThickness", PropertyValue::Number(0.18));
        // Open question (spec §9): "treat as house-style property
        // `MeasureRestVerticalPosition`." Default: the middle (B) line.
        defaults.insert("MeasureRestVerticalPosition", PropertyValue::Number(0.0));
        defaults.insert("MeasureRestPadding", PropertyValue::Number(2.0));
        defaults.insert("MeasureRestMinimumWidth", PropertyValue::Number(2.0));
        defaults.insert("MeasureRestExtent", PropertyValue::Number(1.0));
        defaults.insert("MeasureRestThickness", PropertyValue::Number(0.12));
        defaults.insert("WrapCostExponent", PropertyValue::Number(2.0));
        defaults.insert("FirstLineWidth", PropertyValue::Number(180.0));
        defaults.insert("LineWidth", PropertyValue::Number(180.0));
        HouseStyle { defaults }
    }

    pub fn get(&self, key: &str) -> Option<PropertyValue> {
        self.defaults.get(key).copied()
    }

    pub fn number(&self, key: &str) -> f64 {
        self.get(key).map(PropertyValue::as_f64).unwrap_or(0.0)
    }

    pub fn with_override(mut self, key: &'static str, value: PropertyValue) -> Self {
        self.defaults.insert(key, value);
        self
    }
}

/// Sets a per-island style override (a "child `Property` entry").
pub fn set_island_override(graph: &mut Graph, island: NodeIndex, key: &str, value: f64) {
    graph.node_mut(island).label.set(format!("Style:{key}"), AttributeValue::Rational(Rational32::approximate_float(value).unwrap_or_default()));
}

/// Resolves a property at `island`: the island's own override if
/// present, else the shared `house_style` default.
pub fn resolve(graph: &Graph, island: NodeIndex, key: &str, house_style: &HouseStyle) -> f64 {
    match graph.node(island).label.get(&format!("Style:{key}")) {
        Some(AttributeValue::Rational(r)) => *r.numer() as f64 / *r.denom() as f64,
        Some(AttributeValue::Integer(i)) => *i as f64,
        _ => house_style.number(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_default() {
        let mut g = Graph::new();
        let island = g.add_island();
        let style = HouseStyle::engraver_defaults();
        assert_eq!(resolve(&g, island, "StemWidth", &style), style.number("StemWidth"));

        set_island_override(&mut g, island, "StemWidth", 0.5);
        assert_eq!(resolve(&g, island, "StemWidth", &style), 0.5);
    }
}
