//! Stamps (spec §3.4): the ephemeral, positioned graphics an island
//! emits. Vector-graphics primitives themselves (paths, glyph
//! outlines, font loading) are an external collaborator's job (spec
//! §1) — this module only needs enough geometry to do collision
//! detection and bounds bookkeeping: an axis-aligned [`Bounds`] box
//! and a 2D affine [`Transform`].

use std::cell::Cell;
use std::collections::HashMap;

use crate::graph::NodeIndex;

/// One stamp per island, the engraver's final output (spec §3.4, §6.4).
pub type StampSet = HashMap<NodeIndex, Stamp>;

/// An axis-aligned bounding box, in staff-space units. `y` grows
/// upward, matching `staff_position` (spec §3.6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Bounds {
    pub const EMPTY: Bounds = Bounds { left: f64::INFINITY, bottom: f64::INFINITY, right: f64::NEG_INFINITY, top: f64::NEG_INFINITY };

    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Bounds { left, bottom, right, top }
    }

    pub fn is_empty(&self) -> bool {
        self.right < self.left || self.top < self.bottom
    }

    pub fn width(&self) -> f64 {
        (self.right - self.left).max(0.0)
    }

    pub fn union(self, other: Bounds) -> Bounds {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Bounds {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    pub fn shifted(self, dx: f64, dy: f64) -> Bounds {
        Bounds { left: self.left + dx, right: self.right + dx, bottom: self.bottom + dy, top: self.top + dy }
    }
}

/// A 2D affine transform: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn translate(dx: f64, dy: f64) -> Transform {
        Transform { e: dx, f: dy, ..Transform::IDENTITY }
    }

    /// Multiplies `self` by `other`, applying `other` first (so
    /// `self.then(other)` reads left to right).
    pub fn then(self, other: Transform) -> Transform {
        Transform {
            a: other.a * self.a + other.c * self.b,
            b: other.b * self.a + other.d * self.b,
            c: other.a * self.c + other.c * self.d,
            d: other.b * self.c + other.d * self.d,
            e: other.a * self.e + other.c * self.f + self.e,
            f: other.b * self.e + other.d * self.f + self.f,
        }
    }

    pub fn apply_bounds(self, b: Bounds) -> Bounds {
        if b.is_empty() {
            return b;
        }
        let corners = [(b.left, b.bottom), (b.left, b.top), (b.right, b.bottom), (b.right, b.top)];
        let mut out = Bounds::EMPTY;
        for (x, y) in corners {
            let px = self.a * x + self.c * y + self.e;
            let py = self.b * x + self.d * y + self.f;
            out = out.union(Bounds::new(px, py, px, py));
        }
        out
    }
}

/// What a graphic actually paints. Owned/shared path data and glyph
/// outlines come from the rendering collaborator (spec §6.4); this
/// core only needs the bounds it was told the payload occupies.
#[derive(Debug, Clone)]
pub enum GraphicPayload {
    /// A SMuFL glyph reference, by codepoint name, with its
    /// unscaled bounds.
    Glyph { smufl_name: &'static str, local_bounds: Bounds },
    /// An owned path (e.g. a stem line, a beam parallelogram, a
    /// ledger line, a bracket) with known local bounds.
    Path { local_bounds: Bounds },
    /// A laid-out text block (expression text, tuplet ratio label).
    Text { content: String, local_bounds: Bounds },
}

impl GraphicPayload {
    fn local_bounds(&self) -> Bounds {
        match self {
            GraphicPayload::Glyph { local_bounds, .. } => *local_bounds,
            GraphicPayload::Path { local_bounds } => *local_bounds,
            GraphicPayload::Text { local_bounds, .. } => *local_bounds,
        }
    }
}

/// One positioned graphic within a [`Stamp`] (spec §3.4).
#[derive(Debug, Clone)]
pub struct StampGraphic {
    pub payload: GraphicPayload,
    /// RGB fill color; `None` for glyphs drawn in the default ink.
    pub fill: Option<(u8, u8, u8)>,
    /// Stroke width; 0 means filled rather than stroked.
    pub stroke_width: f64,
    pub transform: Transform,
    /// Back-pointer to the originating node, for hit-testing/selection.
    pub context: NodeIndex,
    bounds_cache: Cell<Option<Bounds>>,
}

impl StampGraphic {
    pub fn new(payload: GraphicPayload, transform: Transform, context: NodeIndex) -> Self {
        StampGraphic { payload, fill: None, stroke_width: 0.0, transform, context, bounds_cache: Cell::new(None) }
    }

    pub fn with_fill(mut self, rgb: (u8, u8, u8)) -> Self {
        self.fill = Some(rgb);
        self
    }

    pub fn red(self) -> Self {
        self.with_fill((220, 40, 40))
    }

    /// Painted bounds: the path's local bounds transformed by this
    /// graphic's own transform. Cached since collision placement reads
    /// it repeatedly.
    pub fn painted_bounds(&self) -> Bounds {
        if let Some(b) = self.bounds_cache.get() {
            return b;
        }
        let b = self.transform.apply_bounds(self.payload.local_bounds());
        self.bounds_cache.set(Some(b));
        b
    }

    fn invalidate(&mut self) {
        self.bounds_cache.set(None);
    }

    pub fn shift(&mut self, dx: f64, dy: f64) {
        self.transform = Transform::translate(dx, dy).then(self.transform);
        self.invalidate();
    }
}

/// An island's complete set of engraved graphics plus its own
/// placement transform relative to the system (spec §3.4).
#[derive(Debug, Clone, Default)]
pub struct Stamp {
    pub context_transform: Transform,
    graphics: Vec<StampGraphic>,
}

impl Stamp {
    pub fn new() -> Self {
        Stamp { context_transform: Transform::IDENTITY, graphics: Vec::new() }
    }

    pub fn push(&mut self, graphic: StampGraphic) {
        self.graphics.push(graphic);
    }

    pub fn graphics(&self) -> &[StampGraphic] {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut [StampGraphic] {
        &mut self.graphics
    }

    /// Union of every graphic's painted bounds.
    pub fn bounds(&self) -> Bounds {
        self.graphics.iter().fold(Bounds::EMPTY, |acc, g| acc.union(g.painted_bounds()))
    }

    /// Shifts every graphic in the stamp by `(dx, dy)` (used by the
    /// typesetter to move a whole island's stamp to its assigned x,
    /// spec §4.13).
    pub fn shift(&mut self, dx: f64, dy: f64) {
        for g in &mut self.graphics {
            g.shift(dx, dy);
        }
    }

    pub fn append(&mut self, other: Stamp) {
        self.graphics.extend(other.graphics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_bounds() {
        let a = Bounds::new(0.0, 0.0, 1.0, 1.0);
        let b = Bounds::new(0.5, 0.5, 2.0, 2.0);
        let u = a.union(b);
        assert_eq!(u, Bounds::new(0.0, 0.0, 2.0, 2.0));
    }

    #[test]
    fn shift_moves_painted_bounds() {
        let mut graph = crate::graph::Graph::new();
        let n = graph.add_island();
        let mut g = StampGraphic::new(GraphicPayload::Path { local_bounds: Bounds::new(0.0, 0.0, 1.0, 1.0) }, Transform::IDENTITY, n);
        assert_eq!(g.painted_bounds(), Bounds::new(0.0, 0.0, 1.0, 1.0));
        g.shift(2.0, 3.0);
        assert_eq!(g.painted_bounds(), Bounds::new(2.0, 3.0, 3.0, 4.0));
    }
}
