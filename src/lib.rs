//! Engraving core for a music-notation typesetting engine.
//!
//! Turns a logical score graph (§3.1) into positioned, bounded vector
//! graphics ("stamps", §3.4) ready for a page renderer. The pipeline is
//! a pure, synchronous function of an immutable structural graph:
//!
//! ```text
//! graph -> geometry -> state accumulation -> per-island engraving
//!       -> horizontal typesetting -> wrap optimization -> stamps
//! ```
//!
//! Vector-graphics primitives, output back-ends (PDF/SVG/PNG), and CLI
//! plumbing are out of scope — this crate hands a renderer a `Stamp`
//! per island (§6.4) and otherwise keeps to itself.

pub mod autocorrect;
pub mod concepts;
pub mod engrave;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod io;
pub mod midi;
pub mod stamp;
pub mod state;
pub mod style;
pub mod typeset;
pub mod wrap;

pub use error::{Diagnostic, EngraveError};
pub use graph::{Edge, EdgeKind, Graph, Label, Node, NodeIndex, NodeKind};
pub use stamp::{Stamp, StampSet};
pub use state::EngraveState;
pub use style::HouseStyle;

/// Runs the full engraving pipeline on a structurally valid graph,
/// returning one [`stamp::Stamp`] per island plus any diagnostics
/// emitted along the way.
///
/// This is the crate's single entry point; everything else is a
/// building block it composes. Per §7's degrade-don't-raise policy,
/// this function only returns `Err` for the structural failures of
/// [`EngraveError::InvalidGraph`] — per-element engraving problems are
/// recorded as [`Diagnostic`]s and the corresponding element is
/// replaced with a placeholder instead.
pub fn engrave(graph: &mut Graph, style: &HouseStyle) -> Result<EngraveResult, EngraveError> {
    graph::validate::validate(graph)?;
    autocorrect::repair(graph);

    let geom = geometry::parse(graph)?;
    let mut state = state::accumulate(graph, &geom, style);

    let mut diagnostics = Vec::new();
    let mut stamps = engrave::engrave_islands(graph, &geom, &mut state, style, &mut diagnostics);

    let systems = wrap::plan_systems(graph, &geom, &state, style);
    typeset::typeset_systems(graph, &geom, &systems, &mut state, &mut stamps, style);
    engrave::engrave_cross_island(graph, &state, &mut stamps, style);

    Ok(EngraveResult { geometry: geom, state, systems, stamps, diagnostics })
}

/// Output of [`engrave`]: the parsed geometry, the accumulated
/// ephemeral state, the chosen system breaks, one stamp per island,
/// and any non-fatal diagnostics collected along the way.
#[derive(Debug, Clone)]
pub struct EngraveResult {
    pub geometry: geometry::Geometry,
    pub state: state::EngraveState,
    pub systems: wrap::SystemPlan,
    pub stamps: StampSet,
    pub diagnostics: Vec<Diagnostic>,
}
