//! Edge kinds (spec §3.1).

use super::label::Label;
use super::node::NodeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeIndex(pub(crate) u32);

impl EdgeIndex {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The tagged variant of edge kinds. `Tuplet` and `Span` carry a
/// disambiguating tag string (spec: "Tuplet edges carry a string `Tag`
/// to disambiguate nested tuplet strands"; "`Span` (generic
/// kind-qualified)").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Partwise,
    Instantwise,
    Token,
    Note,
    Voice,
    Beam,
    Tie,
    Slur,
    Tuplet(String),
    Span(SpanKind),
    Float,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    OctaveTransposition,
    Pedal,
    MeasureRest,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeIndex,
    pub to: NodeIndex,
    pub kind: EdgeKind,
    pub label: Label,
}
