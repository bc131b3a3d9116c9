//! Error hierarchy for the engraving core (spec §7).
//!
//! The engraver itself degrades rather than raises: most per-element
//! failures become a [`Diagnostic`] and a placeholder stamp, never an
//! early return. Only graph construction, graph-XML import/export, and
//! MusicXML import fail fast and return [`EngraveError`].

use thiserror::Error;

/// Top-level error type for operations that can fail structurally.
#[derive(Debug, Clone, Error)]
pub enum EngraveError {
    /// A structural invariant of the score graph was violated (§3.1).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// An importer encountered a feature it explicitly rejects.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A rhythm could not be expressed in notation. Unreachable by
    /// construction on a well-formed graph; kept as a variant because
    /// importers can construct ill-formed rhythms before validation.
    #[error("duration cannot be notated: {0}")]
    UnboundedDuration(String),

    /// A part's instant is missing a required event. Recoverable: the
    /// caller may choose to insert an empty island and continue.
    #[error("geometry incomplete at part {part}, instant {instant}")]
    GeometryIncomplete { part: usize, instant: usize },

    /// The font lacks a SMuFL codepoint for a requested glyph. Callers
    /// render a question-mark placeholder rather than treating this as
    /// fatal; the variant exists so that decision is explicit.
    #[error("glyph missing: {0}")]
    GlyphMissing(String),

    #[error(transparent)]
    Xml(#[from] XmlError),
}

/// XML-specific failures for graph-XML and MusicXML I/O (§6.1, §6.3).
#[derive(Debug, Clone, Error)]
pub enum XmlError {
    #[error("malformed xml: {0}")]
    Malformed(String),

    #[error("missing required attribute `{attr}` on <{element}>")]
    MissingAttribute { element: String, attr: String },

    #[error("unknown node kind `{0}`")]
    UnknownNodeKind(String),

    #[error("dangling edge reference `{0}`")]
    DanglingEdge(String),
}

/// A non-fatal engraving problem recorded instead of raising (§7).
///
/// Each corresponds to one of the substitution behaviors spec §7
/// describes: a placeholder glyph, a red-colored element, or a
/// silently omitted element. The core never loses the underlying
/// data — it records what it did and where.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Index of the island or node this diagnostic is attached to, if
    /// any (selection/debugging aid; mirrors the Stamp's context
    /// back-pointer, §3.4).
    pub node: Option<crate::graph::NodeIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    GlyphMissing,
    GeometryIncomplete,
    UndefinedValue,
    OmittedElement,
}

impl Diagnostic {
    pub fn glyph_missing(message: impl Into<String>, node: crate::graph::NodeIndex) -> Self {
        Diagnostic { kind: DiagnosticKind::GlyphMissing, message: message.into(), node: Some(node) }
    }

    pub fn geometry_incomplete(part: usize, instant: usize) -> Self {
        Diagnostic {
            kind: DiagnosticKind::GeometryIncomplete,
            message: format!("part {part}, instant {instant} had no island; inserted empty island"),
            node: None,
        }
    }

    pub fn omitted(message: impl Into<String>, node: crate::graph::NodeIndex) -> Self {
        Diagnostic { kind: DiagnosticKind::OmittedElement, message: message.into(), node: Some(node) }
    }
}
