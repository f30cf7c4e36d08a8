//! Error and warning types.
//!
//! Fatal conditions are variants of [`Error`] and travel through [`Result`].
//! Conditions the pipeline recovers from (unknown pens, missing templates,
//! skipped pages) are reported as [`Warning`] values next to the output and
//! are logged when they occur.

use std::path::PathBuf;

/// Result type alias for rendering operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while decoding, rendering or composing.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Stroke file is truncated, has an unknown header or declares no layers
    #[error("Invalid lines file: {0}")]
    Format(String),

    /// Source PDF for annotation mode does not exist
    #[error("Source PDF not found: {}", .0.display())]
    MissingSourcePdf(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sidecar JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid PDF header (expected '%PDF-')
    #[error("Invalid PDF header: expected '%PDF-', found '{0}'")]
    InvalidHeader(String),

    /// Parse error at specific byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// Invalid cross-reference table
    #[error("Invalid cross-reference table")]
    InvalidXref,

    /// Referenced object not found in cross-reference table
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Circular reference detected in object graph
    #[error("Circular reference detected: object {0}")]
    CircularReference(crate::object::ObjectRef),

    /// Recursion depth limit exceeded
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(u32),

    /// Invalid PDF structure (generic)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Stream encoding error
    #[error("Stream encoding error: {0}")]
    Encode(String),

    /// Image error
    #[error("Image error: {0}")]
    Image(String),
}

/// Non-fatal conditions reported alongside a successful render.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Warning {
    /// Stroke used a pen id with no alias; it was drawn fully transparent.
    #[error("unknown pen {pen_id} (page {page}, layer {layer}, stroke {stroke}), drawn transparent")]
    UnknownPen {
        /// Zero-based page index
        page: usize,
        /// Layer index within the page
        layer: usize,
        /// Stroke index within the layer
        stroke: usize,
        /// Raw pen id from the file
        pen_id: u32,
    },
    /// Stroke used a color id outside the default palette; black was used.
    #[error("unknown color id {color_id}, using black")]
    UnknownColor {
        /// Raw color id from the file
        color_id: u32,
    },
    /// Notebook page referenced a template image that does not exist.
    #[error("template {} for page {page} not found, using blank page", .path.display())]
    MissingTemplate {
        /// Zero-based page index
        page: usize,
        /// Expected template path
        path: PathBuf,
    },
    /// Template image exists but could not be decoded.
    #[error("template {} for page {page} unreadable ({reason}), using blank page", .path.display())]
    UnreadableTemplate {
        /// Zero-based page index
        page: usize,
        /// Template path
        path: PathBuf,
        /// Decoder message
        reason: String,
    },
    /// Layer metadata sidecar could not be parsed; layers keep palette colors.
    #[error("layer metadata {} for page {page} ignored: {reason}", .path.display())]
    MalformedMetadata {
        /// Zero-based page index
        page: usize,
        /// Sidecar path
        path: PathBuf,
        /// Parser message
        reason: String,
    },
    /// Snapped highlight file could not be parsed; the page has no highlights.
    #[error("highlights {} for page {page} ignored: {reason}", .path.display())]
    MalformedHighlights {
        /// Zero-based page index
        page: usize,
        /// Highlight file path
        path: PathBuf,
        /// Parser message
        reason: String,
    },
    /// Page was left without an overlay.
    #[error("page {page} skipped: {reason}")]
    SkippedPage {
        /// Zero-based page index
        page: usize,
        /// Why the page was skipped
        reason: String,
    },
}
