//! Error types for the overlay engine.
//!
//! None of these are fatal to the host: persistence failures are rolled back
//! locally, geometry errors are guarded by clamping, and undo errors are
//! no-ops.

use thiserror::Error;

use super::highlight::HighlightId;

/// Stored geometry violates the page/size invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("highlight geometry contains a non-finite value")]
    NotFinite,

    #[error("highlight center ({x}, {y}) lies outside the page")]
    CenterOutOfPage { x: f32, y: f32 },

    #[error("highlight size {width}x{height} outside [{min}, {max}]")]
    SizeOutOfRange {
        width: f32,
        height: f32,
        min: f32,
        max: f32,
    },
}

/// A durable create/update/delete/list call failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    /// Transport failure (DNS, connection refused, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The backend refused the operation (validation, missing record).
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Why an undo or redo request did nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UndoError {
    /// The undo (or redo) stack is empty.
    #[error("history is empty")]
    Unavailable,

    /// The entry targets a highlight with a persistence call in flight.
    #[error("highlight {0} has a pending change")]
    Busy(HighlightId),

    /// The entry targets a highlight that is no longer loaded; it was dropped.
    #[error("highlight {0} is no longer loaded")]
    Missing(HighlightId),
}
