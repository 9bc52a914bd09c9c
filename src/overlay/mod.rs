//! Highlight overlay engine.
//!
//! Toolkit-neutral core: nothing in here depends on Bevy. The viewer feeds
//! [`PointerEvent`]s and a [`ContainerRect`] into a [`HighlightEngine`], runs
//! the [`PersistRequest`]s it emits against a backend, and reports results
//! back with [`HighlightEngine::resolve`].

mod engine;
mod error;
mod geometry;
mod highlight;
mod history;
mod pointer;
mod session;
mod store;

pub use engine::{
    EngineSettings, HighlightEngine, Notice, OperationId, PersistCall, PersistReply,
    PersistRequest,
};
pub use error::{GeometryError, PersistenceError, UndoError};
pub use geometry::{
    ContainerRect, Corner, HighlightRect, PAGE_EXTENT, PagePoint, PixelPoint, SizeLimits,
    to_percent, to_pixel,
};
pub use highlight::{Highlight, HighlightDraft, HighlightId, HighlightPatch};
pub use history::{DEFAULT_UNDO_CAPACITY, UndoEntry, UndoLog};
pub use pointer::{PointerEvent, PointerKind, PointerTarget};
pub use session::{Gesture, InteractionMode, InteractionSession, hit_test};
pub use store::HighlightStore;
