//! PDF Highlighter UI Library
//!
//! Interaction layer of the highlighter: text selection and area drag state
//! machines, scroll-to-highlight, and the engine that connects them to a page
//! renderer and a host UI.

pub mod area;
pub mod engine;
pub mod host;
pub mod scroll;
pub mod selection;

pub use area::{AreaSelection, AreaSelectionGesture, GestureUpdate, PointerEvent, PointerTarget};
pub use engine::{DocumentInfo, HighlighterEngine, Key, RenderTarget, RenderedHighlight};
pub use host::{
    CaptureError, HighlighterHost, PageRenderer, PendingSelection, SelectionSource, Tip, TipAnchor,
};
pub use scroll::{
    FragmentTarget, ScrollCoordinator, ScrollDestination, ScrollEvent, ScrollInstruction,
    ScrollTarget,
};
pub use selection::{
    FinalizedSelection, PendingId, SelectionChange, SelectionOutcome, SelectionSnapshot,
    SelectionState, SelectionStateMachine, TextRange,
};
