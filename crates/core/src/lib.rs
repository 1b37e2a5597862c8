//! PDF Highlighter Core Library
//!
//! Highlight geometry for paginated documents: rectangles, per-page viewport
//! metadata, conversion between document-intrinsic and on-screen coordinates,
//! the highlight data model, and per-page partitioning of highlights.

pub mod config;
pub mod coordinates;
pub mod error;
pub mod geometry;
pub mod highlight;
pub mod partition;
pub mod position;
pub mod viewport;

pub use config::{ConfigError, HighlighterConfig, ScaleValue};
pub use coordinates::{
    position_to_viewport, scaled_rect_to_viewport, to_scaled, to_viewport, viewport_rect_to_scaled,
};
pub use error::{HighlightError, HighlightResult};
pub use geometry::{Point, Rect, COORDINATE_EPSILON};
pub use highlight::{
    Comment, EncodedImage, GhostHighlight, Highlight, HighlightCollection, HighlightContent,
    HighlightId, HighlightUpdate,
};
pub use partition::{partition, PageGroups, PageHighlight};
pub use position::{ScaledPosition, ViewportPosition};
pub use viewport::{AffineTransform, PageViewport, ViewportSource};
