//! Collaborator interfaces for the renderer and the host UI
//!
//! The engine never touches a rendering surface or a widget tree directly.
//! The page renderer supplies viewport metadata and raster captures; the
//! host draws tips and overlays and executes scrolls.

use pdf_highlighter_core::{
    EncodedImage, HighlightContent, Rect, ScaleValue, ScaledPosition, ViewportPosition,
    ViewportSource,
};

use crate::engine::RenderTarget;
use crate::scroll::ScrollInstruction;
use crate::selection::PendingId;

/// Errors a renderer may report while capturing a page region
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("page {0} has no raster surface")]
    NoSurface(u32),

    #[error("region capture failed: {0}")]
    Failed(String),
}

/// Rendering engine the highlighter draws on top of
pub trait PageRenderer: ViewportSource {
    /// Page element bounds in container coordinates, `None` while the page is not laid out
    fn page_bounds(&self, page_number: u32) -> Option<Rect>;

    /// Encode the pixels under `rect` (page-relative viewport pixels)
    fn capture_region(&mut self, page_number: u32, rect: &Rect) -> Result<EncodedImage, CaptureError>;

    /// Apply a scale mode or zoom factor to every page
    fn apply_scale_value(&mut self, scale_value: ScaleValue);
}

/// Which flow produced a pending selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Text,
    Area,
}

/// A finalized selection waiting for the user to confirm, commit, or cancel
///
/// The host answers with tip content; later it passes `id` back to
/// `confirm`, `commit`, or `cancel` on the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSelection {
    pub id: PendingId,
    pub source: SelectionSource,
    pub position: ScaledPosition,
    pub viewport_position: ViewportPosition,
    pub content: HighlightContent,
    pub(crate) confirmed: bool,
}

impl PendingSelection {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}

/// The single visible tip
#[derive(Debug, Clone, PartialEq)]
pub struct Tip<C> {
    pub anchor: ViewportPosition,
    pub content: C,
}

/// Container-space placement of a tip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipAnchor {
    pub page_number: u32,
    /// Horizontal centre of the anchor rect
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
}

impl TipAnchor {
    /// Place a tip for `anchor` on a page element laid out at `page_bounds`
    pub fn compute(anchor: &ViewportPosition, page_bounds: &Rect) -> Self {
        let rect = &anchor.bounding_rect;
        let top = page_bounds.top + rect.top;
        Self {
            page_number: anchor.anchor_page(),
            left: page_bounds.left + rect.left + rect.width / 2.0,
            top,
            bottom: top + rect.height,
        }
    }
}

/// UI the highlighter reports to
pub trait HighlighterHost {
    /// Whatever the host renders inside a tip
    type TipContent;

    /// A text or area selection was finalized; return the tip to show for it
    fn on_selection_finished(&mut self, selection: &PendingSelection) -> Self::TipContent;

    fn show_tip(&mut self, tip: &Tip<Self::TipContent>, placement: Option<TipAnchor>);

    fn hide_tip(&mut self);

    /// Draw (or redraw) the highlight overlay of one page
    fn render_page_layer(&mut self, target: &RenderTarget);

    fn on_scroll_needed(&mut self, instruction: &ScrollInstruction);

    /// The user scrolled away from a highlight the engine scrolled to
    fn on_scroll_change(&mut self);

    /// The document is ready and scroll requests can be served
    fn on_document_ready(&mut self);

    /// Toggle native text selection (off while an area drag is in progress)
    fn set_text_selection_enabled(&mut self, enabled: bool);
}
