#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use pdf_highlighter_core::{
    EncodedImage, HighlighterConfig, PageViewport, Rect, ScaleValue, ViewportSource,
};
use pdf_highlighter_scheduler::Subscription;
use pdf_highlighter_ui::{
    CaptureError, DocumentInfo, HighlighterEngine, HighlighterHost, PageRenderer, PendingId,
    PendingSelection, PointerEvent, RenderTarget, ScrollInstruction, SelectionSnapshot, TextRange,
    Tip, TipAnchor,
};

pub const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];
pub const PAGE_GAP: f64 = 10.0;
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Renderer stand-in: pages stacked vertically with a fixed gap
pub struct MockRenderer {
    pub viewports: BTreeMap<u32, PageViewport>,
    pub scale: f64,
    pub applied_scale_values: Vec<ScaleValue>,
    pub captures: Vec<(u32, Rect)>,
    pub fail_capture: bool,
}

impl MockRenderer {
    pub fn with_pages(num_pages: u32, scale: f64) -> Self {
        let viewports = (1..=num_pages)
            .map(|page| (page, PageViewport::new(page, LETTER, scale, 0)))
            .collect();
        Self {
            viewports,
            scale,
            applied_scale_values: Vec::new(),
            captures: Vec::new(),
            fail_capture: false,
        }
    }

    pub fn without_page(mut self, page_number: u32) -> Self {
        self.viewports.remove(&page_number);
        self
    }

    pub fn render_page(&mut self, page_number: u32) {
        self.viewports.insert(
            page_number,
            PageViewport::new(page_number, LETTER, self.scale, 0),
        );
    }
}

impl ViewportSource for MockRenderer {
    fn viewport(&self, page_number: u32) -> Option<PageViewport> {
        self.viewports.get(&page_number).copied()
    }
}

impl PageRenderer for MockRenderer {
    fn page_bounds(&self, page_number: u32) -> Option<Rect> {
        let viewport = self.viewports.get(&page_number)?;
        let top = (page_number - 1) as f64 * (viewport.height + PAGE_GAP);
        Some(Rect::new(0.0, top, viewport.width, viewport.height))
    }

    fn capture_region(&mut self, page_number: u32, rect: &Rect) -> Result<EncodedImage, CaptureError> {
        if self.fail_capture {
            return Err(CaptureError::NoSurface(page_number));
        }
        self.captures.push((page_number, *rect));
        Ok(format!(
            "data:image/png;base64,p{page_number}-{}x{}",
            rect.width, rect.height
        ))
    }

    fn apply_scale_value(&mut self, scale_value: ScaleValue) {
        self.applied_scale_values.push(scale_value);
    }
}

/// Host stand-in that records every call
#[derive(Default)]
pub struct RecordingHost {
    pub finished: Vec<PendingSelection>,
    pub tips: Vec<(String, Option<TipAnchor>)>,
    pub tip_visible: bool,
    pub hidden_tips: usize,
    pub layers: Vec<RenderTarget>,
    pub scrolls: Vec<ScrollInstruction>,
    pub scroll_changes: usize,
    pub document_ready: usize,
    pub text_selection_enabled: Vec<bool>,
}

impl HighlighterHost for RecordingHost {
    type TipContent = String;

    fn on_selection_finished(&mut self, selection: &PendingSelection) -> String {
        self.finished.push(selection.clone());
        format!("save selection {}", selection.id)
    }

    fn show_tip(&mut self, tip: &Tip<String>, placement: Option<TipAnchor>) {
        self.tips.push((tip.content.clone(), placement));
        self.tip_visible = true;
    }

    fn hide_tip(&mut self) {
        self.hidden_tips += 1;
        self.tip_visible = false;
    }

    fn render_page_layer(&mut self, target: &RenderTarget) {
        self.layers.push(target.clone());
    }

    fn on_scroll_needed(&mut self, instruction: &ScrollInstruction) {
        self.scrolls.push(*instruction);
    }

    fn on_scroll_change(&mut self) {
        self.scroll_changes += 1;
    }

    fn on_document_ready(&mut self) {
        self.document_ready += 1;
    }

    fn set_text_selection_enabled(&mut self, enabled: bool) {
        self.text_selection_enabled.push(enabled);
    }
}

pub type TestEngine = HighlighterEngine<MockRenderer, RecordingHost>;

/// Engine attached to a ready document where every page is rendered at scale 1
pub fn ready_engine(num_pages: u32, start: Instant) -> (TestEngine, Subscription) {
    engine_with(MockRenderer::with_pages(num_pages, 1.0), num_pages, start)
}

pub fn engine_with(renderer: MockRenderer, num_pages: u32, start: Instant) -> (TestEngine, Subscription) {
    let mut engine = HighlighterEngine::new(
        renderer,
        RecordingHost::default(),
        HighlighterConfig::default(),
    );
    let subscription = engine.init(DocumentInfo::new("doc-a", num_pages));
    engine.on_document_ready(start);
    (engine, subscription)
}

pub fn line_on_page(page_number: u32, text: &str) -> TextRange {
    TextRange::on_page(text, page_number, vec![Rect::new(10.0, 10.0, 100.0, 12.0)])
}

/// Select text and let the finalize fire; returns the pending id
pub fn select_text(engine: &mut TestEngine, range: TextRange, now: Instant) -> PendingId {
    engine.on_selection_change(SelectionSnapshot::inside(range), now);
    engine.tick(now + DEBOUNCE);
    engine
        .pending()
        .map(|pending| pending.id)
        .expect("selection should be pending after the debounce")
}

/// Pointer event on a page of the mock layout
pub fn on_page(engine: &TestEngine, page_number: u32, x: f64, y: f64) -> PointerEvent {
    let bounds = engine
        .renderer()
        .page_bounds(page_number)
        .expect("page should be laid out");
    PointerEvent::on_page(x, y, page_number, bounds)
}
