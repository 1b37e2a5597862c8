//! Highlighter engine
//!
//! Wires the text selection state machine, the area gesture and the scroll
//! coordinator to a [`PageRenderer`] and a [`HighlighterHost`]. The engine
//! owns the single ghost slot, the single tip slot, the per-page render
//! targets and the two debounce timers (selection finalize, scale recompute).
//!
//! The host drives time: every handler that can start or observe a timer
//! takes the current `Instant`, and [`HighlighterEngine::tick`] fires
//! whatever has come due.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use pdf_highlighter_core::{
    partition, position_to_viewport, to_scaled, to_viewport, Comment, EncodedImage,
    GhostHighlight, Highlight, HighlightCollection, HighlightContent, HighlightError, HighlightId,
    HighlightResult, HighlightUpdate, HighlighterConfig, PageHighlight, PageViewport, Rect,
    ScaledPosition, ViewportPosition,
};
use pdf_highlighter_scheduler::{CancellationToken, Subscription, TrailingDebounce};

use crate::area::{AreaSelection, AreaSelectionGesture, GestureUpdate, PointerEvent};
use crate::host::{HighlighterHost, PageRenderer, PendingSelection, SelectionSource, Tip, TipAnchor};
use crate::scroll::{FragmentTarget, ScrollCoordinator, ScrollEvent, ScrollTarget};
use crate::selection::{
    FinalizedSelection, PendingId, SelectionChange, SelectionSnapshot, SelectionState,
    SelectionStateMachine,
};

/// Document the engine is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub fingerprint: String,
    pub num_pages: u32,
}

impl DocumentInfo {
    pub fn new(fingerprint: impl Into<String>, num_pages: u32) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            num_pages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// One highlight as drawn on one page
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedHighlight {
    pub highlight: PageHighlight,
    pub viewport_position: ViewportPosition,
    pub is_scrolled_to: bool,
}

/// Everything the host needs to draw the overlay of one page
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    pub page_number: u32,
    pub viewport: PageViewport,
    pub highlights: Vec<RenderedHighlight>,
}

impl RenderTarget {
    pub fn ghost(&self) -> Option<&RenderedHighlight> {
        self.highlights.iter().find(|h| h.highlight.is_ghost())
    }

    pub fn get(&self, id: HighlightId) -> Option<&RenderedHighlight> {
        self.highlights.iter().find(|h| h.highlight.id == Some(id))
    }
}

struct Session {
    document: DocumentInfo,
    token: CancellationToken,
}

/// Finished selection waiting for its page to get a viewport
#[derive(Debug, Clone)]
enum DeferredSelection {
    Text(FinalizedSelection),
    Area(AreaSelection),
}

pub struct HighlighterEngine<R: PageRenderer, H: HighlighterHost> {
    config: HighlighterConfig,
    renderer: R,
    host: H,
    session: Option<Session>,
    document_ready: bool,

    highlights: HighlightCollection,
    selection: SelectionStateMachine,
    area: AreaSelectionGesture,
    scroll: ScrollCoordinator,
    scale_debounce: TrailingDebounce<()>,

    pending: Option<PendingSelection>,
    next_pending_id: PendingId,
    ghost: Option<GhostHighlight>,
    tip: Option<Tip<H::TipContent>>,

    render_targets: BTreeMap<u32, RenderTarget>,
    deferred_pages: BTreeSet<u32>,
    deferred_scroll: Option<ScrollTarget>,
    deferred_selection: Option<DeferredSelection>,
}

impl<R: PageRenderer, H: HighlighterHost> HighlighterEngine<R, H> {
    pub fn new(renderer: R, host: H, config: HighlighterConfig) -> Self {
        Self {
            selection: SelectionStateMachine::new(config.selection_debounce()),
            area: AreaSelectionGesture::new(config.min_area_selection_px),
            scroll: ScrollCoordinator::new(config.scroll_margin, config.scroll_settle()),
            scale_debounce: TrailingDebounce::new(config.scale_debounce()),
            config,
            renderer,
            host,
            session: None,
            document_ready: false,
            highlights: HighlightCollection::new(),
            pending: None,
            next_pending_id: 1,
            ghost: None,
            tip: None,
            render_targets: BTreeMap::new(),
            deferred_pages: BTreeSet::new(),
            deferred_scroll: None,
            deferred_selection: None,
        }
    }

    pub fn config(&self) -> &HighlighterConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Document of the live session
    pub fn document(&self) -> Option<&DocumentInfo> {
        self.session
            .as_ref()
            .filter(|session| !session.token.is_cancelled())
            .map(|session| &session.document)
    }

    pub fn is_attached(&self) -> bool {
        self.document().is_some()
    }

    // ---- Lifecycle ----

    /// Attach to a document
    ///
    /// Attaching while another document is live swaps documents: the old
    /// subscription is closed and all per-document state is dropped first.
    pub fn init(&mut self, document: DocumentInfo) -> Subscription {
        if let Some(previous) = self.session.take() {
            log::debug!(
                "swapping document {} for {}",
                previous.document.fingerprint,
                document.fingerprint
            );
            previous.token.cancel();
            self.reset_document_state();
        }

        log::debug!(
            "attached to document {} ({} pages)",
            document.fingerprint,
            document.num_pages
        );
        let subscription = Subscription::new();
        self.session = Some(Session {
            document,
            token: subscription.token(),
        });
        subscription
    }

    /// Detach from the document `subscription` was issued for
    pub fn teardown(&mut self, subscription: Subscription) {
        let owned = self
            .session
            .as_ref()
            .is_some_and(|session| subscription.owns(&session.token));

        if owned {
            self.reset_document_state();
            if let Some(session) = self.session.take() {
                log::debug!("detached from document {}", session.document.fingerprint);
            }
        } else {
            log::trace!("teardown for a subscription that is no longer current");
        }
        subscription.close();
    }

    fn reset_document_state(&mut self) {
        self.selection.reset();
        self.selection.set_area_selection_active(false);
        if self.area.is_dragging() {
            self.host.set_text_selection_enabled(true);
        }
        self.area.reset();
        self.scroll.reset();
        self.scale_debounce.cancel();
        self.pending = None;
        self.ghost = None;
        self.hide_tip();
        self.render_targets.clear();
        self.deferred_pages.clear();
        self.deferred_scroll = None;
        self.deferred_selection = None;
        self.document_ready = false;
    }

    /// The renderer finished loading the document
    pub fn on_document_ready(&mut self, now: Instant) {
        if !self.is_attached() {
            return;
        }
        self.renderer.apply_scale_value(self.config.scale_value);
        self.document_ready = true;
        self.host.on_document_ready();
        self.render_layers();
        self.retry_deferred_selection();
        self.retry_deferred_scroll(now);
    }

    /// The viewer container was resized; the scale is recomputed once resizing settles
    pub fn on_resize(&mut self, now: Instant) {
        if self.is_attached() {
            self.scale_debounce.schedule((), now);
        }
    }

    /// A page's text layer finished rendering
    pub fn on_text_layer_rendered(&mut self, page_number: u32, now: Instant) {
        if !self.is_attached() {
            return;
        }
        log::trace!("text layer rendered for page {page_number}");
        self.render_layers();
        self.retry_deferred_selection();
        self.retry_deferred_scroll(now);
    }

    /// Fire due timers
    pub fn tick(&mut self, now: Instant) {
        if !self.is_attached() {
            return;
        }

        if let Some(result) = self.selection.poll(now) {
            match result {
                Ok(finalized) => self.finish_text_selection(finalized),
                Err(err) => log::debug!("selection finalize skipped: {err}"),
            }
        }

        if self.scale_debounce.poll(now).is_some() {
            log::trace!("reapplying scale value {}", self.config.scale_value);
            self.renderer.apply_scale_value(self.config.scale_value);
            self.render_layers();
        }

        self.scroll.tick(now);
    }

    // ---- Highlights ----

    pub fn highlights(&self) -> &[Highlight] {
        self.highlights.as_slice()
    }

    pub fn highlight(&self, id: HighlightId) -> Option<&Highlight> {
        self.highlights.get(id)
    }

    /// Replace the whole highlight list
    pub fn set_highlights(&mut self, highlights: Vec<Highlight>) {
        self.highlights = HighlightCollection::from_vec(highlights);
        self.render_layers();
    }

    pub fn add_highlight(&mut self, highlight: Highlight) {
        self.highlights.add(highlight);
        self.render_layers();
    }

    pub fn update_highlight(&mut self, id: HighlightId, update: &HighlightUpdate) -> HighlightResult<()> {
        self.highlights.update(id, update)?;
        self.render_layers();
        Ok(())
    }

    pub fn remove_highlight(&mut self, id: HighlightId) -> Option<Highlight> {
        let removed = self.highlights.remove(id);
        if removed.is_some() {
            self.render_layers();
        }
        removed
    }

    // ---- Selection ----

    pub fn selection_state(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn is_area_selection_active(&self) -> bool {
        self.selection.is_area_selection_active()
    }

    pub fn pending(&self) -> Option<&PendingSelection> {
        self.pending.as_ref()
    }

    pub fn ghost(&self) -> Option<&GhostHighlight> {
        self.ghost.as_ref()
    }

    /// The document selection changed
    pub fn on_selection_change(&mut self, snapshot: SelectionSnapshot, now: Instant) {
        if !self.is_attached() {
            return;
        }

        match self.selection.on_selection_change(snapshot, now) {
            Ok(SelectionChange::Collapsed {
                dismissed: Some(pending),
            }) => {
                log::trace!("selection {pending} dismissed by collapse");
                self.discard_pending();
                self.render_layers();
            }
            Ok(SelectionChange::Collapsed { dismissed: None }) => {}
            Ok(SelectionChange::Selecting { superseded }) => {
                self.deferred_selection = None;
                // A new text selection takes the ghost and tip slots from either flow
                if superseded.is_some() || self.pending.is_some() || self.ghost.is_some() {
                    self.discard_pending();
                    self.render_layers();
                }
            }
            Err(err) => log::trace!("selection change ignored: {err}"),
        }
    }

    fn finish_text_selection(&mut self, finalized: FinalizedSelection) {
        let position = match to_scaled(&finalized.position, &self.renderer) {
            Ok(position) => position,
            Err(err) if err.is_retryable() => {
                log::debug!("text selection waits for render: {err}");
                self.deferred_selection = Some(DeferredSelection::Text(finalized));
                return;
            }
            Err(err) => {
                log::debug!("text selection dropped: {err}");
                self.selection.reset();
                return;
            }
        };

        let id = self.open_pending(
            SelectionSource::Text,
            position,
            finalized.position,
            HighlightContent::text(finalized.text),
        );
        self.selection.open_tip(id);
    }

    pub fn on_pointer_down(&mut self, event: PointerEvent, start_allowed: bool) {
        if !self.is_attached() {
            return;
        }

        // Clears any ghost before an area drag can start
        if !event.is_on_tip() {
            self.hide_tip_and_selection();
        }

        match self.area.pointer_down(&event, start_allowed) {
            GestureUpdate::Started => self.host.set_text_selection_enabled(false),
            GestureUpdate::Reset => self.selection.set_area_selection_active(false),
            _ => {}
        }
    }

    pub fn on_pointer_move(&mut self, event: PointerEvent) {
        if !self.is_attached() {
            return;
        }
        if let GestureUpdate::Moved { visible, .. } = self.area.pointer_move(&event) {
            self.selection.set_area_selection_active(visible);
        }
    }

    pub fn on_pointer_up(&mut self, event: PointerEvent) {
        if !self.is_attached() {
            return;
        }
        if let GestureUpdate::Finished(selection) = self.area.pointer_up(&event) {
            self.host.set_text_selection_enabled(true);
            match selection {
                Some(selection) => self.finish_area_selection(selection),
                None => self.selection.set_area_selection_active(false),
            }
        }
    }

    fn finish_area_selection(&mut self, selection: AreaSelection) {
        let viewport_position = ViewportPosition::new(selection.page_number, selection.rect, Vec::new());
        let position = match to_scaled(&viewport_position, &self.renderer) {
            Ok(position) => position,
            Err(err) if err.is_retryable() => {
                log::debug!("area selection waits for render: {err}");
                self.deferred_selection = Some(DeferredSelection::Area(selection));
                return;
            }
            Err(err) => {
                log::debug!("area selection dropped: {err}");
                self.area.reset();
                self.selection.set_area_selection_active(false);
                return;
            }
        };

        let image = self.screenshot(selection.page_number, &selection.rect);
        self.open_pending(
            SelectionSource::Area,
            position,
            viewport_position,
            HighlightContent { text: None, image },
        );
    }

    /// Finish a selection parked while its page had no viewport, if its flow
    /// is still where it left off
    fn retry_deferred_selection(&mut self) {
        match self.deferred_selection.take() {
            Some(DeferredSelection::Text(finalized)) => {
                if matches!(self.selection.state(), SelectionState::Stable(_)) {
                    self.finish_text_selection(finalized);
                }
            }
            Some(DeferredSelection::Area(selection)) => {
                if self.area.rect().is_some() && !self.area.is_dragging() {
                    self.finish_area_selection(selection);
                }
            }
            None => {}
        }
    }

    pub fn has_deferred_selection(&self) -> bool {
        self.deferred_selection.is_some()
    }

    fn open_pending(
        &mut self,
        source: SelectionSource,
        position: ScaledPosition,
        viewport_position: ViewportPosition,
        content: HighlightContent,
    ) -> PendingId {
        let id = self.next_pending_id;
        self.next_pending_id += 1;

        let pending = PendingSelection {
            id,
            source,
            position,
            viewport_position: viewport_position.clone(),
            content,
            confirmed: false,
        };
        log::trace!("{source:?} selection {id} finalized on page {}", pending.position.page_number);

        let content = self.host.on_selection_finished(&pending);
        self.pending = Some(pending);
        self.set_tip(Tip {
            anchor: viewport_position,
            content,
        });
        id
    }

    fn pending_id(&self) -> Option<PendingId> {
        self.pending.as_ref().map(|pending| pending.id)
    }

    /// Turn the pending selection into the ghost highlight
    ///
    /// Returns `false` for an id that is no longer pending.
    pub fn confirm(&mut self, id: PendingId) -> bool {
        let Some(pending) = self.pending.as_mut().filter(|pending| pending.id == id) else {
            log::trace!("confirm for stale selection {id}");
            return false;
        };

        pending.confirmed = true;
        let source = pending.source;
        self.ghost = Some(match source {
            SelectionSource::Text => GhostHighlight::new(pending.position.clone()),
            SelectionSource::Area => {
                GhostHighlight::with_content(pending.position.clone(), pending.content.clone())
            }
        });

        match source {
            SelectionSource::Text => {
                self.selection.mark_confirmed(id);
            }
            SelectionSource::Area => {
                self.area.reset();
                self.selection.set_area_selection_active(false);
            }
        }
        self.render_layers();
        true
    }

    /// Drop the pending selection, its ghost and its tip
    pub fn cancel(&mut self, id: PendingId) -> bool {
        if self.pending_id() != Some(id) {
            log::trace!("cancel for stale selection {id}");
            return false;
        }
        self.selection.cancel(id);
        self.discard_pending();
        self.render_layers();
        true
    }

    /// Save the pending selection as a highlight carrying `comment`
    pub fn commit(&mut self, id: PendingId, comment: Comment) -> Option<Highlight> {
        if self.pending_id() != Some(id) {
            log::trace!("commit for stale selection {id}");
            return None;
        }
        let pending = self.pending.take()?;
        self.selection.commit(id);

        let highlight = Highlight::new(pending.position, pending.content, Some(comment));
        log::debug!(
            "committed highlight {} on page {}",
            highlight.id(),
            highlight.position().page_number
        );
        self.highlights.add(highlight.clone());

        self.discard_pending();
        self.render_layers();
        Some(highlight)
    }

    /// Clear the ghost, tip, pending selection and area rectangle
    ///
    /// Leaves the text selection state machine alone.
    fn discard_pending(&mut self) {
        self.pending = None;
        self.deferred_selection = None;
        self.ghost = None;
        if self.area.is_dragging() {
            self.host.set_text_selection_enabled(true);
        }
        self.area.reset();
        self.selection.set_area_selection_active(false);
        self.hide_tip();
    }

    pub fn on_key_down(&mut self, key: Key) {
        if self.is_attached() && key == Key::Escape {
            self.hide_tip_and_selection();
        }
    }

    // ---- Tip ----

    pub fn tip(&self) -> Option<&Tip<H::TipContent>> {
        self.tip.as_ref()
    }

    /// Placement of the visible tip in container coordinates
    pub fn tip_anchor(&self) -> Option<TipAnchor> {
        self.tip.as_ref().and_then(|tip| self.placement_for(&tip.anchor))
    }

    fn placement_for(&self, anchor: &ViewportPosition) -> Option<TipAnchor> {
        self.renderer
            .page_bounds(anchor.anchor_page())
            .map(|bounds| TipAnchor::compute(anchor, &bounds))
    }

    fn set_tip(&mut self, tip: Tip<H::TipContent>) {
        let placement = self.placement_for(&tip.anchor);
        self.host.show_tip(&tip, placement);
        self.tip = Some(tip);
    }

    /// Show a tip for a saved highlight (on hover)
    ///
    /// Refused while a selection is in progress or a ghost exists.
    pub fn show_tip(&mut self, id: HighlightId, content: H::TipContent) -> bool {
        if !self.is_attached()
            || self.pending.is_some()
            || !self.selection.allows_hover_tip(self.ghost.is_some())
        {
            return false;
        }

        let Some(highlight) = self.highlights.get(id) else {
            log::debug!("{}", HighlightError::UnknownHighlight(id));
            return false;
        };
        match to_viewport(highlight.position(), &self.renderer) {
            Ok(anchor) => {
                self.set_tip(Tip { anchor, content });
                true
            }
            Err(err) => {
                log::debug!("tip for highlight {id} not shown: {err}");
                false
            }
        }
    }

    pub fn hide_tip(&mut self) {
        if self.tip.take().is_some() {
            self.host.hide_tip();
        }
    }

    /// Hide the tip and drop any selection in progress
    pub fn hide_tip_and_selection(&mut self) {
        if let Some(pending) = self.selection.reset() {
            log::trace!("selection {pending} cancelled");
        }
        let had_ghost = self.ghost.is_some();
        self.discard_pending();
        if had_ghost {
            self.render_layers();
        }
    }

    // ---- Scrolling ----

    pub fn scrolled_to(&self) -> Option<HighlightId> {
        self.scroll.scrolled_to()
    }

    /// Scroll a highlight or page into view
    ///
    /// Returns `false` when the scroll was not executed now. Targets on pages
    /// without a viewport (or requested before the document is ready) are
    /// retried on the next render event.
    pub fn scroll_to(&mut self, target: ScrollTarget, now: Instant) -> bool {
        if !self.is_attached() {
            return false;
        }
        if !self.document_ready {
            log::debug!("scroll to page {} deferred until document ready", target.page_number());
            self.deferred_scroll = Some(target);
            return false;
        }

        match self.scroll.resolve_target(&target, &self.renderer) {
            Ok(instruction) => {
                self.deferred_scroll = None;
                self.host.on_scroll_needed(&instruction);
                self.scroll
                    .begin_programmatic_scroll(instruction.highlight_id, now);
                self.render_layers();
                true
            }
            Err(err) if err.is_retryable() => {
                log::debug!("scroll deferred: {err}");
                self.deferred_scroll = Some(target);
                false
            }
            Err(err) => {
                log::debug!("scroll skipped: {err}");
                false
            }
        }
    }

    /// Scroll to the target named by a `#highlight-<id>` or `#page-<n>` fragment
    pub fn scroll_to_fragment(&mut self, fragment: &str, now: Instant) -> bool {
        let target = match fragment.parse::<FragmentTarget>() {
            Ok(FragmentTarget::Highlight(id)) => match self.highlights.get(id) {
                Some(highlight) => ScrollTarget::highlight(highlight),
                None => {
                    log::debug!("fragment names {}", HighlightError::UnknownHighlight(id));
                    return false;
                }
            },
            Ok(FragmentTarget::Page(page_number)) => ScrollTarget::Page(page_number),
            Err(()) => {
                log::trace!("ignoring fragment {fragment:?}");
                return false;
            }
        };
        self.scroll_to(target, now)
    }

    fn retry_deferred_scroll(&mut self, now: Instant) {
        if let Some(target) = self.deferred_scroll.take() {
            self.scroll_to(target, now);
        }
    }

    pub fn has_deferred_scroll(&self) -> bool {
        self.deferred_scroll.is_some()
    }

    /// The viewer container scrolled
    pub fn on_scroll(&mut self, now: Instant) {
        if !self.is_attached() {
            return;
        }
        if self.scroll.on_scroll(now) == ScrollEvent::Manual {
            self.host.on_scroll_change();
            self.render_layers();
        }
    }

    // ---- Rendering ----

    /// Rebuild and hand out the overlay of every page that has a viewport
    pub fn render_layers(&mut self) {
        let Some(num_pages) = self.document().map(|document| document.num_pages) else {
            return;
        };

        let mut groups = partition(self.highlights.as_slice(), self.ghost.as_ref());
        for page_number in 1..=num_pages {
            let group = groups.remove(&page_number).unwrap_or_default();
            let Some(viewport) = self.renderer.viewport(page_number) else {
                // A layer drawn against a viewport that is gone is stale
                self.render_targets.remove(&page_number);
                if !group.is_empty() {
                    log::trace!("layer for page {page_number} deferred until it renders");
                    self.deferred_pages.insert(page_number);
                }
                continue;
            };

            let target = self.build_target(page_number, viewport, group);
            self.deferred_pages.remove(&page_number);
            self.host.render_page_layer(&target);
            self.render_targets.insert(page_number, target);
        }
    }

    fn build_target(
        &self,
        page_number: u32,
        viewport: PageViewport,
        group: Vec<PageHighlight>,
    ) -> RenderTarget {
        let highlights = group
            .into_iter()
            .map(|highlight| RenderedHighlight {
                viewport_position: position_to_viewport(&highlight.position, &viewport),
                is_scrolled_to: highlight
                    .id
                    .is_some_and(|id| self.scroll.is_scrolled_to(id)),
                highlight,
            })
            .collect();

        RenderTarget {
            page_number,
            viewport,
            highlights,
        }
    }

    /// Last overlay handed to the host for a page
    pub fn render_target(&self, page_number: u32) -> Option<&RenderTarget> {
        self.render_targets.get(&page_number)
    }

    /// Pages whose overlay is waiting for a viewport
    pub fn deferred_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.deferred_pages.iter().copied()
    }

    // ---- Area highlight editing ----

    /// Convert a page-relative viewport rect to scaled units
    pub fn viewport_to_scaled(&self, page_number: u32, rect: Rect) -> HighlightResult<ScaledPosition> {
        to_scaled(
            &ViewportPosition::new(page_number, rect, Vec::new()),
            &self.renderer,
        )
    }

    /// Capture the pixels under a page-relative viewport rect
    pub fn screenshot(&mut self, page_number: u32, rect: &Rect) -> Option<EncodedImage> {
        match self.renderer.capture_region(page_number, rect) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!("capture on page {page_number} failed: {err}");
                None
            }
        }
    }

    /// Move or resize an area highlight to `rect` and recapture its image
    pub fn resize_area_highlight(
        &mut self,
        id: HighlightId,
        page_number: u32,
        rect: Rect,
    ) -> HighlightResult<()> {
        if self.highlights.get(id).is_none() {
            return Err(HighlightError::UnknownHighlight(id));
        }

        let position = self.viewport_to_scaled(page_number, rect)?;
        let image = self.screenshot(page_number, &rect);
        let update = HighlightUpdate {
            bounding_rect: Some(position.bounding_rect),
            content: image.map(HighlightContent::image),
            ..Default::default()
        };
        self.update_highlight(id, &update)
    }
}
