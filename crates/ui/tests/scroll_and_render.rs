mod common;

use std::time::{Duration, Instant};

use common::*;
use pdf_highlighter_core::{
    Highlight, HighlightContent, HighlightId, HighlightUpdate, Rect, ScaleValue, ScaledPosition,
};
use pdf_highlighter_ui::{ScrollDestination, ScrollTarget};

fn highlight_at(page_number: u32, top: f64) -> Highlight {
    let rect = Rect::new(50.0, top, 200.0, 14.0);
    Highlight::new(
        ScaledPosition::new(page_number, rect, vec![rect]),
        HighlightContent::text("target"),
        None,
    )
}

#[test]
fn scroll_to_highlight_lands_margin_above_it() {
    let start = Instant::now();
    let (mut engine, _subscription) = ready_engine(5, start);

    let highlight = highlight_at(4, 120.0);
    let id = highlight.id();
    engine.add_highlight(highlight.clone());

    assert!(engine.scroll_to(ScrollTarget::highlight(&highlight), start));

    let instruction = engine.host().scrolls.last().copied().expect("scroll requested");
    assert_eq!(instruction.page_number, 4);
    assert_eq!(instruction.highlight_id, Some(id));
    assert_eq!(
        instruction.destination,
        ScrollDestination::Xyz {
            x: 0.0,
            y: 682.0,
            offset_top: 110.0
        }
    );

    assert_eq!(engine.scrolled_to(), Some(id));
    let rendered = engine
        .render_target(4)
        .and_then(|target| target.get(id))
        .expect("highlight rendered on page 4");
    assert!(rendered.is_scrolled_to);
}

#[test]
fn manual_scroll_clears_mark_after_settle() {
    let start = Instant::now();
    let (mut engine, _subscription) = ready_engine(5, start);

    let highlight = highlight_at(2, 300.0);
    let id = highlight.id();
    engine.add_highlight(highlight.clone());
    engine.scroll_to(ScrollTarget::highlight(&highlight), start);

    // Scroll events from the jump itself
    engine.on_scroll(start + Duration::from_millis(20));
    engine.on_scroll(start + Duration::from_millis(80));
    assert_eq!(engine.host().scroll_changes, 0);
    assert_eq!(engine.scrolled_to(), Some(id));

    engine.on_scroll(start + Duration::from_millis(400));
    assert_eq!(engine.host().scroll_changes, 1);
    assert_eq!(engine.scrolled_to(), None);
    let rendered = engine
        .render_target(2)
        .and_then(|target| target.get(id))
        .expect("highlight rendered on page 2");
    assert!(!rendered.is_scrolled_to);

    // Only the first manual scroll is reported
    engine.on_scroll(start + Duration::from_millis(500));
    assert_eq!(engine.host().scroll_changes, 1);
}

#[test]
fn scroll_to_page_goes_to_top_and_clears_mark() {
    let start = Instant::now();
    let (mut engine, _subscription) = ready_engine(5, start);

    let highlight = highlight_at(1, 10.0);
    engine.add_highlight(highlight.clone());
    engine.scroll_to(ScrollTarget::highlight(&highlight), start);

    assert!(engine.scroll_to(ScrollTarget::Page(3), start + Duration::from_secs(1)));
    let instruction = engine.host().scrolls.last().copied().expect("scroll requested");
    assert_eq!(instruction.page_number, 3);
    assert_eq!(instruction.destination, ScrollDestination::TopOfPage);
    assert_eq!(engine.scrolled_to(), None);
}

#[test]
fn scroll_to_unrendered_page_retries_after_render() {
    let start = Instant::now();
    let (mut engine, _subscription) =
        engine_with(MockRenderer::with_pages(4, 1.0).without_page(3), 4, start);

    let highlight = highlight_at(3, 120.0);
    engine.add_highlight(highlight.clone());

    assert!(!engine.scroll_to(ScrollTarget::highlight(&highlight), start));
    assert!(engine.has_deferred_scroll());
    assert!(engine.host().scrolls.is_empty());

    engine.renderer_mut().render_page(3);
    engine.on_text_layer_rendered(3, start + Duration::from_millis(300));

    assert!(!engine.has_deferred_scroll());
    assert_eq!(engine.host().scrolls.len(), 1);
    assert_eq!(engine.scrolled_to(), Some(highlight.id()));
}

#[test]
fn scroll_before_document_ready_is_served_once_ready() {
    let start = Instant::now();
    let mut engine = TestEngine::new(
        MockRenderer::with_pages(3, 1.0),
        RecordingHost::default(),
        Default::default(),
    );
    let _subscription = engine.init(pdf_highlighter_ui::DocumentInfo::new("doc-a", 3));

    assert!(!engine.scroll_to(ScrollTarget::Page(2), start));
    assert!(engine.host().scrolls.is_empty());

    engine.on_document_ready(start + Duration::from_millis(50));
    assert_eq!(engine.host().document_ready, 1);
    assert_eq!(engine.renderer().applied_scale_values, vec![ScaleValue::Auto]);
    assert_eq!(engine.host().scrolls.len(), 1);
    assert_eq!(engine.host().scrolls[0].page_number, 2);
}

#[test]
fn fragments_resolve_to_targets() {
    let start = Instant::now();
    let (mut engine, _subscription) = ready_engine(5, start);

    let highlight = highlight_at(4, 120.0);
    engine.add_highlight(highlight.clone());

    assert!(engine.scroll_to_fragment("#page-2", start));
    assert_eq!(
        engine.host().scrolls.last().map(|s| s.destination),
        Some(ScrollDestination::TopOfPage)
    );

    let fragment = format!("#highlight-{}", highlight.id());
    assert!(engine.scroll_to_fragment(&fragment, start));
    assert_eq!(
        engine.host().scrolls.last().and_then(|s| s.highlight_id),
        Some(highlight.id())
    );

    let missing = format!("#highlight-{}", HighlightId::new_v4());
    assert!(!engine.scroll_to_fragment(&missing, start));
    assert!(!engine.scroll_to_fragment("#chapter-1", start));
    assert_eq!(engine.host().scrolls.len(), 2);
}

#[test]
fn multi_page_highlight_renders_on_both_pages() {
    let start = Instant::now();
    let (mut engine, _subscription) = ready_engine(3, start);

    let first = Rect::new(10.0, 770.0, 300.0, 12.0).on_page(1);
    let second = Rect::new(10.0, 20.0, 150.0, 12.0).on_page(2);
    let highlight = Highlight::new(
        ScaledPosition::new(1, Rect::union_all(&[first, second]).unwrap_or(first), vec![first, second]),
        HighlightContent::text("spans a page break"),
        None,
    );
    let id = highlight.id();
    engine.set_highlights(vec![highlight]);

    let page1 = engine.render_target(1).and_then(|t| t.get(id)).expect("on page 1");
    assert_eq!(page1.highlight.position.rects, vec![first]);
    assert_eq!(page1.viewport_position.rects, vec![first]);

    let page2 = engine.render_target(2).and_then(|t| t.get(id)).expect("on page 2");
    assert_eq!(page2.highlight.position.page_number, 2);
    assert_eq!(page2.highlight.position.rects, vec![second]);

    assert!(engine.render_target(3).is_some_and(|t| t.highlights.is_empty()));
}

#[test]
fn rectless_highlight_renders_only_on_its_page() {
    let start = Instant::now();
    let (mut engine, _subscription) = ready_engine(4, start);

    let area = Highlight::new(
        ScaledPosition::new(3, Rect::new(40.0, 40.0, 100.0, 80.0), Vec::new()),
        HighlightContent::image("data:image/png;base64,AAAA"),
        None,
    );
    let id = area.id();
    engine.add_highlight(area);

    for page in [1, 2, 4] {
        assert!(engine.render_target(page).is_some_and(|t| t.get(id).is_none()));
    }
    assert!(engine.render_target(3).is_some_and(|t| t.get(id).is_some()));
}

#[test]
fn unrendered_page_layer_waits_for_text_layer() {
    let start = Instant::now();
    let (mut engine, _subscription) =
        engine_with(MockRenderer::with_pages(3, 1.0).without_page(2), 3, start);

    let highlight = highlight_at(2, 100.0);
    let id = highlight.id();
    engine.add_highlight(highlight);

    assert_eq!(engine.deferred_pages().collect::<Vec<_>>(), vec![2]);
    assert!(engine.render_target(2).is_none());

    engine.renderer_mut().render_page(2);
    engine.on_text_layer_rendered(2, start);

    assert_eq!(engine.deferred_pages().count(), 0);
    assert!(engine.render_target(2).and_then(|t| t.get(id)).is_some());
}

#[test]
fn update_highlight_rerenders_with_new_geometry() {
    let start = Instant::now();
    let (mut engine, _subscription) = ready_engine(2, start);

    let highlight = highlight_at(1, 100.0);
    let id = highlight.id();
    engine.add_highlight(highlight);

    let moved = Rect::new(60.0, 400.0, 120.0, 14.0);
    engine
        .update_highlight(
            id,
            &HighlightUpdate {
                bounding_rect: Some(moved),
                rects: Some(vec![moved]),
                ..Default::default()
            },
        )
        .expect("highlight exists");

    let rendered = engine.render_target(1).and_then(|t| t.get(id)).expect("rendered");
    assert_eq!(rendered.viewport_position.bounding_rect, moved);

    assert!(engine.remove_highlight(id).is_some());
    assert!(engine.render_target(1).is_some_and(|t| t.highlights.is_empty()));
}

#[test]
fn resize_reapplies_scale_once_settled() {
    let start = Instant::now();
    let (mut engine, _subscription) = ready_engine(2, start);
    assert_eq!(engine.renderer().applied_scale_values.len(), 1);

    for offset in [0, 100, 200] {
        engine.on_resize(start + Duration::from_millis(offset));
    }

    engine.tick(start + Duration::from_millis(699));
    assert_eq!(engine.renderer().applied_scale_values.len(), 1);

    engine.tick(start + Duration::from_millis(700));
    engine.tick(start + Duration::from_millis(1500));
    assert_eq!(engine.renderer().applied_scale_values.len(), 2);
}

#[test]
fn zoomed_render_scales_viewport_rects() {
    let start = Instant::now();
    let (mut engine, _subscription) =
        engine_with(MockRenderer::with_pages(1, 1.5), 1, start);

    let highlight = highlight_at(1, 120.0);
    let id = highlight.id();
    engine.add_highlight(highlight);

    let rendered = engine.render_target(1).and_then(|t| t.get(id)).expect("rendered");
    assert_eq!(
        rendered.viewport_position.bounding_rect,
        Rect::new(75.0, 180.0, 300.0, 21.0)
    );
    assert_eq!(rendered.highlight.position.bounding_rect, Rect::new(50.0, 120.0, 200.0, 14.0));
}

#[test]
fn unrendered_anchor_page_does_not_block_other_pages() {
    let start = Instant::now();
    let (mut engine, _subscription) =
        engine_with(MockRenderer::with_pages(2, 1.0).without_page(1), 2, start);

    // Text selections tag the bounding rect with the first page they touch
    let first = Rect::new(10.0, 770.0, 300.0, 12.0).on_page(1);
    let second = Rect::new(10.0, 20.0, 150.0, 12.0).on_page(2);
    let spanning = Highlight::new(
        ScaledPosition::new(1, Rect::union_all(&[first, second]).unwrap_or(first), vec![first, second]),
        HighlightContent::text("spans a page break"),
        None,
    );
    let local = highlight_at(2, 300.0);
    let (spanning_id, local_id) = (spanning.id(), local.id());
    engine.set_highlights(vec![spanning, local]);

    let page2 = engine.render_target(2).expect("page 2 has a viewport");
    assert_eq!(page2.highlights.len(), 2);
    let drawn = page2.get(spanning_id).expect("spanning highlight drawn on page 2");
    assert_eq!(drawn.viewport_position.rects, vec![second]);
    assert_eq!(
        page2.get(local_id).map(|h| h.viewport_position.bounding_rect),
        Some(Rect::new(50.0, 300.0, 200.0, 14.0))
    );

    assert_eq!(engine.deferred_pages().collect::<Vec<_>>(), vec![1]);
    assert!(engine.render_target(1).is_none());

    engine.renderer_mut().render_page(1);
    engine.on_text_layer_rendered(1, start + Duration::from_millis(100));

    assert_eq!(engine.deferred_pages().count(), 0);
    let page1 = engine.render_target(1).expect("page 1 rendered");
    assert_eq!(
        page1.get(spanning_id).map(|h| h.viewport_position.rects.clone()),
        Some(vec![first])
    );
    assert!(page1.get(local_id).is_none());
}

#[test]
fn page_losing_its_viewport_drops_cached_layer() {
    let start = Instant::now();
    let (mut engine, _subscription) = ready_engine(2, start);

    let highlight = highlight_at(2, 100.0);
    engine.add_highlight(highlight);
    assert!(engine.render_target(2).is_some());

    engine.renderer_mut().viewports.remove(&2);
    engine.render_layers();

    assert!(engine.render_target(2).is_none());
    assert_eq!(engine.deferred_pages().collect::<Vec<_>>(), vec![2]);
}
