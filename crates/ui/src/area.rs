//! Rectangular area selection by pointer drag
//!
//! Pointer coordinates are in container space. The rectangle is clamped to
//! the page the drag started on and handed out relative to that page.

use pdf_highlighter_core::geometry::{Point, Rect};

/// What the pointer is over when an event fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerTarget {
    /// A page surface; `bounds` is the page element in container coordinates
    Page { page_number: u32, bounds: Rect },
    /// The floating tip container
    Tip,
    /// Anything else inside the container (gaps between pages, toolbars)
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub target: PointerTarget,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, target: PointerTarget) -> Self {
        Self { x, y, target }
    }

    pub fn on_page(x: f64, y: f64, page_number: u32, bounds: Rect) -> Self {
        Self::new(x, y, PointerTarget::Page { page_number, bounds })
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_on_tip(&self) -> bool {
        self.target == PointerTarget::Tip
    }
}

/// A completed area selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaSelection {
    pub page_number: u32,
    /// Rectangle relative to the page element, tagged with its page
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    Idle,
    Dragging {
        page_number: u32,
        page_bounds: Rect,
        start: Point,
        current: Option<Point>,
    },
    /// Released; the rectangle stays on screen until reset
    Completed { rect: Rect },
}

/// Result of feeding a pointer event to the gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureUpdate {
    Ignored,
    /// Drag began; native text selection should be disabled
    Started,
    /// Drag rectangle changed (container coordinates)
    Moved { rect: Rect, visible: bool },
    /// Drag ended; `None` when the rectangle was too small
    Finished(Option<AreaSelection>),
    /// An earlier gesture was discarded
    Reset,
}

#[derive(Debug, Clone)]
pub struct AreaSelectionGesture {
    state: GestureState,
    min_size: f64,
}

impl AreaSelectionGesture {
    pub fn new(min_size: f64) -> Self {
        Self {
            state: GestureState::Idle,
            min_size,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Whether a rectangle is on screen
    pub fn is_visible(&self) -> bool {
        match self.state {
            GestureState::Dragging { current, .. } => current.is_some(),
            GestureState::Completed { .. } => true,
            GestureState::Idle => false,
        }
    }

    /// Current rectangle in container coordinates
    pub fn rect(&self) -> Option<Rect> {
        match self.state {
            GestureState::Dragging {
                start,
                current: Some(current),
                page_bounds,
                ..
            } => Some(Rect::from_corners(start, current).clamp_to(&page_bounds)),
            GestureState::Completed { rect } => Some(rect),
            _ => None,
        }
    }

    /// Start a drag if `start_allowed` and the pointer is on a page
    ///
    /// A refused start discards any earlier gesture.
    pub fn pointer_down(&mut self, event: &PointerEvent, start_allowed: bool) -> GestureUpdate {
        let (page_number, bounds) = match event.target {
            PointerTarget::Page { page_number, bounds } if start_allowed => (page_number, bounds),
            _ => {
                return if self.reset() {
                    GestureUpdate::Reset
                } else {
                    GestureUpdate::Ignored
                };
            }
        };

        log::trace!("area selection started on page {page_number}");
        self.state = GestureState::Dragging {
            page_number,
            page_bounds: bounds,
            start: clamp_point(event.position(), &bounds),
            current: None,
        };
        GestureUpdate::Started
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) -> GestureUpdate {
        let GestureState::Dragging {
            page_bounds,
            start,
            current,
            ..
        } = &mut self.state
        else {
            return GestureUpdate::Ignored;
        };

        let point = clamp_point(event.position(), page_bounds);
        *current = Some(point);
        GestureUpdate::Moved {
            rect: Rect::from_corners(*start, point),
            visible: true,
        }
    }

    pub fn pointer_up(&mut self, event: &PointerEvent) -> GestureUpdate {
        let GestureState::Dragging {
            page_number,
            page_bounds,
            start,
            ..
        } = self.state
        else {
            return GestureUpdate::Ignored;
        };

        let end = clamp_point(event.position(), &page_bounds);
        let rect = Rect::from_corners(start, end);

        if rect.width < self.min_size || rect.height < self.min_size {
            log::trace!("area selection too small: {}x{}", rect.width, rect.height);
            self.state = GestureState::Idle;
            return GestureUpdate::Finished(None);
        }

        self.state = GestureState::Completed { rect };
        GestureUpdate::Finished(Some(AreaSelection {
            page_number,
            rect: Rect::new(
                rect.left - page_bounds.left,
                rect.top - page_bounds.top,
                rect.width,
                rect.height,
            )
            .on_page(page_number),
        }))
    }

    /// Return to `Idle`; `true` if a gesture was discarded
    pub fn reset(&mut self) -> bool {
        let was_active = !self.is_idle();
        self.state = GestureState::Idle;
        was_active
    }
}

fn clamp_point(point: Point, bounds: &Rect) -> Point {
    Point::new(
        point.x.clamp(bounds.left, bounds.right()),
        point.y.clamp(bounds.top, bounds.bottom()),
    )
}
