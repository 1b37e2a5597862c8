//! Scroll-to-highlight and scroll-to-page
//!
//! Resolves a target into an instruction the host can execute, and tracks
//! which highlight was scrolled to until the user scrolls manually.

use std::str::FromStr;
use std::time::{Duration, Instant};

use pdf_highlighter_core::coordinates::scaled_rect_to_viewport;
use pdf_highlighter_core::{
    Highlight, HighlightError, HighlightId, HighlightResult, ScaledPosition, ViewportSource,
};

const HIGHLIGHT_FRAGMENT_PREFIX: &str = "highlight-";
const PAGE_FRAGMENT_PREFIX: &str = "page-";

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollTarget {
    Highlight {
        id: HighlightId,
        position: ScaledPosition,
    },
    Page(u32),
}

impl ScrollTarget {
    pub fn highlight(highlight: &Highlight) -> Self {
        ScrollTarget::Highlight {
            id: highlight.id(),
            position: highlight.position().clone(),
        }
    }

    pub fn page_number(&self) -> u32 {
        match self {
            ScrollTarget::Highlight { position, .. } => position.page_number,
            ScrollTarget::Page(page_number) => *page_number,
        }
    }
}

/// Where on the page the viewer should land
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollDestination {
    TopOfPage,
    /// PDF "XYZ" destination: `(x, y)` in PDF user space, zoom unchanged
    Xyz { x: f64, y: f64, offset_top: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollInstruction {
    pub page_number: u32,
    pub destination: ScrollDestination,
    pub highlight_id: Option<HighlightId>,
}

/// Target named by a URL fragment: `#highlight-<id>` or `#page-<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentTarget {
    Highlight(HighlightId),
    Page(u32),
}

impl FromStr for FragmentTarget {
    type Err = ();

    fn from_str(fragment: &str) -> Result<Self, Self::Err> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

        if let Some(id) = fragment.strip_prefix(HIGHLIGHT_FRAGMENT_PREFIX) {
            return HighlightId::parse_str(id)
                .map(FragmentTarget::Highlight)
                .map_err(|_| ());
        }

        if let Some(page) = fragment.strip_prefix(PAGE_FRAGMENT_PREFIX) {
            return match page.parse::<u32>() {
                Ok(page_number) if page_number > 0 => Ok(FragmentTarget::Page(page_number)),
                _ => Err(()),
            };
        }

        Err(())
    }
}

impl FragmentTarget {
    pub fn to_fragment(&self) -> String {
        match self {
            FragmentTarget::Highlight(id) => format!("#{HIGHLIGHT_FRAGMENT_PREFIX}{id}"),
            FragmentTarget::Page(page_number) => format!("#{PAGE_FRAGMENT_PREFIX}{page_number}"),
        }
    }
}

/// Scroll listener lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
enum Listener {
    Detached,
    /// Re-attaches once the programmatic scroll has settled
    Suspended { until: Instant },
    Attached,
}

/// Outcome of a scroll event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEvent {
    Ignored,
    /// The user scrolled away; the scrolled-to mark was cleared
    Manual,
}

#[derive(Debug)]
pub struct ScrollCoordinator {
    margin: f64,
    settle: Duration,
    scrolled_to: Option<HighlightId>,
    listener: Listener,
}

impl ScrollCoordinator {
    pub fn new(margin: f64, settle: Duration) -> Self {
        Self {
            margin,
            settle,
            scrolled_to: None,
            listener: Listener::Detached,
        }
    }

    /// Turn a target into a scroll instruction against the current render
    pub fn resolve_target<S: ViewportSource + ?Sized>(
        &self,
        target: &ScrollTarget,
        source: &S,
    ) -> HighlightResult<ScrollInstruction> {
        let (id, position) = match target {
            ScrollTarget::Page(page_number) => {
                return Ok(ScrollInstruction {
                    page_number: *page_number,
                    destination: ScrollDestination::TopOfPage,
                    highlight_id: None,
                });
            }
            ScrollTarget::Highlight { id, position } => (*id, position),
        };

        let page_number = position.page_number;
        let viewport = source
            .viewport(page_number)
            .ok_or(HighlightError::PageNotReady { page_number })?;

        let top = scaled_rect_to_viewport(
            &position.bounding_rect,
            &viewport,
            position.use_pdf_coordinates,
        )
        .top;
        let offset_top = top - self.margin;
        let point = viewport
            .convert_to_pdf_point(0.0, offset_top)
            .ok_or(HighlightError::InvalidTransform { page_number })?;

        Ok(ScrollInstruction {
            page_number,
            destination: ScrollDestination::Xyz {
                x: point.x,
                y: point.y,
                offset_top,
            },
            highlight_id: Some(id),
        })
    }

    /// Mark the scroll target and ignore scroll events until the view settles
    ///
    /// Page targets pass `None`, which clears the mark.
    pub fn begin_programmatic_scroll(&mut self, highlight_id: Option<HighlightId>, now: Instant) {
        self.scrolled_to = highlight_id;
        self.listener = Listener::Suspended {
            until: now + self.settle,
        };
    }

    /// Feed a scroll event from the viewer container
    pub fn on_scroll(&mut self, now: Instant) -> ScrollEvent {
        self.tick(now);
        if self.listener != Listener::Attached {
            return ScrollEvent::Ignored;
        }

        log::trace!("manual scroll, clearing scrolled-to mark");
        self.scrolled_to = None;
        self.listener = Listener::Detached;
        ScrollEvent::Manual
    }

    /// Re-attach the listener once the settle period has passed
    pub fn tick(&mut self, now: Instant) {
        if let Listener::Suspended { until } = self.listener {
            if now >= until {
                self.listener = Listener::Attached;
            }
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener == Listener::Attached
    }

    pub fn scrolled_to(&self) -> Option<HighlightId> {
        self.scrolled_to
    }

    pub fn is_scrolled_to(&self, id: HighlightId) -> bool {
        self.scrolled_to == Some(id)
    }

    pub fn reset(&mut self) {
        self.scrolled_to = None;
        self.listener = Listener::Detached;
    }
}
