//! Rectangle primitives shared by scaled and viewport positions
//!
//! Rectangles are axis-aligned and stored as origin plus extent. A rect may
//! carry its own page number when it belongs to a selection spanning several
//! pages; otherwise it inherits the page of the position that owns it.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing transformed coordinates
pub const COORDINATE_EPSILON: f64 = 1e-6;

/// A point in page or viewport space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with an optional page override
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,

    /// Page this rect lives on, `None` means the owning position's page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

impl Rect {
    /// Create a rect without a page override
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
            page_number: None,
        }
    }

    /// Build a normalized rect from two arbitrary corners
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::new(left, top, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Attach a page override
    pub fn on_page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// The four corners, clockwise from the origin
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right(), self.top),
            Point::new(self.right(), self.bottom()),
            Point::new(self.left, self.bottom()),
        ]
    }

    /// Page this rect belongs to, falling back to the owner's page
    pub fn effective_page(&self, owner_page: u32) -> u32 {
        self.page_number.unwrap_or(owner_page)
    }

    /// Whether the rect has no area
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether `other` lies inside this rect (within [`COORDINATE_EPSILON`])
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left - COORDINATE_EPSILON
            && other.top >= self.top - COORDINATE_EPSILON
            && other.right() <= self.right() + COORDINATE_EPSILON
            && other.bottom() <= self.bottom() + COORDINATE_EPSILON
    }

    /// Smallest rect enclosing every rect in `rects`
    ///
    /// The page override of the first rect is kept. Returns `None` for an
    /// empty input.
    pub fn union_all<'a, I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        let mut iter = rects.into_iter();
        let first = iter.next()?;

        let mut min_x = first.left;
        let mut min_y = first.top;
        let mut max_x = first.right();
        let mut max_y = first.bottom();
        for rect in iter {
            min_x = min_x.min(rect.left);
            min_y = min_y.min(rect.top);
            max_x = max_x.max(rect.right());
            max_y = max_y.max(rect.bottom());
        }

        Some(Rect {
            top: min_y,
            left: min_x,
            width: max_x - min_x,
            height: max_y - min_y,
            page_number: first.page_number,
        })
    }

    /// Clamp this rect so that it lies within `bounds`
    pub fn clamp_to(&self, bounds: &Rect) -> Rect {
        let left = self.left.clamp(bounds.left, bounds.right());
        let top = self.top.clamp(bounds.top, bounds.bottom());
        let right = self.right().clamp(bounds.left, bounds.right());
        let bottom = self.bottom().clamp(bounds.top, bounds.bottom());
        Rect {
            top,
            left,
            width: right - left,
            height: bottom - top,
            page_number: self.page_number,
        }
    }

    /// Component-wise comparison with [`COORDINATE_EPSILON`] tolerance
    pub fn approx_eq(&self, other: &Rect) -> bool {
        self.approx_eq_within(other, COORDINATE_EPSILON)
    }

    pub fn approx_eq_within(&self, other: &Rect, epsilon: f64) -> bool {
        self.page_number == other.page_number
            && (self.top - other.top).abs() <= epsilon
            && (self.left - other.left).abs() <= epsilon
            && (self.width - other.width).abs() <= epsilon
            && (self.height - other.height).abs() <= epsilon
    }
}
