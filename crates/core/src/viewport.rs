//! Per-page viewport metadata supplied by the renderer
//!
//! A [`PageViewport`] describes how one page is currently rendered: its
//! view box in PDF user space, the zoom scale, the rotation, and the affine
//! transform mapping page space to device (viewport pixel) space.
//!
//! The transform uses the PDF convention `[a, b, c, d, e, f]`:
//! - `x' = a * x + c * y + e`
//! - `y' = b * x + d * y + f`

use std::collections::{BTreeMap, HashMap};

use crate::geometry::Point;

/// Affine map from PDF user space to viewport pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Build from the `[a, b, c, d, e, f]` array form used by renderers
    pub fn from_array(m: [f64; 6]) -> Self {
        Self {
            a: m[0],
            b: m[1],
            c: m[2],
            d: m[3],
            e: m[4],
            f: m[5],
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Map a point (linear part plus translation)
    pub fn apply_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Map a vector (linear part only)
    pub fn apply_vector(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse of [`apply_vector`](Self::apply_vector)
    ///
    /// Divides by the determinant instead of multiplying by a precomputed
    /// inverse so that axis-aligned scales invert without rounding drift.
    pub fn invert_vector(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some((
            (self.d * x - self.c * y) / det,
            (self.a * y - self.b * x) / det,
        ))
    }

    /// Inverse of [`apply_point`](Self::apply_point)
    pub fn invert_point(&self, p: Point) -> Option<Point> {
        self.invert_vector(p.x - self.e, p.y - self.f)
            .map(|(x, y)| Point::new(x, y))
    }
}

/// Rendering metadata for one page at the current zoom and rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewport {
    /// 1-based page number
    pub page_number: u32,

    /// Page bounds in PDF user space: `[x_min, y_min, x_max, y_max]`
    pub view_box: [f64; 4],

    /// Zoom factor (1.0 = 72 DPI)
    pub scale: f64,

    /// Clockwise rotation in degrees, one of 0, 90, 180, 270
    pub rotation: u32,

    /// Page space to device space mapping
    pub transform: AffineTransform,

    /// Rendered page width in pixels
    pub width: f64,

    /// Rendered page height in pixels
    pub height: f64,
}

impl PageViewport {
    /// Derive the viewport for a page rendered at `scale` and `rotation`
    ///
    /// Y is flipped so that the viewport origin sits at the top-left corner
    /// of the rendered page. Rotations that are not a multiple of 90 degrees
    /// are treated as 0.
    pub fn new(page_number: u32, view_box: [f64; 4], scale: f64, rotation: i32) -> Self {
        let rotation = match rotation.rem_euclid(360) {
            r @ (0 | 90 | 180 | 270) => r as u32,
            other => {
                log::warn!("unsupported page rotation {other}, rendering unrotated");
                0
            }
        };

        let (rotate_a, rotate_b, rotate_c, rotate_d) = match rotation {
            90 => (0.0, 1.0, 1.0, 0.0),
            180 => (-1.0, 0.0, 0.0, 1.0),
            270 => (0.0, -1.0, -1.0, 0.0),
            _ => (1.0, 0.0, 0.0, -1.0),
        };

        let [x_min, y_min, x_max, y_max] = view_box;
        let center_x = (x_max + x_min) / 2.0;
        let center_y = (y_max + y_min) / 2.0;

        let (offset_x, offset_y, width, height) = if rotate_a == 0.0 {
            (
                (center_y - y_min).abs() * scale,
                (center_x - x_min).abs() * scale,
                (y_max - y_min) * scale,
                (x_max - x_min) * scale,
            )
        } else {
            (
                (center_x - x_min).abs() * scale,
                (center_y - y_min).abs() * scale,
                (x_max - x_min) * scale,
                (y_max - y_min) * scale,
            )
        };

        let transform = AffineTransform {
            a: rotate_a * scale,
            b: rotate_b * scale,
            c: rotate_c * scale,
            d: rotate_d * scale,
            e: offset_x - rotate_a * scale * center_x - rotate_c * scale * center_y,
            f: offset_y - rotate_b * scale * center_x - rotate_d * scale * center_y,
        };

        Self {
            page_number,
            view_box,
            scale,
            rotation,
            transform,
            width,
            height,
        }
    }

    /// Assemble a viewport from metadata computed by the renderer itself
    pub fn from_parts(
        page_number: u32,
        view_box: [f64; 4],
        scale: f64,
        rotation: u32,
        transform: [f64; 6],
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            page_number,
            view_box,
            scale,
            rotation,
            transform: AffineTransform::from_array(transform),
            width,
            height,
        }
    }

    /// Same page rendered at a different scale
    pub fn rescaled(&self, scale: f64) -> Self {
        Self::new(self.page_number, self.view_box, scale, self.rotation as i32)
    }

    /// Map a PDF user-space point to viewport pixels
    pub fn convert_to_viewport_point(&self, x: f64, y: f64) -> Point {
        self.transform.apply_point(Point::new(x, y))
    }

    /// Map a viewport pixel to PDF user space
    pub fn convert_to_pdf_point(&self, x: f64, y: f64) -> Option<Point> {
        self.transform.invert_point(Point::new(x, y))
    }
}

/// Anything that can hand out viewport metadata by page number
pub trait ViewportSource {
    /// Viewport for a page, `None` while the page is not rendered
    fn viewport(&self, page_number: u32) -> Option<PageViewport>;
}

impl ViewportSource for PageViewport {
    fn viewport(&self, page_number: u32) -> Option<PageViewport> {
        (self.page_number == page_number).then_some(*self)
    }
}

impl ViewportSource for BTreeMap<u32, PageViewport> {
    fn viewport(&self, page_number: u32) -> Option<PageViewport> {
        self.get(&page_number).copied()
    }
}

impl ViewportSource for HashMap<u32, PageViewport> {
    fn viewport(&self, page_number: u32) -> Option<PageViewport> {
        self.get(&page_number).copied()
    }
}

impl<T: ViewportSource + ?Sized> ViewportSource for &T {
    fn viewport(&self, page_number: u32) -> Option<PageViewport> {
        (**self).viewport(page_number)
    }
}
