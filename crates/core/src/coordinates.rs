//! Conversion between scaled (document) and viewport (pixel) positions
//!
//! Corners are mapped as points through the full affine transform and the
//! resulting origin is the minimum corner. Width and height are mapped as
//! vectors through the linear part only. Both directions resolve each rect
//! against the viewport of the page it lives on.

use crate::error::{HighlightError, HighlightResult};
use crate::geometry::{Point, Rect};
use crate::position::{ScaledPosition, ViewportPosition};
use crate::viewport::{PageViewport, ViewportSource};

/// Resolution of scaled coordinates produced by inverse mapping
const SCALED_GRID: f64 = 1e9;

/// Beyond this magnitude `value * SCALED_GRID` loses integer precision
const SCALED_GRID_LIMIT: f64 = 1e6;

/// Convert one scaled rect to viewport pixels
pub fn scaled_rect_to_viewport(
    rect: &Rect,
    viewport: &PageViewport,
    use_pdf_coordinates: bool,
) -> Rect {
    let transform = &viewport.transform;

    let (dx, dy) = if use_pdf_coordinates {
        transform.apply_vector(rect.width, rect.height)
    } else {
        // Top-down height points downward in PDF space
        transform.apply_vector(rect.width, -rect.height)
    };

    let origin = min_corner(
        rect.corners()
            .map(|corner| transform.apply_point(scaled_to_pdf(corner, viewport, use_pdf_coordinates))),
    );

    Rect {
        top: origin.y,
        left: origin.x,
        width: dx.abs(),
        height: dy.abs(),
        page_number: rect.page_number,
    }
}

/// Convert one viewport rect back to scaled units
pub fn viewport_rect_to_scaled(
    rect: &Rect,
    viewport: &PageViewport,
    use_pdf_coordinates: bool,
) -> HighlightResult<Rect> {
    let transform = &viewport.transform;
    let singular = || HighlightError::InvalidTransform {
        page_number: viewport.page_number,
    };

    let (width, height) = transform
        .invert_vector(rect.width, rect.height)
        .ok_or_else(singular)?;

    let mut corners = [Point::default(); 4];
    for (slot, corner) in corners.iter_mut().zip(rect.corners()) {
        *slot = transform.invert_point(corner).ok_or_else(singular)?;
    }

    let min = min_corner(corners);
    let (left, top) = if use_pdf_coordinates {
        (min.x, min.y)
    } else {
        let max_y = corners
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max);
        let [x_min, _, _, y_max] = viewport.view_box;
        (min.x - x_min, y_max - max_y)
    };

    Ok(Rect {
        top: snap_to_grid(top),
        left: snap_to_grid(left),
        width: snap_to_grid(width.abs()),
        height: snap_to_grid(height.abs()),
        page_number: rect.page_number,
    })
}

/// Convert a page-local projection against one page's viewport
///
/// Every rect, the bounding rect included, is mapped through `viewport`
/// whatever page it is tagged with. Used for per-page overlays, where the
/// projection has already been filtered to the rects of that page.
pub fn position_to_viewport(position: &ScaledPosition, viewport: &PageViewport) -> ViewportPosition {
    let convert = |rect: &Rect| scaled_rect_to_viewport(rect, viewport, position.use_pdf_coordinates);
    ViewportPosition {
        page_number: position.page_number,
        bounding_rect: convert(&position.bounding_rect),
        rects: position.rects.iter().map(convert).collect(),
        use_pdf_coordinates: position.use_pdf_coordinates,
    }
}

/// Convert a scaled position into viewport pixels for the current render
///
/// Fails with [`HighlightError::PageNotReady`] when any page the position
/// touches has no viewport yet.
pub fn to_viewport<S: ViewportSource + ?Sized>(
    position: &ScaledPosition,
    source: &S,
) -> HighlightResult<ViewportPosition> {
    let convert = |rect: &Rect| -> HighlightResult<Rect> {
        let viewport = resolve(source, rect.effective_page(position.page_number))?;
        Ok(scaled_rect_to_viewport(
            rect,
            &viewport,
            position.use_pdf_coordinates,
        ))
    };

    Ok(ViewportPosition {
        page_number: position.page_number,
        bounding_rect: convert(&position.bounding_rect)?,
        rects: position
            .rects
            .iter()
            .map(convert)
            .collect::<HighlightResult<Vec<_>>>()?,
        use_pdf_coordinates: position.use_pdf_coordinates,
    })
}

/// Convert a viewport position into scaled units
pub fn to_scaled<S: ViewportSource + ?Sized>(
    position: &ViewportPosition,
    source: &S,
) -> HighlightResult<ScaledPosition> {
    let convert = |rect: &Rect| -> HighlightResult<Rect> {
        let viewport = resolve(source, rect.effective_page(position.page_number))?;
        viewport_rect_to_scaled(rect, &viewport, position.use_pdf_coordinates)
    };

    Ok(ScaledPosition {
        page_number: position.page_number,
        bounding_rect: convert(&position.bounding_rect)?,
        rects: position
            .rects
            .iter()
            .map(convert)
            .collect::<HighlightResult<Vec<_>>>()?,
        use_pdf_coordinates: position.use_pdf_coordinates,
    })
}

fn resolve<S: ViewportSource + ?Sized>(source: &S, page_number: u32) -> HighlightResult<PageViewport> {
    source
        .viewport(page_number)
        .ok_or(HighlightError::PageNotReady { page_number })
}

/// Lift a scaled corner into PDF user space
fn scaled_to_pdf(corner: Point, viewport: &PageViewport, use_pdf_coordinates: bool) -> Point {
    if use_pdf_coordinates {
        return corner;
    }
    let [x_min, _, _, y_max] = viewport.view_box;
    Point::new(x_min + corner.x, y_max - corner.y)
}

/// Round a scaled value to the nearest multiple of `1 / SCALED_GRID`
///
/// Forward then inverse mapping drifts by a few ulps; snapping removes the
/// drift for any value with at most nine fractional digits.
fn snap_to_grid(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= SCALED_GRID_LIMIT {
        return value;
    }
    (value * SCALED_GRID).round() / SCALED_GRID
}

fn min_corner(points: [Point; 4]) -> Point {
    points.iter().skip(1).fold(points[0], |acc, p| {
        Point::new(acc.x.min(p.x), acc.y.min(p.y))
    })
}
