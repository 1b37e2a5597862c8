//! Highlight positions in scaled (document) and viewport (pixel) space

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Position in document-intrinsic units, invariant across zoom and rotation
///
/// When `use_pdf_coordinates` is false, units are top-down page units of the
/// unrotated page at scale 1. When true, they are raw PDF user space with the
/// Y axis growing upward, and each rect's `left`/`top` hold its minimum x/y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledPosition {
    pub page_number: u32,
    pub bounding_rect: Rect,
    #[serde(default)]
    pub rects: Vec<Rect>,
    #[serde(default)]
    pub use_pdf_coordinates: bool,
}

impl ScaledPosition {
    pub fn new(page_number: u32, bounding_rect: Rect, rects: Vec<Rect>) -> Self {
        Self {
            page_number,
            bounding_rect,
            rects,
            use_pdf_coordinates: false,
        }
    }

    /// Mark the coordinates as raw PDF user space
    pub fn with_pdf_coordinates(mut self) -> Self {
        self.use_pdf_coordinates = true;
        self
    }

    /// Every page this position touches, own page first, without duplicates
    pub fn pages(&self) -> Vec<u32> {
        let mut pages = vec![self.page_number];
        for rect in &self.rects {
            if let Some(page) = rect.page_number {
                if !pages.contains(&page) {
                    pages.push(page);
                }
            }
        }
        pages
    }

    /// Rects whose effective page is `page_number`
    pub fn rects_on_page(&self, page_number: u32) -> impl Iterator<Item = &Rect> {
        self.rects
            .iter()
            .filter(move |rect| rect.effective_page(self.page_number) == page_number)
    }
}

/// Position in pixels within the rendered page element at the current zoom
///
/// Derived on demand from a [`ScaledPosition`] and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportPosition {
    pub page_number: u32,
    pub bounding_rect: Rect,
    #[serde(default)]
    pub rects: Vec<Rect>,
    #[serde(default)]
    pub use_pdf_coordinates: bool,
}

impl ViewportPosition {
    pub fn new(page_number: u32, bounding_rect: Rect, rects: Vec<Rect>) -> Self {
        Self {
            page_number,
            bounding_rect,
            rects,
            use_pdf_coordinates: false,
        }
    }

    /// Build a position from per-page client rects, bounding them on the fly
    ///
    /// Returns `None` when `rects` is empty.
    pub fn from_client_rects(page_number: u32, rects: Vec<Rect>) -> Option<Self> {
        let bounding_rect = Rect::union_all(&rects)?;
        Some(Self::new(page_number, bounding_rect, rects))
    }

    /// Page the anchor rect is drawn on
    pub fn anchor_page(&self) -> u32 {
        self.bounding_rect.effective_page(self.page_number)
    }
}
