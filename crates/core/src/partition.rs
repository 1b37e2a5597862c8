//! Per-page grouping of highlights for overlay rendering
//!
//! A highlight is drawn on every page it spans, carrying only the rects that
//! belong to that page. Rect-less highlights (pure area highlights) still
//! show up on their own page.

use std::collections::{BTreeMap, BTreeSet};

use crate::highlight::{Comment, GhostHighlight, Highlight, HighlightContent, HighlightId};
use crate::position::ScaledPosition;

/// Page-local projection of a highlight or of the ghost
#[derive(Debug, Clone, PartialEq)]
pub struct PageHighlight {
    /// `None` for the ghost highlight
    pub id: Option<HighlightId>,

    /// Position with `page_number` set to the target page and rects filtered
    pub position: ScaledPosition,

    pub content: Option<HighlightContent>,

    pub comment: Option<Comment>,

    /// Page the source highlight is anchored on
    pub home_page: u32,
}

impl PageHighlight {
    pub fn is_ghost(&self) -> bool {
        self.id.is_none()
    }

    /// Whether this projection sits on the highlight's anchor page
    pub fn is_home_page(&self) -> bool {
        self.position.page_number == self.home_page
    }
}

/// Highlights grouped by page, pages ascending
pub type PageGroups = BTreeMap<u32, Vec<PageHighlight>>;

struct Entry<'a> {
    id: Option<HighlightId>,
    position: &'a ScaledPosition,
    content: Option<&'a HighlightContent>,
    comment: Option<&'a Comment>,
}

/// Group highlights (plus the ghost, if any) by every page they touch
///
/// Within a page, entries keep input order with the ghost last.
pub fn partition(highlights: &[Highlight], ghost: Option<&GhostHighlight>) -> PageGroups {
    let entries: Vec<Entry<'_>> = highlights
        .iter()
        .map(|h| Entry {
            id: Some(h.id()),
            position: h.position(),
            content: Some(h.content()),
            comment: h.comment(),
        })
        .chain(ghost.map(|g| Entry {
            id: None,
            position: &g.position,
            content: g.content.as_ref(),
            comment: None,
        }))
        .collect();

    let pages: BTreeSet<u32> = entries
        .iter()
        .flat_map(|entry| entry.position.pages())
        .collect();

    let mut groups = PageGroups::new();
    for page_number in pages {
        let group = groups.entry(page_number).or_default();
        for entry in &entries {
            let rects: Vec<_> = entry.position.rects_on_page(page_number).copied().collect();
            if rects.is_empty() && page_number != entry.position.page_number {
                continue;
            }

            group.push(PageHighlight {
                id: entry.id,
                position: ScaledPosition {
                    page_number,
                    bounding_rect: entry.position.bounding_rect,
                    rects,
                    use_pdf_coordinates: entry.position.use_pdf_coordinates,
                },
                content: entry.content.cloned(),
                comment: entry.comment.cloned(),
                home_page: entry.position.page_number,
            });
        }
    }

    groups
}
