//! Highlight data model
//!
//! Highlights are immutable values: updates produce a new value with the same
//! id so that upstream render diffing sees a replacement rather than an
//! in-place mutation.

use serde::{Deserialize, Serialize};

use crate::error::{HighlightError, HighlightResult};
use crate::geometry::Rect;
use crate::position::ScaledPosition;

/// Process-unique highlight identifier
///
/// Generated using UUID v4, stable across renders.
pub type HighlightId = uuid::Uuid;

/// Encoded image payload (a `data:` URL) produced by region capture
pub type EncodedImage = String;

/// What a highlight marks: selected text, a captured image, or both
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HighlightContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EncodedImage>,
}

impl HighlightContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn image(image: impl Into<EncodedImage>) -> Self {
        Self {
            text: None,
            image: Some(image.into()),
        }
    }

    /// Area highlights carry an image, text highlights do not
    pub fn is_area(&self) -> bool {
        self.image.is_some()
    }

    /// Overlay the fields set in `patch`
    pub fn merged(&self, patch: &HighlightContent) -> Self {
        Self {
            text: patch.text.clone().or_else(|| self.text.clone()),
            image: patch.image.clone().or_else(|| self.image.clone()),
        }
    }
}

/// User comment attached when a highlight is saved
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    #[serde(default)]
    pub emoji: String,
}

impl Comment {
    pub fn new(text: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emoji: emoji.into(),
        }
    }
}

/// A saved highlight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    id: HighlightId,
    position: ScaledPosition,
    content: HighlightContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<Comment>,
}

impl Highlight {
    /// Create a highlight with a freshly generated id
    pub fn new(position: ScaledPosition, content: HighlightContent, comment: Option<Comment>) -> Self {
        Self::with_id(HighlightId::new_v4(), position, content, comment)
    }

    /// Create a highlight with a known id (for hosts restoring their own data)
    pub fn with_id(
        id: HighlightId,
        position: ScaledPosition,
        content: HighlightContent,
        comment: Option<Comment>,
    ) -> Self {
        Self {
            id,
            position,
            content,
            comment,
        }
    }

    pub fn id(&self) -> HighlightId {
        self.id
    }

    pub fn position(&self) -> &ScaledPosition {
        &self.position
    }

    pub fn content(&self) -> &HighlightContent {
        &self.content
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    /// Copy with a replaced position (id preserved)
    pub fn with_position(&self, position: ScaledPosition) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    /// Copy with replaced content (id preserved)
    pub fn with_content(&self, content: HighlightContent) -> Self {
        Self {
            content,
            ..self.clone()
        }
    }

    /// Copy with a partial update applied
    pub fn apply_update(&self, update: &HighlightUpdate) -> Self {
        let mut position = self.position.clone();
        if let Some(page_number) = update.page_number {
            position.page_number = page_number;
        }
        if let Some(bounding_rect) = update.bounding_rect {
            position.bounding_rect = bounding_rect;
        }
        if let Some(rects) = &update.rects {
            position.rects = rects.clone();
        }

        let content = match &update.content {
            Some(patch) => self.content.merged(patch),
            None => self.content.clone(),
        };

        Self {
            id: self.id,
            position,
            content,
            comment: update.comment.clone().or_else(|| self.comment.clone()),
        }
    }
}

/// Partial highlight update; unset fields keep their current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightUpdate {
    pub page_number: Option<u32>,
    pub bounding_rect: Option<Rect>,
    pub rects: Option<Vec<Rect>>,
    pub content: Option<HighlightContent>,
    pub comment: Option<Comment>,
}

/// A finalized but unconfirmed highlight candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostHighlight {
    pub position: ScaledPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<HighlightContent>,
}

impl GhostHighlight {
    pub fn new(position: ScaledPosition) -> Self {
        Self {
            position,
            content: None,
        }
    }

    pub fn with_content(position: ScaledPosition, content: HighlightContent) -> Self {
        Self {
            position,
            content: Some(content),
        }
    }

    /// Promote to a saved highlight with a new id
    pub fn into_highlight(self, fallback_content: HighlightContent, comment: Option<Comment>) -> Highlight {
        Highlight::new(
            self.position,
            self.content.unwrap_or(fallback_content),
            comment,
        )
    }
}

/// Ordered in-memory highlight list
///
/// Keeps insertion order, which the page partitioner relies on for stable
/// overlay ordering.
#[derive(Debug, Clone, Default)]
pub struct HighlightCollection {
    highlights: Vec<Highlight>,
}

impl HighlightCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(highlights: Vec<Highlight>) -> Self {
        Self { highlights }
    }

    /// Append a highlight
    pub fn add(&mut self, highlight: Highlight) {
        self.highlights.push(highlight);
    }

    pub fn get(&self, id: HighlightId) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id() == id)
    }

    /// Replace a highlight by id with an updated copy
    pub fn update(&mut self, id: HighlightId, update: &HighlightUpdate) -> HighlightResult<&Highlight> {
        let index = self
            .highlights
            .iter()
            .position(|h| h.id() == id)
            .ok_or(HighlightError::UnknownHighlight(id))?;
        let updated = self.highlights[index].apply_update(update);
        self.highlights[index] = updated;
        Ok(&self.highlights[index])
    }

    pub fn remove(&mut self, id: HighlightId) -> Option<Highlight> {
        let index = self.highlights.iter().position(|h| h.id() == id)?;
        Some(self.highlights.remove(index))
    }

    pub fn clear(&mut self) {
        self.highlights.clear();
    }

    pub fn as_slice(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.highlights.iter()
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }
}
