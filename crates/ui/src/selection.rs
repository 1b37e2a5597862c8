//! Text selection lifecycle
//!
//! Tracks a native text selection from the first change event through the
//! debounced finalize, the tip that offers to save it, and the final commit
//! or cancel:
//!
//! `Idle -> Selecting -> Stable -> TipOpen -> Idle`
//!
//! Finalization is debounced: bursts of selection changes coalesce into one
//! finalize carrying the last range.

use std::time::{Duration, Instant};

use pdf_highlighter_core::geometry::Rect;
use pdf_highlighter_core::position::ViewportPosition;
use pdf_highlighter_core::{HighlightError, HighlightResult};
use pdf_highlighter_scheduler::TrailingDebounce;

/// Token identifying one finalized selection awaiting confirm, commit, or cancel
pub type PendingId = u64;

/// A non-collapsed text range as reported by the host
#[derive(Debug, Clone, PartialEq)]
pub struct TextRange {
    /// Selected text
    pub text: String,

    /// Client rects relative to their page element, each tagged with its page
    pub rects: Vec<Rect>,
}

impl TextRange {
    pub fn new(text: impl Into<String>, rects: Vec<Rect>) -> Self {
        Self {
            text: text.into(),
            rects,
        }
    }

    /// Range whose rects all lie on one page
    pub fn on_page(text: impl Into<String>, page_number: u32, rects: Vec<Rect>) -> Self {
        Self::new(
            text,
            rects.into_iter().map(|rect| rect.on_page(page_number)).collect(),
        )
    }

    /// Rects that have an area and a page
    fn usable_rects(&self) -> Vec<Rect> {
        self.rects
            .iter()
            .filter(|rect| rect.page_number.is_some() && !rect.is_empty())
            .copied()
            .collect()
    }
}

/// Snapshot of the document selection at the time of a change event
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionSnapshot {
    Collapsed,
    Range {
        range: TextRange,
        /// Whether the range's common ancestor lies inside the highlighter container
        inside_container: bool,
    },
}

impl SelectionSnapshot {
    pub fn inside(range: TextRange) -> Self {
        SelectionSnapshot::Range {
            range,
            inside_container: true,
        }
    }

    pub fn outside(range: TextRange) -> Self {
        SelectionSnapshot::Range {
            range,
            inside_container: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionState {
    Idle,
    Selecting,
    /// Finalized geometry, tip not yet shown
    Stable(TextRange),
    TipOpen {
        pending: PendingId,
        confirmed: bool,
    },
}

/// What a selection change did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// Selection collapsed; `dismissed` is the unconfirmed pending selection it dropped
    Collapsed { dismissed: Option<PendingId> },
    /// A new range is being selected; `superseded` was implicitly cancelled
    Selecting { superseded: Option<PendingId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Committed(PendingId),
    Cancelled(PendingId),
}

/// Geometry and text of a finalized text selection
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedSelection {
    pub position: ViewportPosition,
    pub text: String,
}

#[derive(Debug)]
pub struct SelectionStateMachine {
    state: SelectionState,
    finalize: TrailingDebounce<TextRange>,
    collapsed: bool,
    area_selection_active: bool,
}

impl SelectionStateMachine {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: SelectionState::Idle,
            finalize: TrailingDebounce::new(debounce),
            collapsed: true,
            area_selection_active: false,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Pending selection the open tip belongs to
    pub fn pending(&self) -> Option<PendingId> {
        match self.state {
            SelectionState::TipOpen { pending, .. } => Some(pending),
            _ => None,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_finalize_pending(&self) -> bool {
        self.finalize.is_pending()
    }

    /// Feed a selection change event
    ///
    /// Ranges outside the container are rejected with
    /// [`HighlightError::ContainerMismatch`] and leave the state untouched.
    pub fn on_selection_change(
        &mut self,
        snapshot: SelectionSnapshot,
        now: Instant,
    ) -> HighlightResult<SelectionChange> {
        let range = match snapshot {
            SelectionSnapshot::Collapsed => return Ok(self.collapse()),
            SelectionSnapshot::Range {
                inside_container: false,
                ..
            } => return Err(HighlightError::ContainerMismatch),
            SelectionSnapshot::Range { range, .. } => range,
        };

        self.collapsed = false;
        let superseded = self.pending();
        if let Some(pending) = superseded {
            log::trace!("selection {pending} superseded by a new range");
        }

        self.state = SelectionState::Selecting;
        self.finalize.schedule(range, now);
        Ok(SelectionChange::Selecting { superseded })
    }

    fn collapse(&mut self) -> SelectionChange {
        self.collapsed = true;
        self.finalize.cancel();

        match self.state {
            // Confirmed selections keep their ghost and tip while the user writes a comment
            SelectionState::TipOpen {
                confirmed: true, ..
            } => SelectionChange::Collapsed { dismissed: None },
            SelectionState::TipOpen {
                pending,
                confirmed: false,
            } => {
                self.state = SelectionState::Idle;
                SelectionChange::Collapsed {
                    dismissed: Some(pending),
                }
            }
            _ => {
                self.state = SelectionState::Idle;
                SelectionChange::Collapsed { dismissed: None }
            }
        }
    }

    /// Run the finalize if its quiet period has elapsed
    ///
    /// Returns `None` while nothing is due.
    pub fn poll(&mut self, now: Instant) -> Option<HighlightResult<FinalizedSelection>> {
        let range = self.finalize.poll(now)?;

        if self.state != SelectionState::Selecting || self.collapsed {
            return Some(Err(HighlightError::StaleFinalize));
        }

        let rects = range.usable_rects();
        let page_number = match rects.first().and_then(|rect| rect.page_number) {
            Some(page_number) => page_number,
            None => return Some(Err(HighlightError::EmptySelection)),
        };
        let position = ViewportPosition::from_client_rects(page_number, rects)?;

        let text = range.text.clone();
        self.state = SelectionState::Stable(range);
        Some(Ok(FinalizedSelection { position, text }))
    }

    /// Attach the pending id of the tip shown for the stable selection
    pub fn open_tip(&mut self, pending: PendingId) -> bool {
        if !matches!(self.state, SelectionState::Stable(_)) {
            return false;
        }
        self.state = SelectionState::TipOpen {
            pending,
            confirmed: false,
        };
        true
    }

    /// Record that the user turned the selection into a ghost
    pub fn mark_confirmed(&mut self, pending: PendingId) -> bool {
        match &mut self.state {
            SelectionState::TipOpen {
                pending: current,
                confirmed,
            } if *current == pending => {
                *confirmed = true;
                true
            }
            _ => false,
        }
    }

    pub fn commit(&mut self, pending: PendingId) -> Option<SelectionOutcome> {
        self.finish(pending, SelectionOutcome::Committed(pending))
    }

    pub fn cancel(&mut self, pending: PendingId) -> Option<SelectionOutcome> {
        self.finish(pending, SelectionOutcome::Cancelled(pending))
    }

    fn finish(&mut self, pending: PendingId, outcome: SelectionOutcome) -> Option<SelectionOutcome> {
        if self.pending() != Some(pending) {
            return None;
        }
        self.state = SelectionState::Idle;
        Some(outcome)
    }

    /// Drop everything and return to `Idle`, reporting the pending selection if any
    pub fn reset(&mut self) -> Option<PendingId> {
        let pending = self.pending();
        self.finalize.cancel();
        self.state = SelectionState::Idle;
        pending
    }

    pub fn set_area_selection_active(&mut self, active: bool) {
        self.area_selection_active = active;
    }

    pub fn is_area_selection_active(&self) -> bool {
        self.area_selection_active
    }

    /// Whether hovering a saved highlight may open its tip
    pub fn allows_hover_tip(&self, ghost_exists: bool) -> bool {
        self.collapsed && !ghost_exists && !self.area_selection_active
    }
}
