//! PDF Highlighter Scheduler Library
//!
//! Host-clocked timing primitives for the highlighter: trailing debounce
//! timers and cancellation of document sessions.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use pdf_highlighter_scheduler::TrailingDebounce;
//!
//! let start = Instant::now();
//! let mut finalize = TrailingDebounce::new(Duration::from_millis(500));
//!
//! finalize.schedule("first", start);
//! finalize.schedule("second", start + Duration::from_millis(50));
//!
//! assert_eq!(finalize.poll(start + Duration::from_millis(500)), None);
//! assert_eq!(finalize.poll(start + Duration::from_millis(550)), Some("second"));
//! ```

mod cancel;
mod debounce;

// Re-export public API
pub use cancel::{CancellationToken, Subscription};
pub use debounce::TrailingDebounce;
