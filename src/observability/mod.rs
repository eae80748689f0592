//! Observability for the translation engine
//!
//! - Structured logging (JSON lines)
//! - Atomic translation counters
//! - Typed events
//!
//! Observability is read-only: nothing here changes what a pipeline
//! translates to.
//!
//! ```ignore
//! use aeroquery::observability::{Event, Logger, TranslationMetrics};
//!
//! Logger::info(Event::TranslationComplete, &[("collection", "docs")]);
//!
//! let metrics = TranslationMetrics::new();
//! metrics.increment_translations();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, TranslationMetrics};
