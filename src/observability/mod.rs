//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and histograms via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG)
//!     → whichever metrics recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - No recorder is installed here; without one every metric call is a no-op
//! - Labels are static strings, never user input

pub mod logging;
pub mod metrics;
