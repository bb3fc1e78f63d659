//! # Trueno-Anomaly
//!
//! Streaming anomaly detection for a single numeric signal.
//!
//! A fixed-capacity sliding window holds the most recent samples. Once the
//! window is full, each arriving sample is scored with a drift-compensated
//! z-score against the window's mean and population standard deviation and
//! flagged when the score exceeds a threshold. Memory is bounded by the
//! window; nothing outside it is retained.
//!
//! ## Quick Start
//!
//! ```rust
//! use trueno_anomaly::prelude::*;
//!
//! let mut detector = SlidingWindowAnomalyDetector::new(25, 2.5, 0.01)?;
//! for i in 0..100 {
//!     let value = (i as f64 * 0.3).sin();
//!     let _ = detector.observe(value)?;
//! }
//! assert_eq!(detector.len(), 25);
//! # Ok::<(), trueno_anomaly::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli`: `trueno-anomaly` binary (signal generator -> detector -> terminal)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]

// ============================================================================
// Core Modules
// ============================================================================

/// Bounded FIFO ring buffer.
pub mod ring_buffer;

/// Window mean / standard deviation.
pub mod stats;

/// Sliding-window z-score anomaly detector.
pub mod detector;

// ============================================================================
// Stream Collaborators
// ============================================================================

/// Sample sources (signal generator, replay).
pub mod source;

/// Sample sinks (history panel, terminal).
pub mod sink;

/// Source -> detector -> sink loop.
pub mod pipeline;

/// YAML configuration.
pub mod config;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for trueno-anomaly operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust
/// use trueno_anomaly::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::detector::{Assessment, DetectorConfig, Phase, SlidingWindowAnomalyDetector};
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::{ErrorPolicy, Pipeline, RunSummary, StopReason};
    pub use crate::sink::{AnomalySink, DisplayConfig, HistorySink, SampleRecord, TerminalSink};
    pub use crate::source::{Clock, ReplaySource, SampleSource, SignalGenerator, SignalParams};
    pub use crate::stats::WindowStats;
}
