//! Sliding-window z-score anomaly detector with drift compensation.
//!
//! The detector keeps the most recent `capacity` samples in a ring buffer.
//! Each arriving sample is first admitted with strict FIFO eviction, then
//! scored against the window that now contains it. Every sample (anomalous
//! or not) stays in the window for the samples that follow.
//!
//! Two phases exist:
//!
//! - **Warm-up**: after admission the window holds fewer than `capacity`
//!   samples. The sample is reported as normal.
//! - **Steady**: the window is full. Samples are classified by
//!   `|value - (mean + drift_sensitivity * len)| / std_dev > threshold`,
//!   with a flat window (`std_dev == 0`) scoring every sample as 0.
//!
//! The transition happens on the `capacity`-th sample and never reverts.
//!
//! Because the sample is part of its own window, its z-score can never
//! exceed `sqrt(capacity - 1)`. Thresholds at or above that bound flag
//! nothing.
//!
//! # Example
//!
//! ```rust
//! use trueno_anomaly::detector::SlidingWindowAnomalyDetector;
//!
//! let mut detector = SlidingWindowAnomalyDetector::new(5, 1.5, 0.0)?;
//! for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
//!     assert!(!detector.observe(v)?);
//! }
//! // Window [2, 3, 4, 5, 100]: mean 22.8, z ~ 1.9993.
//! assert!(detector.observe(100.0)?);
//! # Ok::<(), trueno_anomaly::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::ring_buffer::RingBuffer;
use crate::stats::WindowStats;
use serde::{Deserialize, Serialize};

/// Detector parameters as they appear in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Number of samples in the sliding window. Must be > 0.
    #[serde(default = "default_window_size")]
    pub window_size: i64,

    /// Z-score magnitude above which a sample is flagged.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Per-sample additive correction to the mean, scaled by window length.
    #[serde(default = "default_drift_sensitivity")]
    pub drift_sensitivity: f64,
}

fn default_window_size() -> i64 {
    100
}
fn default_threshold() -> f64 {
    2.5
}
fn default_drift_sensitivity() -> f64 {
    0.01
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            threshold: default_threshold(),
            drift_sensitivity: default_drift_sensitivity(),
        }
    }
}

impl DetectorConfig {
    /// Builds a detector from these parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] under the same rules as
    /// [`SlidingWindowAnomalyDetector::new`].
    pub fn build(&self) -> Result<SlidingWindowAnomalyDetector> {
        SlidingWindowAnomalyDetector::new(self.window_size, self.threshold, self.drift_sensitivity)
    }
}

/// Detector lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Window not yet full; no classification is attempted.
    WarmUp,
    /// Window full; every sample is classified.
    Steady,
}

/// Full result of scoring one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    /// The observed sample.
    pub value: f64,
    /// Phase the detector was in after admitting the sample.
    pub phase: Phase,
    /// Statistics of the window, sample included (steady only).
    pub stats: Option<WindowStats>,
    /// `mean + drift_sensitivity * len` (steady only).
    pub drift_adjusted_mean: Option<f64>,
    /// Signed z-score (steady only).
    pub z_score: Option<f64>,
    /// Whether the sample was classified as anomalous.
    pub is_anomaly: bool,
}

impl Assessment {
    fn warm_up(value: f64) -> Self {
        Self {
            value,
            phase: Phase::WarmUp,
            stats: None,
            drift_adjusted_mean: None,
            z_score: None,
            is_anomaly: false,
        }
    }
}

/// Streaming anomaly detector over a fixed-capacity sliding window.
///
/// Not internally synchronised: `observe` takes `&mut self`, so callers on
/// several threads must wrap the detector in a `Mutex` themselves.
#[derive(Debug, Clone)]
pub struct SlidingWindowAnomalyDetector {
    window: RingBuffer<f64>,
    threshold: f64,
    drift_sensitivity: f64,
}

impl SlidingWindowAnomalyDetector {
    /// Creates a detector.
    ///
    /// `threshold` and `drift_sensitivity` accept any finite value, including
    /// zero and negatives. A negative threshold flags every steady-state
    /// sample; that is left to the caller rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `capacity <= 0`, if
    /// `threshold` / `drift_sensitivity` is NaN or infinite, or if a window
    /// of `capacity` samples cannot be allocated.
    pub fn new(capacity: i64, threshold: f64, drift_sensitivity: f64) -> Result<Self> {
        if capacity <= 0 {
            return Err(Error::config(
                "capacity",
                format!("must be greater than 0, got {capacity}"),
            ));
        }
        let capacity = usize::try_from(capacity).map_err(|_| {
            Error::config("capacity", format!("{capacity} does not fit in memory"))
        })?;
        if !threshold.is_finite() {
            return Err(Error::config("threshold", format!("must be a finite number, got {threshold}")));
        }
        if !drift_sensitivity.is_finite() {
            return Err(Error::config(
                "drift_sensitivity",
                format!("must be a finite number, got {drift_sensitivity}"),
            ));
        }

        let window = RingBuffer::try_new(capacity).map_err(|e| {
            Error::config("capacity", format!("cannot allocate a window of {capacity} samples: {e}"))
        })?;

        Ok(Self { window, threshold, drift_sensitivity })
    }

    /// Observes one sample and returns whether it is anomalous.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `value` is NaN or infinite. The
    /// window is not touched in that case.
    pub fn observe(&mut self, value: f64) -> Result<bool> {
        self.assess(value).map(|a| a.is_anomaly)
    }

    /// Observes one sample and returns the full scoring detail.
    ///
    /// Same state transition as [`observe`](Self::observe).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `value` is NaN or infinite.
    pub fn assess(&mut self, value: f64) -> Result<Assessment> {
        if !value.is_finite() {
            return Err(Error::InvalidInput(value));
        }

        self.window.push(value);

        // A full window is never empty, so steady-state stats always exist.
        let assessment = match self.phase() {
            Phase::Steady => WindowStats::compute(self.window.iter()).map(|stats| self.score(value, stats)),
            Phase::WarmUp => None,
        }
        .unwrap_or(Assessment::warm_up(value));

        Ok(assessment)
    }

    fn score(&self, value: f64, stats: WindowStats) -> Assessment {
        let drift_adjusted_mean = stats.mean + self.drift_sensitivity * stats.len as f64;
        let z_score = stats.z_score(value, drift_adjusted_mean);

        Assessment {
            value,
            phase: Phase::Steady,
            stats: Some(stats),
            drift_adjusted_mean: Some(drift_adjusted_mean),
            z_score: Some(z_score),
            is_anomaly: z_score.abs() > self.threshold,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.window.is_full() {
            Phase::Steady
        } else {
            Phase::WarmUp
        }
    }

    /// Returns true once the window has filled.
    #[must_use]
    pub fn is_warm(&self) -> bool {
        self.phase() == Phase::Steady
    }

    /// Returns a snapshot of the window, oldest first.
    #[must_use]
    pub fn window(&self) -> Vec<f64> {
        self.window.to_vec()
    }

    /// Returns statistics of the current window, or `None` if it is empty.
    #[must_use]
    pub fn stats(&self) -> Option<WindowStats> {
        WindowStats::compute(self.window.iter())
    }

    /// Returns the number of buffered samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Returns true if no sample has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Returns the window capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    /// Returns the z-score threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the drift sensitivity.
    #[must_use]
    pub fn drift_sensitivity(&self) -> f64 {
        self.drift_sensitivity
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn feed(detector: &mut SlidingWindowAnomalyDetector, values: &[f64]) -> Vec<bool> {
        values.iter().map(|&v| detector.observe(v).unwrap()).collect()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn test_rejects_non_positive_capacity() {
        for capacity in [0, -1, i64::MIN] {
            let err = SlidingWindowAnomalyDetector::new(capacity, 2.5, 0.01).unwrap_err();
            assert!(
                matches!(err, Error::InvalidConfiguration { parameter: "capacity", .. }),
                "capacity {capacity} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_accepts_reference_configuration() {
        let detector = SlidingWindowAnomalyDetector::new(10, 2.5, 0.01).unwrap();

        assert_eq!(detector.capacity(), 10);
        assert_relative_eq!(detector.threshold(), 2.5);
        assert_relative_eq!(detector.drift_sensitivity(), 0.01);
        assert!(detector.is_empty());
        assert_eq!(detector.phase(), Phase::WarmUp);
    }

    #[test]
    fn test_accepts_negative_and_zero_parameters() {
        assert!(SlidingWindowAnomalyDetector::new(3, -1.0, -0.5).is_ok());
        assert!(SlidingWindowAnomalyDetector::new(3, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_rejects_non_finite_parameters() {
        let err = SlidingWindowAnomalyDetector::new(3, f64::NAN, 0.0).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { parameter: "threshold", .. }));

        let err = SlidingWindowAnomalyDetector::new(3, 2.0, f64::INFINITY).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { parameter: "drift_sensitivity", .. }));
    }

    #[test]
    fn test_rejects_unallocatable_capacity() {
        for capacity in [1 << 62, i64::MAX] {
            let err = SlidingWindowAnomalyDetector::new(capacity, 2.5, 0.0).unwrap_err();
            assert!(
                matches!(err, Error::InvalidConfiguration { parameter: "capacity", .. }),
                "capacity {capacity} should be rejected, got {err:?}"
            );
        }

        let config = DetectorConfig { window_size: i64::MAX, ..DetectorConfig::default() };
        assert!(config.build().is_err());
    }

    #[test]
    fn test_config_defaults_and_build() {
        let config = DetectorConfig::default();
        assert_eq!(config.window_size, 100);
        assert_relative_eq!(config.threshold, 2.5);
        assert_relative_eq!(config.drift_sensitivity, 0.01);

        let detector = config.build().unwrap();
        assert_eq!(detector.capacity(), 100);

        let bad = DetectorConfig { window_size: 0, ..config };
        assert!(bad.build().is_err());
    }

    // ========================================================================
    // Warm-up
    // ========================================================================

    #[test]
    fn test_warm_up_never_flags() {
        let mut detector = SlidingWindowAnomalyDetector::new(4, 0.1, 0.0).unwrap();

        let verdicts = feed(&mut detector, &[0.0, 1e12, -1e12]);
        assert_eq!(verdicts, vec![false, false, false]);
        assert_eq!(detector.len(), 3);
        assert!(!detector.is_warm());
    }

    #[test]
    fn test_phase_transition_is_permanent() {
        let mut detector = SlidingWindowAnomalyDetector::new(3, 2.5, 0.0).unwrap();

        feed(&mut detector, &[1.0, 2.0]);
        assert_eq!(detector.phase(), Phase::WarmUp);

        detector.observe(3.0).unwrap();
        assert_eq!(detector.phase(), Phase::Steady);

        for i in 0..50 {
            detector.observe(i as f64).unwrap();
            assert_eq!(detector.phase(), Phase::Steady);
            assert_eq!(detector.len(), 3);
        }
    }

    // ========================================================================
    // Classification
    // ========================================================================

    #[test]
    fn test_capacity_th_sample_is_classified() {
        let mut detector = SlidingWindowAnomalyDetector::new(3, 0.5, 0.0).unwrap();

        assert!(!detector.observe(0.0).unwrap());
        assert!(!detector.observe(0.0).unwrap());

        // Third sample fills the window and is scored against [0, 0, 10].
        let assessment = detector.assess(10.0).unwrap();
        assert_eq!(assessment.phase, Phase::Steady);
        assert!(assessment.is_anomaly);
        assert_relative_eq!(assessment.z_score.unwrap(), 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_outlier_after_ramp() {
        let mut detector = SlidingWindowAnomalyDetector::new(5, 1.5, 0.0).unwrap();
        feed(&mut detector, &[1.0, 2.0, 3.0, 4.0, 5.0]);

        let assessment = detector.assess(100.0).unwrap();

        // The outlier is part of its own window [2, 3, 4, 5, 100].
        assert!(assessment.is_anomaly);
        assert_eq!(assessment.phase, Phase::Steady);
        let stats = assessment.stats.unwrap();
        assert_relative_eq!(stats.mean, 22.8, epsilon = 1e-12);
        assert_relative_eq!(stats.std_dev, 1490.96_f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(assessment.z_score.unwrap(), 1.99933, epsilon = 1e-5);
    }

    #[test]
    fn test_self_inclusion_bounds_z_score() {
        // sqrt(5 - 1) = 2: no sample in a window of 5 can exceed threshold 2.
        let mut detector = SlidingWindowAnomalyDetector::new(5, 2.0, 0.0).unwrap();
        feed(&mut detector, &[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert!(!detector.observe(100.0).unwrap());
    }

    #[test]
    fn test_flat_window_never_flags() {
        let mut detector = SlidingWindowAnomalyDetector::new(6, 0.0, 0.0).unwrap();
        feed(&mut detector, &[5.0; 6]);

        let assessment = detector.assess(5.0).unwrap();
        assert!(!assessment.is_anomaly);
        assert_eq!(assessment.z_score, Some(0.0));

        // A one-sample window is always flat, so nothing is ever flagged.
        let mut detector = SlidingWindowAnomalyDetector::new(1, 0.0, 0.0).unwrap();
        assert_eq!(feed(&mut detector, &[5.0, 500.0, -1e9]), vec![false, false, false]);
    }

    #[test]
    fn test_negative_threshold_flags_everything_when_steady() {
        let mut detector = SlidingWindowAnomalyDetector::new(2, -1.0, 0.0).unwrap();
        feed(&mut detector, &[1.0, 1.0]);

        assert!(detector.observe(1.0).unwrap());
    }

    #[test]
    fn test_drift_shifts_reference_mean() {
        // Window [0, 2]: mean 1, std 1. With drift 0.5 the reference becomes
        // 1 + 0.5 * 2 = 2.
        let mut detector = SlidingWindowAnomalyDetector::new(2, 0.5, 0.5).unwrap();
        detector.observe(0.0).unwrap();

        let assessment = detector.assess(2.0).unwrap();
        assert_relative_eq!(assessment.drift_adjusted_mean.unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(assessment.z_score.unwrap(), 0.0, epsilon = 1e-12);
        assert!(!assessment.is_anomaly);

        // Without drift the same value is one sigma out.
        let mut plain = SlidingWindowAnomalyDetector::new(2, 0.5, 0.0).unwrap();
        plain.observe(0.0).unwrap();
        let assessment = plain.assess(2.0).unwrap();
        assert_relative_eq!(assessment.z_score.unwrap(), 1.0, epsilon = 1e-12);
        assert!(assessment.is_anomaly);
    }

    #[test]
    fn test_anomalies_stay_in_window() {
        let mut detector = SlidingWindowAnomalyDetector::new(3, 1.0, 0.0).unwrap();
        feed(&mut detector, &[1.0, 2.0, 3.0]);

        assert!(detector.observe(50.0).unwrap());
        assert_eq!(detector.window(), vec![2.0, 3.0, 50.0]);

        // The outlier widens the spread, so the next 50 is not flagged.
        assert!(!detector.observe(50.0).unwrap());
    }

    // ========================================================================
    // Input validation
    // ========================================================================

    #[test]
    fn test_non_finite_input_rejected_without_mutation() {
        let mut detector = SlidingWindowAnomalyDetector::new(3, 2.0, 0.0).unwrap();
        feed(&mut detector, &[1.0, 2.0]);

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = detector.observe(bad).unwrap_err();
            assert!(err.is_input_error());
            assert_eq!(detector.len(), 2);
            assert_eq!(detector.window(), vec![1.0, 2.0]);
        }
    }

    #[test]
    fn test_stats_accessor() {
        let mut detector = SlidingWindowAnomalyDetector::new(4, 2.0, 0.0).unwrap();
        assert!(detector.stats().is_none());

        feed(&mut detector, &[2.0, 4.0]);
        let stats = detector.stats().unwrap();
        assert_eq!(stats.len, 2);
        assert_relative_eq!(stats.mean, 3.0);
        assert_relative_eq!(stats.std_dev, 1.0);
    }

    #[test]
    fn test_window_snapshot_is_detached() {
        let mut detector = SlidingWindowAnomalyDetector::new(2, 2.0, 0.0).unwrap();
        detector.observe(1.0).unwrap();

        let mut snapshot = detector.window();
        snapshot.push(99.0);

        assert_eq!(detector.window(), vec![1.0]);
    }
}

// ============================================================================
// Property-based tests with proptest
// ============================================================================
