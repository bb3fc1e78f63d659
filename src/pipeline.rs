//! Sequential source -> detector -> sink loop.
//!
//! The loop is strictly ordered: the sink receives the verdict for sample k
//! before sample k+1 is pulled from the source. Stopping (sample limit,
//! exhausted source, stop flag) is decided here, between samples, never
//! inside the detector.

use crate::detector::SlidingWindowAnomalyDetector;
use crate::error::Result;
use crate::sink::{AnomalySink, SampleRecord};
use crate::source::SampleSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What to do when the detector rejects a sample from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop and return the error.
    #[default]
    Halt,
    /// Log, count and continue with the next sample.
    Skip,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source returned `None`.
    SourceExhausted,
    /// The configured sample limit was reached.
    SampleLimit,
    /// The stop flag was raised.
    Interrupted,
}

/// Totals for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Samples classified and delivered to the sink.
    pub samples: u64,
    /// Samples classified as anomalous.
    pub anomalies: u64,
    /// Samples rejected by the detector and skipped.
    pub skipped: u64,
    /// Why the run ended.
    pub stop: StopReason,
}

/// Drives a source through a detector into a sink.
pub struct Pipeline<S, K> {
    source: S,
    detector: SlidingWindowAnomalyDetector,
    sink: K,
    max_samples: Option<u64>,
    pacing: Option<Duration>,
    policy: ErrorPolicy,
    stop: Arc<AtomicBool>,
    next_index: u64,
}

impl<S: SampleSource, K: AnomalySink> Pipeline<S, K> {
    /// Creates a pipeline with no sample limit, no pacing and
    /// [`ErrorPolicy::Halt`].
    pub fn new(source: S, detector: SlidingWindowAnomalyDetector, sink: K) -> Self {
        Self {
            source,
            detector,
            sink,
            max_samples: None,
            pacing: None,
            policy: ErrorPolicy::default(),
            stop: Arc::new(AtomicBool::new(false)),
            next_index: 0,
        }
    }

    /// Stops after `limit` delivered samples (`None` runs until the source
    /// ends or the stop flag is raised).
    #[must_use]
    pub fn max_samples(mut self, limit: Option<u64>) -> Self {
        self.max_samples = limit;
        self
    }

    /// Sleeps this long after each delivered sample.
    #[must_use]
    pub fn pacing(mut self, pacing: Option<Duration>) -> Self {
        self.pacing = pacing;
        self
    }

    /// Sets the policy for samples the detector rejects.
    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shares an external stop flag (e.g. set from a Ctrl-C handler).
    #[must_use]
    pub fn stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Returns a handle that stops the run when set.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Returns the detector.
    #[must_use]
    pub fn detector(&self) -> &SlidingWindowAnomalyDetector {
        &self.detector
    }

    /// Returns the sink.
    #[must_use]
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Consumes the pipeline, returning the sink.
    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Runs until the source ends, the sample limit is hit or the stop flag
    /// is raised.
    ///
    /// Delivered samples get contiguous indices across successive runs.
    ///
    /// # Errors
    ///
    /// Source and sink errors always end the run. Detector input errors end
    /// it under [`ErrorPolicy::Halt`] and are skipped under
    /// [`ErrorPolicy::Skip`].
    pub fn run(&mut self) -> Result<RunSummary> {
        info!(
            window = self.detector.capacity(),
            threshold = self.detector.threshold(),
            drift_sensitivity = self.detector.drift_sensitivity(),
            "starting anomaly detection"
        );

        let mut samples = 0u64;
        let mut anomalies = 0u64;
        let mut skipped = 0u64;

        let stop = loop {
            if self.stop.load(Ordering::Relaxed) {
                break StopReason::Interrupted;
            }
            if self.max_samples.is_some_and(|limit| samples >= limit) {
                break StopReason::SampleLimit;
            }

            let Some(value) = self.source.next_sample()? else {
                break StopReason::SourceExhausted;
            };

            let is_anomaly = match self.detector.observe(value) {
                Ok(verdict) => verdict,
                Err(e) if e.is_input_error() && self.policy == ErrorPolicy::Skip => {
                    warn!(value, "skipping rejected sample: {e}");
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let record = SampleRecord { index: self.next_index, value, is_anomaly };
            self.sink.accept(&record)?;
            self.next_index += 1;
            samples += 1;

            if is_anomaly {
                anomalies += 1;
                debug!(index = record.index, value, "anomaly");
            }

            if let Some(pause) = self.pacing {
                std::thread::sleep(pause);
            }
        };

        info!(samples, anomalies, skipped, ?stop, "anomaly detection stopped");
        Ok(RunSummary { samples, anomalies, skipped, stop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::ReplaySource;

    fn detector(capacity: i64, threshold: f64) -> SlidingWindowAnomalyDetector {
        SlidingWindowAnomalyDetector::new(capacity, threshold, 0.0).unwrap()
    }

    #[test]
    fn test_records_delivered_in_order() {
        let source = ReplaySource::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0, 3.0]);
        let mut pipeline = Pipeline::new(source, detector(5, 1.5), Vec::new());

        let summary = pipeline.run().unwrap();

        assert_eq!(summary.samples, 7);
        assert_eq!(summary.anomalies, 1);
        assert_eq!(summary.stop, StopReason::SourceExhausted);

        let records = pipeline.into_sink();
        let indices: Vec<u64> = records.iter().map(|r| r.index).collect();
        assert_eq!(indices, (0..7).collect::<Vec<_>>());
        assert!(records[5].is_anomaly);
        assert!(!records[6].is_anomaly);
    }

    #[test]
    fn test_sample_limit() {
        let source = ReplaySource::new((0..100).map(f64::from));
        let mut pipeline = Pipeline::new(source, detector(3, 2.5), Vec::new()).max_samples(Some(10));

        let summary = pipeline.run().unwrap();

        assert_eq!(summary.samples, 10);
        assert_eq!(summary.stop, StopReason::SampleLimit);
        assert_eq!(pipeline.sink().len(), 10);
    }

    #[test]
    fn test_stop_flag_interrupts() {
        let source = ReplaySource::new(std::iter::repeat(1.0));
        let mut pipeline = Pipeline::new(source, detector(3, 2.5), Vec::new());

        pipeline.stop_handle().store(true, Ordering::Relaxed);
        let summary = pipeline.run().unwrap();

        assert_eq!(summary.samples, 0);
        assert_eq!(summary.stop, StopReason::Interrupted);
    }

    #[test]
    fn test_halt_policy_returns_input_error() {
        let source = ReplaySource::new(vec![1.0, f64::NAN, 2.0]);
        let mut pipeline = Pipeline::new(source, detector(3, 2.5), Vec::new());

        let err = pipeline.run().unwrap_err();

        assert!(matches!(err, Error::InvalidInput(v) if v.is_nan()));
        assert_eq!(pipeline.sink().len(), 1);
        assert_eq!(pipeline.detector().len(), 1);
    }

    #[test]
    fn test_skip_policy_continues() {
        let source = ReplaySource::new(vec![1.0, f64::INFINITY, 2.0, f64::NAN, 3.0]);
        let mut pipeline = Pipeline::new(source, detector(3, 2.5), Vec::new())
            .error_policy(ErrorPolicy::Skip);

        let summary = pipeline.run().unwrap();

        assert_eq!(summary.samples, 3);
        assert_eq!(summary.skipped, 2);
        assert_eq!(pipeline.detector().window(), vec![1.0, 2.0, 3.0]);

        let indices: Vec<u64> = pipeline.sink().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_indices_continue_across_runs() {
        let source = ReplaySource::new((0..6).map(f64::from));
        let mut pipeline = Pipeline::new(source, detector(2, 2.5), Vec::new()).max_samples(Some(3));

        pipeline.run().unwrap();
        pipeline.run().unwrap();

        let indices: Vec<u64> = pipeline.sink().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    struct FailingSource;

    impl SampleSource for FailingSource {
        fn next_sample(&mut self) -> Result<Option<f64>> {
            Err(Error::signal("amplitude", "generator failed"))
        }
    }

    #[test]
    fn test_source_error_propagates_even_when_skipping() {
        let mut pipeline =
            Pipeline::new(FailingSource, detector(3, 2.5), Vec::new()).error_policy(ErrorPolicy::Skip);

        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, Error::InvalidSignal { .. }));
        assert!(pipeline.detector().is_empty());
    }

    #[test]
    fn test_borrowed_sink() {
        let mut records: Vec<SampleRecord> = Vec::new();
        {
            let source = ReplaySource::new(vec![1.0, 2.0]);
            let mut pipeline = Pipeline::new(source, detector(2, 2.5), &mut records);
            pipeline.run().unwrap();
        }
        assert_eq!(records.len(), 2);
    }
}
