//! Consumers of classified samples.
//!
//! Sinks receive one [`SampleRecord`] per sample, in arrival order, after the
//! detector has classified it. They own presentation and retention; the
//! detector never sees them.

use crate::error::Result;
use crate::ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use std::io::Write;
use tracing::warn;

/// One classified sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleRecord {
    /// Zero-based position in the stream.
    pub index: u64,
    /// Sample value.
    pub value: f64,
    /// Detector verdict.
    pub is_anomaly: bool,
}

/// Anything that accepts classified samples.
pub trait AnomalySink {
    /// Accepts the next record.
    ///
    /// # Errors
    ///
    /// Sink-specific (typically I/O). The pipeline halts on sink errors.
    fn accept(&mut self, record: &SampleRecord) -> Result<()>;
}

impl AnomalySink for Vec<SampleRecord> {
    fn accept(&mut self, record: &SampleRecord) -> Result<()> {
        self.push(*record);
        Ok(())
    }
}

impl<K: AnomalySink + ?Sized> AnomalySink for &mut K {
    fn accept(&mut self, record: &SampleRecord) -> Result<()> {
        (**self).accept(record)
    }
}

/// Display settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Number of most recent points kept for display.
    #[serde(default = "default_max_points")]
    pub max_points: usize,

    /// Redraw the history panel every N samples (0 disables redraws).
    #[serde(default = "default_redraw_every")]
    pub redraw_every: u64,

    /// Sparkline width in characters.
    #[serde(default = "default_width")]
    pub width: usize,
}

fn default_max_points() -> usize {
    100
}
fn default_redraw_every() -> u64 {
    10
}
fn default_width() -> usize {
    80
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            redraw_every: default_redraw_every(),
            width: default_width(),
        }
    }
}

// ============================================================================
// History sink
// ============================================================================

/// 8-level block characters, low to high.
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Marker drawn under anomalous columns.
const ANOMALY_MARK: char = '▲';

/// Retains the most recent records and renders them as a text panel.
#[derive(Debug, Clone)]
pub struct HistorySink {
    records: RingBuffer<SampleRecord>,
    width: usize,
    parameters: Vec<(String, String)>,
    last_anomaly: Option<SampleRecord>,
    total: u64,
    anomalies: u64,
}

impl HistorySink {
    /// Creates a sink retaining at most `max_points` records (at least one).
    #[must_use]
    pub fn new(max_points: usize) -> Self {
        Self {
            records: RingBuffer::new(max_points.max(1)),
            width: default_width(),
            parameters: Vec::new(),
            last_anomaly: None,
            total: 0,
            anomalies: 0,
        }
    }

    /// Creates a sink from display settings.
    #[must_use]
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(config.max_points).width(config.width)
    }

    /// Sets the sparkline width in characters (at least one).
    #[must_use]
    pub fn width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Sets the parameter lines shown in the panel header.
    #[must_use]
    pub fn parameters<K, V>(mut self, parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.parameters = parameters.into_iter().map(|(k, v)| (k.into(), v.to_string())).collect();
        self
    }

    /// Returns the retained records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<SampleRecord> {
        self.records.to_vec()
    }

    /// Returns the most recent anomaly seen, even if no longer retained.
    #[must_use]
    pub fn last_anomaly(&self) -> Option<SampleRecord> {
        self.last_anomaly
    }

    /// Total number of records accepted.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Total number of anomalies accepted.
    #[must_use]
    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }

    /// Describes the last anomaly, `None` if there has not been one.
    #[must_use]
    pub fn last_anomaly_label(&self) -> String {
        match self.last_anomaly {
            Some(r) => format!("Last Anomaly Detected: ({}, {:.2})", r.index, r.value),
            None => "Last Anomaly Detected: None".to_string(),
        }
    }

    /// Renders the panel: header, sparkline, anomaly markers and summary.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Real-Time Data Stream with Anomalies");

        if !self.parameters.is_empty() {
            let header: Vec<String> =
                self.parameters.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            let _ = writeln!(out, "{}", header.join(" | "));
        }

        let records = self.records.to_vec();
        if records.is_empty() {
            let _ = writeln!(out, "(no data)");
        } else {
            let (line, marks) = self.sparkline(&records);
            let _ = writeln!(out, "{line}");
            if marks.contains(ANOMALY_MARK) {
                let _ = writeln!(out, "{}", marks.trim_end());
            }

            let (min, max) = extent(&records);
            let _ = writeln!(
                out,
                "range [{min:.2}, {max:.2}]  samples {}  anomalies {}",
                self.total, self.anomalies
            );
        }

        let _ = writeln!(out, "{}", self.last_anomaly_label());
        out
    }

    /// Column characters plus a parallel line of anomaly markers.
    fn sparkline(&self, records: &[SampleRecord]) -> (String, String) {
        let (min, max) = extent(records);
        let range = max - min;
        let columns = self.width.min(records.len());

        let mut line = String::with_capacity(columns * 3);
        let mut marks = String::with_capacity(columns * 3);

        for col in 0..columns {
            // Each column covers a contiguous bucket of records.
            let lo = col * records.len() / columns;
            let hi = ((col + 1) * records.len() / columns).max(lo + 1);
            let bucket = &records[lo..hi];

            let value = bucket.iter().map(|r| r.value).sum::<f64>() / bucket.len() as f64;
            let normalized = if range > 0.0 { ((value - min) / range).clamp(0.0, 1.0) } else { 0.5 };
            let block_idx = ((normalized * 7.0) as usize).min(7);

            line.push(BLOCKS[block_idx]);
            marks.push(if bucket.iter().any(|r| r.is_anomaly) { ANOMALY_MARK } else { ' ' });
        }

        (line, marks)
    }
}

fn extent(records: &[SampleRecord]) -> (f64, f64) {
    records.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
        (lo.min(r.value), hi.max(r.value))
    })
}

impl AnomalySink for HistorySink {
    fn accept(&mut self, record: &SampleRecord) -> Result<()> {
        self.records.push(*record);
        self.total += 1;
        if record.is_anomaly {
            self.anomalies += 1;
            self.last_anomaly = Some(*record);
        }
        Ok(())
    }
}

// ============================================================================
// Terminal sink
// ============================================================================

/// Writes one line per sample and periodically redraws the history panel.
#[derive(Debug)]
pub struct TerminalSink<W: Write> {
    out: W,
    history: HistorySink,
    redraw_every: u64,
}

impl<W: Write> TerminalSink<W> {
    /// Creates a terminal sink writing to `out`.
    pub fn new(out: W, history: HistorySink, redraw_every: u64) -> Self {
        Self { out, history, redraw_every }
    }

    /// Returns the underlying history.
    #[must_use]
    pub fn history(&self) -> &HistorySink {
        &self.history
    }

    /// Draws the final panel and flushes the writer.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn finish(&mut self) -> Result<()> {
        write!(self.out, "{}", self.history.render())?;
        self.out.flush()?;
        Ok(())
    }

    /// Consumes the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AnomalySink for TerminalSink<W> {
    fn accept(&mut self, record: &SampleRecord) -> Result<()> {
        self.history.accept(record)?;

        if record.is_anomaly {
            warn!(index = record.index, value = record.value, "anomaly detected");
            writeln!(self.out, "{:>8}  {:>12.4}  ANOMALY", record.index, record.value)?;
        } else {
            writeln!(self.out, "{:>8}  {:>12.4}", record.index, record.value)?;
        }

        if self.redraw_every > 0 && self.history.total() % self.redraw_every == 0 {
            write!(self.out, "{}", self.history.render())?;
        }
        self.out.flush()?;
        Ok(())
    }
}
