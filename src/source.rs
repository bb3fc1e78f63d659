//! Sample sources feeding the detector.
//!
//! A source yields one finite sample per call. Infinite sources always
//! return `Some`; finite ones return `None` once exhausted so the pipeline
//! can stop cleanly.
//!
//! [`SignalGenerator`] produces a synthetic stream made of a regular sine
//! pattern, a seasonal sine pattern and uniform noise:
//!
//! ```text
//! x(t) = A·sin(2π·f·t) + A·sin(2π·(t mod S)/S) + U(-noise, noise)
//! ```

use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Anything that produces samples one at a time.
pub trait SampleSource {
    /// Returns the next sample, or `None` if the source is exhausted.
    ///
    /// # Errors
    ///
    /// Source-specific; errors propagate to the caller and never reach the
    /// detector.
    fn next_sample(&mut self) -> Result<Option<f64>>;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_sample(&mut self) -> Result<Option<f64>> {
        (**self).next_sample()
    }
}

// ============================================================================
// Signal generator
// ============================================================================

/// Parameters of the synthetic signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalParams {
    /// Amplitude of both sine components. Must be > 0.
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,

    /// Frequency of the regular pattern in Hz. Must be > 0.
    #[serde(default = "default_frequency")]
    pub frequency: f64,

    /// Period of the seasonal pattern in seconds. Must be > 0.
    #[serde(default = "default_seasonality")]
    pub seasonality: u32,

    /// Maximum amplitude of the uniform noise. Must be >= 0.
    #[serde(default = "default_noise_level")]
    pub noise_level: f64,

    /// Interval between data points in milliseconds. Must be > 0.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_amplitude() -> f64 {
    10.0
}
fn default_frequency() -> f64 {
    0.1
}
fn default_seasonality() -> u32 {
    24
}
fn default_noise_level() -> f64 {
    2.0
}
fn default_interval_ms() -> u64 {
    1000
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            amplitude: default_amplitude(),
            frequency: default_frequency(),
            seasonality: default_seasonality(),
            noise_level: default_noise_level(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl SignalParams {
    /// Checks every parameter against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignal`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if !(self.amplitude.is_finite() && self.amplitude > 0.0) {
            return Err(Error::signal(
                "amplitude",
                format!("must be a positive number, got {}", self.amplitude),
            ));
        }
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(Error::signal(
                "frequency",
                format!("must be a positive number, got {}", self.frequency),
            ));
        }
        if self.seasonality == 0 {
            return Err(Error::signal("seasonality", "must be a positive integer, got 0"));
        }
        if !(self.noise_level.is_finite() && self.noise_level >= 0.0) {
            return Err(Error::signal(
                "noise_level",
                format!("must be a non-negative number, got {}", self.noise_level),
            ));
        }
        if self.interval_ms == 0 {
            return Err(Error::signal("interval", "must be a positive number, got 0"));
        }
        Ok(())
    }

    /// Interval between data points.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Noise-free signal value at time `t` (seconds).
    #[must_use]
    pub fn deterministic_at(&self, t: f64) -> f64 {
        let season = f64::from(self.seasonality);
        let regular = self.amplitude * (TAU * self.frequency * t).sin();
        let seasonal = self.amplitude * (TAU * (t % season) / season).sin();
        regular + seasonal
    }
}

/// Time base for the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clock {
    /// Seconds since the Unix epoch, read at each sample.
    Wall,
    /// Starts at zero and advances one interval per sample.
    Logical {
        /// Current logical time in seconds.
        now: f64,
    },
}

impl Clock {
    /// A logical clock starting at `t = 0`.
    #[must_use]
    pub fn logical() -> Self {
        Self::Logical { now: 0.0 }
    }

    fn tick(&mut self, step: f64) -> f64 {
        match self {
            Self::Wall => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or_default(),
            Self::Logical { now } => {
                let t = *now;
                *now += step;
                t
            }
        }
    }
}

/// Synthetic signal source: regular + seasonal sine patterns plus noise.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    params: SignalParams,
    clock: Clock,
    rng: StdRng,
}

impl SignalGenerator {
    /// Creates a wall-clock generator with OS-seeded noise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignal`] if the parameters are out of range.
    pub fn new(params: SignalParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, clock: Clock::Wall, rng: StdRng::from_entropy() })
    }

    /// Replaces the time base.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Seeds the noise generator for reproducible output.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Returns the generator parameters.
    #[must_use]
    pub fn params(&self) -> &SignalParams {
        &self.params
    }

    /// Produces the next sample.
    pub fn sample(&mut self) -> f64 {
        let t = self.clock.tick(self.params.interval().as_secs_f64());
        let noise = if self.params.noise_level > 0.0 {
            self.rng.gen_range(-self.params.noise_level..=self.params.noise_level)
        } else {
            0.0
        };
        self.params.deterministic_at(t) + noise
    }
}

impl SampleSource for SignalGenerator {
    fn next_sample(&mut self) -> Result<Option<f64>> {
        Ok(Some(self.sample()))
    }
}

// ============================================================================
// Replay source
// ============================================================================

/// Finite source replaying pre-recorded values.
#[derive(Debug, Clone)]
pub struct ReplaySource<I> {
    values: I,
}

impl<I: Iterator<Item = f64>> ReplaySource<I> {
    /// Wraps anything iterable over `f64`.
    pub fn new<T: IntoIterator<IntoIter = I>>(values: T) -> Self {
        Self { values: values.into_iter() }
    }
}

impl<I: Iterator<Item = f64>> SampleSource for ReplaySource<I> {
    fn next_sample(&mut self) -> Result<Option<f64>> {
        Ok(self.values.next())
    }
}
