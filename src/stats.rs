//! Window statistics.
//!
//! Mean and population standard deviation recomputed from scratch over the
//! whole window on every call. No running sums are kept, so results are
//! independent of the order in which values entered and left the window.

/// Summary statistics of a non-empty window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// Number of values summarised.
    pub len: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation (divides by `len`, not `len - 1`).
    pub std_dev: f64,
}

impl WindowStats {
    /// Computes statistics over `values`.
    ///
    /// Returns `None` for an empty window: no statistics are defined there.
    #[must_use]
    pub fn compute<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a f64>,
        I::IntoIter: Clone,
    {
        let values = values.into_iter();

        let (len, sum) = values.clone().fold((0usize, 0.0f64), |(n, s), &v| (n + 1, s + v));
        if len == 0 {
            return None;
        }

        let n = len as f64;
        let mean = sum / n;
        let variance = values
            .map(|&v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        Some(Self { len, mean, std_dev: variance.sqrt() })
    }

    /// Signed distance of `value` from `reference` in standard deviations.
    ///
    /// A flat window (`std_dev == 0`) scores every value as 0.
    #[must_use]
    pub fn z_score(&self, value: f64, reference: f64) -> f64 {
        if self.std_dev > 0.0 {
            (value - reference) / self.std_dev
        } else {
            0.0
        }
    }
}
