//! Online mean and standard deviation of total grid usage magnitude.

/// Single-pass accumulator of sample mean and sample standard deviation.
///
/// Uses Welford's update so each observation costs O(1) and no history is
/// kept:
///
/// ```text
/// mean_k = mean_{k-1} + (x_k - mean_{k-1}) / k
/// m2_k   = m2_{k-1} + (x_k - mean_{k-1}) * (x_k - mean_k)
/// sigma  = sqrt(m2_k / (k - 1))
/// ```
///
/// # Examples
///
/// ```
/// use du_sim::utility::stats::RunningStatistics;
///
/// let mut stats = RunningStatistics::new();
/// stats.seed([5.0, 8.0, 11.0, 14.0]);
/// assert_eq!(stats.count(), 4);
/// assert!((stats.mean() - 9.5).abs() < 1e-12);
/// assert!((stats.sigma() - 15.0_f64.sqrt()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStatistics {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStatistics {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a historical series of magnitudes into the state.
    pub fn seed(&mut self, magnitudes: impl IntoIterator<Item = f64>) {
        for magnitude in magnitudes {
            self.observe(magnitude);
        }
    }

    /// Folds one new magnitude into the running state.
    pub fn observe(&mut self, magnitude: f64) {
        self.count += 1;
        let delta = magnitude - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = magnitude - self.mean;
        self.m2 += delta * delta2;
    }

    /// Number of observations folded in so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample mean, `0.0` before the first observation.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation (N - 1 denominator), `0.0` for fewer than two observations.
    pub fn sigma(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }

    /// Usage level above which load is billable: `mean + coefficient * sigma`.
    pub fn threshold(&self, coefficient: f64) -> f64 {
        self.mean() + coefficient * self.sigma()
    }
}
