use std::time::Duration;

use rand::Rng;

use crate::{Error, Result};

/// Range that each simulated step sleeps for, sampled uniformly from `[min, max)`.
///
/// When `min == max` every step sleeps for exactly that long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDelay {
    pub min: Duration,
    pub max: Duration,
}

impl StepDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn from_millis(min: u64, max: u64) -> Self {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        if self.min >= self.max {
            self.min
        } else {
            rng.gen_range(self.min..self.max)
        }
    }
}

impl Default for StepDelay {
    fn default() -> Self {
        Self::from_millis(100, 300)
    }
}

/// Settings for one run of the [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of workers, each with its own row.
    pub worker_count: usize,
    /// Number of steps, and cells, in every bar.
    pub bar_length: usize,
    /// Rows above the first worker row. Row 0 carries the banner when this is non-zero.
    pub header_rows: u16,
    pub step_delay: StepDelay,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: 5,
            bar_length: 30,
            header_rows: 2,
            step_delay: StepDelay::default(),
        }
    }
}

impl Config {
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_bar_length(mut self, bar_length: usize) -> Self {
        self.bar_length = bar_length;
        self
    }

    pub fn with_header_rows(mut self, header_rows: u16) -> Self {
        self.header_rows = header_rows;
        self
    }

    pub fn with_step_delay(mut self, step_delay: StepDelay) -> Self {
        self.step_delay = step_delay;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::InvalidConfig(
                "worker_count must be greater than zero".into(),
            ));
        }
        if self.bar_length == 0 {
            return Err(Error::InvalidConfig(
                "bar_length must be greater than zero".into(),
            ));
        }
        if self.step_delay.min > self.step_delay.max {
            return Err(Error::InvalidConfig(format!(
                "step delay minimum {:?} exceeds maximum {:?}",
                self.step_delay.min, self.step_delay.max
            )));
        }
        Ok(())
    }

    /// Row owned by the worker with the given one-based ordinal.
    pub fn row_of(&self, ordinal: usize) -> Result<u16> {
        let row = self.header_rows as usize + ordinal;
        u16::try_from(row)
            .map_err(|_| Error::LayoutOverflow(format!("worker {} would need row {}", ordinal, row)))
    }

    /// Row of the summary line, right below the last worker.
    pub fn summary_row(&self) -> Result<u16> {
        let row = self.header_rows as usize + self.worker_count + 1;
        u16::try_from(row)
            .map_err(|_| Error::LayoutOverflow(format!("summary line would need row {}", row)))
    }
}
