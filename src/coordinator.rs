use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::progressbar::label;
use crate::worker::{run_worker, WorkerPlan};
use crate::{Canvas, Config, Error, Result, RowLayout, SharedCanvas, TaskId, WorkerSummary};

const BANNER: &str = "Concurrent calculation with progress bars:";

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One entry per worker, ordered by ordinal.
    pub workers: Vec<WorkerSummary>,
    pub elapsed: Duration,
}

/// Launches every worker on its own thread and row, waits for all of them, then writes a summary line.
pub struct Coordinator<C: Canvas> {
    config: Config,
    canvas: SharedCanvas<C>,
}

impl<C: Canvas + 'static> Coordinator<C> {
    pub fn new(config: Config, canvas: SharedCanvas<C>) -> Self {
        Self { config, canvas }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Assigns every worker its identity and row, and checks that each row fits on the canvas.
    pub fn plan(&self) -> Result<Vec<WorkerPlan>> {
        self.config.validate()?;
        self.config.summary_row()?;
        let available = self.canvas.width()?;

        (1..=self.config.worker_count)
            .map(|ordinal| {
                let task = TaskId::next();
                let layout =
                    RowLayout::new(label(ordinal, task).chars().count(), self.config.bar_length)?;
                if let Some(available) = available {
                    if layout.width() > available as usize {
                        return Err(Error::RowTooWide {
                            ordinal,
                            needed: layout.width(),
                            available,
                        });
                    }
                }
                Ok(WorkerPlan {
                    ordinal,
                    task,
                    row: self.config.row_of(ordinal)?,
                    length: self.config.bar_length,
                })
            })
            .collect()
    }

    /// Runs all workers to completion.
    ///
    /// Every spawned worker is joined even when one of them fails; the first failure is returned.
    pub fn run(&self) -> Result<RunSummary> {
        let plans = self.plan()?;
        let started = Instant::now();
        info!(
            workers = self.config.worker_count,
            bar_length = self.config.bar_length,
            "starting run"
        );

        let header_rows = self.config.header_rows;
        self.canvas.draw(|c| {
            c.clear()?;
            if header_rows > 0 {
                c.write_at(0, 0, BANNER)?;
            }
            Ok(())
        })?;

        let mut handles: Vec<(usize, JoinHandle<Result<WorkerSummary>>)> =
            Vec::with_capacity(plans.len());
        let mut failure = None;
        for plan in plans {
            let canvas = self.canvas.clone();
            let delay = self.config.step_delay;
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", plan.ordinal))
                .spawn(move || run_worker(plan, delay, canvas));
            match spawned {
                Ok(handle) => handles.push((plan.ordinal, handle)),
                Err(err) => {
                    error!(ordinal = plan.ordinal, %err, "failed to spawn worker");
                    failure = Some(Error::Io(err));
                    break;
                }
            }
        }

        let mut workers = Vec::with_capacity(handles.len());
        for (ordinal, handle) in handles {
            match handle.join() {
                Ok(Ok(summary)) => workers.push(summary),
                Ok(Err(err)) => {
                    error!(ordinal, %err, "worker failed");
                    failure.get_or_insert(err);
                }
                Err(_) => {
                    error!(ordinal, "worker panicked");
                    failure.get_or_insert(Error::WorkerPanicked(ordinal));
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        let elapsed = started.elapsed();
        let summary_row = self.config.summary_row()?;
        let line = format!(
            "All {} workers finished in {} ms.",
            workers.len(),
            elapsed.as_millis()
        );
        self.canvas.draw(|c| {
            c.write_at(0, summary_row, &line)?;
            c.move_to(0, summary_row.saturating_add(1))
        })?;
        info!(elapsed_ms = elapsed.as_millis() as u64, "run finished");

        Ok(RunSummary { workers, elapsed })
    }
}
