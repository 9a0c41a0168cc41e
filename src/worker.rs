use std::thread;

use tracing::debug;

use crate::{Canvas, ProgressReporter, Result, SharedCanvas, StepDelay, TaskId, WorkerSummary};

/// Everything one worker needs to know about its place on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPlan {
    pub ordinal: usize,
    pub task: TaskId,
    pub row: u16,
    pub length: usize,
}

/// Drives one progress reporter from empty to full, sleeping a random step delay before each advance.
///
/// The sleep stands in for real work. Exactly `plan.length` advances happen before the
/// elapsed time is written.
pub fn run_worker<C: Canvas>(
    plan: WorkerPlan,
    delay: StepDelay,
    canvas: SharedCanvas<C>,
) -> Result<WorkerSummary> {
    debug!(ordinal = plan.ordinal, task = %plan.task, row = plan.row, "worker started");
    let mut reporter = ProgressReporter::new(plan.ordinal, plan.task, plan.length, plan.row, canvas)?;

    let mut rng = rand::thread_rng();
    while !reporter.is_complete() {
        thread::sleep(delay.sample(&mut rng));
        reporter.advance()?;
    }

    let summary = reporter.finalize()?;
    debug!(
        ordinal = summary.ordinal,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "worker finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCanvas;
    use std::time::{Duration, Instant};

    #[test]
    fn single_step_bar_goes_straight_to_full() {
        let canvas = SharedCanvas::new(MemoryCanvas::new());
        let plan = WorkerPlan {
            ordinal: 1,
            task: TaskId::next(),
            row: 3,
            length: 1,
        };
        let summary = run_worker(plan, StepDelay::from_millis(5, 5), canvas.clone()).unwrap();
        assert_eq!(summary.progress, 1);
        assert!(summary.elapsed >= Duration::from_millis(5));

        let text = canvas.draw(|c| Ok(c.row_text(3))).unwrap();
        assert!(text.contains("[#] 100% elapsed: "), "{}", text);
    }

    #[test]
    fn sleeps_once_per_step() {
        let canvas = SharedCanvas::new(MemoryCanvas::new());
        let plan = WorkerPlan {
            ordinal: 2,
            task: TaskId::next(),
            row: 4,
            length: 10,
        };
        let start = Instant::now();
        let summary = run_worker(plan, StepDelay::from_millis(2, 4), canvas).unwrap();
        assert_eq!(summary.progress, 10);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn canvas_failures_stop_the_worker() {
        let canvas = SharedCanvas::new(MemoryCanvas::with_width(10));
        let plan = WorkerPlan {
            ordinal: 1,
            task: TaskId::next(),
            row: 3,
            length: 5,
        };
        assert!(matches!(
            run_worker(plan, StepDelay::from_millis(0, 0), canvas),
            Err(crate::Error::Io(_))
        ));
    }
}
