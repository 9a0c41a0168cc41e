use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::{Canvas, Error, Result, SharedCanvas};

const BAR_FILLED: char = '#';
const BAR_EMPTY: char = ' ';

/// Columns kept free after the percentage for the elapsed-time readout.
const ELAPSED_WIDTH: usize = 20;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a worker task, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub fn next() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Percentage shown for `progress` out of `length`, rounded down.
pub fn percentage(progress: usize, length: usize) -> usize {
    if length == 0 {
        0
    } else {
        100 * progress / length
    }
}

pub(crate) fn label(ordinal: usize, task: TaskId) -> String {
    format!("Worker {:>2} (task {:>4}):", ordinal, task)
}

/// Column positions of one reporter row.
///
/// ```text
/// Worker  1 (task    7): [#####     ]  50% elapsed: 1234 ms
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    bar_start: u16,
    length: u16,
}

impl RowLayout {
    pub fn new(label_width: usize, length: usize) -> Result<Self> {
        let overflow = || {
            Error::LayoutOverflow(format!(
                "a bar of {} cells after a {} column label",
                length, label_width
            ))
        };
        let bar_start = u16::try_from(label_width + 2).map_err(|_| overflow())?;
        let length = u16::try_from(length).map_err(|_| overflow())?;
        let layout = Self { bar_start, length };
        // Every column we address must stay representable.
        u16::try_from(layout.width()).map_err(|_| overflow())?;
        Ok(layout)
    }

    pub fn bar_start(&self) -> u16 {
        self.bar_start
    }

    /// Column of the marker drawn when progress reaches `progress` (one-based).
    pub fn marker_column(&self, progress: usize) -> u16 {
        debug_assert!(progress >= 1 && progress <= self.length as usize);
        self.bar_start + progress as u16 - 1
    }

    pub fn percent_column(&self) -> u16 {
        self.bar_start + self.length + 2
    }

    pub fn elapsed_column(&self) -> u16 {
        self.percent_column() + 4
    }

    /// Columns needed to show the whole row, including room for the elapsed time.
    pub fn width(&self) -> usize {
        self.bar_start as usize + self.length as usize + 6 + ELAPSED_WIDTH
    }
}

/// Final state of a worker once its reporter has been finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub ordinal: usize,
    pub task: TaskId,
    pub row: u16,
    pub progress: usize,
    pub length: usize,
    pub elapsed: Duration,
}

/// Tracks and renders the progress of a single worker on its own canvas row.
///
/// The only mutable state is the progress counter. The marker column and percentage are
/// derived from it on every update.
///
/// ```
/// use parallel_progress::{MemoryCanvas, ProgressReporter, SharedCanvas, TaskId};
///
/// let canvas = SharedCanvas::new(MemoryCanvas::new());
/// let mut reporter = ProgressReporter::new(1, TaskId::next(), 4, 3, canvas.clone()).unwrap();
/// while !reporter.is_complete() {
///     reporter.advance().unwrap();
/// }
/// let summary = reporter.finalize().unwrap();
/// assert_eq!(summary.progress, 4);
///
/// let row = canvas.draw(|c| Ok(c.row_text(3))).unwrap();
/// assert!(row.contains("[####] 100% elapsed:"));
/// ```
pub struct ProgressReporter<C: Canvas> {
    ordinal: usize,
    task: TaskId,
    length: usize,
    progress: usize,
    row: u16,
    layout: RowLayout,
    started: Instant,
    canvas: SharedCanvas<C>,
}

impl<C: Canvas> ProgressReporter<C> {
    /// Creates a reporter on `row` and draws its empty bar.
    pub fn new(
        ordinal: usize,
        task: TaskId,
        length: usize,
        row: u16,
        canvas: SharedCanvas<C>,
    ) -> Result<Self> {
        let layout = RowLayout::new(label(ordinal, task).chars().count(), length)?;
        let mut reporter = Self {
            ordinal,
            task,
            length,
            progress: 0,
            row,
            layout,
            started: Instant::now(),
            canvas,
        };
        reporter.initialize()?;
        Ok(reporter)
    }

    fn initialize(&mut self) -> Result<()> {
        self.started = Instant::now();
        let mut header = label(self.ordinal, self.task);
        header.push_str(" [");
        header.extend(std::iter::repeat(BAR_EMPTY).take(self.length));
        header.push_str("] ");
        header.push_str(&format!("{:>3}%", 0));

        let row = self.row;
        self.canvas.draw(|c| c.write_at(0, row, &header))
    }

    /// Moves the bar forward by one step.
    ///
    /// Does nothing once the bar is complete.
    pub fn advance(&mut self) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        self.progress += 1;
        trace!(
            ordinal = self.ordinal,
            progress = self.progress,
            length = self.length,
            "step"
        );

        let row = self.row;
        let marker = self.layout.marker_column(self.progress);
        let percent_column = self.layout.percent_column();
        let percent = format!("{:>3}%", self.percent());
        self.canvas.draw(|c| {
            c.write_at(marker, row, &BAR_FILLED.to_string())?;
            c.write_at(percent_column, row, &percent)
        })
    }

    /// Writes the elapsed time next to the bar and returns the final state.
    pub fn finalize(self) -> Result<WorkerSummary> {
        let elapsed = self.started.elapsed();
        let readout = format!(" elapsed: {} ms", elapsed.as_millis());
        let (row, column) = (self.row, self.layout.elapsed_column());
        self.canvas.draw(|c| c.write_at(column, row, &readout))?;

        Ok(WorkerSummary {
            ordinal: self.ordinal,
            task: self.task,
            row: self.row,
            progress: self.progress,
            length: self.length,
            elapsed,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.progress == self.length
    }

    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn percent(&self) -> usize {
        percentage(self.progress, self.length)
    }

    pub fn row(&self) -> u16 {
        self.row
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn layout(&self) -> RowLayout {
        self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCanvas;

    fn reporter(length: usize, row: u16) -> (ProgressReporter<MemoryCanvas>, SharedCanvas<MemoryCanvas>) {
        let canvas = SharedCanvas::new(MemoryCanvas::new());
        let reporter = ProgressReporter::new(1, TaskId::next(), length, row, canvas.clone()).unwrap();
        (reporter, canvas)
    }

    fn row_text(canvas: &SharedCanvas<MemoryCanvas>, row: u16) -> String {
        canvas.draw(|c| Ok(c.row_text(row))).unwrap()
    }

    #[test]
    fn task_ids_are_unique() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert_ne!(a, b);
        assert_eq!(format!("{:>4}", TaskId(7)), "   7");
    }

    #[test]
    fn percentage_rounds_down_and_never_decreases() {
        let length = 30;
        let mut last = 0;
        for p in 1..length {
            let pct = percentage(p, length);
            assert_eq!(pct, 100 * p / length);
            assert!(pct >= last);
            assert!(pct < 100);
            last = pct;
        }
        assert_eq!(percentage(1, 30), 3);
        assert_eq!(percentage(29, 30), 96);
        assert_eq!(percentage(30, 30), 100);
        assert_eq!(percentage(2, 3), 66);
    }

    #[test]
    fn layout_columns() {
        let layout = RowLayout::new(22, 30).unwrap();
        assert_eq!(layout.bar_start(), 24);
        assert_eq!(layout.marker_column(1), 24);
        assert_eq!(layout.marker_column(30), 53);
        assert_eq!(layout.percent_column(), 56);
        assert_eq!(layout.elapsed_column(), 60);
        assert_eq!(layout.width(), 80);
    }

    #[test]
    fn oversized_layout_is_rejected() {
        assert!(matches!(
            RowLayout::new(22, u16::MAX as usize),
            Err(Error::LayoutOverflow(_))
        ));
    }

    #[test]
    fn initial_render_shows_empty_bar() {
        let task = TaskId(7);
        let canvas = SharedCanvas::new(MemoryCanvas::new());
        let reporter = ProgressReporter::new(1, task, 10, 3, canvas.clone()).unwrap();
        assert_eq!(reporter.progress(), 0);
        assert!(!reporter.is_complete());
        assert_eq!(
            row_text(&canvas, 3),
            "Worker  1 (task    7): [          ]   0%"
        );
    }

    #[test]
    fn advance_counts_up_by_one_then_stops() {
        let (mut reporter, _canvas) = reporter(5, 3);
        for expected in 1..=5 {
            reporter.advance().unwrap();
            assert_eq!(reporter.progress(), expected);
        }
        assert!(reporter.is_complete());
        for _ in 0..3 {
            reporter.advance().unwrap();
            assert_eq!(reporter.progress(), 5);
        }
    }

    #[test]
    fn partial_progress_renders_markers_and_percent() {
        let task = TaskId(12);
        let canvas = SharedCanvas::new(MemoryCanvas::new());
        let mut reporter = ProgressReporter::new(2, task, 3, 4, canvas.clone()).unwrap();
        reporter.advance().unwrap();
        assert_eq!(row_text(&canvas, 4), "Worker  2 (task   12): [#  ]  33%");
        reporter.advance().unwrap();
        assert_eq!(row_text(&canvas, 4), "Worker  2 (task   12): [## ]  66%");
    }

    #[test]
    fn full_bar_has_no_gaps() {
        let (mut reporter, canvas) = reporter(30, 5);
        while !reporter.is_complete() {
            reporter.advance().unwrap();
        }
        let layout = reporter.layout();
        let text = row_text(&canvas, 5);
        let start = layout.bar_start() as usize;
        let bar: String = text.chars().skip(start).take(30).collect();
        assert_eq!(bar, "#".repeat(30));
        assert_eq!(text.chars().nth(start + 30), Some(']'));
        assert!(text.ends_with("] 100%"));
    }

    #[test]
    fn finalize_writes_elapsed_once() {
        let (mut reporter, canvas) = reporter(1, 3);
        assert_eq!(reporter.percent(), 0);
        reporter.advance().unwrap();
        assert_eq!(reporter.percent(), 100);
        let summary = reporter.finalize().unwrap();
        assert_eq!(summary.progress, 1);
        assert_eq!(summary.length, 1);
        assert_eq!(summary.row, 3);

        let text = row_text(&canvas, 3);
        assert!(text.contains("[#] 100% elapsed: "));
        assert!(text.ends_with(" ms"));
        assert_eq!(text.matches("elapsed:").count(), 1);
    }
}
