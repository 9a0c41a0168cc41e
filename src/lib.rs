//! Concurrent workers that each render a progress bar on their own terminal row.
//!
//! A [`Coordinator`] launches one thread per worker. Every worker owns a [`ProgressReporter`]
//! bound to a distinct row of a shared [`Canvas`], advances it on a randomized schedule and
//! finally writes how long it took. All writes, whatever row they target, go through the single
//! lock held by [`SharedCanvas`], so rows never get garbled by concurrent output.
//!
//! ```
//! use parallel_progress::{Config, Coordinator, MemoryCanvas, SharedCanvas, StepDelay};
//!
//! let canvas = SharedCanvas::new(MemoryCanvas::new());
//! let config = Config::default()
//!     .with_worker_count(3)
//!     .with_bar_length(10)
//!     .with_step_delay(StepDelay::from_millis(1, 2));
//! let summary = Coordinator::new(config, canvas.clone()).run().unwrap();
//! assert!(summary.workers.iter().all(|w| w.progress == w.length));
//!
//! for line in canvas.draw(|c| Ok(c.lines())).unwrap() {
//!     println!("{}", line);
//! }
//! ```

mod canvas;
mod config;
mod coordinator;
mod error;
mod progressbar;
mod worker;

pub use canvas::{Canvas, MemoryCanvas, SharedCanvas, TerminalCanvas};
pub use config::{Config, StepDelay};
pub use coordinator::{Coordinator, RunSummary};
pub use error::{Error, Result};
pub use progressbar::{percentage, ProgressReporter, RowLayout, TaskId, WorkerSummary};
pub use worker::{run_worker, WorkerPlan};
