use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Row of worker {ordinal} needs {needed} columns but the canvas is only {available} wide")]
    RowTooWide {
        ordinal: usize,
        needed: usize,
        available: u16,
    },

    #[error("Layout does not fit in the addressable canvas area: {0}")]
    LayoutOverflow(String),

    #[error("Canvas write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Canvas lock was poisoned by a panicking writer")]
    CanvasPoisoned,

    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
