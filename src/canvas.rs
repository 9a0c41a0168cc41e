use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex};

use crossterm::{
    cursor, queue, style,
    terminal::{self, ClearType},
};

use crate::{Error, Result};

/// A character-addressable surface that text can be written onto at any (column, row).
///
/// Coordinates are zero-based. Writing at one position never disturbs any other position,
/// and implementations neither scroll nor resize.
pub trait Canvas: Send {
    /// Moves the write position to the given cell.
    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()>;

    /// Writes text starting at the current write position, advancing it by one column per character.
    fn write_str(&mut self, text: &str) -> io::Result<()>;

    /// Makes everything written so far visible.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Blanks the whole canvas and moves the write position to the origin.
    fn clear(&mut self) -> io::Result<()>;

    /// Number of columns available, if the canvas knows it.
    fn width(&self) -> Option<u16> {
        None
    }

    /// Equivalent to [`Self::move_to`] followed by [`Self::write_str`].
    fn write_at(&mut self, column: u16, row: u16, text: &str) -> io::Result<()> {
        self.move_to(column, row)?;
        self.write_str(text)
    }
}

/// Renders onto a real terminal using ANSI cursor addressing.
pub struct TerminalCanvas<W: Write> {
    out: W,
}

impl TerminalCanvas<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalCanvas<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Canvas for TerminalCanvas<W> {
    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()> {
        queue!(self.out, cursor::MoveTo(column, row))
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, style::Print(text))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )
    }

    fn width(&self) -> Option<u16> {
        terminal::size().ok().map(|(columns, _)| columns)
    }
}

/// An in-memory grid of characters.
///
/// Used when the output is not an interactive terminal, and for inspecting what was drawn.
#[derive(Debug, Default, Clone)]
pub struct MemoryCanvas {
    cells: Vec<Vec<char>>,
    column: u16,
    row: u16,
    width: Option<u16>,
}

impl MemoryCanvas {
    /// Creates an empty canvas without a width limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty canvas that rejects writes past `width` columns.
    pub fn with_width(width: u16) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    /// Text on the given row with trailing blanks removed.
    pub fn row_text(&self, row: u16) -> String {
        self.cells
            .get(row as usize)
            .map(|cells| cells.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    /// Every row that has been touched, from the top.
    pub fn lines(&self) -> Vec<String> {
        (0..self.cells.len())
            .map(|row| self.row_text(row as u16))
            .collect()
    }

    pub fn cell(&self, column: u16, row: u16) -> Option<char> {
        self.cells
            .get(row as usize)
            .and_then(|cells| cells.get(column as usize))
            .copied()
    }

    fn put(&mut self, c: char) -> io::Result<()> {
        if let Some(width) = self.width {
            if self.column >= width {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "write at column {} is past the canvas width of {}",
                        self.column, width
                    ),
                ));
            }
        }
        let (column, row) = (self.column as usize, self.row as usize);
        if self.cells.len() <= row {
            self.cells.resize(row + 1, vec![]);
        }
        let line = &mut self.cells[row];
        if line.len() <= column {
            line.resize(column + 1, ' ');
        }
        line[column] = c;
        self.column = self.column.checked_add(1).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "write position overflowed")
        })?;
        Ok(())
    }
}

impl Canvas for MemoryCanvas {
    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()> {
        self.column = column;
        self.row = row;
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        text.chars().try_for_each(|c| self.put(c))
    }

    fn clear(&mut self) -> io::Result<()> {
        self.cells.clear();
        self.column = 0;
        self.row = 0;
        Ok(())
    }

    fn width(&self) -> Option<u16> {
        self.width
    }
}

/// A canvas guarded by a single lock, cloned into every thread that draws on it.
///
/// All writes go through [`Self::draw`], so at most one writer touches the canvas at any instant
/// regardless of which row it targets.
pub struct SharedCanvas<C> {
    inner: Arc<Mutex<C>>,
}

impl<C> Clone for SharedCanvas<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Canvas> SharedCanvas<C> {
    pub fn new(canvas: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(canvas)),
        }
    }

    /// Runs `f` with exclusive access to the canvas and flushes before releasing the lock.
    pub fn draw<T>(&self, f: impl FnOnce(&mut C) -> io::Result<T>) -> Result<T> {
        let mut canvas = self.inner.lock().map_err(|_| Error::CanvasPoisoned)?;
        let value = f(&mut canvas)?;
        canvas.flush()?;
        Ok(value)
    }

    pub fn width(&self) -> Result<Option<u16>> {
        let canvas = self.inner.lock().map_err(|_| Error::CanvasPoisoned)?;
        Ok(canvas.width())
    }

    /// Returns the canvas if this is the last handle to it.
    pub fn into_inner(self) -> Option<C> {
        Arc::try_unwrap(self.inner)
            .ok()
            .and_then(|mutex| mutex.into_inner().ok())
    }
}
