//! JSON-lines frame recordings for offline replay.
//!
//! One [`FrameInput`] per line. Blank lines are skipped so logs can be
//! concatenated by hand.
//!
//! # Example
//!
//! ```ignore
//! use vastu_reloc::io::{FrameLogReader, FrameLogWriter};
//!
//! let mut writer = FrameLogWriter::create("session.jsonl")?;
//! writer.record(&frame)?;
//! writer.finish()?;
//!
//! for frame in FrameLogReader::open("session.jsonl")? {
//!     engine.process_frame(&frame?);
//! }
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::FrameInput;
use crate::error::Result;

/// Appends frames to a JSON-lines log.
pub struct FrameLogWriter<W: Write> {
    writer: BufWriter<W>,
    frame_count: u64,
}

impl FrameLogWriter<File> {
    /// Create (truncate) a log file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> FrameLogWriter<W> {
    /// Wrap an arbitrary writer.
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            frame_count: 0,
        }
    }

    /// Append one frame.
    pub fn record(&mut self, frame: &FrameInput) -> Result<()> {
        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        self.frame_count += 1;
        Ok(())
    }

    /// Frames written so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Flush and return the frame count.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        Ok(self.frame_count)
    }
}

/// Iterates frames from a JSON-lines log.
pub struct FrameLogReader<R: BufRead> {
    lines: std::io::Lines<R>,
    line_number: u64,
}

impl FrameLogReader<BufReader<File>> {
    /// Open a log file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> FrameLogReader<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Line number of the most recently read line (1-based).
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

impl<R: BufRead> Iterator for FrameLogReader<R> {
    type Item = Result<FrameInput>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(Into::into));
        }
    }
}
