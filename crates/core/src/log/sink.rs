// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output destinations for rendered log lines

use crate::encoding::{EncodeErrors, Encoding};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// A destination for rendered lines
pub trait Sink: Send {
    /// Short label used in diagnostics
    fn name(&self) -> &str;

    /// Write one line; the sink adds the line terminator
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

fn encoded_line(line: &str, encoding: Encoding, errors: EncodeErrors) -> io::Result<Vec<u8>> {
    let mut bytes = encoding.encode(line, errors)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Append-only log file, flushed after every line
#[derive(Debug)]
pub struct FileSink {
    file: File,
    name: String,
    encoding: Encoding,
    errors: EncodeErrors,
}

impl FileSink {
    pub fn new(file: File, path: &Path, encoding: Encoding, errors: EncodeErrors) -> Self {
        Self {
            file,
            name: path.display().to_string(),
            encoding,
            errors,
        }
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let bytes = encoded_line(line, self.encoding, self.errors)?;
        self.file.write_all(&bytes)?;
        self.file.flush()
    }
}

/// Standard output or standard error
pub struct StreamSink {
    name: &'static str,
    out: Box<dyn Write + Send>,
    encoding: Encoding,
    errors: EncodeErrors,
}

impl StreamSink {
    pub fn stdout(encoding: Encoding, errors: EncodeErrors) -> Self {
        Self {
            name: "stdout",
            out: Box::new(io::stdout()),
            encoding,
            errors,
        }
    }

    pub fn stderr(encoding: Encoding, errors: EncodeErrors) -> Self {
        Self {
            name: "stderr",
            out: Box::new(io::stderr()),
            encoding,
            errors,
        }
    }
}

impl std::fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSink")
            .field("name", &self.name)
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl Sink for StreamSink {
    fn name(&self) -> &str {
        self.name
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let bytes = encoded_line(line, self.encoding, self.errors)?;
        self.out.write_all(&bytes)?;
        self.out.flush()
    }
}

/// In-memory sink that records lines, for tests
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far, across all clones
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
