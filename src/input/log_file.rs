use crate::error::{ReplayError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A recording held in memory as lines, with a read cursor
///
/// The whole file is read on open so the OS handle is released immediately;
/// seeking to a line is then a cursor move.
#[derive(Debug, Clone)]
pub struct TextLog {
    name: String,
    lines: Vec<String>,
    /// Index of the next line to read
    next: usize,
}

/// A non-empty, non-comment line together with its line index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub index: usize,
    pub text: String,
}

impl TextLog {
    /// Load a recording from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |source| ReplayError::Open {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(open_error)?;
        Self::from_reader(path.display().to_string(), BufReader::new(file)).map_err(open_error)
    }

    /// Read a recording from any buffered reader.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; `\r\n` endings are accepted.
    pub fn from_reader<R: BufRead>(name: impl Into<String>, mut reader: R) -> std::io::Result<Self> {
        let mut lines = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            lines.push(line.trim_end_matches(|c| c == '\r' || c == '\n').to_string());
        }

        Ok(Self {
            name: name.into(),
            lines,
            next: 0,
        })
    }

    /// Build a log from text, mostly for tests and in-memory recordings
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            lines: text.lines().map(str::to_string).collect(),
            next: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of lines, including blank and comment lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of lines consumed so far
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_eof(&self) -> bool {
        self.next >= self.lines.len()
    }

    /// Move the cursor so that `line` is read next
    pub fn go_to_line(&mut self, line: usize) {
        self.next = line.min(self.lines.len());
    }

    pub fn rewind(&mut self) {
        self.next = 0;
    }

    /// Read the next line that is neither blank nor a `#` comment, trimmed
    pub fn next_record(&mut self) -> Option<LogLine> {
        while let Some(line) = self.lines.get(self.next) {
            let index = self.next;
            self.next += 1;

            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return Some(LogLine {
                index,
                text: text.to_string(),
            });
        }
        None
    }
}
