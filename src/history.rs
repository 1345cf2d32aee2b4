//! The session's ordered record of accepted command lines.

use crate::config::COMMENT_CHAR;
use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Append-only list of commands, oldest first.
///
/// Users see entries numbered `1..=len()` from the oldest. Negative indices
/// passed to [`HistoryLog::get`] and [`HistoryLog::remove`] count back from
/// the newest entry, `-1` being the newest. Out-of-range lookups yield
/// `None` rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<String>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn get(&self, index: isize) -> Option<&str> {
        self.position(index).map(|i| self.entries[i].as_str())
    }

    /// Remove and return the entry at `index`.
    pub fn remove(&mut self, index: isize) -> Option<String> {
        self.position(index).map(|i| self.entries.remove(i))
    }

    /// Remove and return the newest entry.
    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    fn position(&self, index: isize) -> Option<usize> {
        let len = self.entries.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        (resolved < len).then_some(resolved)
    }

    /// Read entries, one per line. Blank lines and comment lines are skipped.
    pub fn read_from(reader: impl BufRead) -> io::Result<Self> {
        let mut log = Self::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with(COMMENT_CHAR) {
                continue;
            }
            log.add(line);
        }
        Ok(log)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        Self::read_from(BufReader::new(fs::File::open(path)?))
    }

    /// Write every entry followed by a newline.
    pub fn write_to(&self, writer: impl Write) -> io::Result<()> {
        let mut writer = BufWriter::new(writer);
        for entry in &self.entries {
            writeln!(writer, "{entry}")?;
        }
        writer.flush()
    }

    /// Replace the contents of `path` with this log.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        self.write_to(fs::File::create(path)?)
    }
}
