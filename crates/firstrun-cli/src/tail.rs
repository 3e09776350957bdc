use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Polling follower for the append-only install log. Keeps the byte offset
/// of everything consumed so far plus any trailing partial line, and hands
/// back only complete lines.
#[derive(Debug)]
pub struct LogTail {
    path: PathBuf,
    offset: u64,
    partial: String,
}

impl LogTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            partial: String::new(),
        }
    }

    /// Returns the complete lines appended since the last poll. A missing
    /// file is not an error (the installer may not have created the log
    /// yet); a file that shrank is treated as rotated and re-read from the
    /// start.
    pub fn poll(&mut self) -> Result<Vec<String>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to open log file: {}", self.path.display()))
            }
        };

        let len = file
            .metadata()
            .with_context(|| format!("failed to stat log file: {}", self.path.display()))?
            .len();
        if len < self.offset {
            self.offset = 0;
            self.partial.clear();
        }

        file.seek(SeekFrom::Start(self.offset))
            .with_context(|| format!("failed to seek log file: {}", self.path.display()))?;
        let mut chunk = Vec::new();
        file.read_to_end(&mut chunk)
            .with_context(|| format!("failed to read log file: {}", self.path.display()))?;
        self.offset += chunk.len() as u64;

        Ok(split_complete_lines(
            &mut self.partial,
            &String::from_utf8_lossy(&chunk),
        ))
    }
}

pub(crate) fn split_complete_lines(partial: &mut String, chunk: &str) -> Vec<String> {
    partial.push_str(chunk);
    let mut lines = Vec::new();
    while let Some(newline_at) = partial.find('\n') {
        let mut line: String = partial.drain(..=newline_at).collect();
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
        lines.push(line);
    }
    lines
}
