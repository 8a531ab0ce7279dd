// file: src/system/log.rs
// version: 1.0.0
// guid: 9d4c71e8-35f2-4b09-a6d7-c28e50b1f473

//! Append-only durable log
//!
//! Separate from the tracing console output: this file is the authoritative
//! audit trail of every executed command and status line, so a failed run is
//! diagnosable after the fact. Never rotated or truncated by this tool.

use crate::Result;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable log file, opened in append mode for the lifetime of the process
pub struct DurableLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl DurableLog {
    /// Open (creating if necessary, mode 0600) the log at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a timestamped status line
    pub fn status(&self, message: &str) -> Result<()> {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        self.write_line(&format!("[{}] {}", stamp, message))
    }

    /// Append raw command output, unstamped
    pub fn raw(&self, line: &str) -> Result<()> {
        self.write_line(line)
    }

    /// Last `n` lines of the log, for failure diagnostics
    pub fn tail(&self, n: usize) -> Result<Vec<String>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].to_vec())
    }

    fn write_line(&self, line: &str) -> Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| crate::error::ProvisionError::provision("log mutex poisoned"))?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }
}
