//! Log files under the server's log directory.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

pub const ACCESS_LOG: &str = "access.log";

/// Which log file a `Log` diagnostics request reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    /// Process output, rotated daily as `sysout.{yyyyMMdd}.log`.
    Sysout,
    /// Request log, `access.log`.
    Access,
}

impl LogCategory {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "SYSOUT" => Some(Self::Sysout),
            "ACCESS" => Some(Self::Access),
            _ => None,
        }
    }

    pub fn file_name(self, today: NaiveDate) -> String {
        match self {
            Self::Sysout => format!("sysout.{}.log", today.format("%Y%m%d")),
            Self::Access => ACCESS_LOG.to_owned(),
        }
    }
}

/// Reads the end of the log files in one directory.
#[derive(Debug, Clone)]
pub struct LogFiles {
    dir: PathBuf,
}

impl LogFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The last `lines` lines of today's file for `category`.
    pub async fn tail(&self, category: LogCategory, lines: usize) -> io::Result<String> {
        let path = self.dir.join(category.file_name(Local::now().date_naive()));
        debug!(path = %path.display(), lines, "tail log file");
        let content = fs::read(&path).await?;
        Ok(String::from_utf8_lossy(last_lines(&content, lines)).into_owned())
    }
}

/// The suffix of `content` holding its last `n` lines. A trailing newline
/// does not start an extra empty line.
fn last_lines(content: &[u8], n: usize) -> &[u8] {
    if n == 0 {
        return &[];
    }
    let body = content.strip_suffix(b"\n").unwrap_or(content);
    let start = body
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, b)| **b == b'\n')
        .nth(n - 1)
        .map_or(0, |(pos, _)| pos + 1);
    &content[start..]
}

/// Appends one line per served request to `access.log`.
#[derive(Debug)]
pub struct AccessLog {
    file: Mutex<File>,
}

impl AccessLog {
    /// Opens `access.log` under `dir` for appending, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        fs::create_dir_all(dir.as_ref()).await?;
        let file = OpenOptions::new().create(true).append(true).open(dir.as_ref().join(ACCESS_LOG)).await?;
        Ok(Self { file: Mutex::new(file) })
    }

    pub async fn append(&self, line: &str) -> io::Result<()> {
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }
}
