//! Rolling File Logger
//!
//! Routes `log` and `tracing` records into daily log files, rotates them by
//! size, prunes old segments and mirrors the most recent lines into a
//! circular buffer so a diagnostics panel can show them without touching disk.
//!
//! Segment files are named `<app>.<YYYY-MM-DD>.<seq>.log` and ordered by
//! `(date, seq)`; the sequence is zero-padded but may outgrow the padding.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use chrono::{Local, NaiveDate};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 7;
const DEFAULT_BUFFER_LINES: usize = 500;

/// Tunables for rotation and the in-memory buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Size after which the current segment is closed and a new one opened
    pub max_file_bytes: u64,
    /// Segments kept on disk (oldest are deleted first)
    pub max_files: usize,
    /// Lines kept in the circular buffer
    pub buffer_lines: usize,
    /// Most verbose level that is recorded
    pub level: log::LevelFilter,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
            buffer_lines: DEFAULT_BUFFER_LINES,
            level: log::LevelFilter::Info,
        }
    }
}

/// Logger setup errors
#[derive(Debug)]
pub enum LoggerError {
    Io(io::Error),
    AlreadyInitialized(PathBuf),
    NotInitialized,
    Subscriber(String),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::Io(err) => write!(f, "log file error: {}", err),
            LoggerError::AlreadyInitialized(dir) => {
                write!(f, "logger already initialized at {}", dir.display())
            }
            LoggerError::NotInitialized => write!(f, "logger not initialized"),
            LoggerError::Subscriber(msg) => write!(f, "failed to install subscriber: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggerError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LoggerError {
    fn from(err: io::Error) -> Self {
        LoggerError::Io(err)
    }
}

// ========================
// Rolling File Sink
// ========================

/// Size- and date-rotated log sink, usable as a `tracing_subscriber` writer
#[derive(Clone)]
pub struct RollingFile {
    inner: Arc<Mutex<Segment>>,
}

struct Segment {
    dir: PathBuf,
    app_name: String,
    options: LoggerOptions,
    date: NaiveDate,
    seq: u32,
    file: File,
    written: u64,
    recent: VecDeque<String>,
    partial: String,
}

impl RollingFile {
    /// Open (or continue) today's newest segment in `dir`
    pub fn open(dir: impl AsRef<Path>, app_name: &str, options: LoggerOptions) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let date = Local::now().date_naive();
        let seq = latest_sequence(&dir, app_name, date)?;
        let (file, written) = open_segment(&dir, app_name, date, seq)?;
        prune_segments(&dir, app_name, options.max_files)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Segment {
                dir,
                app_name: app_name.to_string(),
                options,
                date,
                seq,
                file,
                written,
                recent: VecDeque::with_capacity(options.buffer_lines),
                partial: String::new(),
            })),
        })
    }

    /// Lines currently held in the circular buffer, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        let segment = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        segment.recent.iter().cloned().collect()
    }

    /// Path of the segment being written
    pub fn current_path(&self) -> PathBuf {
        let segment = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        segment.dir.join(segment_name(&segment.app_name, segment.date, segment.seq))
    }
}

impl Segment {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        let today = Local::now().date_naive();
        if today != self.date {
            self.date = today;
            self.seq = 0;
            self.reopen()?;
        } else if self.written > 0
            && self.written + buf.len() as u64 > self.options.max_file_bytes
        {
            self.seq += 1;
            self.reopen()?;
        }

        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        self.remember(buf);
        Ok(())
    }

    fn reopen(&mut self) -> io::Result<()> {
        let (file, written) = open_segment(&self.dir, &self.app_name, self.date, self.seq)?;
        self.file = file;
        self.written = written;
        prune_segments(&self.dir, &self.app_name, self.options.max_files)
    }

    fn remember(&mut self, buf: &[u8]) {
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            if self.options.buffer_lines == 0 {
                continue;
            }
            if self.recent.len() == self.options.buffer_lines {
                self.recent.pop_front();
            }
            self.recent
                .push_back(line.trim_end_matches(['\n', '\r']).to_string());
        }
    }
}

/// Per-event writer handed out by [`RollingFile`]
pub struct RollingWriter {
    inner: Arc<Mutex<Segment>>,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut segment = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        segment.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut segment = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        segment.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn segment_name(app_name: &str, date: NaiveDate, seq: u32) -> String {
    format!("{}.{}.{:03}.log", app_name, date.format("%Y-%m-%d"), seq)
}

fn open_segment(dir: &Path, app_name: &str, date: NaiveDate, seq: u32) -> io::Result<(File, u64)> {
    let path = dir.join(segment_name(app_name, date, seq));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let written = file.metadata()?.len();
    Ok((file, written))
}

/// `(date, seq)` of a segment name, `None` for foreign files
fn segment_key(name: &str, prefix: &str) -> Option<(NaiveDate, u32)> {
    let (date, seq) = name.strip_prefix(prefix)?.strip_suffix(".log")?.split_once('.')?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((date, seq.parse().ok()?))
}

/// Segment names, oldest first
fn segment_files(dir: &Path, app_name: &str) -> io::Result<Vec<String>> {
    let prefix = format!("{}.", app_name);
    let mut segments: Vec<((NaiveDate, u32), String)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| Some((segment_key(&name, &prefix)?, name)))
        .collect();
    segments.sort();
    Ok(segments.into_iter().map(|(_, name)| name).collect())
}

fn latest_sequence(dir: &Path, app_name: &str, date: NaiveDate) -> io::Result<u32> {
    let prefix = format!("{}.", app_name);
    let latest = segment_files(dir, app_name)?
        .iter()
        .filter_map(|name| segment_key(name, &prefix))
        .filter(|(day, _)| *day == date)
        .map(|(_, seq)| seq)
        .max()
        .unwrap_or(0);
    Ok(latest)
}

fn prune_segments(dir: &Path, app_name: &str, max_files: usize) -> io::Result<()> {
    let names = segment_files(dir, app_name)?;
    let keep = max_files.max(1);
    if names.len() > keep {
        for name in &names[..names.len() - keep] {
            fs::remove_file(dir.join(name))?;
        }
    }
    Ok(())
}

// ========================
// Process-wide Logger
// ========================

struct LoggerState {
    dir: PathBuf,
    app_name: String,
    file: RollingFile,
}

static STATE: OnceLock<LoggerState> = OnceLock::new();

/// Initialize the process logger with default options
///
/// Calling again with the same directory is a no-op.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, app_name, LoggerOptions::default())
}

/// Initialize the process logger
///
/// Installs a `tracing` fmt subscriber writing into a [`RollingFile`]; records
/// emitted through the `log` facade are bridged into it as well.
pub fn init_logger_with(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    options: LoggerOptions,
) -> Result<(), LoggerError> {
    let dir = log_dir.as_ref().to_path_buf();
    if let Some(state) = STATE.get() {
        return if state.dir == dir {
            Ok(())
        } else {
            Err(LoggerError::AlreadyInitialized(state.dir.clone()))
        };
    }

    let file = RollingFile::open(&dir, app_name, options)?;
    tracing_subscriber::fmt()
        .with_writer(file.clone())
        .with_ansi(false)
        .with_target(true)
        .with_max_level(to_tracing_level(options.level))
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    let _ = STATE.set(LoggerState {
        dir: dir.clone(),
        app_name: app_name.to_string(),
        file,
    });
    tracing::info!(app = app_name, dir = %dir.display(), "logger initialized");
    Ok(())
}

/// Record an info line
pub fn info(message: &str) -> Result<(), LoggerError> {
    let state = STATE.get().ok_or(LoggerError::NotInitialized)?;
    tracing::info!(app = %state.app_name, "{}", message);
    Ok(())
}

/// Record an error line
pub fn error(message: &str) -> Result<(), LoggerError> {
    let state = STATE.get().ok_or(LoggerError::NotInitialized)?;
    tracing::error!(app = %state.app_name, "{}", message);
    Ok(())
}

/// Recent lines of the process logger (empty before init)
pub fn recent_lines() -> Vec<String> {
    STATE
        .get()
        .map(|state| state.file.recent_lines())
        .unwrap_or_default()
}

fn to_tracing_level(level: log::LevelFilter) -> LevelFilter {
    match level {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    }
}
