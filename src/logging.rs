//! Decoupled logging pipeline for CI helper runs.
//!
//! All `log::*` macro calls are routed through a crossbeam channel to a
//! background writer thread that appends to `logs/<timestamp>.log`. Disk
//! persistence never blocks the caller, and warnings/errors are mirrored to
//! stderr so CI output stays readable without the log file.
//!
//! The report the analyzer prints to stdout is a separate, stable contract
//! and does not pass through this pipeline.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Internal log line or special marker
enum LogMessage {
    /// Regular formatted line
    Line(String),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// Get the logs path relative to the current working directory: ./logs
pub fn default_log_dir() -> Result<PathBuf, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Failed to get current working directory: {}", e))?;
    Ok(cwd.join("logs"))
}

/// Unified logger handle: cloneable sender side of the pipeline.
pub struct BuildLog {
    tx: Sender<LogMessage>,
    log_path: PathBuf,
}

impl BuildLog {
    /// Create the collector and spawn the background writer thread.
    ///
    /// The log file is created immediately so it exists even before the
    /// first message arrives.
    pub fn new(log_dir: &Path) -> Result<Self, String> {
        std::fs::create_dir_all(log_dir)
            .map_err(|e| format!("Failed to create logs directory: {}", e))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("{}_kbuild.log", timestamp));
        File::create(&log_path).map_err(|e| format!("Failed to create log file: {}", e))?;

        // Unbounded crossbeam channel: sends never block or fail, so log
        // calls are safe from any thread, including tokio worker threads.
        let (tx, rx) = unbounded::<LogMessage>();

        let writer_path = log_path.clone();
        std::thread::spawn(move || {
            let mut file: Option<File> = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&writer_path)
                .ok();

            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        if let Some(f) = file.as_mut() {
                            let _ = f.write_all(line.as_bytes());
                            let _ = f.write_all(b"\n");
                        }
                    }
                    LogMessage::Flush(done) => {
                        if let Some(f) = file.as_mut() {
                            let _ = f.flush();
                        }
                        let _ = done.send(());
                    }
                }
            }
        });

        Ok(BuildLog { tx, log_path })
    }

    /// Initialize the global `log` facade with a new collector.
    ///
    /// Returns the handle so the caller can flush before exit. `verbose`
    /// lowers the stderr mirror threshold from Warn to Debug.
    pub fn init(log_dir: &Path, verbose: bool) -> Result<BuildLog, String> {
        let collector = BuildLog::new(log_dir)?;
        let handle = collector.clone();

        let max_level = if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        log::set_boxed_logger(Box::new(LogDispatch {
            collector,
            mirror_level: if verbose { Level::Debug } else { Level::Warn },
        }))
        .map(|()| log::set_max_level(max_level))
        .map_err(|e| format!("Failed to register logger: {}", e))?;

        Ok(handle)
    }

    /// Path of the log file this collector writes.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Send a pre-formatted line (non-blocking, cannot fail).
    fn push(&self, line: String) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Block until every line sent before this call is durably on disk.
    pub fn flush(&self) -> Result<(), String> {
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(done_tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        done_rx
            .recv()
            .map_err(|e| format!("Flush signal interrupted: {}", e))?;
        Ok(())
    }
}

impl Clone for BuildLog {
    fn clone(&self) -> Self {
        BuildLog {
            tx: self.tx.clone(),
            log_path: self.log_path.clone(),
        }
    }
}

/// Implementation of the `log` crate's Log trait over the collector.
struct LogDispatch {
    collector: BuildLog,
    mirror_level: Level,
}

impl Log for LogDispatch {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%H:%M:%S%.3f");
        let line = format!("[{}] [{}] {}", timestamp, record.level(), record.args());

        if record.level() <= self.mirror_level {
            eprintln!("{}", line);
        }
        self.collector.push(line);
    }

    fn flush(&self) {
        let _ = self.collector.flush();
    }
}
