// Author: Dustin Pilgrim
// License: MIT

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Size-based rotation for the daemon log.
#[derive(Debug, Clone, Copy)]
pub struct LogPolicy {
    pub max_bytes: u64,
    pub keep_backups: u32,
}

impl Default for LogPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            keep_backups: 5,
        }
    }
}

pub fn default_log_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".cache").join("tabtime").join("tabtime.log"))
}

/// Install the global subscriber for daemon mode.
///
/// `--verbose` forces `debug` and mirrors output to stderr; otherwise
/// `RUST_LOG` applies, falling back to `info`. The returned guard must
/// live as long as the process or buffered file output is lost.
pub fn init(verbose: bool, path: Option<&Path>) -> Option<WorkerGuard> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let (file_layer, guard) = match path.map(open_log_file) {
        Some(Ok(file)) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("tabtime: file logging disabled: {e}");
            (None, None)
        }
        None => (None, None),
    };

    let console_layer = verbose.then(|| fmt::layer().with_writer(io::stderr));

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
    {
        eprintln!("tabtime: logging already initialised: {e}");
    }

    guard
}

/// Rotate if needed, append the run header, and open for appending.
fn open_log_file(path: &Path) -> io::Result<fs::File> {
    let header = run_header();
    if prepare_log_file(path, LogPolicy::default())? {
        append_raw(path, &format!("\n{header}\n"))?;
    } else {
        append_raw(path, &format!("{header}\n"))?;
    }

    fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Creates the log directory and rotates an oversized file.
///
/// Returns true when the file already holds an earlier run, so the new
/// header gets a separating blank line.
pub fn prepare_log_file(path: &Path, policy: LogPolicy) -> io::Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e),
    };

    if len >= policy.max_bytes {
        rotate(path, policy.keep_backups);
        return Ok(false);
    }

    Ok(len > 0)
}

pub fn run_header() -> String {
    let started = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        "---- tabtime daemon run start {started} (pid={}) ----",
        std::process::id()
    )
}

/// Appends text as-is, bypassing the formatter.
fn append_raw(path: &Path, text: &str) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

/// Shift `log.N` to `log.N+1`, dropping the oldest, then move the live
/// file to `log.1`. Failures leave the file in place to keep growing.
fn rotate(path: &Path, keep_backups: u32) {
    if keep_backups == 0 {
        let _ = fs::remove_file(path);
        return;
    }

    for n in (1..keep_backups).rev() {
        let from = rotated_name(path, n);
        if from.exists() {
            let _ = fs::rename(&from, rotated_name(path, n + 1));
        }
    }

    let _ = fs::rename(path, rotated_name(path, 1));
}

fn rotated_name(base: &Path, n: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}
