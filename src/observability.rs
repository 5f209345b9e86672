// SPDX-License-Identifier: Apache-2.0

//! Logging setup and runtime control.
//!
//! The shim installs one `tracing` subscriber with a reloadable filter and a
//! writer that can be pointed at a file while connections are opened. Level
//! and file are process-wide: the last connection that asks for one wins.

pub mod sensitive;

pub use sensitive::{is_sensitive_key, Sensitive};

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::config::{LogLevel, LogSettings};

/// Where formatted events end up
enum Sink {
    Stderr,
    File(RollingFileAppender),
}

struct LogState {
    initialized: bool,
    filter: Option<reload::Handle<EnvFilter, Registry>>,
    level: LogLevel,
    file: Option<PathBuf>,
}

fn state() -> &'static Mutex<LogState> {
    static STATE: OnceLock<Mutex<LogState>> = OnceLock::new();
    STATE.get_or_init(|| {
        Mutex::new(LogState {
            initialized: false,
            filter: None,
            level: LogLevel::default(),
            file: None,
        })
    })
}

/// Kept apart from [`LogState`] so writing an event never waits on a
/// reconfiguration that is itself logging.
fn sink() -> &'static Mutex<Sink> {
    static SINK: OnceLock<Mutex<Sink>> = OnceLock::new();
    SINK.get_or_init(|| Mutex::new(Sink::Stderr))
}

/// `io::Write` handle over the current sink, one per formatted event
struct SinkWriter;

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *sink().lock() {
            Sink::Stderr => io::stderr().write(buf),
            Sink::File(appender) => appender.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *sink().lock() {
            Sink::Stderr => io::stderr().flush(),
            Sink::File(appender) => appender.flush(),
        }
    }
}

/// Installs the global subscriber. Safe to call more than once.
///
/// When the host application already set a global subscriber, that one is
/// left alone; level changes are then only recorded.
pub fn init_tracing() {
    let mut state = state().lock();
    if state.initialized {
        return;
    }
    state.initialized = true;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(state.level.directive()));
    let (filter_layer, handle) = reload::Layer::new(env_filter);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(|| SinkWriter)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if installed {
        state.filter = Some(handle);
    }
    drop(state);

    if installed {
        info!("Tracing initialized");
    }
}

/// Changes the level of the crate's own events
pub fn set_level(level: LogLevel) {
    let mut state = state().lock();
    state.level = level;
    let reloaded = match &state.filter {
        Some(handle) => handle.reload(EnvFilter::new(level.directive())),
        None => Ok(()),
    };
    drop(state);

    if let Err(e) = reloaded {
        warn!(error = %e, "Could not change log level");
    }
}

/// Sends events to `path`, appending to it.
///
/// Does nothing when `path` is already the current file. The previous file
/// is closed first; if the new one cannot be opened events go to stderr.
pub fn set_log_file(path: impl AsRef<Path>) {
    let path = normalize(path.as_ref());
    if path.as_os_str().is_empty() {
        return;
    }

    let mut state = state().lock();
    if state.file.as_deref() == Some(path.as_path()) {
        return;
    }

    // old appender is dropped, which closes its file
    *sink().lock() = Sink::Stderr;
    state.file = None;

    match open_appender(&path) {
        Ok(appender) => {
            *sink().lock() = Sink::File(appender);
            state.file = Some(path);
        }
        Err(e) => {
            drop(state);
            warn!(path = %path.display(), error = %e, "Could not open log file");
        }
    }
}

/// Applies whatever a connection asked for, installing the subscriber first
pub fn apply(settings: &LogSettings) {
    if settings.is_empty() {
        return;
    }
    init_tracing();

    if let Some(level) = settings.level {
        set_level(level);
    }
    if let Some(file) = &settings.file {
        set_log_file(file);
    }
}

/// Closes the log file and restores the default level
pub fn teardown() {
    {
        let mut state = state().lock();
        *sink().lock() = Sink::Stderr;
        state.file = None;
    }
    set_level(LogLevel::default());
}

pub fn current_level() -> LogLevel {
    state().lock().level
}

pub fn current_log_file() -> Option<PathBuf> {
    state().lock().file.clone()
}

fn normalize(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(s.trim()),
        None => path.to_path_buf(),
    }
}

fn open_appender(path: &Path) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
}
