//
// logger.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::fs::File;
use std::io::prelude::*;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Once;
use std::time::SystemTime;

use chrono::DateTime;
use chrono::Utc;

use crate::error::Error;

fn is_internal(target: &str) -> bool {
    // Log `target:`s default to module locations, like `burdock::registry`,
    // where the element before the first `::` is the crate name.
    match target.find("::") {
        // No `::`, the target was set manually at the call site
        None => true,
        Some(loc) => &target[0..loc] == "burdock",
    }
}

/// Formats a record as `<timestamp> [burdock] <LEVEL> <file>:<line>: <message>`.
fn format_record(now: DateTime<Utc>, record: &log::Record) -> String {
    let timestamp = now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    format!(
        "{} [burdock] {} {}:{}: {}",
        timestamp,
        record.level(),
        record.file().unwrap_or("?"),
        record.line().unwrap_or(0),
        record.args()
    )
}

static ONCE: Once = Once::new();
static LOGGER: Logger = Logger::new();

struct LoggerInner {
    /// The log level (set with the RUST_LOG environment variable)
    level: log::Level,

    /// The file we log to. `None` logs to stderr.
    file: Option<File>,
}

struct Logger {
    /// Set to `None` at compile time, set for real during `initialize()`.
    inner: Mutex<Option<LoggerInner>>,
}

impl Logger {
    const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<LoggerInner>> {
        // A panic while logging shouldn't silence the logger
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn initialize(&self, level: log::Level, file: Option<File>) {
        *self.lock() = Some(LoggerInner { level, file });
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        match self.lock().as_ref() {
            Some(inner) => metadata.level() <= inner.level,
            None => false,
        }
    }

    fn log(&self, record: &log::Record) {
        if !is_internal(record.target()) && record.level() > log::Level::Warn {
            // Foreign crates only get to log warnings and errors
            return;
        }

        let mut guard = self.lock();
        let Some(inner) = guard.as_mut() else {
            return;
        };
        if record.level() > inner.level {
            return;
        }

        let now: DateTime<Utc> = SystemTime::now().into();
        let message = format_record(now, record);

        match inner.file.as_mut() {
            Some(file) => {
                if let Err(error) = writeln!(file, "{message}") {
                    eprintln!("Error writing to log file: {error:?}");
                }
            },
            None => eprintln!("{message}"),
        }
    }

    fn flush(&self) {
        if let Some(file) = self.lock().as_mut().and_then(|inner| inner.file.as_mut()) {
            if let Err(error) = file.flush() {
                eprintln!("Error flushing log file: {error:?}");
            }
        }
    }
}

/// Installs the burdock logger, once per process. The level comes from
/// `RUST_LOG` and defaults to `info`. Records go to `file` when given, to
/// stderr otherwise.
pub fn initialize(file: Option<&str>) -> crate::Result<()> {
    let file = match file {
        None => None,
        Some(path) => Some(
            std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|err| Error::LogFile(String::from(path), err))?,
        ),
    };

    ONCE.call_once(|| {
        let level_envvar = std::env::var("RUST_LOG").unwrap_or(String::from("info"));

        let level = match log::Level::from_str(level_envvar.as_str()) {
            Ok(level) => level,
            Err(err) => {
                eprintln!("Error parsing RUST_LOG, defaulting to `info`: {err:?}");
                log::Level::Info
            },
        };

        log::set_max_level(level.to_level_filter());
        LOGGER.initialize(level, file);

        if let Err(err) = log::set_logger(&LOGGER) {
            eprintln!("Another logger is already installed: {err:?}");
        }
    });

    Ok(())
}
