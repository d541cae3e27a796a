//! Logging façade for host processes embedding this crate.
//!
//! The core itself never initializes logging as a side effect — the worker
//! and session lifecycle notices this crate emits go through the `log`
//! facade, not a dedicated error channel. A host that wants those messages
//! calls `init_logger` once; one that already runs its own `log` backend
//! can skip this and just use its own.

use std::thread;

/// Installs a process-wide `fern` logger writing to stderr.
///
/// Formats each line with a timestamp, level, source location, thread name
/// and message, so chip-reader log lines read the same way as the rest of
/// a host application built on this stack.
pub fn init_logger(level: log::LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{:<5}] [{}:{}] [{}] {}",
                humantime::format_rfc3339_seconds(std::time::SystemTime::now()),
                record.level(),
                record.file().unwrap_or("<unknown>"),
                record.line().unwrap_or(0),
                thread::current().name().unwrap_or("<unnamed>"),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}
