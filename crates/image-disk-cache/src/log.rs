//! Logging interface consumed by the cache
//!
//! The cache reports diagnostics through the [`Logger`] trait rather than
//! calling `tracing` directly, so the host pipeline decides where cache
//! messages go. [`TracingLogger`] is the production adapter; [`NoOpLogger`]
//! discards everything.

use std::fmt::Arguments;

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Fire-and-forget message sink.
///
/// Implementations must be `Send + Sync` and must not block the caller for
/// long: the cache logs from inside request handling.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

/// Logger that forwards to the `tracing` crate under the cache's module target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!("{}", args),
            LogLevel::Debug => tracing::debug!("{}", args),
            LogLevel::Info => tracing::info!("{}", args),
            LogLevel::Warn => tracing::warn!("{}", args),
            LogLevel::Error => tracing::error!("{}", args),
        }
    }
}

/// Logger that discards all messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recording {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Logger for Recording {
        fn log(&self, level: LogLevel, args: Arguments<'_>) {
            self.lines.lock().unwrap().push((level, args.to_string()));
        }
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_default_methods_route_levels() {
        let recording = Recording::default();
        recording.debug(format_args!("d"));
        recording.warn(format_args!("w"));

        let lines = recording.lines.lock().unwrap();
        assert_eq!(lines[0], (LogLevel::Debug, "d".to_string()));
        assert_eq!(lines[1], (LogLevel::Warn, "w".to_string()));
    }

    #[test]
    fn test_macros_format_arguments() {
        let recording = Arc::new(Recording::default());
        let logger: Arc<dyn Logger> = recording.clone();
        crate::log_debug!(logger, "Error while writing the file {}", "/cache/x.jpg");
        crate::log_info!(logger, "{} entries", 3);

        let lines = recording.lines.lock().unwrap();
        assert_eq!(lines[0].1, "Error while writing the file /cache/x.jpg");
        assert_eq!(lines[1], (LogLevel::Info, "3 entries".to_string()));
    }

    #[test]
    fn test_loggers_are_send_sync_trait_objects() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TracingLogger>();
        assert_send_sync::<NoOpLogger>();

        let loggers: Vec<Box<dyn Logger>> = vec![Box::new(TracingLogger), Box::new(NoOpLogger)];
        for logger in loggers {
            logger.debug(format_args!("discarded or traced"));
        }
    }
}
