use catchguard::{Level, Logger};

/// Writes guard messages to stderr as `catchguard: LEVEL: message`.
///
/// With `quiet`, only errors and fatal messages are written.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrLogger {
    quiet: bool,
}

impl StderrLogger {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn enabled(&self, level: Level) -> bool {
        !self.quiet || level >= Level::Error
    }
}

impl Logger for StderrLogger {
    fn log(&self, level: Level, message: &str) {
        if self.enabled(level) {
            eprintln!("catchguard: {level}: {message}");
        }
    }
}
