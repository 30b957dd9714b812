//! Non-fatal diagnostics. Notices never change what a parse call returns.

use std::sync::Mutex;

pub const DEFAULT_TARGET: &str = "parsers.jsonpath";

pub trait NoticeSink: Send + Sync {
    fn notice(&self, message: &str);
}

/// Forwards notices to the `log` facade as warnings.
#[derive(Debug, Clone)]
pub struct LogSink {
    target: String,
}

impl LogSink {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl NoticeSink for LogSink {
    fn notice(&self, message: &str) {
        log::warn!(target: &self.target, "{message}");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NoticeSink for NullSink {
    fn notice(&self, _message: &str) {}
}

/// Keeps every notice in memory; handy for asserting on diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    notices: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<String> {
        match self.notices.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NoticeSink for MemorySink {
    fn notice(&self, message: &str) {
        let mut guard = match self.notices.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(message.to_string());
    }
}

impl<T: NoticeSink + ?Sized> NoticeSink for std::sync::Arc<T> {
    fn notice(&self, message: &str) {
        (**self).notice(message);
    }
}
