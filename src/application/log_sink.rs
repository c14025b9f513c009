// Observability sink fanning log events out to registered listeners
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default number of lines kept by the console panel.
pub const DEFAULT_CONSOLE_MAX_LINES: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
}

pub trait LogListener: Send + Sync {
    fn on_event(&self, event: &LogEvent);
}

/// Dispatches every event to all listeners, in registration order.
#[derive(Clone)]
pub struct LogSink {
    listeners: Arc<Vec<Arc<dyn LogListener>>>,
}

impl LogSink {
    pub fn new(listeners: Vec<Arc<dyn LogListener>>) -> Self {
        Self {
            listeners: Arc::new(listeners),
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let event = LogEvent {
            level,
            message: message.into(),
        };
        for listener in self.listeners.iter() {
            listener.on_event(&event);
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }
}

/// Forwards events to the process log.
#[derive(Debug, Default)]
pub struct TracingListener;

impl LogListener for TracingListener {
    fn on_event(&self, event: &LogEvent) {
        match event.level {
            LogLevel::Info => tracing::info!(target: "dashboard", "{}", event.message),
            LogLevel::Warn => tracing::warn!(target: "dashboard", "{}", event.message),
            LogLevel::Error => tracing::error!(target: "dashboard", "{}", event.message),
        }
    }
}

/// The on-page console: the most recent lines, oldest first.
#[derive(Debug)]
pub struct ConsolePanel {
    lines: Mutex<VecDeque<String>>,
    max_lines: usize,
}

impl ConsolePanel {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(max_lines)),
            max_lines,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

impl LogListener for ConsolePanel {
    fn on_event(&self, event: &LogEvent) {
        let mut lines = self
            .lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        lines.push_back(format!("> {}", event.message));
        while lines.len() > self.max_lines {
            lines.pop_front();
        }
    }
}
