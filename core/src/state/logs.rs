use std::collections::VecDeque;

use derive_more::Display;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_CAPACITY: usize = 1000;

#[derive(Default, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    #[serde(alias = "normal")]
    #[display("info")]
    Info,
    #[display("warning")]
    Warning,
    #[display("error")]
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Newest-first log entries. Once `capacity` entries are held, every push
/// evicts the oldest one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSequence {
    entries: VecDeque<LogEntry>,
    capacity: Option<usize>,
    total_pushed: u64,
}

impl Default for LogSequence {
    fn default() -> Self {
        Self::with_capacity(Some(DEFAULT_LOG_CAPACITY))
    }
}

impl LogSequence {
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            total_pushed: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.total_pushed += 1;
        if let Some(capacity) = self.capacity {
            self.entries.truncate(capacity);
        }
    }

    /// newest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Count of every entry ever pushed, including evicted ones. Lets a reader
    /// tell how many entries arrived since it last looked.
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn messages(logs: &LogSequence) -> Vec<&str> {
        logs.iter().map(|entry| entry.message.as_str()).collect()
    }

    #[test]
    fn test_push_is_newest_first() {
        let mut logs = LogSequence::unbounded();
        logs.push(LogEntry::new("old", Severity::Info));
        logs.push(LogEntry::new("A", Severity::Warning));
        logs.push(LogEntry::new("B", Severity::Error));
        assert_eq!(messages(&logs), ["B", "A", "old"]);
        assert_eq!(logs.latest().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut logs = LogSequence::with_capacity(Some(2));
        for message in ["1", "2", "3"] {
            logs.push(LogEntry::new(message, Severity::Info));
        }
        assert_eq!(messages(&logs), ["3", "2"]);
        assert_eq!(logs.total_pushed(), 3);
    }

    #[test]
    fn test_severity_wire_names() {
        let entry: LogEntry = serde_json::from_str(r#"{"message":"m","severity":"normal"}"#).unwrap();
        assert_eq!(entry.severity, Severity::Info);
        let entry: LogEntry = serde_json::from_str(r#"{"message":"m","severity":"warning"}"#).unwrap();
        assert_eq!(entry.severity, Severity::Warning);
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), r#""error""#);
        assert_eq!(Severity::Info.to_string(), "info");
    }
}
