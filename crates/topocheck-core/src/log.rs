use crate::config::schema::LogConfig;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::VecDeque};

thread_local! {
    static LOG: RefCell<LogBuffer> = RefCell::new(LogBuffer::new(LogConfig::default()));
}

///
/// Level
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug, // least severe
    Info,
    Ok,
    Warn,
    Error, // most severe
}

///
/// Topic
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum Topic {
    Binding,
    Config,
    Match,
    Verify,
}

///
/// LogEntry
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
    pub crate_name: String,
    pub level: Level,
    pub topic: Option<String>,
    pub message: String,
}

#[macro_export]
macro_rules! log {
    // =========================================
    // (1) With topic (normal + trailing comma)
    // =========================================
    ($topic:expr, $level:ident, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        $crate::log!(@inner Some(&$topic.to_string()), $crate::log::Level::$level, $fmt $(, $arg)*);
    }};

    // =========================================
    // (2) No topic (normal + trailing comma)
    // =========================================
    ($level:ident, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        $crate::log!(@inner None::<&str>, $crate::log::Level::$level, $fmt $(, $arg)*);
    }};

    // =========================================
    // INTERNAL
    // =========================================
    (@inner $topic:expr, $level:expr, $fmt:expr $(, $arg:expr)*) => {{
        let level = $level;
        if $crate::log::__enabled(level) {
            let topic_opt: Option<&str> = $topic;
            let message = format!($fmt $(, $arg)*);

            $crate::log::__append(env!("CARGO_PKG_NAME"), topic_opt, level, message);
        }
    }};
}

///
/// LogBuffer
///
/// Bounded in-memory log; the oldest entry is evicted once `max_entries`
/// is reached.
///

struct LogBuffer {
    config: LogConfig,
    entries: VecDeque<LogEntry>,
}

impl LogBuffer {
    const fn new(config: LogConfig) -> Self {
        Self {
            config,
            entries: VecDeque::new(),
        }
    }

    fn push(&mut self, entry: LogEntry) {
        if self.config.max_entries == 0 {
            return;
        }

        while self.entries.len() >= self.config.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

// -----------------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------------

/// Replace the log configuration for the current thread.
/// Retained entries beyond the new bound are dropped, oldest first.
pub fn configure(config: &LogConfig) {
    LOG.with_borrow_mut(|log| {
        log.config = config.clone();
        while log.entries.len() > log.config.max_entries {
            log.entries.pop_front();
        }
    });
}

/// Snapshot of the retained entries, oldest first.
#[must_use]
pub fn entries() -> Vec<LogEntry> {
    LOG.with_borrow(|log| log.entries.iter().cloned().collect())
}

/// Drop every retained entry.
pub fn clear() {
    LOG.with_borrow_mut(|log| log.entries.clear());
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

#[doc(hidden)]
#[must_use]
pub fn __enabled(level: Level) -> bool {
    LOG.with_borrow(|log| level >= log.config.min_level)
}

#[doc(hidden)]
pub fn __append(crate_name: &str, topic: Option<&str>, level: Level, message: String) {
    let echo = LOG.with_borrow(|log| log.config.echo);
    if echo {
        println!("{}", render_line(crate_name, topic, level, &message));
    }

    let entry = LogEntry {
        crate_name: crate_name.to_string(),
        level,
        topic: topic.map(ToString::to_string),
        message,
    };

    LOG.with_borrow_mut(|log| log.push(entry));
}

fn render_line(crate_name: &str, topic: Option<&str>, level: Level, message: &str) -> String {
    let (color, reset) = match level {
        Level::Ok => ("\x1b[32m", "\x1b[0m"),
        Level::Info => ("\x1b[34m", "\x1b[0m"),
        Level::Warn => ("\x1b[33m", "\x1b[0m"),
        Level::Error => ("\x1b[31m", "\x1b[0m"),
        Level::Debug => ("", ""),
    };

    let label = format!("{color}{:^5}{reset}", level.to_string().to_uppercase());
    let final_msg = if let Some(t) = topic {
        format!("[{t}] {message}")
    } else {
        message.to_string()
    };

    format!("{label}|{crate_name:^16}| {final_msg}")
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min_level: Level, max_entries: usize) -> LogConfig {
        LogConfig {
            min_level,
            max_entries,
            echo: false,
        }
    }

    #[test]
    fn entries_below_min_level_are_dropped() {
        configure(&config(Level::Info, 16));
        clear();

        crate::log!(Topic::Match, Debug, "hidden {}", 1);
        crate::log!(Topic::Match, Info, "shown {}", 2);
        crate::log!(Warn, "no topic");

        let entries = entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "shown 2");
        assert_eq!(entries[0].topic.as_deref(), Some("Match"));
        assert_eq!(entries[1].topic, None);
        assert_eq!(entries[1].level, Level::Warn);
    }

    #[test]
    fn buffer_evicts_oldest_first() {
        configure(&config(Level::Debug, 2));
        clear();

        for i in 0..5 {
            crate::log!(Topic::Verify, Info, "entry {i}");
        }

        let messages: Vec<_> = entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["entry 3", "entry 4"]);
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        configure(&config(Level::Debug, 0));
        clear();

        crate::log!(Topic::Config, Error, "gone");
        assert!(entries().is_empty());
    }

    #[test]
    fn rendered_line_carries_level_and_topic() {
        let line = render_line("topocheck-core", Some("Binding"), Level::Debug, "bound x");

        assert!(line.starts_with("DEBUG|"));
        assert!(line.ends_with("[Binding] bound x"));
    }
}
