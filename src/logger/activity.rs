//! Shared handle to the activity log.
//!
//! Callers record through `&ActivityLog`; the writer sits behind a mutex so
//! one handle can be lent to the dispatcher and the CLI at once.

#![allow(missing_docs)]

use parking_lot::Mutex;

use crate::core::config::LoggingConfig;
use crate::logger::jsonl::{JsonlConfig, JsonlWriter, LogEntry};

pub struct ActivityLog {
    writer: Option<Mutex<JsonlWriter>>,
}

impl ActivityLog {
    /// Open according to config; a disabled log records nothing.
    #[must_use]
    pub fn open(cfg: &LoggingConfig) -> Self {
        if cfg.enabled {
            Self {
                writer: Some(Mutex::new(JsonlWriter::open(JsonlConfig::from(cfg)))),
            }
        } else {
            Self::disabled()
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Write one entry, returning to the primary path first if it is usable again.
    pub fn record(&self, entry: &LogEntry) {
        if let Some(writer) = &self.writer {
            let mut writer = writer.lock();
            writer.try_recover();
            writer.write_entry(entry);
        }
    }

    pub fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.lock().flush();
        }
    }

    /// Degradation state of the underlying writer, `"disabled"` when off.
    #[must_use]
    pub fn state(&self) -> String {
        self.writer
            .as_ref()
            .map_or_else(|| "disabled".to_string(), |w| w.lock().state().to_string())
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog").field("state", &self.state()).finish()
    }
}
