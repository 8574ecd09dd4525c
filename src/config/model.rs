// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;

use tokio::time::Duration;

use crate::core::manager::DEFAULT_FLUSH_PERIOD_MS;
use crate::services::{ticker::DEFAULT_TICK_INTERVAL, viewer::DEFAULT_LIVE_BUFFER};

pub const MIN_TICK_INTERVAL_MS: u64 = 100;
pub const MIN_FLUSH_PERIOD_SECONDS: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabtimeConfig {
    pub tick_interval_ms: u64,
    pub flush_period_seconds: u64,
    pub data_dir: PathBuf,
    pub live_buffer: usize,
}

impl Default for TabtimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            flush_period_seconds: DEFAULT_FLUSH_PERIOD_MS / 1000,
            data_dir: default_data_dir(),
            live_buffer: DEFAULT_LIVE_BUFFER,
        }
    }
}

impl TabtimeConfig {
    /// Raise anything below its floor.
    pub fn clamped(mut self) -> Self {
        self.tick_interval_ms = self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS);
        self.flush_period_seconds = self.flush_period_seconds.max(MIN_FLUSH_PERIOD_SECONDS);
        self.live_buffer = self.live_buffer.max(1);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn flush_period_ms(&self) -> u64 {
        self.flush_period_seconds.saturating_mul(1000)
    }

    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.jsonl")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("tabtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let cfg = TabtimeConfig::default();
        assert_eq!(cfg.tick_interval(), Duration::from_secs(1));
        assert_eq!(cfg.flush_period_ms(), 10_000);
        assert_eq!(cfg.live_buffer, 64);
        assert!(cfg.records_path().ends_with("tabtime/records.jsonl"));
    }

    #[test]
    fn clamps_to_floors() {
        let cfg = TabtimeConfig {
            tick_interval_ms: 5,
            flush_period_seconds: 0,
            live_buffer: 0,
            ..TabtimeConfig::default()
        }
        .clamped();

        assert_eq!(cfg.tick_interval_ms, MIN_TICK_INTERVAL_MS);
        assert_eq!(cfg.flush_period_seconds, MIN_FLUSH_PERIOD_SECONDS);
        assert_eq!(cfg.live_buffer, 1);
    }
}
