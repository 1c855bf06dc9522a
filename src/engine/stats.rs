//! Cumulative counters and the externally visible status snapshot.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

use super::EngineState;

/// Cumulative collection counters, mutated only by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Cycles attempted, whether or not the write succeeded.
    pub collection_count: u64,
    /// Failed sub-collections plus failed writes.
    pub error_count: u64,
    pub last_collection_time: Option<DateTime<Utc>>,
}

impl CollectionStats {
    pub(crate) fn record_cycle(&mut self, completed_at: DateTime<Utc>) {
        self.collection_count += 1;
        self.last_collection_time = Some(completed_at);
    }

    pub(crate) fn record_errors(&mut self, count: u64) {
        self.error_count += count;
    }
}

/// Point-in-time view of the engine for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub running: bool,
    pub hardware_connected: bool,
    pub database_connected: bool,
    pub collection_count: u64,
    pub error_count: u64,
    /// The sink's own failed-write counter.
    pub sink_write_errors: u64,
    pub last_collection_time: Option<DateTime<Utc>>,
}

/// One of the four per-cycle sub-collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SubSource {
    Sensors,
    Pumps,
    Metrics,
    Alarms,
}

/// Outcome of a successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Readings handed to the sink.
    pub points: usize,
    /// Sub-collections that failed and contributed nothing.
    pub failed_sources: Vec<SubSource>,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.failed_sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_cycle_sets_time() {
        let mut stats = CollectionStats::default();
        assert!(stats.last_collection_time.is_none());

        let now = Utc::now();
        stats.record_cycle(now);
        stats.record_cycle(now);
        stats.record_errors(3);

        assert_eq!(stats.collection_count, 2);
        assert_eq!(stats.error_count, 3);
        assert_eq!(stats.last_collection_time, Some(now));
    }

    #[test]
    fn test_status_serializes_for_monitoring() {
        let status = EngineStatus {
            state: EngineState::Running,
            running: true,
            hardware_connected: true,
            database_connected: false,
            collection_count: 4,
            error_count: 1,
            sink_write_errors: 1,
            last_collection_time: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "running");
        assert_eq!(json["running"], true);
        assert_eq!(json["database_connected"], false);
        assert_eq!(json["collection_count"], 4);
        assert!(json["last_collection_time"].is_null());
    }

    #[test]
    fn test_sub_source_names() {
        assert_eq!(SubSource::Pumps.to_string(), "pumps");
        assert_eq!(SubSource::Metrics.as_ref(), "metrics");
    }
}
