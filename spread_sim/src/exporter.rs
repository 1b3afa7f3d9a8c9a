//! JSON exporter for finished runs.
//!
//! Aggregated counts are written as nested maps, one object per epoch:
//! `{"ill": {"S": 64, "I": 10, "R": 3}, ...}`.

use crate::error::SimError;
use crate::logger::Logger;
use crate::simulator::StopReason;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use spread_core::StatesCount;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Counts of one epoch, layer -> state -> count.
pub type EpochCounts = IndexMap<String, IndexMap<String, usize>>;

/// Complete run export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunExport {
    /// Scenario name
    pub scenario: String,

    /// Model name
    pub model: String,

    /// Seed used
    pub seed: u64,

    /// Epochs performed after the initial one
    pub epochs_run: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,

    /// Final results
    pub passed: bool,

    /// Aggregated counts, index = epoch
    pub global_stats: Vec<EpochCounts>,
}

impl RunExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, model: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            model: model.to_string(),
            seed,
            epochs_run: 0,
            stop_reason: None,
            passed: false,
            global_stats: Vec::new(),
        }
    }

    /// Copies the aggregated counts out of a logger.
    pub fn record(&mut self, logger: &Logger) {
        self.global_stats = logger.get_aggregated_logs().iter().map(to_nested).collect();
        self.epochs_run = logger.epochs();
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, stop_reason: Option<StopReason>) {
        self.passed = passed;
        self.stop_reason = stop_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &Path) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

fn to_nested(counts: &StatesCount) -> EpochCounts {
    counts
        .iter()
        .map(|(layer, pairs)| (layer.clone(), pairs.iter().cloned().collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger() -> Logger {
        let mut logger = Logger::new("m", "n");
        for (s, i) in [(9usize, 1usize), (7, 3)] {
            let mut log = StatesCount::new();
            log.insert("ill".into(), vec![("S".into(), s), ("I".into(), i)]);
            logger.add_global_stat(log);
        }
        logger
    }

    #[test]
    fn test_record_and_serialize() {
        let mut export = RunExport::new("cascade", "mic", 42);
        export.record(&logger());
        export.finalize(true, Some(StopReason::Patience { epoch: 1 }));
        assert_eq!(export.epochs_run, 1);
        assert_eq!(export.global_stats[1]["ill"]["I"], 3);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["global_stats"][0]["ill"]["S"], 9);
        assert_eq!(json["stop_reason"]["patience"]["epoch"], 1);
    }

    #[test]
    fn test_write_to_file() {
        let mut export = RunExport::new("dsaa", "dsaa", 7);
        export.record(&logger());
        let path = std::env::temp_dir().join(format!("spread_export_{}.json", std::process::id()));
        export.write_to_file(&path).unwrap();
        let back: RunExport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, export);
        std::fs::remove_file(&path).unwrap();
    }
}
