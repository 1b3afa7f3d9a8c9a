//! Logger - per-epoch records of a propagation and their reports.
//!
//! Two kinds of records are kept:
//! - **global**: aggregated `(state, count)` pairs per layer, one per epoch
//! - **local**: the update buffers applied in each epoch
//!
//! After the run, [`Logger::convert_logs`] turns global records into one
//! [`PropagationTable`] per layer with a stable column order.

use crate::error::SimError;
use indexmap::IndexMap;
use serde::Serialize;
use spread_core::{NetworkUpdateBuffer, StatesCount, BOLD_UNDERLINE, THIN_UNDERLINE};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Counts of one layer indexed by epoch, one column per state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationTable {
    /// Column labels
    pub states: Vec<String>,

    /// One row per epoch, aligned with `states`
    pub rows: Vec<Vec<usize>>,
}

impl PropagationTable {
    /// Counts of one state over epochs.
    pub fn column(&self, state: &str) -> Option<Vec<usize>> {
        let idx = self.states.iter().position(|s| s == state)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Count of `state` at `epoch`.
    pub fn get(&self, epoch: usize, state: &str) -> Option<usize> {
        let idx = self.states.iter().position(|s| s == state)?;
        self.rows.get(epoch).map(|row| row[idx])
    }

    pub fn epochs(&self) -> usize {
        self.rows.len()
    }

    /// Renders the table as CSV with an `epoch` index column.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("epoch");
        for state in &self.states {
            out.push(',');
            out.push_str(state);
        }
        out.push('\n');
        for (epoch, row) in self.rows.iter().enumerate() {
            out.push_str(&epoch.to_string());
            for count in row {
                out.push(',');
                out.push_str(&count.to_string());
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for PropagationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}", "epoch")?;
        for state in &self.states {
            write!(f, " {state:>6}")?;
        }
        for (epoch, row) in self.rows.iter().enumerate() {
            write!(f, "\n{epoch:>6}")?;
            for count in row {
                write!(f, " {count:>6}")?;
            }
        }
        Ok(())
    }
}

/// Stores and processes logs acquired while running a simulation.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    model_description: String,
    network_description: String,
    global_stats: Vec<StatesCount>,
    local_stats: BTreeMap<usize, Vec<NetworkUpdateBuffer>>,
    converted: IndexMap<String, PropagationTable>,
}

impl Logger {
    pub fn new(model_description: impl Into<String>, network_description: impl Into<String>) -> Self {
        Self {
            model_description: model_description.into(),
            network_description: network_description.into(),
            ..Default::default()
        }
    }

    /// Adds the aggregated counts of one epoch.
    pub fn add_global_stat(&mut self, log: StatesCount) {
        self.global_stats.push(log);
    }

    /// Adds the buffers applied in one epoch.
    pub fn add_local_stat(&mut self, epoch: usize, stats: Vec<NetworkUpdateBuffer>) {
        self.local_stats.insert(epoch, stats);
    }

    /// Builds one table per layer.
    ///
    /// Columns are the declared states of the layer, in declaration order,
    /// followed by any other state seen in the logs. Missing counts are 0.
    pub fn convert_logs(&mut self, model_parameters: &IndexMap<String, Vec<String>>) {
        let mut columns: IndexMap<String, Vec<String>> = model_parameters.clone();
        for epoch in &self.global_stats {
            for (layer, counts) in epoch {
                let states = columns.entry(layer.clone()).or_default();
                for (state, _) in counts {
                    if !states.contains(state) {
                        states.push(state.clone());
                    }
                }
            }
        }

        let mut converted: IndexMap<String, PropagationTable> = columns
            .into_iter()
            .map(|(layer, states)| (layer, PropagationTable { states, rows: Vec::new() }))
            .collect();
        for epoch in &self.global_stats {
            for (layer, table) in converted.iter_mut() {
                let counts = epoch.get(layer);
                let row = table
                    .states
                    .iter()
                    .map(|state| {
                        counts
                            .and_then(|c| c.iter().find(|(s, _)| s == state))
                            .map_or(0, |(_, n)| *n)
                    })
                    .collect();
                table.rows.push(row);
            }
        }
        self.converted = converted;
    }

    /// Per-layer tables built by [`Self::convert_logs`].
    pub fn converted(&self) -> &IndexMap<String, PropagationTable> {
        &self.converted
    }

    pub fn get_aggregated_logs(&self) -> &[StatesCount] {
        &self.global_stats
    }

    pub fn get_detailed_logs(&self) -> &BTreeMap<usize, Vec<NetworkUpdateBuffer>> {
        &self.local_stats
    }

    /// Number of epochs performed after the initial one.
    pub fn epochs(&self) -> usize {
        self.global_stats.len().saturating_sub(1)
    }

    pub fn model_description(&self) -> &str {
        &self.model_description
    }

    pub fn network_description(&self) -> &str {
        &self.network_description
    }

    /// Writes the report of the experiment.
    ///
    /// With a `path`, the directory receives one
    /// `<layer>_propagation_report.csv` per layer, `local_stats.json`,
    /// `model_report.txt` and `network_report.txt`. Without one, the
    /// descriptions and tables are written to `out`.
    pub fn report(&self, path: Option<&Path>, out: &mut dyn Write) -> Result<(), SimError> {
        match path {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                for (layer, table) in &self.converted {
                    fs::write(dir.join(format!("{layer}_propagation_report.csv")), table.to_csv())?;
                }
                fs::write(
                    dir.join("local_stats.json"),
                    serde_json::to_string(&self.local_stats)?,
                )?;
                fs::write(dir.join("model_report.txt"), &self.model_description)?;
                fs::write(dir.join("network_report.txt"), &self.network_description)?;
            }
            None => {
                writeln!(out, "{}", self.network_description)?;
                writeln!(out, "{}", self.model_description)?;
                writeln!(out, "{self}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BOLD_UNDERLINE}\npropagation report\n{THIN_UNDERLINE}")?;
        for (layer, table) in &self.converted {
            writeln!(f, "{layer}\n{table}\n")?;
        }
        write!(f, "{BOLD_UNDERLINE}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spread_core::ActorId;

    fn counts(layer: &str, pairs: &[(&str, usize)]) -> StatesCount {
        let mut log = StatesCount::new();
        log.insert(
            layer.to_string(),
            pairs.iter().map(|(s, n)| (s.to_string(), *n)).collect(),
        );
        log
    }

    fn filled_logger() -> Logger {
        let mut logger = Logger::new("model", "network");
        logger.add_global_stat(counts("ill", &[("S", 9), ("I", 1)]));
        logger.add_local_stat(0, vec![NetworkUpdateBuffer::new(ActorId::from(1u64), "ill", "I")]);
        // state order in the raw log differs between epochs
        logger.add_global_stat(counts("ill", &[("I", 3), ("R", 1), ("S", 6)]));
        logger.add_local_stat(1, vec![]);

        let mut params = IndexMap::new();
        params.insert("ill".to_string(), vec!["S".to_string(), "I".to_string(), "R".to_string()]);
        logger.convert_logs(&params);
        logger
    }

    #[test]
    fn test_convert_logs_fills_missing_states() {
        let logger = filled_logger();
        let table = &logger.converted()["ill"];
        assert_eq!(table.states, vec!["S", "I", "R"]);
        assert_eq!(table.rows, vec![vec![9, 1, 0], vec![6, 3, 1]]);
        assert_eq!(table.column("I"), Some(vec![1, 3]));
        assert_eq!(table.get(1, "R"), Some(1));
        assert_eq!(table.get(2, "R"), None);
        assert_eq!(logger.epochs(), 1);
    }

    #[test]
    fn test_undeclared_states_get_columns() {
        let mut logger = Logger::new("m", "n");
        logger.add_global_stat(counts("ill", &[("S", 2), ("unset", 1)]));
        let mut params = IndexMap::new();
        params.insert("ill".to_string(), vec!["S".to_string(), "I".to_string()]);
        logger.convert_logs(&params);
        assert_eq!(logger.converted()["ill"].states, vec!["S", "I", "unset"]);
        assert_eq!(logger.converted()["ill"].rows[0], vec![2, 0, 1]);
    }

    #[test]
    fn test_csv_rendering() {
        let logger = filled_logger();
        assert_eq!(
            logger.converted()["ill"].to_csv(),
            "epoch,S,I,R\n0,9,1,0\n1,6,3,1\n"
        );
    }

    #[test]
    fn test_report_to_stream() {
        let logger = filled_logger();
        let mut out: Vec<u8> = Vec::new();
        logger.report(None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("network\nmodel\n"));
        assert!(text.contains("propagation report"));
    }

    #[test]
    fn test_report_to_directory() {
        let logger = filled_logger();
        let dir = std::env::temp_dir().join(format!("spread_sim_report_{}", std::process::id()));
        logger.report(Some(dir.as_path()), &mut std::io::sink()).unwrap();

        let csv = fs::read_to_string(dir.join("ill_propagation_report.csv")).unwrap();
        assert!(csv.starts_with("epoch,S,I,R"));
        let local: BTreeMap<usize, Vec<NetworkUpdateBuffer>> =
            serde_json::from_str(&fs::read_to_string(dir.join("local_stats.json")).unwrap()).unwrap();
        assert_eq!(local[&0].len(), 1);
        assert_eq!(fs::read_to_string(dir.join("model_report.txt")).unwrap(), "model");
        fs::remove_dir_all(&dir).unwrap();
    }
}
