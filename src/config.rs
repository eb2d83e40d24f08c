use std::path::PathBuf;

use crate::per90::Per90Floor;
use crate::pipeline::PipelineOptions;
use crate::ranking::PercentilePopulation;
use crate::season::MINUTES_COLUMN;

pub const DEFAULT_TOP_N: usize = 20;

/// Stats ranked when a caller names none.
pub const DEFAULT_KEY_STATS: [&str; 6] = [
    "goals",
    "assists",
    "expected_goals_xg",
    "progressive_passes",
    "tackles",
    "blocks",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ScoutConfig {
    pub data_path: Option<PathBuf>,
    pub minutes_column: String,
    pub per90_floor: Per90Floor,
    pub population: PercentilePopulation,
    pub top_n: usize,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            minutes_column: MINUTES_COLUMN.to_string(),
            per90_floor: Per90Floor::default(),
            population: PercentilePopulation::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ScoutConfig {
    /// Read `.env.local` / `.env` if present, then the `SCOUT_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            data_path: var("SCOUT_DATA_PATH").map(PathBuf::from),
            minutes_column: var("SCOUT_MINUTES_COLUMN").unwrap_or(defaults.minutes_column),
            per90_floor: var("SCOUT_PER90_FLOOR")
                .and_then(|v| Per90Floor::parse(&v))
                .unwrap_or(defaults.per90_floor),
            population: var("SCOUT_POPULATION")
                .and_then(|v| PercentilePopulation::parse(&v))
                .unwrap_or(defaults.population),
            top_n: var("SCOUT_TOP_N")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.top_n)
                .max(1),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            minutes_column: self.minutes_column.clone(),
            per90_floor: self.per90_floor,
        }
    }

    pub fn default_stats() -> Vec<String> {
        DEFAULT_KEY_STATS.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(ScoutConfig::from_lookup(|_| None), ScoutConfig::default());
    }

    #[test]
    fn reads_scout_variables() {
        let cfg = ScoutConfig::from_lookup(lookup(&[
            ("SCOUT_DATA_PATH", "data/database.csv"),
            ("SCOUT_MINUTES_COLUMN", "min"),
            ("SCOUT_PER90_FLOOR", "full_match"),
            ("SCOUT_POPULATION", "global"),
            ("SCOUT_TOP_N", "5"),
        ]));
        assert_eq!(cfg.data_path, Some(PathBuf::from("data/database.csv")));
        assert_eq!(cfg.pipeline_options().minutes_column, "min");
        assert_eq!(cfg.per90_floor, Per90Floor::FullMatch);
        assert_eq!(cfg.population, PercentilePopulation::Global);
        assert_eq!(cfg.top_n, 5);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = ScoutConfig::from_lookup(lookup(&[("SCOUT_PER90_FLOOR", "sometimes"), ("SCOUT_TOP_N", "0")]));
        assert_eq!(cfg.per90_floor, Per90Floor::ZeroOnly);
        assert_eq!(cfg.top_n, 1);
    }
}
