use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const MINUTES_COLUMN: &str = "minutes";

/// Columns carried as identity, never summed.
pub const IDENTIFIER_COLUMNS: [&str; 5] = ["player", "team", "position", "nation", "age"];

pub fn is_identifier(column: &str) -> bool {
    IDENTIFIER_COLUMNS.contains(&column)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Age {
    Years(u32),
    /// FBref style "years-days", e.g. "22-123".
    YearsDays { years: u32, days: u32 },
}

impl Age {
    pub fn years(self) -> u32 {
        match self {
            Age::Years(y) => y,
            Age::YearsDays { years, .. } => years,
        }
    }
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Age::Years(y) => write!(f, "{y}"),
            Age::YearsDays { years, days } => write!(f, "{years}-{days:03}"),
        }
    }
}

/// One (player, team) season line after aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonRecord {
    pub player: String,
    pub team: String,
    pub position: String,
    pub position_list: Vec<String>,
    pub nation: Option<String>,
    pub age: Option<Age>,
    pub age_years: Option<u32>,
    /// Summed volume stats plus any derived `_per90` / `_pct` columns.
    pub stats: HashMap<String, f64>,
    /// Non-numeric columns outside the identifier set, first-seen value.
    pub extras: HashMap<String, String>,
}

impl PlayerSeasonRecord {
    pub fn stat(&self, column: &str) -> Option<f64> {
        self.stats.get(column).copied()
    }

    /// Whole minutes played, read from `column`; absent or non-positive is 0.
    pub fn minutes_in(&self, column: &str) -> u32 {
        self.stat(column)
            .filter(|m| m.is_finite() && *m > 0.0)
            .map(|m| m.round() as u32)
            .unwrap_or(0)
    }
}

/// Aggregated season table. Column lists keep header order; derived
/// columns are appended as they are computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonTable {
    pub numeric_columns: Vec<String>,
    pub text_columns: Vec<String>,
    pub records: Vec<PlayerSeasonRecord>,
}

impl SeasonTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Register a derived column; no-op when it already exists.
    pub fn add_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.numeric_columns.push(column.to_string());
        }
    }

    /// Copy of this table keeping only rows that pass `keep`, in order.
    pub fn filtered(&self, keep: impl Fn(&PlayerSeasonRecord) -> bool) -> SeasonTable {
        SeasonTable {
            numeric_columns: self.numeric_columns.clone(),
            text_columns: self.text_columns.clone(),
            records: self.records.iter().filter(|r| keep(*r)).cloned().collect(),
        }
    }

    pub fn column_values(&self, column: &str) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.stat(column)).collect()
    }
}

pub fn per90_column(stat: &str) -> String {
    format!("{stat}_per90")
}

pub fn pct_column(column: &str) -> String {
    format!("{column}_pct")
}

/// Percentile column of the per-90 rate for a base stat.
pub fn per90_pct_column(stat: &str) -> String {
    pct_column(&per90_column(stat))
}
