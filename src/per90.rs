use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::{Diagnostics, Stage};
use crate::error::{Result, ScoutError};
use crate::season::{SeasonTable, per90_column};

/// How the `minutes / 90` divisor is floored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Per90Floor {
    /// Only zero minutes is replaced, by a divisor of 1.
    #[default]
    ZeroOnly,
    /// Anything under a full match counts as one match: `max(minutes / 90, 1)`.
    FullMatch,
}

impl Per90Floor {
    pub fn divisor(self, minutes: f64) -> f64 {
        let matches = minutes / 90.0;
        match self {
            Per90Floor::ZeroOnly if matches == 0.0 || !matches.is_finite() => 1.0,
            Per90Floor::ZeroOnly => matches,
            Per90Floor::FullMatch => matches.max(1.0),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "zero" | "zero_only" => Some(Per90Floor::ZeroOnly),
            "full" | "full_match" => Some(Per90Floor::FullMatch),
            _ => None,
        }
    }
}

/// Add `<stat>_per90` for every requested stat the table carries.
///
/// Returns the per-90 column names actually added, in request order. Stats
/// the table lacks are reported to `diag` and left out of the result.
pub fn add_per90_stats(
    table: &mut SeasonTable,
    stats: &[String],
    minutes_column: &str,
    floor: Per90Floor,
    diag: &mut Diagnostics,
) -> Result<Vec<String>> {
    if !table.has_column(minutes_column) {
        return Err(ScoutError::schema(minutes_column));
    }

    let mut added = Vec::new();
    for stat in stats {
        if !table.has_column(stat) {
            diag.missing_column(Stage::Per90, stat);
            continue;
        }
        let column = per90_column(stat);
        for record in &mut table.records {
            let minutes = record.stat(minutes_column).unwrap_or(0.0);
            let value = record.stat(stat).unwrap_or(0.0);
            record
                .stats
                .insert(column.clone(), value / floor.divisor(minutes));
        }
        table.add_column(&column);
        if !added.contains(&column) {
            added.push(column);
        }
    }

    debug!(columns = ?added, "derived per90 columns");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::season::PlayerSeasonRecord;

    fn record(minutes: f64, goals: f64) -> PlayerSeasonRecord {
        PlayerSeasonRecord {
            player: "P".into(),
            team: "T".into(),
            position: "FW".into(),
            position_list: vec!["FW".into()],
            nation: None,
            age: None,
            age_years: None,
            stats: HashMap::from([("minutes".to_string(), minutes), ("goals".to_string(), goals)]),
            extras: HashMap::new(),
        }
    }

    fn table(records: Vec<PlayerSeasonRecord>) -> SeasonTable {
        SeasonTable {
            numeric_columns: vec!["minutes".into(), "goals".into()],
            text_columns: Vec::new(),
            records,
        }
    }

    #[test]
    fn rates_scale_by_matches_played() {
        let mut t = table(vec![record(900.0, 10.0), record(450.0, 6.0), record(0.0, 2.0)]);
        let mut diag = Diagnostics::new();
        let cols = add_per90_stats(&mut t, &["goals".into()], "minutes", Per90Floor::ZeroOnly, &mut diag)
            .unwrap();
        assert_eq!(cols, vec!["goals_per90"]);
        assert!((t.records[0].stat("goals_per90").unwrap() - 1.0).abs() < 1e-12);
        assert!((t.records[1].stat("goals_per90").unwrap() - 1.2).abs() < 1e-12);
        assert_eq!(t.records[2].stat("goals_per90"), Some(2.0));
        assert!(diag.is_empty());
    }

    #[test]
    fn full_match_floor_caps_short_stints() {
        assert_eq!(Per90Floor::FullMatch.divisor(45.0), 1.0);
        assert_eq!(Per90Floor::ZeroOnly.divisor(45.0), 0.5);
        assert_eq!(Per90Floor::FullMatch.divisor(180.0), 2.0);
    }

    #[test]
    fn missing_stat_is_skipped_with_warning() {
        let mut t = table(vec![record(900.0, 10.0)]);
        let mut diag = Diagnostics::new();
        let cols = add_per90_stats(
            &mut t,
            &["xg".into(), "goals".into()],
            "minutes",
            Per90Floor::ZeroOnly,
            &mut diag,
        )
        .unwrap();
        assert_eq!(cols, vec!["goals_per90"]);
        assert_eq!(diag.missing_columns(Stage::Per90), vec!["xg"]);
        assert!(!t.has_column("xg_per90"));
    }

    #[test]
    fn missing_minutes_is_schema_error() {
        let mut t = table(vec![record(900.0, 10.0)]);
        let err = add_per90_stats(&mut t, &["goals".into()], "mins", Per90Floor::ZeroOnly, &mut Diagnostics::new())
            .unwrap_err();
        assert!(matches!(err, ScoutError::Schema { ref column } if column == "mins"));
    }
}
