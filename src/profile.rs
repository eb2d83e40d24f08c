use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, PipelineWarning, Stage};
use crate::error::{Result, ScoutError};
use crate::normalize::normalize_player_name;
use crate::season::{PlayerSeasonRecord, SeasonTable, per90_column, per90_pct_column};

/// One radar axis: the raw season total, its per-90 rate and the percentile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAxis {
    pub stat: String,
    pub raw: Option<f64>,
    pub per90: Option<f64>,
    pub percentile: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileVector {
    pub player: String,
    pub team: String,
    pub position: String,
    pub age_years: Option<u32>,
    pub minutes: u32,
    pub axes: Vec<ProfileAxis>,
}

impl ProfileVector {
    /// Percentiles in requested stat order.
    pub fn values(&self) -> Vec<Option<f64>> {
        self.axes.iter().map(|a| a.percentile).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.axes.iter().map(|a| a.stat.as_str()).collect()
    }
}

/// Build the percentile profile of one player from a table that already
/// carries `<stat>_per90_pct` columns.
///
/// Lookup is accent-insensitive. When several rows share the name the first
/// one wins and a `DuplicatePlayer` warning is recorded. Stats without a
/// percentile column yield `None` on their axis and a warning. Minutes are
/// read from `minutes_column`.
pub fn build_profile(
    table: &SeasonTable,
    player: &str,
    stats: &[String],
    minutes_column: &str,
    diag: &mut Diagnostics,
) -> Result<ProfileVector> {
    let wanted = normalize_player_name(player);
    let matches: Vec<&PlayerSeasonRecord> = table
        .records
        .iter()
        .filter(|r| r.player == wanted)
        .collect();
    let Some(record) = matches.first().copied() else {
        return Err(ScoutError::NotFound {
            player: player.to_string(),
        });
    };
    if matches.len() > 1 {
        diag.push(PipelineWarning::DuplicatePlayer {
            player: record.player.clone(),
            rows: matches.len(),
        });
    }

    let mut axes = Vec::with_capacity(stats.len());
    for stat in stats {
        let pct_col = per90_pct_column(stat);
        if !table.has_column(&pct_col) {
            diag.missing_column(Stage::Profile, &pct_col);
        }
        axes.push(ProfileAxis {
            stat: stat.clone(),
            raw: record.stat(stat),
            per90: record.stat(&per90_column(stat)),
            percentile: record.stat(&pct_col),
        });
    }

    Ok(ProfileVector {
        player: record.player.clone(),
        team: record.team.clone(),
        position: record.position.clone(),
        age_years: record.age_years,
        minutes: record.minutes_in(minutes_column),
        axes,
    })
}

/// Case- and accent-insensitive substring search over player names, in table order.
pub fn search_players<'a>(table: &'a SeasonTable, query: &str) -> Vec<&'a PlayerSeasonRecord> {
    let needle = normalize_player_name(query).to_lowercase();
    table
        .records
        .iter()
        .filter(|r| r.player.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn record(player: &str, team: &str, goals_pct: f64) -> PlayerSeasonRecord {
        PlayerSeasonRecord {
            player: player.into(),
            team: team.into(),
            position: "FW".into(),
            position_list: vec!["FW".into()],
            nation: None,
            age: None,
            age_years: Some(24),
            stats: HashMap::from([
                ("minutes".to_string(), 900.0),
                ("goals".to_string(), 10.0),
                ("goals_per90".to_string(), 1.0),
                ("goals_per90_pct".to_string(), goals_pct),
            ]),
            extras: HashMap::new(),
        }
    }

    fn table(records: Vec<PlayerSeasonRecord>) -> SeasonTable {
        SeasonTable {
            numeric_columns: vec![
                "minutes".into(),
                "goals".into(),
                "goals_per90".into(),
                "goals_per90_pct".into(),
            ],
            text_columns: Vec::new(),
            records,
        }
    }

    #[test]
    fn profile_follows_requested_order() {
        let t = table(vec![record("Jose Gaya", "Valencia", 75.0)]);
        let mut diag = Diagnostics::new();
        let p = build_profile(&t, "José Gayà", &["xg".into(), "goals".into()], "minutes", &mut diag).unwrap();
        assert_eq!(p.labels(), vec!["xg", "goals"]);
        assert_eq!(p.values(), vec![None, Some(75.0)]);
        assert_eq!(p.axes[1].raw, Some(10.0));
        assert_eq!(p.minutes, 900);
        assert_eq!(diag.missing_columns(Stage::Profile), vec!["xg_per90_pct"]);
    }

    #[test]
    fn minutes_come_from_the_named_column() {
        let mut r = record("A", "X", 50.0);
        r.stats.remove("minutes");
        r.stats.insert("min".to_string(), 1234.4);
        let t = table(vec![r]);
        let p = build_profile(&t, "A", &["goals".into()], "min", &mut Diagnostics::new()).unwrap();
        assert_eq!(p.minutes, 1234);
        let p = build_profile(&t, "A", &["goals".into()], "minutes", &mut Diagnostics::new()).unwrap();
        assert_eq!(p.minutes, 0);
    }

    #[test]
    fn duplicate_names_use_first_row() {
        let t = table(vec![record("A", "X", 10.0), record("A", "Y", 90.0)]);
        let mut diag = Diagnostics::new();
        let p = build_profile(&t, "A", &["goals".into()], "minutes", &mut diag).unwrap();
        assert_eq!(p.team, "X");
        assert!(matches!(
            diag.warnings()[0],
            PipelineWarning::DuplicatePlayer { rows: 2, .. }
        ));
    }

    #[test]
    fn unknown_player_is_not_found() {
        let t = table(vec![record("A", "X", 10.0)]);
        let err = build_profile(&t, "Nobody", &["goals".into()], "minutes", &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, ScoutError::NotFound { ref player } if player == "Nobody"));
    }

    #[test]
    fn search_ignores_case_and_accents() {
        let t = table(vec![record("Martin Odegaard", "Arsenal", 50.0), record("Bukayo Saka", "Arsenal", 60.0)]);
        let hits = search_players(&t, "ødeg");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].player, "Martin Odegaard");
        assert_eq!(search_players(&t, "").len(), 2);
    }
}
