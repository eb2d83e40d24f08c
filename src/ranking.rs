use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::{Diagnostics, PipelineWarning};
use crate::error::{Result, ScoutError};
use crate::season::{PlayerSeasonRecord, SeasonTable, per90_pct_column};

/// Which rows percentiles are measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentilePopulation {
    /// Only the rows left after position and age filtering.
    #[default]
    Filtered,
    /// Every row in the season table; filtering happens after ranking.
    Global,
}

impl PercentilePopulation {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "filtered" | "local" => Some(PercentilePopulation::Filtered),
            "global" | "all" => Some(PercentilePopulation::Global),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingRequest {
    pub stats: Vec<String>,
    /// Empty means every position.
    #[serde(default)]
    pub positions: BTreeSet<String>,
    /// Stats without an entry weigh 1.0.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub age_ceiling: Option<u32>,
    #[serde(default)]
    pub population: PercentilePopulation,
}

impl RankingRequest {
    pub fn new<I, S>(stats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stats: stats.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn positions<I, S>(mut self, positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positions = positions.into_iter().map(Into::into).collect();
        self
    }

    pub fn weight(mut self, stat: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(stat.into(), weight);
        self
    }

    pub fn max_age(mut self, age: u32) -> Self {
        self.age_ceiling = Some(age);
        self
    }

    pub fn population(mut self, population: PercentilePopulation) -> Self {
        self.population = population;
        self
    }

    /// Requested stats with repeats dropped, first occurrence kept.
    pub fn unique_stats(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.stats.len());
        for s in &self.stats {
            if !out.contains(s) {
                out.push(s.clone());
            }
        }
        out
    }

    /// Row filter combining the position and age predicates.
    pub fn admits(&self, record: &PlayerSeasonRecord) -> bool {
        matches_positions(record, &self.positions) && within_age(record, self.age_ceiling)
    }
}

/// One stat's share of a player's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub stat: String,
    pub percentile: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlayer {
    pub record: PlayerSeasonRecord,
    pub ranking_score: f64,
    /// Largest contributions first, at most `MAX_FACTORS`.
    pub factors: Vec<ScoreFactor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    pub entries: Vec<RankedPlayer>,
    /// Normalized weights in request order.
    pub weights: Vec<(String, f64)>,
    /// Percentile columns that fed the score.
    pub pct_columns: Vec<String>,
    pub warnings: Vec<PipelineWarning>,
}

impl RankingResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self, n: usize) -> &[RankedPlayer] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn position_of(&self, player: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.record.player == player)
    }
}

const MAX_FACTORS: usize = 5;

/// True when the record holds at least one of `positions`, or when the set is empty.
pub fn matches_positions(record: &PlayerSeasonRecord, positions: &BTreeSet<String>) -> bool {
    positions.is_empty() || record.position_list.iter().any(|p| positions.contains(p))
}

/// True when no ceiling is set or the known age is at most the ceiling.
/// Rows with unknown age never pass a ceiling.
pub fn within_age(record: &PlayerSeasonRecord, ceiling: Option<u32>) -> bool {
    match ceiling {
        None => true,
        Some(max) => record.age_years.is_some_and(|age| age <= max),
    }
}

/// Weights for `stats`, normalized to sum to 1. Missing entries default to 1.0.
pub fn resolve_weights(
    stats: &[String],
    weights: &BTreeMap<String, f64>,
    diag: &mut Diagnostics,
) -> Result<Vec<(String, f64)>> {
    for stat in weights.keys() {
        if !stats.contains(stat) {
            diag.push(PipelineWarning::UnusedWeight { stat: stat.clone() });
        }
    }

    let mut raw = Vec::with_capacity(stats.len());
    for stat in stats {
        let w = weights.get(stat).copied().unwrap_or(1.0);
        if !w.is_finite() || w < 0.0 {
            return Err(ScoutError::Config(format!(
                "weight for '{stat}' must be a non-negative number, got {w}"
            )));
        }
        raw.push((stat.clone(), w));
    }

    let total: f64 = raw.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(ScoutError::Config("total weight is zero".to_string()));
    }
    Ok(raw.into_iter().map(|(s, w)| (s, w / total)).collect())
}

/// Filter, weight and sort a table whose `<stat>_per90_pct` columns are
/// already computed.
pub fn combine_scores(
    table: &SeasonTable,
    request: &RankingRequest,
    diag: &mut Diagnostics,
) -> Result<RankingResult> {
    let stats = request.unique_stats();
    let usable: Vec<&String> = stats
        .iter()
        .filter(|s| table.has_column(&per90_pct_column(s)))
        .collect();
    if usable.is_empty() {
        return Err(ScoutError::Validation(format!(
            "no usable stats among [{}]",
            stats.join(", ")
        )));
    }

    let weights = resolve_weights(&stats, &request.weights, diag)?;
    let mut scored: Vec<(String, String, f64)> = Vec::with_capacity(weights.len());
    for (stat, w) in &weights {
        let column = per90_pct_column(stat);
        if table.has_column(&column) {
            scored.push((stat.clone(), column, *w));
        } else {
            diag.push(PipelineWarning::WastedWeight {
                stat: stat.clone(),
                weight: *w,
            });
        }
    }

    let mut entries: Vec<RankedPlayer> = table
        .records
        .iter()
        .filter(|r| request.admits(r))
        .map(|record| score_record(record, &scored))
        .collect();
    entries.sort_by(|a, b| b.ranking_score.total_cmp(&a.ranking_score));

    debug!(
        rows = entries.len(),
        stats = scored.len(),
        "combined ranking scores"
    );

    Ok(RankingResult {
        entries,
        weights,
        pct_columns: scored.into_iter().map(|(_, col, _)| col).collect(),
        warnings: diag.warnings().to_vec(),
    })
}

fn score_record(record: &PlayerSeasonRecord, scored: &[(String, String, f64)]) -> RankedPlayer {
    let mut factors: Vec<ScoreFactor> = scored
        .iter()
        .map(|(stat, column, weight)| {
            let percentile = record.stat(column).unwrap_or(0.0);
            ScoreFactor {
                stat: stat.clone(),
                percentile,
                weight: *weight,
                contribution: weight * percentile,
            }
        })
        .collect();
    let ranking_score = factors.iter().map(|f| f.contribution).sum();

    factors.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
    factors.truncate(MAX_FACTORS);

    RankedPlayer {
        record: record.clone(),
        ranking_score,
        factors,
    }
}
