use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::aggregate_season;
use crate::dataset::{RawTable, load_csv};
use crate::diagnostics::{Diagnostics, PipelineWarning};
use crate::error::Result;
use crate::normalize::normalize;
use crate::per90::{Per90Floor, add_per90_stats};
use crate::percentile::add_percentiles;
use crate::profile::{ProfileVector, build_profile, search_players};
use crate::ranking::{PercentilePopulation, RankingRequest, RankingResult, combine_scores};
use crate::season::{MINUTES_COLUMN, PlayerSeasonRecord, SeasonTable};

const MAX_CACHE_ENTRIES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub minutes_column: String,
    pub per90_floor: Per90Floor,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            minutes_column: MINUTES_COLUMN.to_string(),
            per90_floor: Per90Floor::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub profile: ProfileVector,
    pub warnings: Vec<PipelineWarning>,
}

/// Raw rows to one aggregated record per (player, team).
pub fn prepare(raw: &RawTable) -> Result<SeasonTable> {
    let normalized = normalize(raw)?;
    Ok(aggregate_season(&normalized))
}

/// Per-90 and percentile columns for `stats` on a private copy of the rows
/// `keep` admits. `base` is never modified.
pub fn derive(
    base: &SeasonTable,
    stats: &[String],
    keep: impl Fn(&PlayerSeasonRecord) -> bool,
    options: &PipelineOptions,
    diag: &mut Diagnostics,
) -> Result<SeasonTable> {
    let mut working = base.filtered(keep);
    let per90 = add_per90_stats(
        &mut working,
        stats,
        &options.minutes_column,
        options.per90_floor,
        diag,
    )?;
    add_percentiles(&mut working, &per90, diag);
    Ok(working)
}

/// Full ranking for one request against a prepared table.
pub fn rank(base: &SeasonTable, request: &RankingRequest, options: &PipelineOptions) -> Result<RankingResult> {
    let mut diag = Diagnostics::new();
    let stats = request.unique_stats();
    let working = match request.population {
        PercentilePopulation::Filtered => derive(base, &stats, |r| request.admits(r), options, &mut diag)?,
        PercentilePopulation::Global => derive(base, &stats, |_| true, options, &mut diag)?,
    };
    combine_scores(&working, request, &mut diag)
}

/// Profile of one player with percentiles measured over the whole table,
/// whatever population a ranking would use. Use [`profile_in`] to match the
/// percentiles shown in a ranking.
pub fn profile(
    base: &SeasonTable,
    player: &str,
    stats: &[String],
    options: &PipelineOptions,
) -> Result<ProfileReport> {
    let mut diag = Diagnostics::new();
    let working = derive(base, stats, |_| true, options, &mut diag)?;
    let profile = build_profile(&working, player, stats, &options.minutes_column, &mut diag)?;
    Ok(ProfileReport {
        profile,
        warnings: diag.into_warnings(),
    })
}

/// Profile of one player measured against the population a ranking request
/// would compare them with.
pub fn profile_in(
    base: &SeasonTable,
    player: &str,
    request: &RankingRequest,
    options: &PipelineOptions,
) -> Result<ProfileReport> {
    let mut diag = Diagnostics::new();
    let stats = request.unique_stats();
    let working = match request.population {
        PercentilePopulation::Filtered => derive(base, &stats, |r| request.admits(r), options, &mut diag)?,
        PercentilePopulation::Global => derive(base, &stats, |_| true, options, &mut diag)?,
    };
    let profile = build_profile(&working, player, &stats, &options.minutes_column, &mut diag)?;
    Ok(ProfileReport {
        profile,
        warnings: diag.into_warnings(),
    })
}

/// Memoized rankings keyed by input fingerprint and request parameters.
/// When full, the oldest entry is evicted first.
#[derive(Debug, Default)]
pub struct RankingCache {
    entries: Mutex<CacheEntries>,
}

#[derive(Debug, Default)]
struct CacheEntries {
    results: HashMap<String, Arc<RankingResult>>,
    order: VecDeque<String>,
}

impl RankingCache {
    pub fn key(fingerprint: &str, request: &RankingRequest, options: &PipelineOptions) -> Option<String> {
        let params = serde_json::to_string(&(request, options)).ok()?;
        Some(format!("{fingerprint}|{params}"))
    }

    pub fn get(&self, key: &str) -> Option<Arc<RankingResult>> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.results.get(key).cloned()
    }

    pub fn insert(&self, key: String, result: Arc<RankingResult>) {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if guard.results.insert(key.clone(), result).is_some() {
            return;
        }
        guard.order.push_back(key);
        while guard.order.len() > MAX_CACHE_ENTRIES {
            if let Some(oldest) = guard.order.pop_front() {
                guard.results.remove(&oldest);
                debug!("evicted oldest ranking from cache");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .results
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A prepared dataset shared read-only between requests.
#[derive(Debug)]
pub struct Scout {
    base: Arc<SeasonTable>,
    fingerprint: String,
    options: PipelineOptions,
    cache: RankingCache,
}

impl Scout {
    pub fn from_raw(raw: &RawTable, options: PipelineOptions) -> Result<Self> {
        let base = prepare(raw)?;
        info!(
            rows = raw.len(),
            players = base.len(),
            fingerprint = %raw.fingerprint,
            "prepared season table"
        );
        Ok(Self {
            base: Arc::new(base),
            fingerprint: raw.fingerprint.clone(),
            options,
            cache: RankingCache::default(),
        })
    }

    pub fn load(path: &Path, options: PipelineOptions) -> Result<Self> {
        let raw = load_csv(path)?;
        Self::from_raw(&raw, options)
    }

    pub fn table(&self) -> &SeasonTable {
        &self.base
    }

    pub fn shared_table(&self) -> Arc<SeasonTable> {
        Arc::clone(&self.base)
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn cache(&self) -> &RankingCache {
        &self.cache
    }

    /// Ranking for `request`, served from cache when the same request was seen.
    /// Failed requests are not cached.
    pub fn rank(&self, request: &RankingRequest) -> Result<Arc<RankingResult>> {
        let key = RankingCache::key(&self.fingerprint, request, &self.options);
        if let Some(hit) = key.as_deref().and_then(|k| self.cache.get(k)) {
            debug!("ranking cache hit");
            return Ok(hit);
        }
        let result = Arc::new(rank(&self.base, request, &self.options)?);
        if let Some(key) = key {
            self.cache.insert(key, Arc::clone(&result));
        }
        Ok(result)
    }

    /// Percentiles here are measured over every player in the dataset, so they
    /// can differ from a ranking computed over a filtered population. Use
    /// [`Scout::profile_in`] to profile against a ranking request's population.
    pub fn profile(&self, player: &str, stats: &[String]) -> Result<ProfileReport> {
        profile(&self.base, player, stats, &self.options)
    }

    pub fn profile_in(&self, player: &str, request: &RankingRequest) -> Result<ProfileReport> {
        profile_in(&self.base, player, request, &self.options)
    }

    pub fn search(&self, query: &str) -> Vec<&PlayerSeasonRecord> {
        search_players(&self.base, query)
    }
}
