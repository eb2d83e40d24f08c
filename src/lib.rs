//! Football scouting statistics: season aggregation, per-90 rates,
//! population percentiles and weighted position-aware rankings.

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod normalize;
pub mod per90;
pub mod percentile;
pub mod pipeline;
pub mod profile;
pub mod ranking;
pub mod season;

pub use diagnostics::{Diagnostics, PipelineWarning, Stage};
pub use error::{Result, ScoutError};
pub use pipeline::{PipelineOptions, ProfileReport, Scout};
pub use ranking::{PercentilePopulation, RankedPlayer, RankingRequest, RankingResult};
pub use season::{Age, PlayerSeasonRecord, SeasonTable};
