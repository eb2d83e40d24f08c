use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Per90,
    Percentile,
    Ranking,
    Profile,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Per90 => "per90",
            Stage::Percentile => "percentile",
            Stage::Ranking => "ranking",
            Stage::Profile => "profile",
        }
    }
}

/// Non-fatal conditions observed while deriving or ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineWarning {
    /// A requested column does not exist and was left out of every later stage.
    MissingColumn { stage: Stage, column: String },
    /// A weighted stat had no percentile column, so its share of the weight scores nothing.
    WastedWeight { stat: String, weight: f64 },
    /// A weight was given for a stat outside the request.
    UnusedWeight { stat: String },
    /// More than one row carries this player name; the first one was used.
    DuplicatePlayer { player: String, rows: usize },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::MissingColumn { stage, column } => {
                write!(f, "[{}] column '{}' not found, skipping", stage.label(), column)
            }
            PipelineWarning::WastedWeight { stat, weight } => {
                write!(f, "[ranking] no percentile for '{stat}', weight {weight:.3} unused")
            }
            PipelineWarning::UnusedWeight { stat } => {
                write!(f, "[ranking] weight given for unrequested stat '{stat}'")
            }
            PipelineWarning::DuplicatePlayer { player, rows } => {
                write!(f, "[profile] '{player}' matches {rows} rows, using the first")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    warnings: Vec<PipelineWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: PipelineWarning) {
        warn!(%warning, "pipeline warning");
        self.warnings.push(warning);
    }

    pub fn missing_column(&mut self, stage: Stage, column: &str) {
        self.push(PipelineWarning::MissingColumn {
            stage,
            column: column.to_string(),
        });
    }

    pub fn warnings(&self) -> &[PipelineWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn into_warnings(self) -> Vec<PipelineWarning> {
        self.warnings
    }

    pub fn missing_columns(&self, stage: Stage) -> Vec<&str> {
        self.warnings
            .iter()
            .filter_map(|w| match w {
                PipelineWarning::MissingColumn { stage: s, column } if *s == stage => {
                    Some(column.as_str())
                }
                _ => None,
            })
            .collect()
    }
}
