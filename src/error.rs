use thiserror::Error;

/// Errors raised by the scouting pipeline.
///
/// `Schema` and `Parse` abort the load of a dataset. `Validation`, `Config`
/// and `NotFound` are request-level and leave the prepared table untouched.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("required column missing: {column}")]
    Schema { column: String },

    #[error("invalid value '{value}' in column {column}")]
    Parse { column: String, value: String },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("invalid weights: {0}")]
    Config(String),

    #[error("player not found: {player}")]
    NotFound { player: String },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write workbook: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl ScoutError {
    pub fn schema(column: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
        }
    }

    pub fn parse(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Parse {
            column: column.into(),
            value: value.into(),
        }
    }

    /// True for errors caused by the request rather than the dataset.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Config(_) | Self::NotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;
