use thiserror::Error;

/// Rejected computations. Nothing is produced when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("roster is empty; ingest teams before ranking")]
    MissingRoster,

    #[error("game log is empty; ingest games before ranking")]
    MissingGames,

    #[error("delta requires week >= 2, got {week}")]
    InvalidDeltaWeek { week: i64 },

    #[error("config field `{field}` must be a finite number")]
    NonFiniteConfig { field: &'static str },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
