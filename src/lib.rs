pub mod cache;
pub mod cfbd_fetch;
pub mod composite;
pub mod config;
pub mod delta;
pub mod dominance;
pub mod efficiency;
pub mod elo;
pub mod error;
pub mod export;
pub mod http_client;
pub mod market;
pub mod model;
pub mod resume;
pub mod schedule;
pub mod zscore;

pub use composite::compute_rankings;
pub use config::{RankingConfig, WeightPreset};
pub use delta::compute_delta;
pub use error::EngineError;
pub use model::{RankingOutput, RatingRow, SeasonInputs, Window};
