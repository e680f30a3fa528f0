//! Draft pick advisor: ranks heroes against known enemy picks using a
//! counter table, community meta stats and the player's own match history.

pub mod analysis;
pub mod config;
pub mod display;
pub mod error;
pub mod history;
pub mod knowledge;

pub use analysis::{DraftContext, DraftEngine, PickResult, ScoringWeights, WeightOverrides};
pub use error::{AppError, Result};
