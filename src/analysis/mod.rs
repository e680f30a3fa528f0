pub mod confidence;
pub mod performance;
pub mod reason;
pub mod recommender;
pub mod weights;

pub use confidence::{Confidence, ConfidenceThresholds};
pub use performance::{MatchupStats, PerformanceIndex, PerformanceSource, PersonalStats, StatsProvider};
pub use reason::{render_explanation, Reason, ReasonKind};
pub use recommender::{DraftContext, DraftEngine, PickResult};
pub use weights::{ScoringWeights, WeightOverrides};
