//! Static hero knowledge: names, counter relations and community meta stats.

pub mod counters;
pub mod meta;
pub mod roster;

pub use counters::{CounterRelation, CounterSource, CounterTable};
pub use meta::{MetaStats, MetaTable, MetaWeights, Tier};
pub use roster::{normalize_key, HeroId, HeroRoster, LanePreset};
