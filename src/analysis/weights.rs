use crate::analysis::confidence::ConfidenceThresholds;
use crate::error::{AppError, Result};
use crate::knowledge::MetaWeights;
use serde::Deserialize;

// Any weight beyond this could push a score sum to infinity.
pub(crate) const MAX_WEIGHT_MAGNITUDE: f64 = 1.0e6;

/// Caller-supplied overrides. Every field is optional; unset fields keep the
/// defaults. Thresholds are signed so a negative value can be reported
/// instead of silently wrapping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightOverrides {
    pub counter_weight: Option<f64>,
    pub tier_weight: Option<f64>,
    pub meta_win_rate_weight: Option<f64>,
    pub pick_rate_weight: Option<f64>,
    pub ban_rate_weight: Option<f64>,
    pub personal_win_rate_weight: Option<f64>,
    pub good_matchup_bonus: Option<f64>,
    pub bad_matchup_penalty: Option<f64>,
    pub good_matchup_threshold: Option<f64>,
    pub bad_matchup_threshold: Option<f64>,
    pub matchup_min_games: Option<i64>,
    pub confidence_high_games: Option<i64>,
    pub confidence_medium_games: Option<i64>,
    pub confidence_low_games: Option<i64>,
    pub use_personal_data: Option<bool>,
    pub infer_inverse_counters: Option<bool>,
}

impl WeightOverrides {
    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: WeightOverrides) -> WeightOverrides {
        WeightOverrides {
            counter_weight: other.counter_weight.or(self.counter_weight),
            tier_weight: other.tier_weight.or(self.tier_weight),
            meta_win_rate_weight: other.meta_win_rate_weight.or(self.meta_win_rate_weight),
            pick_rate_weight: other.pick_rate_weight.or(self.pick_rate_weight),
            ban_rate_weight: other.ban_rate_weight.or(self.ban_rate_weight),
            personal_win_rate_weight: other
                .personal_win_rate_weight
                .or(self.personal_win_rate_weight),
            good_matchup_bonus: other.good_matchup_bonus.or(self.good_matchup_bonus),
            bad_matchup_penalty: other.bad_matchup_penalty.or(self.bad_matchup_penalty),
            good_matchup_threshold: other.good_matchup_threshold.or(self.good_matchup_threshold),
            bad_matchup_threshold: other.bad_matchup_threshold.or(self.bad_matchup_threshold),
            matchup_min_games: other.matchup_min_games.or(self.matchup_min_games),
            confidence_high_games: other.confidence_high_games.or(self.confidence_high_games),
            confidence_medium_games: other
                .confidence_medium_games
                .or(self.confidence_medium_games),
            confidence_low_games: other.confidence_low_games.or(self.confidence_low_games),
            use_personal_data: other.use_personal_data.or(self.use_personal_data),
            infer_inverse_counters: other.infer_inverse_counters.or(self.infer_inverse_counters),
        }
    }
}

/// Validated, immutable scoring configuration for one `rank` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub(crate) counter_weight: f64,
    pub(crate) meta: MetaWeights,
    pub(crate) personal_win_rate_weight: f64,
    pub(crate) good_matchup_bonus: f64,
    pub(crate) bad_matchup_penalty: f64,
    pub(crate) good_matchup_threshold: f64,
    pub(crate) bad_matchup_threshold: f64,
    pub(crate) matchup_min_games: u32,
    pub(crate) confidence: ConfidenceThresholds,
    pub(crate) use_personal_data: bool,
    pub(crate) infer_inverse_counters: bool,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            counter_weight: 1.0,
            meta: MetaWeights::default(),
            personal_win_rate_weight: 0.08,
            good_matchup_bonus: 1.5,
            bad_matchup_penalty: -1.8,
            good_matchup_threshold: 0.60,
            bad_matchup_threshold: 0.40,
            matchup_min_games: 2,
            confidence: ConfidenceThresholds::default(),
            use_personal_data: true,
            infer_inverse_counters: true,
        }
    }
}

fn games_threshold(name: &str, value: Option<i64>, default: u32) -> Result<u32> {
    match value {
        None => Ok(default),
        Some(v) if v < 0 => Err(AppError::InvalidWeights(format!(
            "{} must not be negative (got {})",
            name, v
        ))),
        Some(v) => u32::try_from(v).map_err(|_| {
            AppError::InvalidWeights(format!("{} is too large (got {})", name, v))
        }),
    }
}

impl ScoringWeights {
    pub fn from_overrides(overrides: WeightOverrides) -> Result<Self> {
        let d = ScoringWeights::default();

        let weights = ScoringWeights {
            counter_weight: overrides.counter_weight.unwrap_or(d.counter_weight),
            meta: MetaWeights {
                tier: overrides.tier_weight.unwrap_or(d.meta.tier),
                win_rate: overrides.meta_win_rate_weight.unwrap_or(d.meta.win_rate),
                pick_rate: overrides.pick_rate_weight.unwrap_or(d.meta.pick_rate),
                ban_rate: overrides.ban_rate_weight.unwrap_or(d.meta.ban_rate),
            },
            personal_win_rate_weight: overrides
                .personal_win_rate_weight
                .unwrap_or(d.personal_win_rate_weight),
            good_matchup_bonus: overrides.good_matchup_bonus.unwrap_or(d.good_matchup_bonus),
            bad_matchup_penalty: overrides.bad_matchup_penalty.unwrap_or(d.bad_matchup_penalty),
            good_matchup_threshold: overrides
                .good_matchup_threshold
                .unwrap_or(d.good_matchup_threshold),
            bad_matchup_threshold: overrides
                .bad_matchup_threshold
                .unwrap_or(d.bad_matchup_threshold),
            matchup_min_games: games_threshold(
                "matchup_min_games",
                overrides.matchup_min_games,
                d.matchup_min_games,
            )?,
            confidence: ConfidenceThresholds {
                high: games_threshold(
                    "confidence_high_games",
                    overrides.confidence_high_games,
                    d.confidence.high,
                )?,
                medium: games_threshold(
                    "confidence_medium_games",
                    overrides.confidence_medium_games,
                    d.confidence.medium,
                )?,
                low: games_threshold(
                    "confidence_low_games",
                    overrides.confidence_low_games,
                    d.confidence.low,
                )?,
            },
            use_personal_data: overrides.use_personal_data.unwrap_or(d.use_personal_data),
            infer_inverse_counters: overrides
                .infer_inverse_counters
                .unwrap_or(d.infer_inverse_counters),
        };

        weights.validate()?;
        Ok(weights)
    }

    fn validate(&self) -> Result<()> {
        let named = [
            ("counter_weight", self.counter_weight),
            ("tier_weight", self.meta.tier),
            ("meta_win_rate_weight", self.meta.win_rate),
            ("pick_rate_weight", self.meta.pick_rate),
            ("ban_rate_weight", self.meta.ban_rate),
            ("personal_win_rate_weight", self.personal_win_rate_weight),
            ("good_matchup_bonus", self.good_matchup_bonus),
            ("bad_matchup_penalty", self.bad_matchup_penalty),
        ];
        for (name, value) in named {
            if !value.is_finite() || value.abs() > MAX_WEIGHT_MAGNITUDE {
                return Err(AppError::InvalidWeights(format!(
                    "{} must be a finite number no larger than {} in magnitude (got {})",
                    name, MAX_WEIGHT_MAGNITUDE, value
                )));
            }
        }

        if self.bad_matchup_penalty > 0.0 {
            return Err(AppError::InvalidWeights(format!(
                "bad_matchup_penalty is subtracted and must be <= 0 (got {})",
                self.bad_matchup_penalty
            )));
        }

        for (name, value) in [
            ("good_matchup_threshold", self.good_matchup_threshold),
            ("bad_matchup_threshold", self.bad_matchup_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::InvalidWeights(format!(
                    "{} must be a win rate in [0, 1] (got {})",
                    name, value
                )));
            }
        }
        if self.bad_matchup_threshold >= self.good_matchup_threshold {
            return Err(AppError::InvalidWeights(format!(
                "bad_matchup_threshold ({}) must be below good_matchup_threshold ({})",
                self.bad_matchup_threshold, self.good_matchup_threshold
            )));
        }

        self.confidence.check().map_err(AppError::InvalidWeights)
    }

    pub fn matchup_min_games(&self) -> u32 {
        self.matchup_min_games
    }

    pub fn confidence_thresholds(&self) -> ConfidenceThresholds {
        self.confidence
    }

    pub fn uses_personal_data(&self) -> bool {
        self.use_personal_data
    }

    pub fn infers_inverse_counters(&self) -> bool {
        self.infer_inverse_counters
    }
}
