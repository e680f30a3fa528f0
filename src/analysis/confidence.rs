use crate::analysis::performance::MatchupStats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much personal history backs a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn stars(&self) -> &'static str {
        match self {
            Confidence::None => "",
            Confidence::Low => "★",
            Confidence::Medium => "★★",
            Confidence::High => "★★★",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::None => "No data",
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        };
        f.write_str(label)
    }
}

/// Minimum games for each confidence label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        ConfidenceThresholds {
            high: 5,
            medium: 3,
            low: 1,
        }
    }
}

impl ConfidenceThresholds {
    /// Zero games is always `None`, whatever the thresholds say.
    pub fn classify(&self, games_played: u32) -> Confidence {
        if games_played == 0 {
            Confidence::None
        } else if games_played >= self.high {
            Confidence::High
        } else if games_played >= self.medium {
            Confidence::Medium
        } else if games_played >= self.low {
            Confidence::Low
        } else {
            Confidence::None
        }
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        if self.low == 0 {
            return Err("confidence low threshold must be at least 1 game".to_string());
        }
        if !(self.low <= self.medium && self.medium <= self.high) {
            return Err(format!(
                "confidence thresholds must satisfy low <= medium <= high (got {}/{}/{})",
                self.low, self.medium, self.high
            ));
        }
        Ok(())
    }
}

/// Warning text for a losing matchup, e.g. "1-4 vs Fredrinn". Only emitted
/// when the matchup has enough games and sits at or under `bad_threshold`.
pub fn matchup_warning(stats: &MatchupStats, min_games: u32, bad_threshold: f64) -> Option<String> {
    if stats.games_played == 0 || stats.games_played < min_games {
        return None;
    }
    if stats.win_rate() <= bad_threshold {
        Some(format!("{} vs {}", stats.record(), stats.enemy))
    } else {
        None
    }
}
