use crate::error::{AppError, Result};
use crate::knowledge::roster::{normalize_key, HeroId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
    /// Placeholder labels such as "Pending Analysis"; scores as neutral.
    Unrated,
}

impl Tier {
    pub fn score(&self) -> f64 {
        match self {
            Tier::S => 0.9,
            Tier::A => 0.45,
            Tier::B => 0.0,
            Tier::C => -0.3,
            Tier::D => -0.6,
            Tier::Unrated => 0.0,
        }
    }
}

impl FromStr for Tier {
    type Err = Infallible;

    // Community lists use modifiers like "S+" or "A-"; only the letter matters here.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let letter = s.trim().trim_end_matches(['+', '-']).trim();
        let tier = match letter.to_ascii_uppercase().as_str() {
            "S" => Tier::S,
            "A" => Tier::A,
            "B" => Tier::B,
            "C" => Tier::C,
            "D" => Tier::D,
            _ => Tier::Unrated,
        };
        Ok(tier)
    }
}

impl From<String> for Tier {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Tier::Unrated)
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        tier.to_string()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
            Tier::Unrated => "Unrated",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaStats {
    #[serde(default = "unrated")]
    pub tier: Tier,
    #[serde(default)]
    pub win_rate: Option<f64>,
    #[serde(default)]
    pub pick_rate: f64,
    #[serde(default)]
    pub ban_rate: f64,
    #[serde(default)]
    pub early_tip: Option<String>,
}

fn unrated() -> Tier {
    Tier::Unrated
}

impl MetaStats {
    pub fn new(tier: Tier, win_rate: f64, pick_rate: f64, ban_rate: f64) -> Self {
        MetaStats {
            tier,
            win_rate: Some(win_rate),
            pick_rate,
            ban_rate,
            early_tip: None,
        }
    }

    fn validate(&self, hero: &HeroId) -> Result<()> {
        let rates = [
            ("win_rate", self.win_rate),
            ("pick_rate", Some(self.pick_rate)),
            ("ban_rate", Some(self.ban_rate)),
        ];
        for (label, rate) in rates {
            let Some(rate) = rate else { continue };
            if !(0.0..=1.0).contains(&rate) {
                return Err(AppError::InvalidMeta(format!(
                    "{} has {} {}, expected a fraction in [0, 1]",
                    hero, label, rate
                )));
            }
        }
        Ok(())
    }
}

/// How much each meta column moves the score. Rates are weighted per
/// percentage point; win rate is measured as distance from 50%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetaWeights {
    pub tier: f64,
    pub win_rate: f64,
    pub pick_rate: f64,
    pub ban_rate: f64,
}

impl Default for MetaWeights {
    fn default() -> Self {
        MetaWeights {
            tier: 1.0,
            win_rate: 0.05,
            pick_rate: 0.0,
            ban_rate: 0.0,
        }
    }
}

/// Per-hero meta stats, looked up by normalized name so "Lapu Lapu" in one
/// file and "Lapu-Lapu" in another refer to the same row.
#[derive(Debug, Default, Clone)]
pub struct MetaTable {
    // normalized key -> (name as written in the file, stats)
    rows: HashMap<String, (HeroId, MetaStats)>,
}

impl MetaTable {
    pub fn new(rows: HashMap<HeroId, MetaStats>) -> Result<Self> {
        let mut entries: Vec<(HeroId, MetaStats)> = rows.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut table: HashMap<String, (HeroId, MetaStats)> = HashMap::new();
        for (hero, stats) in entries {
            stats.validate(&hero)?;
            let key = normalize_key(hero.as_str());
            if let Some((kept, _)) = table.get(&key) {
                warn!(hero = %hero, kept = %kept, "duplicate meta entry under another spelling, ignoring");
                continue;
            }
            table.insert(key, (hero, stats));
        }
        Ok(MetaTable { rows: table })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let rows: HashMap<HeroId, MetaStats> = serde_json::from_str(&content).map_err(|e| {
            AppError::JsonError(format!("Failed to parse meta table {}: {}", path.display(), e))
        })?;
        Self::new(rows)
    }

    pub fn get(&self, hero: &HeroId) -> Option<&MetaStats> {
        self.rows
            .get(&normalize_key(hero.as_str()))
            .map(|(_, stats)| stats)
    }

    pub fn heroes(&self) -> impl Iterator<Item = &HeroId> {
        self.rows.values().map(|(hero, _)| hero)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Meta contribution for `hero` and the one-line reason describing it.
    /// Heroes missing from the table get a zero, neutral reason; a missing
    /// win rate or an unrated tier contributes nothing.
    pub fn meta_bonus(&self, hero: &HeroId, weights: &MetaWeights) -> (f64, String) {
        let Some(stats) = self.get(hero) else {
            return (0.0, "No meta data".to_string());
        };

        let win_pct = stats.win_rate.map(|w| w * 100.0);
        let bonus = stats.tier.score() * weights.tier
            + win_pct.map_or(0.0, |pct| (pct - 50.0) * weights.win_rate)
            + stats.pick_rate * 100.0 * weights.pick_rate
            + stats.ban_rate * 100.0 * weights.ban_rate;

        let mut text = match stats.tier {
            Tier::Unrated => "Unrated tier".to_string(),
            tier => format!("Tier {}", tier),
        };
        if let Some(pct) = win_pct {
            text.push_str(&format!(", {:.1}% meta win rate", pct));
        }
        if weights.pick_rate != 0.0 {
            text.push_str(&format!(", {:.1}% pick", stats.pick_rate * 100.0));
        }
        if weights.ban_rate != 0.0 {
            text.push_str(&format!(", {:.1}% ban", stats.ban_rate * 100.0));
        }

        (bonus, text)
    }
}
