use crate::analysis::weights::MAX_WEIGHT_MAGNITUDE;
use crate::error::{AppError, Result};
use crate::knowledge::roster::{normalize_key, HeroId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const DEFAULT_STRENGTH: f64 = 1.25;

fn default_strength() -> f64 {
    DEFAULT_STRENGTH
}

/// `favored` counters `disfavored` by `strength`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterRelation {
    pub favored: HeroId,
    pub disfavored: HeroId,
    #[serde(default = "default_strength")]
    pub strength: f64,
}

impl CounterRelation {
    pub fn new(favored: impl Into<HeroId>, disfavored: impl Into<HeroId>, strength: f64) -> Self {
        CounterRelation {
            favored: favored.into(),
            disfavored: disfavored.into(),
            strength,
        }
    }

    fn validate(&self) -> Result<()> {
        if normalize_key(self.favored.as_str()) == normalize_key(self.disfavored.as_str()) {
            return Err(AppError::InvalidCounter(format!(
                "{} cannot counter itself",
                self.favored
            )));
        }
        check_strength(&self.favored, &self.disfavored, self.strength)
    }
}

fn check_strength(favored: &HeroId, disfavored: &HeroId, strength: f64) -> Result<()> {
    if !strength.is_finite() || strength <= 0.0 || strength > MAX_WEIGHT_MAGNITUDE {
        return Err(AppError::InvalidCounter(format!(
            "{} vs {} has strength {}, expected a positive number no larger than {}",
            favored, disfavored, strength, MAX_WEIGHT_MAGNITUDE
        )));
    }
    Ok(())
}

/// Where a counter signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterSource {
    Explicit,
    Inferred,
}

/// Static "who beats whom" lookup, keyed by normalized hero name. Read-only
/// once built.
#[derive(Debug, Default, Clone)]
pub struct CounterTable {
    // (favored, disfavored) normalized keys -> summed strength
    relations: HashMap<(String, String), f64>,
    // normalized key -> first spelling seen
    names: HashMap<String, HeroId>,
}

impl CounterTable {
    pub fn new(relations: Vec<CounterRelation>) -> Result<Self> {
        let mut table = HashMap::new();
        let mut names = HashMap::new();
        for relation in relations {
            relation.validate()?;
            let favored = normalize_key(relation.favored.as_str());
            let disfavored = normalize_key(relation.disfavored.as_str());

            let total = table
                .entry((favored.clone(), disfavored.clone()))
                .or_insert(0.0);
            *total += relation.strength;
            check_strength(&relation.favored, &relation.disfavored, *total)?;

            names.entry(favored).or_insert(relation.favored);
            names.entry(disfavored).or_insert(relation.disfavored);
        }
        Ok(CounterTable {
            relations: table,
            names,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let relations: Vec<CounterRelation> = serde_json::from_str(&content).map_err(|e| {
            AppError::JsonError(format!("Failed to parse counter table {}: {}", path.display(), e))
        })?;
        Self::new(relations)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Every hero mentioned on either side of a relation.
    pub fn heroes(&self) -> impl Iterator<Item = &HeroId> {
        self.names.values()
    }

    /// Signed counter value of `candidate` against `enemy`, with its source.
    ///
    /// An explicit `candidate -> enemy` entry always wins. Only when it is
    /// missing (and `infer_inverse` is set) does an `enemy -> candidate`
    /// entry count, negated. Returns `None` when neither applies.
    pub fn lookup(
        &self,
        candidate: &HeroId,
        enemy: &HeroId,
        infer_inverse: bool,
    ) -> Option<(f64, CounterSource)> {
        let candidate = normalize_key(candidate.as_str());
        let enemy = normalize_key(enemy.as_str());

        if let Some(strength) = self.relations.get(&(candidate.clone(), enemy.clone())) {
            return Some((*strength, CounterSource::Explicit));
        }
        if infer_inverse {
            if let Some(strength) = self.relations.get(&(enemy, candidate)) {
                return Some((-strength, CounterSource::Inferred));
            }
        }
        None
    }

    pub fn counter_bonus(&self, candidate: &HeroId, enemy: &HeroId, infer_inverse: bool) -> f64 {
        self.lookup(candidate, enemy, infer_inverse)
            .map(|(value, _)| value)
            .unwrap_or(0.0)
    }
}
