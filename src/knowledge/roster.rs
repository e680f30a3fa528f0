use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::warn;

/// Stable identifier for a playable hero. Ordering is plain string ordering,
/// which is what ranking ties fall back to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeroId(String);

impl HeroId {
    pub fn new(name: impl Into<String>) -> Self {
        HeroId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HeroId {
    fn from(name: &str) -> Self {
        HeroId(name.to_string())
    }
}

impl From<String> for HeroId {
    fn from(name: String) -> Self {
        HeroId(name)
    }
}

/// Lowercase and drop everything that isn't a letter or digit.
/// "Yu Zhong", "yu-zhong" and "YUZHONG" all map to "yuzhong".
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

// Common spellings -> normalized key of the canonical name.
const ALIASES: &[(&str, &str)] = &[
    ("popol and kupa", "popolandkupa"),
    ("popol & kupa", "popolandkupa"),
    ("popol", "popolandkupa"),
    ("yi sun shin", "yisunshin"),
    ("yss", "yisunshin"),
    ("lapu lapu", "lapulapu"),
    ("x borg", "xborg"),
    ("yz", "yuzhong"),
];

/// Every hero name the advisor knows about, indexed by normalized key.
#[derive(Debug, Default)]
pub struct HeroRoster {
    by_key: HashMap<String, HeroId>,
    aliases: HashMap<String, HeroId>,
}

impl HeroRoster {
    pub fn new<I>(heroes: I) -> Self
    where
        I: IntoIterator<Item = HeroId>,
    {
        let by_key: HashMap<String, HeroId> = heroes
            .into_iter()
            .map(|hero| (normalize_key(hero.as_str()), hero))
            .collect();

        // An alias only counts if its target is actually in the roster.
        let aliases = ALIASES
            .iter()
            .filter_map(|(alias, target)| {
                by_key
                    .get(*target)
                    .map(|hero| (normalize_key(alias), hero.clone()))
            })
            .collect();

        HeroRoster { by_key, aliases }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn contains(&self, hero: &HeroId) -> bool {
        self.by_key.contains_key(&normalize_key(hero.as_str()))
    }

    pub fn resolve(&self, raw: &str) -> Option<HeroId> {
        let key = normalize_key(raw);
        self.aliases
            .get(&key)
            .or_else(|| self.by_key.get(&key))
            .cloned()
    }

    /// Resolve a user-typed name, keeping it verbatim when the roster has no
    /// match. Unknown heroes still get scored, just without any data.
    pub fn resolve_or_keep(&self, raw: &str) -> HeroId {
        match self.resolve(raw) {
            Some(hero) => hero,
            None => {
                warn!(name = raw.trim(), "hero not found in roster, keeping name as typed");
                HeroId::new(raw.trim())
            }
        }
    }

    pub fn heroes(&self) -> BTreeSet<HeroId> {
        self.by_key.values().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LanePreset {
    Exp,
    Gold,
    Jungle,
    Roam,
    Mid,
}

impl LanePreset {
    pub fn members(&self) -> &'static [&'static str] {
        match self {
            LanePreset::Exp => &["Argus", "Lapu-Lapu", "Terizla", "Yu Zhong", "Martis", "Thamuz"],
            LanePreset::Gold => &["Brody", "Claude", "Harith", "Miya", "Wanwan"],
            LanePreset::Jungle => &["Martis", "Fredrinn", "Nolan", "Ling"],
            LanePreset::Roam => &["Atlas", "Khufra", "Diggie", "Kaja", "Akai", "Tigreal"],
            LanePreset::Mid => &["Valir", "Kadita", "Lylia", "Pharsa", "Yve"],
        }
    }

    /// Preset members that exist in the roster, in canonical spelling.
    pub fn pool(&self, roster: &HeroRoster) -> BTreeSet<HeroId> {
        self.members()
            .iter()
            .filter_map(|name| roster.resolve(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> HeroRoster {
        HeroRoster::new(
            ["Yu Zhong", "Lapu-Lapu", "Khufra", "Yi Sun-shin", "Thamuz"]
                .into_iter()
                .map(HeroId::from),
        )
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Yu Zhong"), "yuzhong");
        assert_eq!(normalize_key("  Lapu-Lapu "), "lapulapu");
        assert_eq!(normalize_key("X.Borg"), "xborg");
    }

    #[test]
    fn test_resolve_spelling_variants() {
        let roster = roster();
        assert_eq!(roster.resolve("yuzhong"), Some(HeroId::from("Yu Zhong")));
        assert_eq!(roster.resolve("lapu lapu"), Some(HeroId::from("Lapu-Lapu")));
        assert_eq!(roster.resolve("Nobody"), None);
    }

    #[test]
    fn test_alias_requires_target_in_roster() {
        let roster = roster();
        assert_eq!(roster.resolve("yss"), Some(HeroId::from("Yi Sun-shin")));
        // X.Borg is not in this roster, so neither is its alias
        assert_eq!(roster.resolve("x borg"), None);
    }

    #[test]
    fn test_resolve_or_keep_unknown() {
        let roster = roster();
        assert_eq!(roster.resolve_or_keep(" Novaria "), HeroId::from("Novaria"));
    }

    #[test]
    fn test_lane_pool_drops_missing_heroes() {
        let roster = roster();
        let pool = LanePreset::Exp.pool(&roster);
        assert_eq!(
            pool,
            ["Lapu-Lapu", "Thamuz", "Yu Zhong"]
                .into_iter()
                .map(HeroId::from)
                .collect()
        );
    }
}
