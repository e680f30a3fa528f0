use crate::error::{AppError, Result};
use crate::knowledge::{normalize_key, HeroId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum MatchOutcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Medal {
    #[serde(rename = "MVP", alias = "Mvp")]
    Mvp,
    Gold,
    Silver,
    Bronze,
}

/// One logged game from the player's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: u64,
    pub date: NaiveDate,
    pub hero: HeroId,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub allies: Vec<HeroId>,
    pub enemies: Vec<HeroId>,
    pub result: MatchOutcome,
    #[serde(default)]
    pub medal: Option<Medal>,
    #[serde(default)]
    pub kills: Option<u32>,
    #[serde(default)]
    pub deaths: Option<u32>,
    #[serde(default)]
    pub assists: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MatchRecord {
    pub fn won(&self) -> bool {
        self.result == MatchOutcome::Win
    }
}

/// A match as submitted for logging, before it has an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMatch {
    pub date: NaiveDate,
    pub hero: HeroId,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub allies: Vec<HeroId>,
    pub enemies: Vec<HeroId>,
    pub result: MatchOutcome,
    #[serde(default)]
    pub medal: Option<Medal>,
    #[serde(default)]
    pub kills: Option<u32>,
    #[serde(default)]
    pub deaths: Option<u32>,
    #[serde(default)]
    pub assists: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewMatch {
    pub fn validate(&self) -> Result<()> {
        if self.hero.as_str().trim().is_empty() {
            return Err(AppError::InvalidMatch(
                "a match needs the hero you played".to_string(),
            ));
        }
        if self.enemies.is_empty() {
            return Err(AppError::InvalidMatch(
                "a match needs at least one enemy hero".to_string(),
            ));
        }
        let hero_key = normalize_key(self.hero.as_str());
        if self.enemies.iter().any(|e| normalize_key(e.as_str()) == hero_key) {
            return Err(AppError::InvalidMatch(format!(
                "{} is listed as both your hero and an enemy",
                self.hero
            )));
        }
        Ok(())
    }

    fn into_record(self, id: u64) -> MatchRecord {
        MatchRecord {
            id,
            date: self.date,
            hero: self.hero,
            role: self.role,
            allies: self.allies,
            enemies: self.enemies,
            result: self.result,
            medal: self.medal,
            kills: self.kills,
            deaths: self.deaths,
            assists: self.assists,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        }
    }
}

/// Counts from a bulk import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Read a bulk-import file. Only the outer list has to parse; each element
/// is checked when it is imported.
pub fn read_import_file(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::JsonError(format!(
            "{} is not a JSON list of matches: {}",
            path.display(),
            e
        ))
    })
}

/// The player's match log, persisted as one JSON file.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchLog {
    pub last_updated: DateTime<Utc>,
    pub matches: Vec<MatchRecord>,
}

impl Default for MatchLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchLog {
    pub fn new() -> Self {
        MatchLog {
            last_updated: Utc::now(),
            matches: Vec::new(),
        }
    }

    /// Read the log at `path`. A missing file is an empty log.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                AppError::JsonError(format!("Failed to parse match history: {}", e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MatchLog::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::JsonError(format!("Failed to serialize match history: {}", e))
        })?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn append(&mut self, new_match: NewMatch) -> Result<&MatchRecord> {
        new_match.validate()?;

        let next_id = self.matches.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        self.matches.push(new_match.into_record(next_id));
        self.last_updated = Utc::now();

        Ok(&self.matches[self.matches.len() - 1])
    }

    /// Append one raw import element after passing it through `resolve`.
    /// Elements that don't describe a match are `InvalidMatch`.
    pub fn import_record<F>(&mut self, value: Value, resolve: F) -> Result<&MatchRecord>
    where
        F: FnOnce(NewMatch) -> NewMatch,
    {
        let new_match: NewMatch = serde_json::from_value(value)
            .map_err(|e| AppError::InvalidMatch(format!("unreadable record: {}", e)))?;
        self.append(resolve(new_match))
    }

    /// Import every element that makes a valid match; the rest are skipped
    /// and counted.
    pub fn import_all<I, F>(&mut self, values: I, mut resolve: F) -> ImportReport
    where
        I: IntoIterator<Item = Value>,
        F: FnMut(NewMatch) -> NewMatch,
    {
        let mut report = ImportReport::default();
        for (position, value) in values.into_iter().enumerate() {
            match self.import_record(value, &mut resolve) {
                Ok(_) => report.imported += 1,
                Err(e) => {
                    warn!(position, error = %e, "skipping match during import");
                    report.skipped += 1;
                }
            }
        }
        report
    }

    /// Most recent first; same-day games by logging order.
    pub fn recent(&self, count: usize) -> Vec<&MatchRecord> {
        let mut matches: Vec<&MatchRecord> = self.matches.iter().collect();
        matches.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        matches.truncate(count);
        matches
    }

    pub fn heroes(&self) -> HashSet<HeroId> {
        self.matches
            .iter()
            .flat_map(|m| {
                std::iter::once(&m.hero)
                    .chain(m.allies.iter())
                    .chain(m.enemies.iter())
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_match(hero: &str, enemies: &[&str], result: MatchOutcome) -> NewMatch {
        NewMatch {
            date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            hero: HeroId::from(hero),
            role: Some("EXP Lane".to_string()),
            allies: vec![],
            enemies: enemies.iter().map(|e| HeroId::from(*e)).collect(),
            result,
            medal: None,
            kills: Some(5),
            deaths: Some(2),
            assists: Some(7),
            notes: None,
        }
    }

    #[test]
    fn test_append_assigns_sequential_ids() {
        let mut log = MatchLog::new();
        let first = log.append(new_match("Thamuz", &["Yu Zhong"], MatchOutcome::Win)).unwrap().id;
        let second = log.append(new_match("Thamuz", &["Fredrinn"], MatchOutcome::Loss)).unwrap().id;
        assert_eq!((first, second), (1, 2));
    }

    #[test]
    fn test_append_rejects_missing_enemies() {
        let mut log = MatchLog::new();
        let err = log.append(new_match("Thamuz", &[], MatchOutcome::Win)).unwrap_err();
        assert!(matches!(err, AppError::InvalidMatch(_)));
        assert!(log.is_empty());
    }

    #[test]
    fn test_append_rejects_hero_on_both_sides() {
        let mut log = MatchLog::new();
        assert!(log.append(new_match("Thamuz", &["Thamuz"], MatchOutcome::Win)).is_err());
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let mut log = MatchLog::new();
        let mut older = new_match("Argus", &["Ling"], MatchOutcome::Win);
        older.date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        log.append(older).unwrap();
        log.append(new_match("Thamuz", &["Ling"], MatchOutcome::Win)).unwrap();
        log.append(new_match("Martis", &["Ling"], MatchOutcome::Loss)).unwrap();

        let heroes: Vec<&str> = log.recent(2).iter().map(|m| m.hero.as_str()).collect();
        assert_eq!(heroes, vec!["Martis", "Thamuz"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let mut log = MatchLog::new();
        log.append(new_match("Thamuz", &["Yu Zhong", "Ling"], MatchOutcome::Win)).unwrap();
        log.save(&path).unwrap();

        let loaded = MatchLog::load(&path).unwrap();
        assert_eq!(loaded.matches, log.matches);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = MatchLog::load(&dir.path().join("missing.json")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(MatchLog::load(&path), Err(AppError::JsonError(_))));
    }

    #[test]
    fn test_medal_parses_mvp() {
        let medal: Medal = serde_json::from_str("\"MVP\"").unwrap();
        assert_eq!(medal, Medal::Mvp);
    }

    #[test]
    fn test_append_rejects_hero_on_both_sides_under_another_spelling() {
        let mut log = MatchLog::new();
        assert!(log.append(new_match("Yu Zhong", &["yu-zhong"], MatchOutcome::Win)).is_err());
    }

    #[test]
    fn test_import_skips_and_counts_bad_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(
            &path,
            r#"[
                {"date": "2026-03-01", "hero": "Thamuz", "enemies": ["Yu Zhong"], "result": "Win"},
                {"date": "2026-03-01", "hero": "Thamuz", "enemies": ["Ling"], "result": "Draw"},
                {"hero": "Thamuz", "enemies": ["Ling"], "result": "Loss"},
                {"date": "2026-03-02", "hero": "Thamuz", "enemies": [], "result": "Loss"},
                "not a match",
                {"date": "2026-03-03", "hero": "thamuz", "enemies": ["Fredrinn"], "result": "Loss",
                 "kills": 2, "deaths": 6, "assists": 3}
            ]"#,
        )
        .unwrap();

        let values = read_import_file(&path).unwrap();
        let mut log = MatchLog::new();
        let report = log.import_all(values, |mut m| {
            if m.hero.as_str() == "thamuz" {
                m.hero = HeroId::from("Thamuz");
            }
            m
        });

        assert_eq!(report, ImportReport { imported: 2, skipped: 4 });
        let ids: Vec<u64> = log.matches.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(log.matches.iter().all(|m| m.hero == HeroId::from("Thamuz")));

        let history = dir.path().join("history.json");
        log.save(&history).unwrap();
        assert_eq!(MatchLog::load(&history).unwrap().len(), 2);
    }

    #[test]
    fn test_import_file_must_be_a_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, r#"{"hero": "Thamuz"}"#).unwrap();
        assert!(matches!(read_import_file(&path), Err(AppError::JsonError(_))));
    }
}
