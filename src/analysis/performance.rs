use crate::history::{MatchLog, MatchRecord};
use crate::knowledge::{normalize_key, HeroId};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{info, warn};

/// The player's own record on one hero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalStats {
    pub hero: HeroId,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub avg_kills: f64,
    pub avg_deaths: f64,
    pub avg_assists: f64,
}

impl PersonalStats {
    pub fn empty(hero: HeroId) -> Self {
        PersonalStats {
            hero,
            games_played: 0,
            wins: 0,
            losses: 0,
            avg_kills: 0.0,
            avg_deaths: 0.0,
            avg_assists: 0.0,
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.games_played as f64
        }
    }

    pub fn kda(&self) -> f64 {
        (self.avg_kills + self.avg_assists) / self.avg_deaths.max(1.0)
    }
}

/// The player's record on `hero` in games where `enemy` was on the other team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchupStats {
    pub hero: HeroId,
    pub enemy: HeroId,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
}

impl MatchupStats {
    pub fn empty(hero: HeroId, enemy: HeroId) -> Self {
        MatchupStats {
            hero,
            enemy,
            games_played: 0,
            wins: 0,
            losses: 0,
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.games_played as f64
        }
    }

    /// Literal win-loss record, e.g. "4-1".
    pub fn record(&self) -> String {
        format!("{}-{}", self.wins, self.losses)
    }
}

/// Read-only source of personal and matchup aggregates. Implementations
/// report zero games instead of failing.
pub trait PerformanceSource {
    fn personal_stats(&self, hero: &HeroId) -> PersonalStats;
    fn matchup_stats(&self, hero: &HeroId, enemy: &HeroId) -> MatchupStats;
}

#[derive(Debug, Default)]
struct KdaTotals {
    kills: (u64, u32),
    deaths: (u64, u32),
    assists: (u64, u32),
}

impl KdaTotals {
    fn add(&mut self, record: &MatchRecord) {
        for (slot, value) in [
            (&mut self.kills, record.kills),
            (&mut self.deaths, record.deaths),
            (&mut self.assists, record.assists),
        ] {
            if let Some(v) = value {
                slot.0 += v as u64;
                slot.1 += 1;
            }
        }
    }

    fn average((sum, count): (u64, u32)) -> f64 {
        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }
}

/// Aggregates computed once from a slice of match records. Heroes are keyed
/// by normalized name, so records spelling a hero differently still pool.
#[derive(Debug, Default)]
pub struct PerformanceIndex {
    personal: HashMap<String, PersonalStats>,
    matchups: HashMap<(String, String), MatchupStats>,
}

impl PerformanceIndex {
    pub fn from_records(records: &[MatchRecord]) -> Self {
        let mut personal: HashMap<String, PersonalStats> = HashMap::new();
        let mut kda: HashMap<String, KdaTotals> = HashMap::new();
        let mut matchups: HashMap<(String, String), MatchupStats> = HashMap::new();

        for record in records {
            let won = record.won();
            let hero_key = normalize_key(record.hero.as_str());

            let entry = personal
                .entry(hero_key.clone())
                .or_insert_with(|| PersonalStats::empty(record.hero.clone()));
            entry.games_played += 1;
            if won {
                entry.wins += 1;
            } else {
                entry.losses += 1;
            }
            kda.entry(hero_key.clone()).or_default().add(record);

            // A hero listed twice on the enemy side still counts as one game.
            let mut seen = BTreeSet::new();
            for enemy in &record.enemies {
                let enemy_key = normalize_key(enemy.as_str());
                if !seen.insert(enemy_key.clone()) {
                    continue;
                }
                let entry = matchups
                    .entry((hero_key.clone(), enemy_key))
                    .or_insert_with(|| MatchupStats::empty(record.hero.clone(), enemy.clone()));
                entry.games_played += 1;
                if won {
                    entry.wins += 1;
                } else {
                    entry.losses += 1;
                }
            }
        }

        for (key, totals) in kda {
            if let Some(stats) = personal.get_mut(&key) {
                stats.avg_kills = KdaTotals::average(totals.kills);
                stats.avg_deaths = KdaTotals::average(totals.deaths);
                stats.avg_assists = KdaTotals::average(totals.assists);
            }
        }

        PerformanceIndex { personal, matchups }
    }

    /// Every hero played or faced in the indexed games.
    pub fn heroes(&self) -> BTreeSet<HeroId> {
        self.personal
            .values()
            .map(|s| &s.hero)
            .chain(self.matchups.values().map(|m| &m.enemy))
            .cloned()
            .collect()
    }

    /// Per-hero stats with at least `min_games`, most played first.
    pub fn all_personal(&self, min_games: u32) -> Vec<PersonalStats> {
        let mut stats: Vec<PersonalStats> = self
            .personal
            .values()
            .filter(|s| s.games_played >= min_games)
            .cloned()
            .collect();
        stats.sort_by(|a, b| {
            b.games_played
                .cmp(&a.games_played)
                .then_with(|| a.hero.cmp(&b.hero))
        });
        stats
    }

    /// Every enemy faced while playing `hero`, most frequent first.
    pub fn matchups_for(&self, hero: &HeroId) -> Vec<MatchupStats> {
        let key = normalize_key(hero.as_str());
        let mut stats: Vec<MatchupStats> = self
            .matchups
            .iter()
            .filter(|((played, _), _)| *played == key)
            .map(|(_, m)| MatchupStats {
                hero: hero.clone(),
                ..m.clone()
            })
            .collect();
        stats.sort_by(|a, b| {
            b.games_played
                .cmp(&a.games_played)
                .then_with(|| a.enemy.cmp(&b.enemy))
        });
        stats
    }
}

impl PerformanceSource for PerformanceIndex {
    // Stats come back under the names the caller asked for.
    fn personal_stats(&self, hero: &HeroId) -> PersonalStats {
        match self.personal.get(&normalize_key(hero.as_str())) {
            Some(stats) => PersonalStats {
                hero: hero.clone(),
                ..stats.clone()
            },
            None => PersonalStats::empty(hero.clone()),
        }
    }

    fn matchup_stats(&self, hero: &HeroId, enemy: &HeroId) -> MatchupStats {
        let key = (normalize_key(hero.as_str()), normalize_key(enemy.as_str()));
        match self.matchups.get(&key) {
            Some(stats) => MatchupStats {
                hero: hero.clone(),
                enemy: enemy.clone(),
                ..stats.clone()
            },
            None => MatchupStats::empty(hero.clone(), enemy.clone()),
        }
    }
}

/// Match history as seen by the engine: either loaded, or not there at all.
#[derive(Debug)]
pub enum StatsProvider {
    Available(PerformanceIndex),
    Unavailable,
}

impl StatsProvider {
    /// Open the history file at `path`. A missing or unreadable history is
    /// `Unavailable`, never an error.
    pub fn open(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "no match history yet, personal stats disabled");
            return StatsProvider::Unavailable;
        }
        match MatchLog::load(path) {
            Ok(log) => StatsProvider::from_log(&log),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "match history unreadable, personal stats disabled");
                StatsProvider::Unavailable
            }
        }
    }

    pub fn from_log(log: &MatchLog) -> Self {
        StatsProvider::Available(PerformanceIndex::from_records(&log.matches))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, StatsProvider::Available(_))
    }
}

impl PerformanceSource for StatsProvider {
    fn personal_stats(&self, hero: &HeroId) -> PersonalStats {
        match self {
            StatsProvider::Available(index) => index.personal_stats(hero),
            StatsProvider::Unavailable => PersonalStats::empty(hero.clone()),
        }
    }

    fn matchup_stats(&self, hero: &HeroId, enemy: &HeroId) -> MatchupStats {
        match self {
            StatsProvider::Available(index) => index.matchup_stats(hero, enemy),
            StatsProvider::Unavailable => MatchupStats::empty(hero.clone(), enemy.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MatchOutcome;
    use chrono::NaiveDate;

    fn record(id: u64, hero: &str, enemies: &[&str], result: MatchOutcome, kda: Option<(u32, u32, u32)>) -> MatchRecord {
        MatchRecord {
            id,
            date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            hero: HeroId::from(hero),
            role: None,
            allies: vec![],
            enemies: enemies.iter().map(|e| HeroId::from(*e)).collect(),
            result,
            medal: None,
            kills: kda.map(|k| k.0),
            deaths: kda.map(|k| k.1),
            assists: kda.map(|k| k.2),
            notes: None,
        }
    }

    fn index() -> PerformanceIndex {
        PerformanceIndex::from_records(&[
            record(1, "Thamuz", &["Yu Zhong", "Ling"], MatchOutcome::Win, Some((6, 2, 4))),
            record(2, "Thamuz", &["Yu Zhong"], MatchOutcome::Win, Some((4, 4, 8))),
            record(3, "Thamuz", &["Fredrinn"], MatchOutcome::Loss, None),
            record(4, "Argus", &["Yu Zhong", "Yu Zhong"], MatchOutcome::Loss, None),
        ])
    }

    #[test]
    fn test_personal_stats_aggregate() {
        let stats = index().personal_stats(&HeroId::from("Thamuz"));
        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.wins + stats.losses, stats.games_played);
        // KDA averages only cover games that recorded them
        assert_eq!(stats.avg_kills, 5.0);
        assert_eq!(stats.avg_deaths, 3.0);
        assert_eq!(stats.avg_assists, 6.0);
    }

    #[test]
    fn test_matchup_stats_aggregate() {
        let index = index();
        let vs_yz = index.matchup_stats(&HeroId::from("Thamuz"), &HeroId::from("Yu Zhong"));
        assert_eq!((vs_yz.games_played, vs_yz.wins, vs_yz.losses), (2, 2, 0));
        assert_eq!(vs_yz.record(), "2-0");

        let argus = index.matchup_stats(&HeroId::from("Argus"), &HeroId::from("Yu Zhong"));
        assert_eq!(argus.games_played, 1);
    }

    #[test]
    fn test_unknown_hero_reports_zero_games() {
        let index = index();
        assert_eq!(index.personal_stats(&HeroId::from("Ling")).games_played, 0);
        assert_eq!(
            index
                .matchup_stats(&HeroId::from("Thamuz"), &HeroId::from("Atlas"))
                .games_played,
            0
        );
    }

    #[test]
    fn test_unavailable_provider_reports_zero_games() {
        let provider = StatsProvider::Unavailable;
        let stats = provider.personal_stats(&HeroId::from("Thamuz"));
        assert_eq!(stats, PersonalStats::empty(HeroId::from("Thamuz")));
        assert_eq!(stats.win_rate(), 0.0);
    }

    #[test]
    fn test_open_missing_or_corrupt_history_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!StatsProvider::open(&dir.path().join("missing.json")).is_available());

        let corrupt = dir.path().join("history.json");
        std::fs::write(&corrupt, "[oops").unwrap();
        assert!(!StatsProvider::open(&corrupt).is_available());
    }

    #[test]
    fn test_all_personal_filters_and_orders() {
        let heroes: Vec<String> = index()
            .all_personal(1)
            .into_iter()
            .map(|s| s.hero.to_string())
            .collect();
        assert_eq!(heroes, vec!["Thamuz", "Argus"]);
        assert_eq!(index().all_personal(2).len(), 1);
    }

    #[test]
    fn test_spelling_variants_pool_together() {
        let index = PerformanceIndex::from_records(&[
            record(1, "Lapu-Lapu", &["Yu Zhong"], MatchOutcome::Win, None),
            record(2, "Lapu Lapu", &["Yu-Zhong", "yu zhong"], MatchOutcome::Loss, None),
        ]);

        let stats = index.personal_stats(&HeroId::from("lapu lapu"));
        assert_eq!((stats.games_played, stats.wins), (2, 1));
        assert_eq!(stats.hero, HeroId::from("lapu lapu"));

        let vs = index.matchup_stats(&HeroId::from("Lapu-Lapu"), &HeroId::from("YU ZHONG"));
        assert_eq!(vs.record(), "1-1");
        assert_eq!(vs.enemy, HeroId::from("YU ZHONG"));
    }
}
