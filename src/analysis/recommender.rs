use super::confidence::{matchup_warning, Confidence};
use super::performance::{MatchupStats, PerformanceSource, PersonalStats};
use super::reason::{render_explanation, signed, Reason, ReasonCategory, ReasonKind};
use super::weights::ScoringWeights;
use crate::knowledge::{CounterTable, HeroId, MetaTable};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// What is known about the draft so far.
#[derive(Debug, Clone, Default)]
pub struct DraftContext {
    pub enemies: BTreeSet<HeroId>,
    /// Informational only; allies are excluded from candidates but not scored against.
    pub allies: BTreeSet<HeroId>,
    pub banned: BTreeSet<HeroId>,
    pub pool: BTreeSet<HeroId>,
}

impl DraftContext {
    /// Pool members that are still pickable.
    pub fn candidates(&self) -> impl Iterator<Item = &HeroId> {
        self.pool.iter().filter(move |hero| {
            !self.enemies.contains(*hero)
                && !self.allies.contains(*hero)
                && !self.banned.contains(*hero)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickResult {
    pub hero: HeroId,
    pub score: f64,
    /// Counter terms, then meta, then personal, then matchup.
    pub reasons: Vec<Reason>,
    pub personal_stats: Option<PersonalStats>,
    pub matchup_breakdown: BTreeMap<HeroId, MatchupStats>,
    pub confidence: Confidence,
    pub warnings: Vec<String>,
}

impl PickResult {
    fn category_total(&self, category: ReasonCategory) -> f64 {
        self.reasons
            .iter()
            .filter(|r| r.kind.category() == category)
            .map(|r| r.delta)
            .sum()
    }

    pub fn counter_bonus(&self) -> f64 {
        self.category_total(ReasonCategory::Counter)
    }

    pub fn meta_bonus(&self) -> f64 {
        self.category_total(ReasonCategory::Meta)
    }

    pub fn personal_bonus(&self) -> f64 {
        self.category_total(ReasonCategory::Personal)
    }

    pub fn matchup_bonus(&self) -> f64 {
        self.category_total(ReasonCategory::Matchup)
    }

    pub fn explain(&self, max_per_category: usize) -> String {
        render_explanation(&self.reasons, max_per_category)
    }
}

/// Personal win-rate bonus: `weight` per percentage point away from 50%.
pub fn personal_bonus(stats: &PersonalStats, weight: f64) -> f64 {
    if stats.games_played == 0 {
        return 0.0;
    }
    let win_pct = stats.wins as f64 * 100.0 / stats.games_played as f64;
    weight * (win_pct - 50.0)
}

/// Scores draft candidates against read-only counter, meta and history views.
/// Holds no state of its own; every `rank` call is independent.
pub struct DraftEngine<'a> {
    counters: &'a CounterTable,
    meta: &'a MetaTable,
    performance: &'a dyn PerformanceSource,
}

impl<'a> DraftEngine<'a> {
    pub fn new(
        counters: &'a CounterTable,
        meta: &'a MetaTable,
        performance: &'a dyn PerformanceSource,
    ) -> Self {
        DraftEngine {
            counters,
            meta,
            performance,
        }
    }

    /// Every candidate in the context, best first. Equal scores are ordered
    /// by hero id.
    pub fn rank(&self, context: &DraftContext, weights: &ScoringWeights) -> Vec<PickResult> {
        let mut results: Vec<PickResult> = context
            .candidates()
            .map(|hero| self.score_candidate(hero, &context.enemies, weights))
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.hero.cmp(&b.hero))
        });

        info!(
            candidates = results.len(),
            enemies = context.enemies.len(),
            top = results.first().map(|r| r.hero.as_str()).unwrap_or("-"),
            "ranked draft candidates"
        );

        results
    }

    pub fn score_candidate(
        &self,
        hero: &HeroId,
        enemies: &BTreeSet<HeroId>,
        weights: &ScoringWeights,
    ) -> PickResult {
        let mut reasons = Vec::new();

        // 1. counters, one reason per enemy that has a relation
        for enemy in enemies {
            let bonus = self
                .counters
                .counter_bonus(hero, enemy, weights.infer_inverse_counters)
                * weights.counter_weight;
            if bonus > 0.0 {
                reasons.push(Reason::new(
                    ReasonKind::CounterStrong,
                    bonus,
                    format!("Strong vs {} ({})", enemy, signed(bonus)),
                ));
            } else if bonus < 0.0 {
                reasons.push(Reason::new(
                    ReasonKind::CounterWeak,
                    bonus,
                    format!("Weak vs {} ({})", enemy, signed(bonus)),
                ));
            }
        }

        // 2. meta, always exactly one reason
        let (meta_bonus, meta_text) = self.meta.meta_bonus(hero, &weights.meta);
        reasons.push(Reason::new(ReasonKind::Meta, meta_bonus, meta_text));

        let mut personal_stats = None;
        let mut matchup_breakdown = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut confidence = Confidence::None;

        if weights.use_personal_data {
            // 3. personal win rate
            let stats = self.performance.personal_stats(hero);
            confidence = weights.confidence.classify(stats.games_played);

            if stats.games_played >= 1 {
                let bonus = personal_bonus(&stats, weights.personal_win_rate_weight);
                let stars = confidence.stars();
                let mut text = format!(
                    "Your win rate {:.0}% over {} games",
                    stats.win_rate() * 100.0,
                    stats.games_played
                );
                if !stars.is_empty() {
                    text.push(' ');
                    text.push_str(stars);
                }
                reasons.push(Reason::new(ReasonKind::Personal, bonus, text));
                personal_stats = Some(stats);
            }

            // 4. per-enemy matchups, each gated by its own games threshold
            for enemy in enemies {
                let matchup = self.performance.matchup_stats(hero, enemy);
                if matchup.games_played == 0 {
                    continue;
                }

                if matchup.games_played >= weights.matchup_min_games {
                    let win_rate = matchup.win_rate();
                    if win_rate >= weights.good_matchup_threshold {
                        reasons.push(Reason::new(
                            ReasonKind::GoodMatchup,
                            weights.good_matchup_bonus,
                            format!("Good matchup vs {} ({})", enemy, matchup.record()),
                        ));
                    } else if win_rate <= weights.bad_matchup_threshold {
                        reasons.push(Reason::new(
                            ReasonKind::BadMatchup,
                            weights.bad_matchup_penalty,
                            format!("Bad matchup vs {} ({})", enemy, matchup.record()),
                        ));
                    }
                }

                // 6. warnings are raised whatever the penalty did to the rank
                if let Some(warning) = matchup_warning(
                    &matchup,
                    weights.matchup_min_games,
                    weights.bad_matchup_threshold,
                ) {
                    warnings.push(warning);
                }

                matchup_breakdown.insert(enemy.clone(), matchup);
            }
        }

        // 5. total
        let score: f64 = reasons.iter().map(|r| r.delta).sum();

        debug!(
            hero = hero.as_str(),
            score,
            reasons = reasons.len(),
            warnings = warnings.len(),
            %confidence,
            "scored candidate"
        );

        PickResult {
            hero: hero.clone(),
            score,
            reasons,
            personal_stats,
            matchup_breakdown,
            confidence,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::performance::StatsProvider;
    use crate::analysis::weights::WeightOverrides;
    use crate::knowledge::{CounterRelation, MetaStats, Tier};
    use std::collections::HashMap;

    fn heroes(names: &[&str]) -> BTreeSet<HeroId> {
        names.iter().map(|n| HeroId::from(*n)).collect()
    }

    #[test]
    fn test_candidates_exclude_taken_heroes() {
        let context = DraftContext {
            enemies: heroes(&["Ling"]),
            allies: heroes(&["Atlas"]),
            banned: heroes(&["Fredrinn"]),
            pool: heroes(&["Ling", "Atlas", "Fredrinn", "Thamuz"]),
        };
        let candidates: Vec<&HeroId> = context.candidates().collect();
        assert_eq!(candidates, vec![&HeroId::from("Thamuz")]);
    }

    #[test]
    fn test_personal_bonus_zero_crossing() {
        let mut stats = PersonalStats::empty(HeroId::from("Thamuz"));
        stats.games_played = 10;
        stats.wins = 5;
        stats.losses = 5;
        assert_eq!(personal_bonus(&stats, 0.08), 0.0);

        stats.wins = 7;
        stats.losses = 3;
        assert!((personal_bonus(&stats, 0.08) - 1.6).abs() < 1e-9);

        stats.wins = 3;
        stats.losses = 7;
        assert!((personal_bonus(&stats, 0.08) + 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_counter_reason_text() {
        let counters = CounterTable::new(vec![
            CounterRelation::new("Thamuz", "Yu Zhong", 1.25),
            CounterRelation::new("Ling", "Thamuz", 0.75),
        ])
        .unwrap();
        let meta = MetaTable::default();
        let provider = StatsProvider::Unavailable;
        let engine = DraftEngine::new(&counters, &meta, &provider);

        let result = engine.score_candidate(
            &HeroId::from("Thamuz"),
            &heroes(&["Ling", "Yu Zhong"]),
            &ScoringWeights::default(),
        );
        let texts: Vec<&str> = result.reasons.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Weak vs Ling (-0.75)", "Strong vs Yu Zhong (+1.25)", "No meta data"]
        );
        assert!((result.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_personal_data_ignores_history() {
        let counters = CounterTable::default();
        let mut rows = HashMap::new();
        rows.insert(HeroId::from("Thamuz"), MetaStats::new(Tier::A, 0.5, 0.0, 0.0));
        let meta = MetaTable::new(rows).unwrap();

        let log = {
            use crate::history::{MatchLog, MatchOutcome, NewMatch};
            let mut log = MatchLog::new();
            for _ in 0..3 {
                log.append(NewMatch {
                    date: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                    hero: HeroId::from("Thamuz"),
                    role: None,
                    allies: vec![],
                    enemies: vec![HeroId::from("Ling")],
                    result: MatchOutcome::Loss,
                    medal: None,
                    kills: None,
                    deaths: None,
                    assists: None,
                    notes: None,
                })
                .unwrap();
            }
            log
        };
        let provider = StatsProvider::from_log(&log);
        let engine = DraftEngine::new(&counters, &meta, &provider);

        let weights = ScoringWeights::from_overrides(WeightOverrides {
            use_personal_data: Some(false),
            ..Default::default()
        })
        .unwrap();
        let result = engine.score_candidate(&HeroId::from("Thamuz"), &heroes(&["Ling"]), &weights);

        assert_eq!(result.confidence, Confidence::None);
        assert!(result.warnings.is_empty());
        assert!(result.personal_stats.is_none());
        assert!((result.score - 0.45).abs() < 1e-9);

        let with_history =
            engine.score_candidate(&HeroId::from("Thamuz"), &heroes(&["Ling"]), &ScoringWeights::default());
        assert_eq!(with_history.warnings, vec!["0-3 vs Ling".to_string()]);
        assert_eq!(with_history.confidence, Confidence::Medium);
    }
}
