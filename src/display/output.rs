use crate::analysis::{Confidence, MatchupStats, PersonalStats, PickResult};
use crate::history::{MatchOutcome, MatchRecord};
use crate::knowledge::{HeroId, MetaTable};
use colored::*;
use std::collections::BTreeSet;
use tabled::{settings::Style, Table, Tabled};

const NO_TIP: &str = "Tactical analysis pending.";

#[derive(Tabled)]
struct PickRow {
    rank: String,
    hero: String,
    score: String,
    counter: String,
    meta: String,
    personal: String,
    matchup: String,
    confidence: String,
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "#")]
    id: String,
    date: String,
    hero: String,
    role: String,
    result: String,
    kda: String,
    enemies: String,
}

#[derive(Tabled)]
struct HeroRow {
    hero: String,
    games: String,
    record: String,
    win_rate: String,
    kda: String,
}

#[derive(Tabled)]
struct MatchupRow {
    enemy: String,
    games: String,
    record: String,
    win_rate: String,
}

fn signed_cell(value: f64) -> String {
    if value == 0.0 {
        "-".to_string()
    } else {
        format!("{:+.2}", value)
    }
}

fn confidence_cell(confidence: Confidence) -> String {
    match confidence {
        Confidence::None => "No data".dimmed().to_string(),
        other => format!("{} {}", other, other.stars()),
    }
}

pub fn format_kda(record: &MatchRecord) -> String {
    match (record.kills, record.deaths, record.assists) {
        (None, None, None) => "-".to_string(),
        (k, d, a) => format!(
            "{}/{}/{}",
            k.map_or("?".to_string(), |v| v.to_string()),
            d.map_or("?".to_string(), |v| v.to_string()),
            a.map_or("?".to_string(), |v| v.to_string()),
        ),
    }
}

fn join_heroes<'a>(heroes: impl IntoIterator<Item = &'a HeroId>) -> String {
    heroes
        .into_iter()
        .map(|h| h.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn display_recommendations(
    results: &[PickResult],
    enemies: &BTreeSet<HeroId>,
    meta: &MetaTable,
    top_n: usize,
    max_reasons: usize,
) {
    println!("\n{}", "⚔️  Draft Recommendations".bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    if enemies.is_empty() {
        println!("{}\n", "Enemy picks: none yet".dimmed());
    } else {
        println!("Enemy picks: {}\n", join_heroes(enemies).red());
    }

    if results.is_empty() {
        println!(
            "{}",
            "No candidates left (pool is empty or every hero is taken/banned)".yellow()
        );
        return;
    }

    let shown = &results[..results.len().min(top_n)];

    let rows: Vec<PickRow> = shown
        .iter()
        .enumerate()
        .map(|(idx, r)| PickRow {
            rank: format!("#{}", idx + 1),
            hero: r.hero.to_string(),
            score: format!("{:.2}", r.score),
            counter: signed_cell(r.counter_bonus()),
            meta: signed_cell(r.meta_bonus()),
            personal: signed_cell(r.personal_bonus()),
            matchup: signed_cell(r.matchup_bonus()),
            confidence: confidence_cell(r.confidence),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    println!("\n{}", "Why".bold().yellow());
    for (idx, r) in shown.iter().enumerate() {
        println!("  {} {}", format!("#{} {}", idx + 1, r.hero).bold(), r.explain(max_reasons));

        let tip = meta
            .get(&r.hero)
            .and_then(|m| m.early_tip.as_deref())
            .unwrap_or(NO_TIP);
        println!("     💡 {}", tip.dimmed());

        for warning in &r.warnings {
            println!("     {} {}", "⚠️".red(), warning.red());
        }
    }

    // Warnings on picks below the cut still matter if the player goes for them.
    let hidden: Vec<&PickResult> = results[shown.len()..]
        .iter()
        .filter(|r| !r.warnings.is_empty())
        .collect();
    if !hidden.is_empty() {
        println!("\n{}", "Other warnings".bold().red());
        for r in hidden {
            println!("  {}: {}", r.hero, r.warnings.join(", "));
        }
    }

    println!();
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message.yellow());
}

pub fn display_match_history(matches: &[&MatchRecord]) {
    if matches.is_empty() {
        println!("{}", "No matches logged yet".yellow());
        return;
    }

    let total = matches.len();
    let wins = matches.iter().filter(|m| m.won()).count();
    let losses = total - wins;
    let win_rate = (wins as f64 / total as f64) * 100.0;

    println!("\n{}", format!("📊 MATCH HISTORY (Last {} Games)", total).bold().cyan());
    println!("{}\n", "=".repeat(80).cyan());
    println!(
        "{} {} W / {} L ({:.1}% WR)\n",
        "📈 Overall:".bold(),
        wins.to_string().green(),
        losses.to_string().red(),
        win_rate
    );

    let rows: Vec<MatchRow> = matches
        .iter()
        .map(|m| MatchRow {
            id: m.id.to_string(),
            date: m.date.to_string(),
            hero: m.hero.to_string(),
            role: m.role.clone().unwrap_or_else(|| "-".to_string()),
            result: match m.result {
                MatchOutcome::Win => "WIN".green().to_string(),
                MatchOutcome::Loss => "LOSS".red().to_string(),
            },
            kda: format_kda(m),
            enemies: join_heroes(&m.enemies),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_hero_stats(stats: &[PersonalStats]) {
    println!("\n{}", "🦸 HERO PERFORMANCE".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());

    if stats.is_empty() {
        println!("{}", "Not enough games logged yet".yellow());
        return;
    }

    let rows: Vec<HeroRow> = stats
        .iter()
        .map(|s| HeroRow {
            hero: s.hero.to_string(),
            games: s.games_played.to_string(),
            record: format!("{}-{}", s.wins, s.losses),
            win_rate: format!("{:.1}%", s.win_rate() * 100.0),
            kda: format!("{:.2}", s.kda()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_matchups(hero: &HeroId, matchups: &[MatchupStats]) {
    println!("\n{}", format!("🎯 {} vs ENEMIES", hero).bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());

    if matchups.is_empty() {
        println!("{}", format!("No games logged on {}", hero).yellow());
        return;
    }

    let rows: Vec<MatchupRow> = matchups
        .iter()
        .map(|m| MatchupRow {
            enemy: m.enemy.to_string(),
            games: m.games_played.to_string(),
            record: m.record(),
            win_rate: format!("{:.1}%", m.win_rate() * 100.0),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(kills: Option<u32>, deaths: Option<u32>, assists: Option<u32>) -> MatchRecord {
        MatchRecord {
            id: 1,
            date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            hero: HeroId::from("Thamuz"),
            role: None,
            allies: vec![],
            enemies: vec![HeroId::from("Ling")],
            result: MatchOutcome::Win,
            medal: None,
            kills,
            deaths,
            assists,
            notes: None,
        }
    }

    #[test]
    fn test_format_kda() {
        assert_eq!(format_kda(&record(Some(8), Some(2), Some(6))), "8/2/6");
        assert_eq!(format_kda(&record(Some(8), None, Some(6))), "8/?/6");
        assert_eq!(format_kda(&record(None, None, None)), "-");
    }

    #[test]
    fn test_signed_cell() {
        assert_eq!(signed_cell(0.0), "-");
        assert_eq!(signed_cell(1.5), "+1.50");
        assert_eq!(signed_cell(-1.8), "-1.80");
    }
}
