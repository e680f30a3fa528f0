use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use draft_advisor::analysis::{
    DraftContext, DraftEngine, PerformanceIndex, ScoringWeights, StatsProvider, WeightOverrides,
};
use draft_advisor::config::Config;
use draft_advisor::display::output::{
    display_error, display_hero_stats, display_info, display_match_history, display_matchups,
    display_recommendations, display_success, display_warning,
};
use draft_advisor::history::{read_import_file, MatchLog, MatchOutcome, Medal, NewMatch};
use draft_advisor::knowledge::{CounterTable, HeroId, HeroRoster, LanePreset, MetaTable};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "Draft Advisor")]
#[command(about = "Rank hero picks against the enemy draft using counters, meta and your own games", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank candidate picks for the current draft
    Recommend(RecommendArgs),
    /// Log a finished match
    Log(LogArgs),
    /// Import matches from a JSON file (a list of match objects)
    Import {
        file: PathBuf,
    },
    /// Show recent matches
    History {
        /// Number of matches to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show your per-hero performance, or one hero's matchups
    Stats {
        /// Show the enemy breakdown for this hero
        #[arg(long)]
        hero: Option<String>,

        /// Hide heroes with fewer games than this
        #[arg(long, default_value = "1")]
        min_games: u32,
    },
}

#[derive(Args, Debug)]
struct RecommendArgs {
    /// Enemy picks (repeat or comma-separate)
    #[arg(short, long = "enemy", value_delimiter = ',')]
    enemies: Vec<String>,

    /// Ally picks
    #[arg(short, long = "ally", value_delimiter = ',')]
    allies: Vec<String>,

    /// Banned heroes
    #[arg(short, long = "ban", value_delimiter = ',')]
    bans: Vec<String>,

    /// Your hero pool (default: lane preset, or every known hero)
    #[arg(short, long, value_delimiter = ',')]
    pool: Vec<String>,

    /// Use a lane preset as the pool
    #[arg(short, long, value_enum)]
    lane: Option<LanePreset>,

    /// Number of picks to display
    #[arg(short, long, default_value = "10")]
    top_n: usize,

    /// Reasons shown per category
    #[arg(long, default_value = "3")]
    max_reasons: usize,

    /// Ignore your match history
    #[arg(long)]
    no_personal: bool,

    /// Don't infer weaknesses from the enemy's counter list
    #[arg(long)]
    no_inverse: bool,

    /// Bonus per win-rate point above 50% on the candidate
    #[arg(long)]
    personal_weight: Option<f64>,

    /// Bonus for a winning matchup
    #[arg(long)]
    good_matchup: Option<f64>,

    /// Penalty for a losing matchup (negative)
    #[arg(long, allow_hyphen_values = true)]
    bad_matchup: Option<f64>,

    /// Games needed before a matchup counts
    #[arg(long, allow_hyphen_values = true)]
    matchup_min_games: Option<i64>,
}

impl RecommendArgs {
    fn overrides(&self) -> WeightOverrides {
        WeightOverrides {
            personal_win_rate_weight: self.personal_weight,
            good_matchup_bonus: self.good_matchup,
            bad_matchup_penalty: self.bad_matchup,
            matchup_min_games: self.matchup_min_games,
            use_personal_data: self.no_personal.then_some(false),
            infer_inverse_counters: self.no_inverse.then_some(false),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Kda {
    kills: u32,
    deaths: u32,
    assists: u32,
}

impl FromStr for Kda {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').map(str::trim).collect();
        let [k, d, a] = parts.as_slice() else {
            return Err(format!("expected K/D/A like 8/2/6, got '{}'", s));
        };
        let parse = |v: &str| v.parse::<u32>().map_err(|_| format!("'{}' is not a count", v));
        Ok(Kda {
            kills: parse(*k)?,
            deaths: parse(*d)?,
            assists: parse(*a)?,
        })
    }
}

#[derive(Args, Debug)]
struct LogArgs {
    /// Hero you played
    #[arg(long)]
    hero: String,

    /// Enemy heroes
    #[arg(short, long = "enemy", value_delimiter = ',', required = true)]
    enemies: Vec<String>,

    /// Allied heroes
    #[arg(short, long = "ally", value_delimiter = ',')]
    allies: Vec<String>,

    #[arg(short, long, value_enum)]
    result: MatchOutcome,

    /// Lane or role you played
    #[arg(long)]
    role: Option<String>,

    #[arg(long, value_enum)]
    medal: Option<Medal>,

    /// Kills/deaths/assists, e.g. 8/2/6
    #[arg(long)]
    kda: Option<Kda>,

    #[arg(long)]
    notes: Option<String>,

    /// Match date (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    match cli.command {
        Command::Recommend(args) => recommend(&config, args),
        Command::Log(args) => log_match(&config, args),
        Command::Import { file } => import_matches(&config, &file),
        Command::History { limit } => {
            let log = load_history(&config)?;
            display_match_history(&log.recent(limit));
            Ok(())
        }
        Command::Stats { hero, min_games } => show_stats(&config, hero, min_games),
    }
}

/// Counter and meta tables. A missing file just means no data of that kind.
fn load_knowledge(config: &Config) -> anyhow::Result<(CounterTable, MetaTable)> {
    let counters = if config.counters_path.exists() {
        CounterTable::load(&config.counters_path).with_context(|| {
            format!("loading counter table {}", config.counters_path.display())
        })?
    } else {
        display_warning(&format!(
            "No counter table at {}, counter bonuses will be 0",
            config.counters_path.display()
        ));
        CounterTable::default()
    };

    let meta = if config.meta_path.exists() {
        MetaTable::load(&config.meta_path)
            .with_context(|| format!("loading meta table {}", config.meta_path.display()))?
    } else {
        display_warning(&format!(
            "No meta table at {}, meta bonuses will be 0",
            config.meta_path.display()
        ));
        MetaTable::default()
    };

    Ok((counters, meta))
}

fn load_history(config: &Config) -> anyhow::Result<MatchLog> {
    MatchLog::load(&config.history_path)
        .with_context(|| format!("loading match history {}", config.history_path.display()))
}

fn build_roster<I>(counters: &CounterTable, meta: &MetaTable, extra: I) -> HeroRoster
where
    I: IntoIterator<Item = HeroId>,
{
    let mut heroes: BTreeSet<HeroId> = counters.heroes().cloned().collect();
    heroes.extend(meta.heroes().cloned());
    heroes.extend(extra);
    HeroRoster::new(heroes)
}

fn resolve_all(roster: &HeroRoster, names: &[String]) -> BTreeSet<HeroId> {
    names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| roster.resolve_or_keep(n))
        .collect()
}

fn recommend(config: &Config, args: RecommendArgs) -> anyhow::Result<()> {
    // Reject bad weights before touching any data.
    let overrides = config.weight_overrides()?.merge(args.overrides());
    let weights = ScoringWeights::from_overrides(overrides)?;

    let (counters, meta) = load_knowledge(config)?;
    let provider = if weights.uses_personal_data() {
        StatsProvider::open(&config.history_path)
    } else {
        StatsProvider::Unavailable
    };
    if weights.uses_personal_data() && !provider.is_available() {
        display_info("No match history found, ranking on counters and meta only");
    }

    let history_heroes = match &provider {
        StatsProvider::Available(index) => index.heroes(),
        StatsProvider::Unavailable => BTreeSet::new(),
    };
    let roster = build_roster(&counters, &meta, history_heroes);

    let pool = if !args.pool.is_empty() {
        resolve_all(&roster, &args.pool)
    } else if let Some(lane) = args.lane {
        lane.pool(&roster)
    } else {
        roster.heroes()
    };
    if pool.is_empty() {
        anyhow::bail!("hero pool is empty: pass --pool or --lane, or add a counter/meta table");
    }

    let context = DraftContext {
        enemies: resolve_all(&roster, &args.enemies),
        allies: resolve_all(&roster, &args.allies),
        banned: resolve_all(&roster, &args.bans),
        pool,
    };

    let engine = DraftEngine::new(&counters, &meta, &provider);
    let results = engine.rank(&context, &weights);

    display_recommendations(&results, &context.enemies, &meta, args.top_n, args.max_reasons);
    Ok(())
}

fn log_match(config: &Config, args: LogArgs) -> anyhow::Result<()> {
    let (counters, meta) = load_knowledge(config)?;
    let mut log = load_history(config)?;
    let roster = build_roster(&counters, &meta, log.heroes());

    let new_match = NewMatch {
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
        hero: roster.resolve_or_keep(&args.hero),
        role: args.role,
        allies: resolve_all(&roster, &args.allies).into_iter().collect(),
        enemies: resolve_all(&roster, &args.enemies).into_iter().collect(),
        result: args.result,
        medal: args.medal,
        kills: args.kda.map(|k| k.kills),
        deaths: args.kda.map(|k| k.deaths),
        assists: args.kda.map(|k| k.assists),
        notes: args.notes,
    };

    let record = log.append(new_match)?.clone();
    log.save(&config.history_path)?;

    display_success(&format!(
        "Logged match #{}: {} {:?} vs {}",
        record.id,
        record.hero,
        record.result,
        record
            .enemies
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    Ok(())
}

const IMPORT_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

fn import_progress_style() -> anyhow::Result<ProgressStyle> {
    Ok(ProgressStyle::with_template(IMPORT_TEMPLATE)?.progress_chars("=>-"))
}

fn import_matches(config: &Config, file: &Path) -> anyhow::Result<()> {
    let values = read_import_file(file).with_context(|| format!("reading {}", file.display()))?;

    let (counters, meta) = load_knowledge(config)?;
    let mut log = load_history(config)?;
    let roster = build_roster(&counters, &meta, log.heroes());

    let pb = ProgressBar::new(values.len() as u64);
    pb.set_style(import_progress_style()?);
    pb.set_message("Importing matches");

    let resolve_names = |mut new_match: NewMatch| {
        new_match.hero = roster.resolve_or_keep(new_match.hero.as_str());
        new_match.enemies = new_match
            .enemies
            .iter()
            .map(|e| roster.resolve_or_keep(e.as_str()))
            .collect();
        new_match.allies = new_match
            .allies
            .iter()
            .map(|a| roster.resolve_or_keep(a.as_str()))
            .collect();
        new_match
    };
    let report = log.import_all(pb.wrap_iter(values.into_iter()), resolve_names);
    pb.finish_with_message("✓ Import finished");

    log.save(&config.history_path)?;
    display_success(&format!("Imported {} matches", report.imported));
    if report.skipped > 0 {
        display_warning(&format!("Skipped {} invalid matches", report.skipped));
    }
    Ok(())
}

fn show_stats(config: &Config, hero: Option<String>, min_games: u32) -> anyhow::Result<()> {
    let log = load_history(config)?;
    let index = PerformanceIndex::from_records(&log.matches);

    match hero {
        Some(name) => {
            let (counters, meta) = load_knowledge(config)?;
            let roster = build_roster(&counters, &meta, log.heroes());
            let hero = roster.resolve_or_keep(&name);
            display_matchups(&hero, &index.matchups_for(&hero));
        }
        None => display_hero_stats(&index.all_personal(min_games)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kda() {
        let kda: Kda = "8/2/6".parse().unwrap();
        assert_eq!((kda.kills, kda.deaths, kda.assists), (8, 2, 6));
        assert!("8/2".parse::<Kda>().is_err());
        assert!("8/x/6".parse::<Kda>().is_err());
    }

    #[test]
    fn test_cli_parses_recommend() {
        let cli = Cli::try_parse_from([
            "draft-advisor",
            "recommend",
            "-e",
            "Yu Zhong,Fredrinn",
            "--pool",
            "Thamuz",
            "--bad-matchup",
            "-2.0",
        ])
        .unwrap();
        match cli.command {
            Command::Recommend(args) => {
                assert_eq!(args.enemies, vec!["Yu Zhong", "Fredrinn"]);
                assert_eq!(args.overrides().bad_matchup_penalty, Some(-2.0));
                assert_eq!(args.overrides().use_personal_data, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_import_progress_shows_message() {
        assert!(IMPORT_TEMPLATE.contains("{msg}"));
        assert!(import_progress_style().is_ok());
    }
}
