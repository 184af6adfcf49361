use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use ultraplan_core::*;

#[derive(Parser)]
#[command(name = "ultraplan")]
#[command(about = "Arctic ultra training planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this plan file instead of the built-in plan
    #[arg(long, global = true)]
    plan: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the session for a day (default)
    Suggest {
        /// Date as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Sport you did or plan to do instead, e.g. "Zwift"
        #[arg(long)]
        sport: Option<String>,
    },

    /// Show Monday..Sunday of a week with logged activities
    Week {
        #[arg(long)]
        date: Option<String>,
    },

    /// Compare planned and logged hours per week
    Volume {
        #[arg(long)]
        date: Option<String>,
    },

    /// Import a CSV training-log export into the history
    Import {
        file: PathBuf,
    },

    /// Fetch activities from Runalyze into the history
    Sync {
        /// API token (default: the configured token)
        #[arg(long)]
        token: Option<String>,
    },

    /// List logged activities, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Validate the plan
    Check,

    /// Store the Runalyze API token in the config file
    SetToken {
        token: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep stdout for the plan itself
    ultraplan_core::logging::init_with_level(if cli.verbose { "info" } else { "warn" });

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_config_path);
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        Config::default()
    };

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let plan_path = cli.plan.clone().or_else(|| config.plan.path.clone());
    tracing::info!("Data dir {:?}, plan {:?}", data_dir, plan_path);

    match cli.command {
        Some(Commands::Suggest { date, sport }) => cmd_suggest(
            plan_path.as_deref(),
            &data_dir,
            date.as_deref(),
            sport.as_deref().unwrap_or(""),
            cli.json,
        ),
        Some(Commands::Week { date }) => {
            cmd_week(plan_path.as_deref(), &data_dir, date.as_deref(), cli.json)
        }
        Some(Commands::Volume { date }) => {
            cmd_volume(plan_path.as_deref(), &data_dir, date.as_deref(), cli.json)
        }
        Some(Commands::Import { file }) => cmd_import(&data_dir, &file),
        Some(Commands::Sync { token }) => cmd_sync(&data_dir, token, &config),
        Some(Commands::History { limit }) => cmd_history(&data_dir, limit, cli.json),
        Some(Commands::Check) => cmd_check(plan_path.as_deref()),
        Some(Commands::SetToken { token }) => cmd_set_token(&config_path, config, token),
        None => cmd_suggest(plan_path.as_deref(), &data_dir, None, "", cli.json),
    }
}

fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(d) => parse_iso_date(d),
        None => Ok(Utc::now().date_naive()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_suggest(
    plan_path: Option<&Path>,
    data_dir: &Path,
    date: Option<&str>,
    sport: &str,
    json: bool,
) -> Result<()> {
    let plan = Plan::load(plan_path)?;
    let date = resolve_date(date)?;
    let history = HistoryStore::in_dir(data_dir).load()?;

    let suggestion = generate_suggestion(&plan, date, sport, &history)?;

    if json {
        return print_json(&suggestion);
    }

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {} ({})", suggestion.date, suggestion.date.format("%A"));
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  Phase: {}  ·  Week {}  ·  Target {:.1} h",
        suggestion.phase.label, suggestion.week.range, suggestion.week.hours_target
    );
    if suggestion.is_special {
        println!("  ★ Special day");
    }
    println!();

    print_session("Plan", &suggestion.primary);
    if let Some(ref alternative) = suggestion.alternative {
        print_session("Alternative", alternative);
    }
    if let Some(ref prehab) = suggestion.prehab {
        print_session("Prehab", prehab);
    }
    if let Some(ref actual) = suggestion.actual {
        println!("  ✓ Logged: {}", format_entry(actual));
        println!();
    }

    Ok(())
}

fn print_session(title: &str, session: &TrainingSession) {
    println!("  [{}] {}", title, session.label);
    println!("    {}  ·  {}  ·  {}", session.discipline, session.duration_text, session.intensity);
    for note in &session.notes {
        println!("    → {}", note);
    }
    println!();
}

fn format_entry(entry: &HistoryEntry) -> String {
    match entry.distance_km {
        Some(km) if km > 0.0 => format!("{} {} min, {:.1} km", entry.sport, entry.duration_min, km),
        _ => format!("{} {} min", entry.sport, entry.duration_min),
    }
}

fn cmd_week(plan_path: Option<&Path>, data_dir: &Path, date: Option<&str>, json: bool) -> Result<()> {
    let plan = Plan::load(plan_path)?;
    let date = resolve_date(date)?;
    let history = HistoryStore::in_dir(data_dir).load()?;

    let days = full_week_plan(&plan, date, &history);

    if json {
        return print_json(&days);
    }

    for day in &days {
        let marker = if day.date == date { "›" } else { " " };
        println!(
            "{} {} {}  {:<40} {}",
            marker,
            day.weekday,
            day.date,
            day.session.label,
            day.session.duration_text
        );
        if let Some(ref actual) = day.actual {
            println!("                  ✓ {}", format_entry(actual));
        }
    }

    Ok(())
}

fn cmd_volume(plan_path: Option<&Path>, data_dir: &Path, date: Option<&str>, json: bool) -> Result<()> {
    let plan = Plan::load(plan_path)?;
    let today = resolve_date(date)?;
    let history = HistoryStore::in_dir(data_dir).load()?;

    let weeks = weekly_volume(&plan, &history, today);

    if json {
        return print_json(&weeks);
    }

    for week in &weeks {
        let marker = if week.is_current { "›" } else { " " };
        println!(
            "{} {}..{}  {:>5.1} h / {:>5.1} h",
            marker, week.start, week.end, week.actual_hours, week.hours_target
        );
    }

    Ok(())
}

fn cmd_import(data_dir: &Path, file: &Path) -> Result<()> {
    let store = HistoryStore::in_dir(data_dir);
    let report = sync_from(&CsvFileSource::new(file), &store, data_dir)?;

    println!("✓ Imported {} activities ({} new)", report.fetched, report.added);
    Ok(())
}

fn cmd_sync(data_dir: &Path, token: Option<String>, config: &Config) -> Result<()> {
    let token = token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| config.runalyze_token().map(String::from))
        .ok_or_else(|| {
            Error::Config("No Runalyze token configured. Run `ultraplan set-token <TOKEN>` first.".into())
        })?;

    let source = RunalyzeSource::new(token, &config.runalyze)?;
    let store = HistoryStore::in_dir(data_dir);

    match sync_from(&source, &store, data_dir) {
        Ok(report) => {
            println!("✓ Synced {} activities ({} new)", report.fetched, report.added);
            Ok(())
        }
        Err(e) => {
            match &e {
                Error::Auth(_) => {
                    eprintln!("Runalyze rejected the token. Update it with `ultraplan set-token <TOKEN>`.")
                }
                Error::Network(_) => eprintln!(
                    "Runalyze could not be reached. Import a CSV export with `ultraplan import <FILE>` instead."
                ),
                Error::SyncInProgress => eprintln!("Another sync is still running."),
                _ => {}
            }
            Err(e)
        }
    }
}

fn cmd_history(data_dir: &Path, limit: usize, json: bool) -> Result<()> {
    let entries = HistoryStore::in_dir(data_dir).load()?;
    let shown: Vec<&HistoryEntry> = entries.iter().take(limit).collect();

    if json {
        return print_json(&shown);
    }

    if shown.is_empty() {
        println!("No activities logged yet.");
        return Ok(());
    }

    for entry in shown {
        println!("{}  {}", entry.date, format_entry(entry));
    }
    if entries.len() > limit {
        println!("… {} more", entries.len() - limit);
    }

    Ok(())
}

fn cmd_check(plan_path: Option<&Path>) -> Result<()> {
    // Parse without the load-time validation so every problem gets listed
    let plan = match plan_path {
        Some(path) => Plan::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => Plan::builtin()?.clone(),
    };

    let errors = plan.validate();
    if !errors.is_empty() {
        eprintln!("Plan validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::PlanValidation(format!("{} problems", errors.len())));
    }

    let (start, end) = plan
        .span()
        .ok_or_else(|| Error::PlanValidation("Plan has no phases".into()))?;
    println!(
        "✓ Plan OK: {} phases, {} weeks, {} overrides ({}..{})",
        plan.phases.len(),
        plan.weeks.len(),
        plan.overrides.len(),
        start,
        end
    );
    Ok(())
}

fn cmd_set_token(config_path: &Path, mut config: Config, token: String) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Config("Token must not be empty".into()));
    }

    config.runalyze.token = Some(token.to_string());
    config.save_to(config_path)?;

    println!("✓ Token saved to {}", config_path.display());
    Ok(())
}
