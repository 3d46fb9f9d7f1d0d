use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cfb_rankings::cache::DataDir;
use cfb_rankings::cfbd_fetch::{CfbdClient, ingest};
use cfb_rankings::delta::parse_delta_week;
use cfb_rankings::export::export_rankings;
use cfb_rankings::model::{RatingRow, Window};
use cfb_rankings::{RankingConfig, WeightPreset, compute_rankings};

#[derive(Parser, Debug)]
#[command(name = "cfb_rankings")]
#[command(about = "Composite college football power rankings from cached CFBD data", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory (defaults to $CFB_DATA_DIR or ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a season from the CollegeFootballData API into the data directory
    Ingest {
        #[arg(long)]
        year: Option<i32>,
        /// Last week for week-scoped datasets
        #[arg(long)]
        end_week: Option<u32>,
    },
    /// Rank every team from cached data and save the result
    Rank {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        through_week: Option<u32>,
        /// Rows to print
        #[arg(long, default_value_t = 25)]
        top: usize,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        weights: WeightArgs,
    },
    /// Compare week N against week N-1
    Delta {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        week: String,
        #[arg(long, default_value_t = 25)]
        top: usize,
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        weights: WeightArgs,
    },
    /// Show the largest score contributions for one team
    Explain {
        team: String,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        through_week: Option<u32>,
        #[arg(long, default_value_t = 5)]
        factors: usize,
        #[command(flatten)]
        weights: WeightArgs,
    },
    /// List cached years, weeks and files
    CacheInfo {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Delete cached files, all of them or one year's
    ClearCache {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Write a ranking run to an .xlsx workbook
    Export {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        through_week: Option<u32>,
        /// Also include a delta sheet against the previous week
        #[arg(long)]
        with_delta: bool,
        #[arg(long, short)]
        out: PathBuf,
        #[command(flatten)]
        weights: WeightArgs,
    },
}

/// Applied in order: preset, then --config file, then individual flags.
#[derive(Args, Debug, Clone, Default)]
struct WeightArgs {
    #[arg(long)]
    preset: Option<WeightPreset>,
    /// JSON file with any subset of ranking config fields
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    w_elo: Option<f64>,
    #[arg(long)]
    w_play: Option<f64>,
    #[arg(long)]
    w_prior: Option<f64>,
    #[arg(long)]
    w_ppa: Option<f64>,
    #[arg(long)]
    w_market: Option<f64>,
    #[arg(long)]
    w_return: Option<f64>,
    #[arg(long)]
    w_ext: Option<f64>,
    #[arg(long)]
    w_mov: Option<f64>,
    #[arg(long)]
    w_off: Option<f64>,
    #[arg(long)]
    w_def: Option<f64>,
    #[arg(long)]
    sos_weight: Option<f64>,
    #[arg(long)]
    k: Option<f64>,
    #[arg(long)]
    hfa: Option<f64>,
    #[arg(long)]
    fcs_weight: Option<f64>,
}

impl WeightArgs {
    fn resolve(&self) -> Result<RankingConfig> {
        let base = RankingConfig::from_preset(self.preset.unwrap_or(WeightPreset::Balanced));
        let mut cfg = match &self.config {
            Some(path) => RankingConfig::load_over(path, &base)?,
            None => base,
        };
        let overrides = [
            (&mut cfg.w_elo, self.w_elo),
            (&mut cfg.w_play, self.w_play),
            (&mut cfg.w_prior, self.w_prior),
            (&mut cfg.w_ppa, self.w_ppa),
            (&mut cfg.w_market, self.w_market),
            (&mut cfg.w_return, self.w_return),
            (&mut cfg.w_ext, self.w_ext),
            (&mut cfg.w_mov, self.w_mov),
            (&mut cfg.w_off, self.w_off),
            (&mut cfg.w_def, self.w_def),
            (&mut cfg.sos_weight, self.sos_weight),
            (&mut cfg.k, self.k),
            (&mut cfg.hfa, self.hfa),
            (&mut cfg.fcs_weight, self.fcs_weight),
        ];
        for (slot, value) in overrides {
            if let Some(v) = value {
                *slot = v;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn default_year() -> i32 {
    std::env::var("SEASON_YEAR")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_else(|| Utc::now().year())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let dir = cli.data_dir.map(DataDir::new).unwrap_or_else(DataDir::from_env);

    match cli.command {
        Commands::Ingest { year, end_week } => {
            let year = year.unwrap_or_else(default_year);
            let client = CfbdClient::from_env()?;
            let meta = ingest(&client, &dir, year, end_week)?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }
        Commands::Rank {
            year,
            through_week,
            top,
            json,
            weights,
        } => {
            let year = year.unwrap_or_else(default_year);
            let cfg = weights.resolve()?;
            let inputs = dir.load_season(year, through_week)?;
            let window = through_week.map(Window::through).unwrap_or_default();
            let output = compute_rankings(&inputs, &cfg, window)?;
            dir.save_rankings(year, &output)?;
            info!(
                teams = output.meta.teams_count,
                games = output.meta.games_to_date,
                "saved rankings"
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_table(&output.rankings, top);
            }
        }
        Commands::Delta {
            year,
            week,
            top,
            json,
            weights,
        } => {
            let year = year.unwrap_or_else(default_year);
            let week = parse_delta_week(&week)?;
            let cfg = weights.resolve()?;
            let output = dir.delta(year, week, &cfg)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("week {} vs week {}", output.meta.week, output.meta.delta_from);
                println!("{:>4} {:<28} {:>8} {:>6} {:>8}", "#", "Team", "Score", "dRank", "dScore");
                for d in output.rankings.iter().take(top) {
                    let ds = d
                        .delta_score
                        .map(|v| format!("{v:+.3}"))
                        .unwrap_or_else(|| "new".to_string());
                    println!(
                        "{:>4} {:<28} {:>8.3} {:>+6} {:>8}",
                        d.row.rank, d.row.team, d.row.score, d.delta_rank, ds
                    );
                }
            }
        }
        Commands::Explain {
            team,
            year,
            through_week,
            factors,
            weights,
        } => {
            let year = year.unwrap_or_else(default_year);
            let cfg = weights.resolve()?;
            let inputs = dir.load_season(year, through_week)?;
            let window = through_week.map(Window::through).unwrap_or_default();
            let output = compute_rankings(&inputs, &cfg, window)?;
            let Some(row) = output
                .rankings
                .iter()
                .find(|r| r.team.eq_ignore_ascii_case(team.trim()))
            else {
                bail!("team {team} is not on the {year} roster");
            };
            println!("#{} {} score {:.3}", row.rank, row.team, row.score);
            println!(
                "record {}-{}  elo {:.1}  sos avg elo {:.1}",
                row.record.wins, row.record.losses, row.elo, row.sos_avg_elo
            );
            for (name, value) in row.top_factors(factors) {
                println!("  {name:<10} {value:+.4}");
            }
        }
        Commands::CacheInfo { year } => {
            let info = dir.cache_info(year)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::ClearCache { year } => {
            let deleted = dir.clear(year)?;
            println!("deleted {deleted} file(s)");
        }
        Commands::Export {
            year,
            through_week,
            with_delta,
            out,
            weights,
        } => {
            let year = year.unwrap_or_else(default_year);
            let cfg = weights.resolve()?;
            let inputs = dir.load_season(year, through_week)?;
            let window = through_week.map(Window::through).unwrap_or_default();
            let output = compute_rankings(&inputs, &cfg, window)?;
            let delta = match (with_delta, through_week) {
                (true, Some(week)) => Some(dir.delta(year, week, &cfg)?),
                (true, None) => bail!("--with-delta needs --through-week"),
                (false, _) => None,
            };
            let report = export_rankings(&out, &output, delta.as_ref().map(|d| d.rankings.as_slice()))
                .with_context(|| format!("export {}", out.display()))?;
            println!(
                "wrote {} rows across {} sheets to {}",
                report.rankings,
                report.sheets,
                out.display()
            );
        }
    }
    Ok(())
}

fn print_table(rows: &[RatingRow], top: usize) {
    println!(
        "{:>4} {:<28} {:<14} {:>8} {:>7} {:>7} {:>4} {:>4}",
        "#", "Team", "Conf", "Score", "Elo", "W-L", "QW", "BL"
    );
    for r in rows.iter().take(top) {
        println!(
            "{:>4} {:<28} {:<14} {:>8.3} {:>7.1} {:>7} {:>4} {:>4}",
            r.rank,
            r.team,
            r.conference.as_deref().unwrap_or("-"),
            r.score,
            r.elo,
            format!("{}-{}", r.record.wins, r.record.losses),
            r.resume.quality_wins_25,
            r.resume.bad_losses,
        );
    }
}
