use anyhow::{bail, Context, Result};
use clap::Parser;
use gq::{
    compute_from_store,
    filter::filter_sql,
    quality::GameQualityFilter,
    store::ParquetStore,
    QualityParams,
};
use log::LevelFilter;
use polars::prelude::*;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::{fs::File, path::PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scores NBA player games against their weekly cohort")]
struct Args {
    /// Box scores parquet file (requires --schedule)
    #[arg(long, value_name = "FILE", requires = "schedule")]
    box_scores: Option<PathBuf>,

    /// Schedule parquet file with game_id and game_date
    #[arg(long, value_name = "FILE", requires = "box_scores")]
    schedule: Option<PathBuf>,

    /// Directory holding box_scores.parquet and schedule.parquet
    #[arg(short = 'd', long, value_name = "DIR", default_value = "data")]
    data_dir: PathBuf,

    /// JSON file with min_minutes, fg_baseline and ft_baseline
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    #[arg(long)]
    min_minutes: Option<i64>,

    /// Week id such as 202403
    #[arg(short = 'w', long)]
    week: Option<i32>,

    #[arg(long, num_args = 2, value_names = ["START", "END"], conflicts_with = "week")]
    week_range: Option<Vec<i32>>,

    #[arg(short = 'g', long)]
    game: Option<String>,

    /// Player name as stored in the box scores
    #[arg(short = 'p', long)]
    player: Option<String>,

    /// Player entity id
    #[arg(long, conflicts_with = "player")]
    player_id: Option<String>,

    #[arg(long)]
    qualified_only: bool,

    /// Top games by quality, skipping unscored rows
    #[arg(long)]
    leaderboard: bool,

    #[arg(long, default_value_t = 100)]
    limit: u32,

    /// SQL run against the results, registered as `game_quality`
    #[arg(long, value_name = "QUERY")]
    sql: Option<String>,

    /// Write results to a parquet file instead of printing
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_params(args: &Args) -> Result<QualityParams> {
    let mut params = match &args.params {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            serde_json::from_reader(file).with_context(|| format!("parsing {}", path.display()))?
        }
        None => QualityParams::standard(),
    };
    if let Some(min_minutes) = args.min_minutes {
        params.min_minutes = min_minutes;
    }
    if params.min_minutes < 0 {
        bail!("Minimum minutes must not be negative");
    }
    Ok(params)
}

fn build_filter(args: &Args) -> Result<GameQualityFilter> {
    let mut filter = GameQualityFilter::new();
    if let Some(week) = args.week {
        filter = filter.week(week);
    }
    if let Some(range) = &args.week_range {
        let [start, end] = range[..] else {
            bail!("Week range needs a start and an end");
        };
        if start > end {
            bail!("Week range start {} is after end {}", start, end);
        }
        filter = filter.week_range(start, end);
    }
    if let Some(game_id) = &args.game {
        filter = filter.game(game_id);
    }
    if let Some(player) = &args.player {
        filter = filter.player_name(player);
    }
    if let Some(entity_id) = &args.player_id {
        filter = filter.player_id(entity_id);
    }
    if args.qualified_only {
        filter = filter.qualified_only();
    }
    Ok(filter)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set the default level based on verbosity
    let default_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let config = ConfigBuilder::new().add_filter_allow_str("gq").build();

    TermLogger::init(
        default_level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    log::trace!("Args {:#?}", args);

    let params = load_params(&args)?;
    log::debug!("Using {:?}", params);

    let store = match (&args.box_scores, &args.schedule) {
        (Some(box_scores), Some(schedule)) => ParquetStore::new(box_scores, schedule),
        _ => ParquetStore::from_dir(&args.data_dir),
    };

    let game_quality = compute_from_store(&store, &params)?;
    log::info!("Scored {} player games", game_quality.height());

    let game_quality = game_quality.filter(build_filter(&args)?.build())?;
    let df = if args.leaderboard {
        game_quality.leaderboard(args.limit)?
    } else {
        game_quality.into_inner()
    };

    let mut df = match &args.sql {
        Some(query) => filter_sql(df.lazy(), "game_quality", query)?.collect()?,
        None => df,
    };

    match &args.output {
        Some(path) => {
            let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            ParquetWriter::new(&mut file).finish(&mut df)?;
            log::info!("Wrote {} rows to {}", df.height(), path.display());
        }
        None => println!("{}", df),
    }

    Ok(())
}
