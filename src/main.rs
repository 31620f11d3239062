//! Binary entrypoint for the questbot CLI.
//!
//! Commands:
//! - `init` - write a starter `questbot.toml` and create the data directory
//! - `status` - print store statistics and the active configuration summary
//! - `play <player> <action> [args..]` - resolve one action and print the reply
//! - `leaderboard [stat] [--limit N]` - print a ranking
//! - `snapshot <player>` - take a snapshot of one player
//! - `purge-snapshots [--days N]` - apply the snapshot retention sweep
//! - `repl` - line-oriented stand-in for a chat adapter, with scheduled snapshots
//!
//! See the library crate docs for module-level details: `questbot::`.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use questbot::config::Config;
use questbot::logutil::escape_log;
use questbot::metrics;
use questbot::rpg::commands::render_error;
use questbot::rpg::{handle_request, ActionRequest, Catalog, GameEngine, LeaderboardStat, Reply};
use questbot::storage::{SledPlayerStore, SnapshotScheduler, SnapshotSchedulerConfig};

#[derive(Parser)]
#[command(name = "questbot")]
#[command(about = "RPG progression, economy and encounter engine for chat games")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "questbot.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file and data directory
    Init,
    /// Show store statistics
    Status,
    /// Run a single action for a player
    Play {
        player: String,
        action: String,
        args: Vec<String>,
    },
    /// Show a leaderboard
    Leaderboard {
        /// level, coins, xp, adventures, dungeons, work, monsters, daily_streak
        #[arg(default_value = "level")]
        stat: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Snapshot one player's current record
    Snapshot { player: String },
    /// Delete snapshots older than the retention window
    PurgeSnapshots {
        /// Override the configured retention in days
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// Interactive loop: `<player> <action> [args..]` per line, `quit` to exit
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            return init(&cli.config).await;
        }
        other => other,
    };

    let config = Config::load(&cli.config).await.unwrap_or_else(|e| {
        eprintln!("{} (using defaults)", e);
        Config::default()
    });
    init_logging(&Some(config.clone()), cli.verbose);
    let engine = build_engine(&config)?;

    match command {
        Commands::Init => {}
        Commands::Status => {
            let stats = engine.stats().await?;
            println!("Questbot v{}", env!("CARGO_PKG_VERSION"));
            println!("Store: {}", config.storage.db_path().display());
            println!("Players: {}", stats.players);
            println!("Snapshots: {}", stats.snapshots);
            println!(
                "Level cap {} / inventory {} slots",
                config.game.max_level, config.game.inventory_capacity
            );
            for (action, counter) in metrics::action_counters_snapshot() {
                println!(
                    "  {}: {} attempts, {} ok, {} rejected, {} store failures",
                    action, counter.attempts, counter.successes, counter.rejections, counter.store_failures
                );
            }
        }
        Commands::Play {
            player,
            action,
            args,
        } => {
            let request = ActionRequest::new(player, action, args);
            print_outcome(handle_request(&engine, &request).await);
        }
        Commands::Leaderboard { stat, limit } => {
            let stat = LeaderboardStat::parse(&stat)?;
            let entries = engine.leaderboard(stat, limit).await?;
            print!("{}", Reply::Leaderboard { stat, entries }.render_text());
        }
        Commands::Snapshot { player } => {
            let snapshot = engine.snapshot(&player).await?;
            println!(
                "Snapshot of {} taken at {}",
                snapshot.player_id,
                snapshot.taken_at.to_rfc3339()
            );
        }
        Commands::PurgeSnapshots { days } => {
            let days = days.unwrap_or(config.storage.snapshot_retention_days);
            let removed = engine
                .purge_snapshots(chrono::Duration::days(i64::from(days)))
                .await?;
            println!("Removed {} snapshot(s) older than {} day(s)", removed, days);
        }
        Commands::Repl => repl(engine, &config).await?,
    }

    Ok(())
}

async fn init(path: &str) -> Result<()> {
    if std::path::Path::new(path).exists() {
        return Err(anyhow!("{} already exists; refusing to overwrite", path));
    }
    Config::create_default(path).await?;
    let config = Config::load(path).await?;
    tokio::fs::create_dir_all(&config.storage.data_dir).await?;
    println!("Created {} and data directory {}", path, config.storage.data_dir);
    Ok(())
}

fn build_engine(config: &Config) -> Result<GameEngine> {
    let catalog = match &config.game.catalog_path {
        Some(path) => {
            info!("Loading catalog from {}", path);
            Catalog::from_json_file(path)?
        }
        None => Catalog::standard(),
    };
    let store = SledPlayerStore::open(config.storage.db_path())?;
    Ok(GameEngine::new(Arc::new(store), catalog, config))
}

fn print_outcome(outcome: Result<Reply, questbot::rpg::GameError>) {
    match outcome {
        Ok(reply) => print!("{}", reply.render_text()),
        Err(e) => println!("{}", render_error(&e)),
    }
}

async fn repl(engine: GameEngine, config: &Config) -> Result<()> {
    let scheduler = SnapshotScheduler::new(SnapshotSchedulerConfig::from(&config.storage));
    let background = scheduler
        .config()
        .enabled
        .then(|| scheduler.spawn(engine.clone(), Duration::from_secs(60)));
    info!("Questbot REPL ready");
    println!("Enter `<player> <action> [args..]`, or `quit`.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let Some(player) = parts.next() else { continue };
        if player.eq_ignore_ascii_case("quit") || player.eq_ignore_ascii_case("exit") {
            break;
        }
        let Some(action) = parts.next() else {
            println!("Usage: <player> <action> [args..]");
            continue;
        };
        let request = ActionRequest::new(player, action, parts.map(str::to_string).collect());
        log::debug!("repl request: {}", escape_log(&line));
        print_outcome(handle_request(&engine, &request).await);
    }

    if let Some(handle) = background {
        handle.abort();
    }
    if engine.active_locks() > 0 {
        warn!("Exiting with {} player lock(s) still held", engine.active_locks());
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|cfg| cfg.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config.as_ref().and_then(|cfg| cfg.logging.file.clone());
    let opened = log_file.as_ref().and_then(|file| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .ok()
    });
    match opened {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Mirror to the console only when someone is watching it
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
