//! coach-analyze
//!
//! Runs the evaluation pipeline over a PGN file from the command line.
//!
//!   coach-analyze --pgn games.pgn --user alice          # worst moves as JSON
//!   coach-analyze --pgn games.pgn --user alice --scan   # per-position chart

use std::sync::Arc;

use anyhow::{bail, Context};
use chess_core::{pgn, GameRecord};
use tracing::{info, warn};

use coach_engine::config::{OracleBackend, PipelineConfig};
use coach_engine::display::{format_score_label, to_display_fraction};
use coach_engine::http::HttpOracle;
use coach_engine::pool::EnginePool;
use coach_engine::{Evaluator, Oracle, Pipeline, Progress};

struct Args {
    pgn_path: String,
    username: Option<String>,
    scan: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut pgn_path = None;
    let mut username = None;
    let mut scan = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--pgn" => {
                pgn_path = args.get(i + 1).cloned();
                i += 1;
            }
            "--user" => {
                username = args.get(i + 1).cloned();
                i += 1;
            }
            "--scan" => scan = true,
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    let Some(pgn_path) = pgn_path else {
        bail!("usage: coach-analyze --pgn <file> [--user <name>] [--scan]");
    };
    if !scan && username.is_none() {
        bail!("--user is required unless --scan is given");
    }
    Ok(Args {
        pgn_path,
        username,
        scan,
    })
}

/// Parse every game in the file; unparseable ones are logged and dropped.
fn load_games(text: &str) -> Vec<GameRecord> {
    pgn::split_games(text)
        .iter()
        .enumerate()
        .filter_map(|(i, game)| match pgn::parse_pgn(game) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index = i + 1, error = %e, "Skipping unparseable game");
                None
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args = parse_args()?;
    let config = PipelineConfig::from_env()?;

    let text = tokio::fs::read_to_string(&args.pgn_path)
        .await
        .with_context(|| format!("reading {}", args.pgn_path))?;
    let games = load_games(&text);
    info!(games = games.len(), path = %args.pgn_path, "Games loaded");

    let mut engines = None;
    let oracle: Arc<dyn Oracle> = match &config.oracle {
        OracleBackend::Http { endpoint } => {
            info!(endpoint = %endpoint, "Using HTTP evaluation service");
            Arc::new(HttpOracle::new(endpoint.clone(), config.request_timeout)?)
        }
        OracleBackend::Uci { command, pool_size } => {
            info!(path = %command.path, pool_size, "Creating engine pool");
            let pool = Arc::new(EnginePool::new(command.clone(), *pool_size, config.search));
            pool.warm_up().await?;
            engines = Some(pool.clone());
            pool
        }
    };

    let pipeline = Pipeline::new(Evaluator::new(oracle, config.request_timeout), &config);

    let cancel = pipeline.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping after the current evaluation...");
            cancel.cancel();
        }
    });

    let mut log_progress = |event: Progress| info!("{event}");

    let result = if args.scan {
        match games.first() {
            Some(record) => pipeline
                .scan_game(record, &mut log_progress)
                .await
                .map(|scan| {
                    let rows = scan.positions.iter().zip(&scan.scores).zip(&scan.material_balance);
                    for (ply, ((fen, score), material)) in rows.enumerate() {
                        println!(
                            "{ply:>4}  {:>7}  {:.3}  {material:+3}  {fen}",
                            format_score_label(*score),
                            to_display_fraction(*score)
                        );
                    }
                }),
            None => {
                warn!("No games to scan");
                Ok(())
            }
        }
    } else {
        let username = args.username.as_deref().unwrap_or_default();
        pipeline
            .analyze_batch(&games, username, &mut log_progress)
            .await
            .and_then(|report| {
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            })
    };

    if let Some(pool) = engines {
        pool.shutdown().await;
    }

    result?;
    Ok(())
}
