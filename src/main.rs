//! Tendency Runner
//!
//! Loads raw session tables and zone catalogs, runs the engine and writes the
//! consolidated dataset as JSON.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tendency_engine::clustering::TuningGrid;
use tendency_engine::core::records::RawTables;
use tendency_engine::pipeline::tune_hotspot_params;
use tendency_engine::spatial::CatalogSet;
use tendency_engine::{Engine, EngineConfig, Result};

/// Spatial tendency analysis over recorded sessions
#[derive(Parser, Debug)]
#[command(name = "tendency-runner")]
#[command(about = "Consolidate recorded sessions into a spatial tendency dataset")]
struct Args {
    /// Raw session tables (JSON)
    #[arg(long)]
    tables: PathBuf,

    /// Zone catalog file (.toml or .json); repeat for several arenas
    #[arg(long = "catalog", required = true)]
    catalogs: Vec<PathBuf>,

    /// Engine configuration (TOML); defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads, overriding the configuration
    #[arg(long)]
    workers: Option<usize>,

    /// Target arena, overriding the configuration
    #[arg(long)]
    arena: Option<String>,

    /// Output file; stdout when absent
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log tuned clustering parameters per utility category
    #[arg(long)]
    tune: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tendency_engine=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(arena) = args.arena {
        config.target_arena = Some(arena);
    }

    let catalogs = CatalogSet::load_files(&args.catalogs)?;
    let engine = Engine::new(config, catalogs)?;

    let tables: RawTables = serde_json::from_str(&fs::read_to_string(&args.tables)?)?;
    tracing::info!(
        "Loaded {} sessions, {} rounds, {} position samples from {}",
        tables.sessions.len(),
        tables.rounds.len(),
        tables.positions.len(),
        args.tables.display()
    );

    let dataset = engine.run(tables)?;

    if args.tune {
        let grid = TuningGrid::default();
        for (category, result) in tune_hotspot_params(&dataset, engine.config(), &grid) {
            match result {
                Some(tuned) => tracing::info!(
                    "Tuned {}: eps {:.3}, min_pts {} -> {} clusters, {} noise",
                    category,
                    tuned.params.eps,
                    tuned.params.min_pts,
                    tuned.clusters,
                    tuned.noise
                ),
                None => tracing::info!("Tuned {}: no landing points", category),
            }
        }
    }

    let json = dataset.to_json()?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            tracing::info!("Wrote consolidated dataset to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
