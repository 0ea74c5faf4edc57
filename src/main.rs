use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use trapcycle::eventbridge::{analyze_pattern, evaluate_pattern, resolver_for};
use trapcycle::{ChainOptions, Engine, EngineConfig, Logger};

#[derive(Parser)]
#[command(name = "trapcycle")]
#[command(about = "Step-driven pattern sequencer", long_about = None)]
struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a pattern for a number of ticks and print every note
    Run {
        /// Pattern to play
        pattern: String,

        /// Ticks to run (default: one cycle)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Ticks per beat
        #[arg(long)]
        ppq: Option<f64>,

        /// Cycle length in beats
        #[arg(short, long)]
        cycle: Option<f64>,

        /// Chromatic root pitch
        #[arg(short, long)]
        root: Option<i32>,

        /// Scale as root:name, e.g. c5:major
        #[arg(short, long)]
        scale: Option<String>,

        /// Seed for `?`
        #[arg(long)]
        seed: Option<u64>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print one JSON object per note
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a pattern and print its events as JSON
    Eval {
        /// Pattern to evaluate
        pattern: String,

        /// Start cycle (default: 0)
        #[arg(short, long, default_value = "0")]
        from: f64,

        /// Duration in cycles (default: 1)
        #[arg(short, long, default_value = "1")]
        duration: f64,

        /// Chromatic root pitch
        #[arg(short, long, default_value = "60")]
        root: i32,

        /// Scale as root:name, e.g. c5:major
        #[arg(short, long)]
        scale: Option<String>,

        /// Seed for `?`
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show event counts for a pattern
    Analyze {
        /// Pattern to analyze
        pattern: String,

        /// Cycles to scan
        #[arg(short, long, default_value = "4")]
        cycles: f64,

        /// Seed for `?`
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            pattern,
            ticks,
            ppq,
            cycle,
            root,
            scale,
            seed,
            config,
            json,
        } => {
            let mut engine_config = match config {
                Some(path) => EngineConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => EngineConfig::default(),
            };
            if let Some(ppq) = ppq {
                engine_config.units_per_beat = ppq;
            }
            if let Some(cycle) = cycle {
                engine_config.default_cycle_beats = cycle;
            }
            if let Some(root) = root {
                engine_config.default_root = root;
            }
            if seed.is_some() {
                engine_config.seed = seed;
            }

            let mut engine = Engine::new(engine_config, Logger::new(std::io::stdout(), json));
            let mut options = ChainOptions::new();
            if let Some(scale) = scale {
                options = options.scale(scale);
            }
            if let Err(e) = engine.note(&pattern, options) {
                eprintln!("✗ {}", e);
                std::process::exit(1);
            }

            let ticks = ticks.unwrap_or_else(|| {
                let config = engine.config();
                (config.units_per_beat * config.default_cycle_beats).ceil() as u64
            });
            info!(ticks, "running");

            for _ in 0..ticks {
                let step = engine.tick();
                engine.trigger_mut().set_step(step);
                engine.update();
            }

            info!(notes = engine.trigger().fired(), "done");
            engine.shutdown();
            Ok(())
        }
        Commands::Eval {
            pattern,
            from,
            duration,
            root,
            scale,
            seed,
        } => {
            let resolver = resolver_for(scale.as_deref(), root).map_err(|e| anyhow::anyhow!(e.message))?;
            match evaluate_pattern(&pattern, from, duration, seed, Some(&resolver)) {
                Ok(haps) => {
                    println!("{}", serde_json::to_string_pretty(&haps)?);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("✗ Parse error: {}", e.message);
                    std::process::exit(1);
                }
            }
        }
        Commands::Analyze {
            pattern,
            cycles,
            seed,
        } => match analyze_pattern(&pattern, cycles, seed) {
            Ok(metrics) => {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
                Ok(())
            }
            Err(e) => {
                eprintln!("✗ Parse error: {}", e.message);
                std::process::exit(1);
            }
        },
    }
}
