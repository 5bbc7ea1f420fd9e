//! fdnet command-line driver.
//!
//! Builds the two-cluster dataset from the configured seed, restores the
//! checkpoint (or starts from random weights) and runs one command:
//!
//!   cargo run --release -- train --steps 200
//!   cargo run --release -- classify 10 12
//!
//! For the interactive HTTP surface run `cargo run --bin studio`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use fdnet::config::RunArgs;
use fdnet::logging::init_logging;
use fdnet::{train_loop, RunConfig, TrainConfig};

#[derive(Parser)]
#[command(name = "fdnet")]
#[command(about = "Train a small classifier with finite-difference gradients", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    run: RunArgs,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Train, writing a checkpoint whenever the mean cost reaches a new low
    Train {
        /// Stop after this many steps (runs until killed if omitted)
        #[arg(short, long)]
        steps: Option<usize>,
    },
    /// Print the mean cost over the dataset
    Cost,
    /// Print the predicted class for one input vector
    Classify {
        #[arg(required = true, allow_negative_numbers = true)]
        inputs: Vec<f64>,
    },
    /// Print the first layer's raw outputs for the first few points
    Inspect {
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },
    /// Print every point with its label and predicted class
    Report,
    /// Write the default configuration as JSON
    InitConfig {
        #[arg(value_name = "PATH")]
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level: Level = cli.log_level.parse()?;
    init_logging(level)?;

    if let Commands::InitConfig { path } = &cli.command {
        RunConfig::default()
            .save_json(path)
            .with_context(|| format!("writing {path}"))?;
        println!("Wrote default configuration to {path}");
        return Ok(());
    }

    let config = cli.run.resolve().context("loading configuration")?;
    let prepared = config
        .prepare()
        .with_context(|| format!("preparing network from {}", config.checkpoint_path.display()))?;
    let mut network = prepared.network;
    let data = prepared.data;
    info!(
        restored = prepared.restored,
        layers = ?network.layer_sizes(),
        lowest_cost = network.lowest_cost(),
        samples = data.len(),
        "network ready"
    );

    match cli.command {
        Commands::Train { steps } => {
            let before = network.cost_multiple(&data)?;
            println!("Cost before training: {before:.6}");
            let train_config = TrainConfig::new(config.learn_rate, steps);
            match train_loop(&mut network, &data, &prepared.store, &train_config)? {
                Some(last) => println!(
                    "Step {}: cost = {:.6}, lowest = {:.6}",
                    last.step, last.cost, last.lowest_cost
                ),
                None => println!("No steps run."),
            }
        }
        Commands::Cost => {
            println!("Cost: {:.6}", network.cost_multiple(&data)?);
        }
        Commands::Classify { inputs } => {
            let class = network.classify(&inputs)?;
            println!("{inputs:?} -> class {class}");
        }
        Commands::Inspect { count } => {
            let first = network
                .layers
                .first()
                .context("network has no layers")?;
            for point in data.iter().take(count) {
                println!("{:?}", first.calculate_outputs(point.inputs())?);
            }
        }
        Commands::Report => {
            let mut correct = 0;
            for point in &data {
                let predicted = network.classify(point.inputs())?;
                if predicted == point.label() {
                    correct += 1;
                }
                println!("{:>8.3?}  label {}  predicted {}", point.inputs(), point.label(), predicted);
            }
            println!(
                "Accuracy: {}/{}  Cost: {:.6}",
                correct,
                data.len(),
                network.cost_multiple(&data)?
            );
        }
        // handled before the network is prepared
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}
