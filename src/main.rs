//! Kohonen3D CLI - Three-Dimensional Self-Organizing Maps
//!
//! Command-line interface for training, validating and exporting maps.

use clap::{Parser, Subcommand};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use kohonen3d::{
    export_visualization, validate_file, DataConfig, Dataset, KohonenError, Result, Som,
    SomConfig, SomTrainer,
};
use log::{error, warn};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "kohonen3d")]
#[command(author = "Kohonen3D Contributors")]
#[command(version)]
#[command(about = "Three-dimensional self-organizing maps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a map and export it for visualization
    Train {
        /// Training data (label column followed by feature columns)
        #[arg(short, long)]
        input: PathBuf,

        /// Visualization output file
        #[arg(short, long)]
        output: PathBuf,

        /// Dataset to check before training (failures are reported, not fatal)
        #[arg(long)]
        validate: Option<PathBuf>,

        /// Labeled dataset used to name neurons (default: the training data)
        #[arg(short, long)]
        labeled: Option<PathBuf>,

        /// Also save a binary snapshot of the trained grid
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Grid extents
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [10, 10, 10])]
        grid: Vec<usize>,

        /// Features per sample
        #[arg(long, default_value = "784")]
        input_size: usize,

        /// Number of epochs
        #[arg(short, long, default_value = "10")]
        epochs: usize,

        /// Initial learning rate
        #[arg(long, default_value = "0.1")]
        learning_rate: f64,

        /// Initial neighborhood radius
        #[arg(long, default_value = "5.0")]
        sigma: f64,

        /// Samples per progress update
        #[arg(short, long, default_value = "100")]
        batch_size: usize,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Search for best matching units on all cores
        #[arg(long)]
        parallel: bool,
    },

    /// Check a dataset file without training
    Validate {
        /// Dataset to check
        #[arg(short, long)]
        input: PathBuf,

        /// Features per sample
        #[arg(long, default_value = "784")]
        input_size: usize,
    },

    /// Export a saved snapshot for visualization
    Export {
        /// Snapshot written by `train --snapshot`
        #[arg(long)]
        snapshot: PathBuf,

        /// Labeled dataset used to name neurons
        #[arg(short, long)]
        labeled: PathBuf,

        /// Visualization output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Train {
            input,
            output,
            validate,
            labeled,
            snapshot,
            grid,
            input_size,
            epochs,
            learning_rate,
            sigma,
            batch_size,
            seed,
            parallel,
        } => {
            let config = SomConfig {
                grid_x: grid[0],
                grid_y: grid[1],
                grid_z: grid[2],
                input_size,
                epochs,
                initial_learning_rate: learning_rate,
                initial_sigma: sigma,
                seed,
                parallel,
            };
            let labeled = labeled.unwrap_or_else(|| input.clone());
            train(config, input, validate, labeled, output, snapshot, batch_size)
        }

        Commands::Validate { input, input_size } => validate(input, input_size),

        Commands::Export {
            snapshot,
            labeled,
            output,
        } => export(snapshot, labeled, output),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn train(
    config: SomConfig,
    input: PathBuf,
    validate: Option<PathBuf>,
    labeled: PathBuf,
    output: PathBuf,
    snapshot: Option<PathBuf>,
    batch_size: usize,
) -> Result<()> {
    let start_time = Instant::now();
    let data_config = DataConfig::default();

    println!("Kohonen3D Self-Organizing Map");
    println!("   Training from: {}", input.display());
    println!();

    let mut som = Som::new(&config)?;
    let trainer = SomTrainer::new(config.clone())?;
    println!(
        "✓ Initialized grid ({}x{}x{} = {} neurons, {}-dim weights)",
        config.grid_x,
        config.grid_y,
        config.grid_z,
        config.total_neurons(),
        config.input_size
    );

    let dataset = Dataset::load(&input, config.input_size, &data_config)?;
    println!("✓ Loaded {} samples", dataset.len());

    if let Some(path) = validate {
        match validate_file(&path, config.input_size, &data_config) {
            Ok(report) if report.is_valid() => {
                println!("✓ Validated {} rows in {}", report.valid_rows, path.display());
            }
            Ok(report) => {
                warn!(
                    "Validation failed for {} ({} issues), proceeding with training anyway",
                    path.display(),
                    report.issues.len()
                );
            }
            Err(e) => warn!("Validation failed: {}, proceeding with training anyway", e),
        }
    }

    println!();
    println!("Training SOM...");

    let total = (config.epochs * dataset.len()) as u64;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
            .expect("static progress template")
            .progress_chars("█▓▒░  "),
    );

    let metrics = trainer.train_with_batches(&mut som, &dataset, batch_size, |p| {
        pb.set_position((p.epoch * p.samples_total + p.samples_done) as u64);
        pb.set_message(format!(
            "Epoch {}/{} batch {}/{} ({:.1}% of epoch) lr={:.4} sigma={:.3}",
            p.epoch + 1,
            p.epochs,
            p.batch + 1,
            p.batches,
            p.epoch_percent(),
            p.learning_rate,
            p.sigma
        ));
    })?;
    pb.finish_and_clear();
    println!("✓ Trained {} epochs ({} steps)", config.epochs, metrics.steps);

    let qe = som.quantization_error(&dataset)?;
    println!("✓ Quantization error: {:.6}", qe);

    if let Some(path) = snapshot {
        som.save(&path)?;
        println!("✓ Saved snapshot to {}", path.display());
    }

    let summary = export_visualization(&som, &labeled, &output, &data_config)?;
    println!(
        "✓ Wrote {} neurons ({} labeled) to {}",
        summary.neurons,
        summary.labeled,
        output.display()
    );

    println!();
    println!("Training complete in {}", HumanDuration(start_time.elapsed()));
    Ok(())
}

fn validate(input: PathBuf, input_size: usize) -> Result<()> {
    let report = validate_file(&input, input_size, &DataConfig::default())?;

    if report.is_valid() {
        println!("✓ {} valid rows in {}", report.valid_rows, input.display());
        return Ok(());
    }

    for issue in &report.issues {
        println!("✗ {}", issue);
    }
    Err(KohonenError::DataFormat {
        line: report.issues[0].line,
        message: format!(
            "{} of {} rows invalid in {}",
            report.issues.len(),
            report.total_rows(),
            input.display()
        ),
    })
}

fn export(snapshot: PathBuf, labeled: PathBuf, output: PathBuf) -> Result<()> {
    let som = Som::load(&snapshot)?;
    let summary = export_visualization(&som, &labeled, &output, &DataConfig::default())?;
    println!(
        "✓ Wrote {} neurons ({} labeled) to {}",
        summary.neurons,
        summary.labeled,
        output.display()
    );
    Ok(())
}
