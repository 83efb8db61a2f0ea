//! SOSVM Command Line Interface
//!
//! A command-line interface for training, evaluating, and inspecting
//! structured SVM models on multiclass LibSVM-format data.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use sosvm::api::SoSvm;
use sosvm::core::Result;
use sosvm::data::MulticlassDataset;
use sosvm::model::MulticlassModel;
use sosvm::persistence::SerializableModel;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "sosvm")]
#[command(about = "A Rust cutting-plane trainer for structured-output SVMs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "SOSVM Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a multiclass model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (multiclass LibSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Convergence tolerance
    #[arg(short, long, default_value = "0.001")]
    epsilon: f64,

    /// Maximum sweeps before giving up
    #[arg(short, long, default_value = "1000")]
    max_iterations: usize,

    /// Constraint deduplication similarity threshold
    #[arg(long, default_value = "0.9999")]
    dedup_threshold: f64,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file (labels are scored against predictions)
    #[arg(long)]
    data: PathBuf,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn train_command(args: TrainArgs) -> Result<()> {
    info!("Training structured SVM model...");
    info!("Data file: {:?}", args.data);
    info!(
        "Parameters: C={}, epsilon={}, max_iter={}",
        args.c, args.epsilon, args.max_iterations
    );

    let dataset = MulticlassDataset::from_file(&args.data)?;
    info!(
        "Loaded {} examples, {} features, {} classes",
        dataset.len(),
        dataset.n_features(),
        dataset.n_classes()
    );

    let model = MulticlassModel::new(dataset.n_features(), dataset.n_classes());
    let trained = SoSvm::new()
        .with_c(args.c)
        .with_epsilon(args.epsilon)
        .with_max_iterations(args.max_iterations)
        .with_dedup_threshold(args.dedup_threshold)
        .train(model, dataset.examples())?;

    println!("Training completed");
    println!("  Sweeps: {}", trained.sweeps());
    println!("  Constraints: {}", trained.n_constraints());
    println!("  Objective: {:.6}", trained.objective());
    println!(
        "  Training accuracy: {:.2}%",
        trained.evaluate(dataset.examples()) * 100.0
    );

    SerializableModel::from_trained(&trained).save_to_file(&args.output)?;
    println!("Model saved to {:?}", args.output);

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    let serialized = SerializableModel::load_from_file(&args.model)?;
    let (model, weights) = serialized.into_model();
    let dataset = MulticlassDataset::from_file(&args.data)?;

    let mut correct = 0;
    for (i, example) in dataset.examples().iter().enumerate() {
        let predicted = model.predict(&weights, &example.pattern);
        if predicted == example.label {
            correct += 1;
        }
        println!("{i}: predicted {predicted}, label {}", example.label);
    }

    println!(
        "Accuracy: {:.2}%",
        correct as f64 / dataset.len() as f64 * 100.0
    );

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    let model = SerializableModel::load_from_file(&args.model)?;

    println!("=== Model Information ===");
    println!("Features: {}", model.n_features);
    println!("Classes: {}", model.n_classes);
    println!("Weights: {}", model.weights.len());
    println!("Library version: {}", model.metadata.library_version);
    println!("Created: {}", model.metadata.created_at);
    println!("Objective: {:.6}", model.metadata.objective);
    println!("Constraints: {}", model.metadata.n_constraints);
    println!("Sweeps: {}", model.metadata.sweeps);
    println!(
        "Training: C={}, epsilon={}, max_iter={:?}",
        model.metadata.training_params.c,
        model.metadata.training_params.epsilon,
        model.metadata.training_params.max_iterations
    );

    Ok(())
}
