//! PIRWLS command line interface
//!
//! Train, evaluate, and apply SVM models fitted by parallel IRWLS, with
//! LibSVM and CSV data formats.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info, warn};
use pirwls::api::SVM;
use pirwls::core::{Result, SVMError, Sample};
use pirwls::persistence::{SerializableModel, TrainingParams};
use pirwls::{CsvDataset, Dataset, LibSVMDataset, LinearKernel, RBFKernel};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "pirwls")]
#[command(about = "SVM training by parallel Iteratively Reweighted Least Squares")]
#[command(version = env!("CARGO_PKG_VERSION"))]
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
    /// Train a new SVM model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on test data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LibSVM or CSV format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Data format
    #[arg(short, long, default_value = "auto")]
    format: CliFormat,

    /// CSV separator character
    #[arg(long, default_value = ",")]
    csv_separator: char,

    /// Kernel function
    #[arg(short, long, default_value = "rbf")]
    kernel: CliKernel,

    /// Gaussian kernel width gamma
    #[arg(short, long, default_value = "1.0")]
    gamma: f64,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Convergence tolerance
    #[arg(short, long, default_value = "1e-6")]
    tolerance: f64,

    /// Maximum IRWLS iterations
    #[arg(short, long, default_value = "100")]
    max_iterations: usize,

    /// Worker threads (0 = all available cores)
    #[arg(long, default_value = "0")]
    threads: usize,

    /// Cap the model at this many support vectors (budgeted mode)
    #[arg(short, long)]
    budget: Option<usize>,

    /// Candidate samples examined per budgeted selection round
    #[arg(long, default_value = "10")]
    candidates: usize,

    /// Seed for budgeted candidate sampling
    #[arg(long, default_value = "0")]
    seed: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliFormat {
    /// Detect from the file extension
    Auto,
    /// label index:value pairs, 1-based indices
    Libsvm,
    /// label in the first column, dense features after
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    /// Dot product
    Linear,
    /// Gaussian exp(-gamma * ||x - y||^2)
    Rbf,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Data format
    #[arg(short, long, default_value = "auto")]
    format: CliFormat,

    /// CSV separator character
    #[arg(long, default_value = ",")]
    csv_separator: char,

    /// Show confidence scores
    #[arg(long)]
    confidence: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file
    #[arg(long)]
    data: PathBuf,

    /// Data format
    #[arg(short, long, default_value = "auto")]
    format: CliFormat,

    /// CSV separator character
    #[arg(long, default_value = ",")]
    csv_separator: char,

    /// Show detailed metrics
    #[arg(long)]
    detailed: bool,
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
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

/// Load a dataset as a flat sample list, dispatching on format
fn load_samples(
    path: &Path,
    format: CliFormat,
    csv_separator: char,
) -> Result<Vec<Sample>> {
    let format = resolve_format(path, format);
    let samples = match format {
        CliFormat::Libsvm => {
            let dataset = LibSVMDataset::from_file(path)?;
            info!(
                "Loaded {} samples with {} dimensions (libsvm)",
                dataset.len(),
                dataset.dim()
            );
            (0..dataset.len()).map(|i| dataset.get_sample(i)).collect()
        }
        CliFormat::Csv => {
            let dataset = CsvDataset::from_file_with_separator(path, csv_separator)?;
            info!(
                "Loaded {} samples with {} dimensions (csv)",
                dataset.len(),
                dataset.dim()
            );
            (0..dataset.len()).map(|i| dataset.get_sample(i)).collect()
        }
        CliFormat::Auto => unreachable!("resolve_format never returns Auto"),
    };
    Ok(samples)
}

fn resolve_format(path: &Path, format: CliFormat) -> CliFormat {
    match format {
        CliFormat::Auto => match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => CliFormat::Csv,
            Some("libsvm") | Some("svm") => CliFormat::Libsvm,
            _ => {
                warn!("Unknown file extension, assuming LibSVM format");
                CliFormat::Libsvm
            }
        },
        other => other,
    }
}

fn train_command(args: TrainArgs) -> Result<()> {
    info!("Training SVM model from {:?}", args.data);
    info!(
        "Parameters: C={}, tolerance={}, max_iter={}, threads={}",
        args.c, args.tolerance, args.max_iterations, args.threads
    );

    let samples = load_samples(&args.data, args.format, args.csv_separator)?;
    if samples.len() < 2 {
        return Err(SVMError::InvalidDataset(
            "Dataset must contain at least 2 samples".to_string(),
        ));
    }

    let mut builder = SVM::new()
        .with_c(args.c)
        .with_tolerance(args.tolerance)
        .with_max_iterations(args.max_iterations)
        .with_threads(args.threads)
        .with_seed(args.seed);

    if let Some(budget) = args.budget {
        info!("Budgeted mode: at most {} support vectors", budget);
        builder = builder
            .with_budget(budget)
            .with_candidates_per_round(args.candidates);
    }

    let params = TrainingParams {
        c: args.c,
        tolerance: args.tolerance,
        max_iterations: args.max_iterations,
    };

    let serializable = match args.kernel {
        CliKernel::Linear => {
            let model = builder
                .with_kernel(LinearKernel::new())
                .train_samples(&samples)?;
            report_training(&samples, model.evaluate(&samples), model.info());
            SerializableModel::from_trained_model(model.inner(), params)
        }
        CliKernel::Rbf => {
            if args.gamma <= 0.0 {
                return Err(SVMError::InvalidParameter(format!(
                    "gamma must be positive, got {}",
                    args.gamma
                )));
            }
            let model = builder
                .with_kernel(RBFKernel::new(args.gamma))
                .train_samples(&samples)?;
            report_training(&samples, model.evaluate(&samples), model.info());
            SerializableModel::from_trained_model(model.inner(), params)
        }
    };

    serializable.save(&args.output)?;
    info!("Model saved to: {:?}", args.output);

    Ok(())
}

fn report_training(samples: &[Sample], accuracy: f64, info: pirwls::ModelInfo) {
    info!("Training completed on {} samples", samples.len());
    info!("Support vectors: {}", info.n_support_vectors);
    info!("Bias: {:.6}", info.bias);
    info!("Iterations: {}", info.iterations);
    if !info.converged {
        warn!("Solver stopped at the iteration cap; model is the best iterate");
    }
    info!("Training accuracy: {:.2}%", accuracy * 100.0);
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable = SerializableModel::load(&args.model)?;
    let model = serializable.to_trained_model()?;

    let samples = load_samples(&args.data, args.format, args.csv_separator)?;
    info!(
        "Predicting with {} support vectors",
        serializable.metadata.n_support_vectors
    );
    let predictions = model.predict_batch(&samples);

    let mut lines = Vec::with_capacity(predictions.len() + 2);
    lines.push(format!("# Predictions for {} samples", predictions.len()));
    lines.push(format!(
        "# Format: sample_index predicted_label{}",
        if args.confidence { " confidence" } else { "" }
    ));
    for (i, pred) in predictions.iter().enumerate() {
        if args.confidence {
            lines.push(format!("{} {:.0} {:.6}", i, pred.label, pred.confidence()));
        } else {
            lines.push(format!("{} {:.0}", i, pred.label));
        }
    }

    if let Some(output_path) = args.output {
        std::fs::write(&output_path, lines.join("\n") + "\n")?;
        info!("Predictions saved to: {output_path:?}");
    } else {
        for line in lines {
            println!("{line}");
        }
    }

    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable = SerializableModel::load(&args.model)?;
    let model = serializable.to_trained_model()?;

    let samples = load_samples(&args.data, args.format, args.csv_separator)?;
    let accuracy = model.evaluate(&samples);

    println!("=== Model Evaluation ===");
    serializable.print_summary();

    println!("\nTest Results:");
    println!("  Accuracy: {:.2}%", accuracy * 100.0);

    if args.detailed {
        let predictions = model.predict_batch(&samples);
        let mut tp = 0usize;
        let mut tn = 0usize;
        let mut fp = 0usize;
        let mut fne = 0usize;
        for (pred, sample) in predictions.iter().zip(samples.iter()) {
            match (pred.label > 0.0, sample.label > 0.0) {
                (true, true) => tp += 1,
                (false, false) => tn += 1,
                (true, false) => fp += 1,
                (false, true) => fne += 1,
            }
        }
        let metrics = pirwls::EvaluationMetrics {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fne,
        };

        println!("\nDetailed Metrics:");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
        println!("  Specificity:     {:.4}", metrics.specificity());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable = SerializableModel::load(&args.model)?;

    serializable.print_summary();

    println!("\nSupport Vector Details:");
    println!("  Total: {}", serializable.support_vectors.len());

    if let Some(first_sv) = serializable.support_vectors.first() {
        println!("  First SV non-zeros: {}", first_sv.indices.len());
        println!(
            "  First SV indices: {:?}",
            &first_sv.indices[..first_sv.indices.len().min(5)]
        );
        if first_sv.indices.len() > 5 {
            println!("    ... ({} more)", first_sv.indices.len() - 5);
        }
    }

    println!("\nCoefficients:");
    let coefficients = &serializable.coefficients;
    let n_show = coefficients.len().min(10);
    for (i, &coeff) in coefficients.iter().enumerate().take(n_show) {
        println!("  beta{i}: {coeff:.6}");
    }
    if coefficients.len() > n_show {
        println!("  ... ({} more)", coefficients.len() - n_show);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert!(matches!(
            resolve_format(&PathBuf::from("test.csv"), CliFormat::Auto),
            CliFormat::Csv
        ));
        assert!(matches!(
            resolve_format(&PathBuf::from("test.libsvm"), CliFormat::Auto),
            CliFormat::Libsvm
        ));
        assert!(matches!(
            resolve_format(&PathBuf::from("test.svm"), CliFormat::Auto),
            CliFormat::Libsvm
        ));
        assert!(matches!(
            resolve_format(&PathBuf::from("test"), CliFormat::Auto),
            CliFormat::Libsvm
        ));
        assert!(matches!(
            resolve_format(&PathBuf::from("test"), CliFormat::Csv),
            CliFormat::Csv
        ));
    }
}
