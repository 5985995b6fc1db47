//! Fraud Risk Scorer - Command-line entry point
//!
//! Loads the model once, then scores a single transaction from flags, a CSV
//! batch, or prints the model's feature-importance chart.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fraud_risk_scorer::{
    config::{AppConfig, LoggingConfig},
    metrics::ScoringMetrics,
    policy::validate_threshold,
    report::{render_importance_chart, render_verdict, CHART_WIDTH},
    ScoringContext, ScoringReport, TransactionRecord, TransactionType,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fraud-scorer", version, about = "Score payment transactions for fraud risk")]
struct Cli {
    /// Configuration file (default: config/config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model artifact, overriding the configured path
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a single transaction
    Score(ScoreArgs),
    /// Score every row of a PaySim-style CSV file, one JSON report per line
    Batch(BatchArgs),
    /// Print the model's feature importances
    Importance,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Time step
    #[arg(long, default_value_t = 0)]
    step: u64,

    /// TRANSFER, CASH_OUT, PAYMENT, CASH_IN or DEBIT
    #[arg(long = "type", value_name = "TYPE")]
    transaction_type: TransactionType,

    #[arg(long, value_parser = non_negative, default_value_t = 0.0)]
    amount: f64,

    /// Sender balance before the transaction
    #[arg(long, value_parser = non_negative, default_value_t = 0.0)]
    old_balance_origin: f64,

    /// Sender balance after the transaction
    #[arg(long, value_parser = non_negative, default_value_t = 0.0)]
    new_balance_origin: f64,

    /// Receiver balance before the transaction
    #[arg(long, value_parser = non_negative, default_value_t = 0.0)]
    old_balance_dest: f64,

    /// Receiver balance after the transaction
    #[arg(long, value_parser = non_negative, default_value_t = 0.0)]
    new_balance_dest: f64,

    /// Fraud probability threshold (overrides config)
    #[arg(long, value_parser = unit_interval)]
    threshold: Option<f64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// CSV file with step,type,amount,oldbalanceOrg,newbalanceOrig,oldbalanceDest,newbalanceDest columns
    #[arg(long, short)]
    input: PathBuf,

    /// Fraud probability threshold (overrides config)
    #[arg(long, value_parser = unit_interval)]
    threshold: Option<f64>,
}

fn non_negative(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be a non-negative number"))
    }
}

fn unit_interval(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_threshold(value).map_err(|e| e.to_string())
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("fraud_risk_scorer={}", config.level).parse()?)
            .add_directive(format!("fraud_scorer={}", config.level).parse()?),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.format == "json" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load()?,
    };
    if let Some(model) = &cli.model {
        config.model.path = model.display().to_string();
    }

    init_logging(&config.logging)?;
    info!(
        model = %config.model.path,
        threshold = config.detection.threshold,
        "Configuration loaded"
    );

    let context = match ScoringContext::load(&config.model) {
        Ok(context) => context,
        Err(e) => {
            error!(model = %config.model.path, error = %e, "Cannot serve predictions");
            return Err(e).context("Failed to initialise scoring context");
        }
    };

    match cli.command {
        Command::Score(args) => {
            let threshold = args.threshold.unwrap_or(config.detection.threshold);
            score_one(&context, &args, threshold)
        }
        Command::Batch(args) => {
            let threshold = args.threshold.unwrap_or(config.detection.threshold);
            score_batch(&context, &args, threshold)
        }
        Command::Importance => {
            print!(
                "{}",
                render_importance_chart(context.feature_importance(), CHART_WIDTH)
            );
            Ok(())
        }
    }
}

fn score_one(context: &ScoringContext, args: &ScoreArgs, threshold: f64) -> Result<()> {
    let record = TransactionRecord {
        step: args.step,
        transaction_type: args.transaction_type,
        amount: args.amount,
        old_balance_origin: args.old_balance_origin,
        new_balance_origin: args.new_balance_origin,
        old_balance_dest: args.old_balance_dest,
        new_balance_dest: args.new_balance_dest,
    };

    let start_time = Instant::now();
    let result = context
        .score(&record, threshold)
        .context("Prediction failed")?;

    info!(
        tier = %result.tier,
        probability = result.probability,
        processing_time_us = start_time.elapsed().as_micros() as u64,
        "Transaction scored"
    );

    if args.json {
        let report = ScoringReport::new(&result, threshold).with_top_features(
            context.top_features().into_iter().map(String::from).collect(),
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_verdict(&result, threshold));
        println!("Feature importance:");
        print!(
            "{}",
            render_importance_chart(context.feature_importance(), CHART_WIDTH)
        );
    }

    Ok(())
}

fn score_batch(context: &ScoringContext, args: &BatchArgs, threshold: f64) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let mut metrics = ScoringMetrics::new();
    let top_features: Vec<String> = context
        .top_features()
        .into_iter()
        .map(String::from)
        .collect();

    info!(input = %args.input.display(), threshold = threshold, "Starting batch scoring");

    for (index, row) in reader.deserialize::<TransactionRecord>().enumerate() {
        let record = match row {
            Ok(record) => record,
            Err(e) => {
                warn!(record = index, error = %e, "Skipping unreadable row");
                metrics.record_failure();
                continue;
            }
        };

        if let Err(e) = record.validate() {
            warn!(record = index, error = %e, "Skipping invalid row");
            metrics.record_failure();
            continue;
        }

        let start_time = Instant::now();
        match context.score(&record, threshold) {
            Ok(result) => {
                metrics.record_scored(start_time.elapsed(), result.probability, result.tier);

                let report = ScoringReport::new(&result, threshold)
                    .with_record_index(index)
                    .with_top_features(top_features.clone());
                println!("{}", serde_json::to_string(&report)?);
            }
            Err(e) => {
                error!(record = index, error = %e, "Prediction failed");
                metrics.record_failure();
            }
        }
    }

    metrics.print_summary();
    Ok(())
}
