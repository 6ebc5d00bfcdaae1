//! Offline data preparation and evaluation for the RUL model

use anyhow::{bail, Context};
use api::evaluation::{evaluate, EvaluationReport};
use api::{init_logging, LoggingSettings};
use clap::{Parser, Subcommand};
use data_validator::{ScalerState, Validator};
use feature_engine::{SequenceWindower, TIME_STEPS};
use health_scorer::{HealthScorer, ScoringConfig};
use inference_engine::{EngineConfig, InferenceEngine, MAX_RUL};
use std::path::{Path, PathBuf};
use telemetry::{load_dataset, load_rul_truth, FeatureSchema, UnitTable};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rul-prepare")]
#[command(about = "Fit scalers, build training windows and evaluate RUL models on CMAPSS data")]
#[command(version)]
struct CliArgs {
    /// Emit JSON logs
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the min-max scaler over the canonical feature columns
    FitScaler {
        /// CMAPSS training file (train_FD00x.txt)
        #[arg(long)]
        train: PathBuf,
        /// Where to write the scaler JSON
        #[arg(long, default_value = "models/scaler.json")]
        out: PathBuf,
    },
    /// Build scaled training windows and report their counts and label range
    Windows {
        #[arg(long)]
        train: PathBuf,
        #[arg(long, default_value = "models/scaler.json")]
        scaler: PathBuf,
        #[arg(long, default_value_t = TIME_STEPS)]
        time_steps: usize,
    },
    /// Score a model on test units against the RUL truth file
    Evaluate {
        /// CMAPSS test file (test_FD00x.txt)
        #[arg(long)]
        test: PathBuf,
        /// RUL truth file (RUL_FD00x.txt)
        #[arg(long)]
        truth: PathBuf,
        #[arg(long, default_value = "models/rul_model.onnx")]
        model: PathBuf,
        #[arg(long, default_value = "models/scaler.json")]
        scaler: PathBuf,
        #[arg(long, default_value_t = TIME_STEPS)]
        time_steps: usize,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Load a CMAPSS file and reject it unless every unit passes validation
fn load_table(path: &Path) -> anyhow::Result<UnitTable> {
    let readings = load_dataset(path).with_context(|| format!("reading {}", path.display()))?;
    let table = UnitTable::from_readings(readings);

    let result = Validator::default().validate_table(&table);
    if !result.valid {
        for err in &result.errors {
            tracing::error!("{}", err);
        }
    }
    result
        .into_result()
        .with_context(|| format!("validating {}", path.display()))?;

    info!(
        "Loaded {} units ({} rows) from {}",
        table.unit_count(),
        table.row_count(),
        path.display()
    );
    Ok(table)
}

fn fit_scaler(train: &Path, out: &Path) -> anyhow::Result<()> {
    let table = load_table(train)?;
    let schema = FeatureSchema::cmapss();

    let rows = table
        .all_rows()
        .map(|reading| schema.extract(reading))
        .collect::<Result<Vec<_>, _>>()?;
    let scaler = ScalerState::fit(&rows)?;

    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    scaler.save(out)?;
    println!(
        "Fitted scaler over {} features from {} rows -> {}",
        scaler.num_features(),
        rows.len(),
        out.display()
    );
    Ok(())
}

fn windows(train: &Path, scaler: &Path, time_steps: usize) -> anyhow::Result<()> {
    let windower = SequenceWindower::new(time_steps, FeatureSchema::cmapss())?;
    let table = load_table(train)?;
    let scaler = ScalerState::load(scaler)?;

    let mut total = 0usize;
    let mut label_range: Option<(f64, f64)> = None;
    for (unit_id, rows) in table.iter() {
        let samples = windower.unit_training_windows(unit_id, rows, Some(&scaler))?;
        println!("unit {:>4}: {:>4} cycles, {:>4} windows", unit_id, rows.len(), samples.len());
        total += samples.len();
        for sample in &samples {
            label_range = Some(match label_range {
                None => (sample.label, sample.label),
                Some((lo, hi)) => (lo.min(sample.label), hi.max(sample.label)),
            });
        }
    }

    println!("total: {} windows of shape {}", total, windower.shape());
    match label_range {
        Some((lo, hi)) => println!("labels: {} ..= {}", lo, hi),
        None => println!("labels: none (every unit has {} or fewer cycles)", time_steps),
    }
    Ok(())
}

fn print_report(report: &EvaluationReport) {
    println!("{:>6} {:>10} {:>10} {:>8} {:>8}  status", "unit", "predicted", "true", "error", "health");
    for unit in &report.units {
        println!(
            "{:>6} {:>10.2} {:>10.2} {:>8.2} {:>7.1}%  {}",
            unit.unit_id, unit.predicted_rul, unit.true_rul, unit.error, unit.health_percent, unit.status
        );
    }
    for skipped in &report.skipped {
        println!("{:>6} skipped: {}", skipped.unit_id, skipped.reason);
    }
    match report.rmse {
        Some(rmse) => println!("RMSE over {} units: {:.3}", report.units.len(), rmse),
        None => println!("RMSE: n/a (no unit evaluated)"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(&LoggingSettings {
        level: "info".to_string(),
        json: args.json_logs,
    })?;

    match args.command {
        Command::FitScaler { train, out } => fit_scaler(&train, &out),
        Command::Windows {
            train,
            scaler,
            time_steps,
        } => windows(&train, &scaler, time_steps),
        Command::Evaluate {
            test,
            truth,
            model,
            scaler,
            time_steps,
            json,
        } => {
            let windower = SequenceWindower::new(time_steps, FeatureSchema::cmapss())?;
            let table = load_table(&test)?;
            let truth = load_rul_truth(&truth)?;

            let engine = InferenceEngine::load(&EngineConfig {
                model_path: Some(model),
                scaler_path: Some(scaler),
                shape: windower.shape(),
                max_rul: MAX_RUL,
            });
            if !engine.is_loaded() {
                bail!("model or scaler could not be loaded; see log for details");
            }

            let report = evaluate(
                &engine,
                &HealthScorer::new(ScoringConfig::default()),
                &windower,
                &table,
                &truth,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
    }
}
