use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use building_carbon_predictor::artifact::ModelArtifact;
use building_carbon_predictor::models::BuildingDescription;
use building_carbon_predictor::predict::Predictor;
use building_carbon_predictor::{certification, dataset, report, train};

#[derive(Parser)]
#[command(name = "carbon-predictor")]
#[command(about = "Building CO2 emission predictor and green certification assessor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic building emissions dataset
    GenerateData {
        #[arg(long, default_value = "building_emissions.csv")]
        out: PathBuf,
        #[arg(long, default_value_t = 3500)]
        samples: usize,
        #[arg(long, default_value_t = 2024)]
        seed: u64,
    },
    /// Train candidate regressors and keep the best as a model artifact
    Train {
        #[arg(long, default_value = "building_emissions.csv")]
        data: PathBuf,
        #[arg(long, default_value = "model.json")]
        out: PathBuf,
    },
    /// Predict annual CO2 emissions for a building described in JSON
    Predict {
        #[arg(long, default_value = "model.json")]
        model: PathBuf,
        #[arg(long)]
        input: PathBuf,
    },
    /// Score a building against the LEED-style certification rubric
    Assess {
        #[arg(long, default_value = "model.json")]
        model: PathBuf,
        #[arg(long)]
        input: PathBuf,
    },
    /// Write a markdown assessment report
    Report {
        #[arg(long, default_value = "model.json")]
        model: PathBuf,
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show metadata for a trained model artifact
    ModelInfo {
        #[arg(long, default_value = "model.json")]
        model: PathBuf,
    },
}

fn read_building(path: &Path) -> anyhow::Result<BuildingDescription> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read building description {}", path.display()))?;
    let building = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse building description {}", path.display()))?;
    Ok(building)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::GenerateData { out, samples, seed } => {
            let config = dataset::GeneratorConfig {
                samples,
                seed,
                ..dataset::GeneratorConfig::default()
            };
            let generated = dataset::generate(&config)?;
            dataset::write_csv(&out, &generated)?;
            println!("Wrote {} buildings to {}.", generated.len(), out.display());
        }
        Commands::Train { data, out } => {
            let samples = dataset::load_csv(&data)?;
            let outcome = train::train(&samples, &train::TrainConfig::default())?;

            println!("Candidate models:");
            for candidate in &outcome.candidates {
                println!(
                    "- {}: test MAE {:.2} tons, test R² {:.4} (train MAE {:.2}, train R² {:.4})",
                    candidate.name,
                    candidate.test_mae,
                    candidate.test_r2,
                    candidate.train_mae,
                    candidate.train_r2
                );
            }
            let meta = &outcome.artifact.metadata;
            println!(
                "Selected {} (test MAE {:.2} tons, R² {:.4}).",
                meta.model_name, meta.test_mae, meta.test_r2
            );
            outcome.artifact.save(&out)?;
            println!("Model artifact written to {}.", out.display());
        }
        Commands::Predict { model, input } => {
            let predictor = Predictor::from_path(&model)?;
            let building = read_building(&input)?;
            let estimate = predictor.predict(&building)?;
            println!("{}", serde_json::to_string_pretty(&estimate)?);
        }
        Commands::Assess { model, input } => {
            let predictor = Predictor::from_path(&model)?;
            let building = read_building(&input)?;
            let estimate = predictor.predict(&building)?;
            let result = certification::score(&building, &estimate)?;

            println!(
                "Baseline {:.1} tons/year, predicted {:.1} tons/year ({:.1}% improvement).",
                result.baseline_tons, estimate.tons_per_year, result.improvement_pct
            );
            println!(
                "EA credits: {}/{} ({}).",
                result.credits_earned,
                result.max_credits,
                result.tier.as_str()
            );
            if let Some(next) = &result.next_level {
                println!(
                    "Cut {:.1} more tons to reach {} credits.",
                    next.reduction_needed_tons, next.credits
                );
            }
            println!("Top levers:");
            for rec in result.recommendations.iter().take(3) {
                println!(
                    "- {}: ~{:.1} tons/year",
                    rec.lever.as_str(),
                    rec.estimated_reduction_tons
                );
            }
        }
        Commands::Report { model, input, out } => {
            let predictor = Predictor::from_path(&model)?;
            let building = read_building(&input)?;
            let estimate = predictor.predict(&building)?;
            let result = certification::score(&building, &estimate)?;
            let report = report::build_report(
                &building,
                &estimate,
                &result,
                Some(&predictor.artifact().metadata),
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::ModelInfo { model } => {
            let artifact = ModelArtifact::load(&model)?;
            let meta = &artifact.metadata;
            println!("Model: {} (artifact v{})", meta.model_name, artifact.version);
            println!(
                "Trained: {} on {} buildings ({} held out)",
                meta.trained_at, meta.n_train, meta.n_test
            );
            println!("Test MAE: {:.2} tons/year, R²: {:.4}", meta.test_mae, meta.test_r2);
            println!("Trees: {}", artifact.model.n_trees());
            println!("Top features:");
            for importance in meta.feature_importances.iter().take(10) {
                println!(
                    "- {}: {:.1}%",
                    importance.feature,
                    importance.importance * 100.0
                );
            }
        }
    }

    Ok(())
}
