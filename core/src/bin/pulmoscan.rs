use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{error, info};
use pulmolens_core::cli::report::{HistoryReport, TextReport};
use pulmolens_core::cli::{open_store, setup_logging, OutputFormat};
use pulmolens_core::history::HistorySummary;
use pulmolens_core::{
    Assessment, BurnClassifier, ClassifierConfig, Diagnosis, DiagnosisRecord, MemoryRecordStore,
    PersistencePolicy, PulmolensError, RecordFilter, Result, ScreeningService, SubmissionForm,
    round_confidence,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

/// Offline companion to the pulmolens server
#[derive(Parser, Debug)]
#[command(name = "pulmoscan")]
#[command(about = "Screen chest X-rays and inspect diagnosis history from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a single image and print the report
    Classify {
        /// Image file (PNG, JPEG, ...)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Path to the model weights (.mpk)
        #[arg(
            long,
            env = "PULMOLENS_MODEL",
            default_value = "ml_model/pneumonia_model.mpk"
        )]
        model: PathBuf,

        /// Input resolution the weights were built for
        #[arg(long, default_value_t = 224)]
        image_size: usize,

        #[arg(long)]
        patient_id: Option<String>,

        #[arg(long)]
        age: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        /// Store the result in this database (requires patient details)
        #[arg(long)]
        database: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print stored records and their summary
    History {
        /// SQLite database file, or ":memory:"
        #[arg(long, env = "PULMOLENS_DATABASE", default_value = "pulmolens.sqlite")]
        database: PathBuf,

        /// Only records for this patient
        #[arg(long)]
        patient_id: Option<String>,

        /// Only records with this diagnosis
        #[arg(long, value_parser = parse_diagnosis)]
        diagnosis: Option<Diagnosis>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Write randomly initialised weights for the network
    InitModel {
        /// Destination path; the extension is replaced with .mpk
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[arg(long, default_value_t = 224)]
        image_size: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Classify {
            image,
            model,
            image_size,
            patient_id,
            age,
            gender,
            database,
            format,
        } => {
            let form = SubmissionForm {
                patient_id,
                age,
                gender,
                image_name: image
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
                image: Some(std::fs::read(&image)?),
            };
            let output = classify(&model, image_size, form, database.as_deref(), format)?;
            println!("{}", output);
        }
        Command::History {
            database,
            patient_id,
            diagnosis,
            format,
        } => {
            let filter = RecordFilter {
                patient_id,
                diagnosis,
            };
            println!("{}", history(&database, &filter, format)?);
        }
        Command::InitModel { output, image_size } => {
            let written =
                BurnClassifier::write_initial_weights(&output, ClassifierConfig::new(image_size))?;
            info!("Wrote untrained weights to {}", written.display());
            println!("{}", written.display());
        }
    }
    Ok(())
}

fn classify(
    model: &Path,
    image_size: usize,
    form: SubmissionForm,
    database: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let classifier = BurnClassifier::load(model, ClassifierConfig::new(image_size))?;

    let patient_id = form.patient_id.clone();
    let age = form.age.as_deref().and_then(|a| a.trim().parse::<i32>().ok());
    let gender = form.gender.clone();

    let assessment = match database {
        Some(path) => {
            let service = ScreeningService::new(
                Arc::new(classifier),
                open_store(path)?,
                PersistencePolicy::Required,
            );
            service.submit(&form.validate()?)?
        }
        None => {
            let image = form
                .image
                .ok_or_else(|| PulmolensError::Validation("image is required".to_string()))?;
            ScreeningService::new(
                Arc::new(classifier),
                Arc::new(MemoryRecordStore::new()),
                PersistencePolicy::BestEffort,
            )
            .assess(&image)?
        }
    };

    match format {
        OutputFormat::Text => Ok(TextReport::new(&assessment, Utc::now())
            .with_patient(patient_id.as_deref(), age, gender.as_deref())
            .to_string()),
        OutputFormat::Json => to_json(&ClassifyJson::from(&assessment)),
    }
}

fn history(database: &Path, filter: &RecordFilter, format: OutputFormat) -> Result<String> {
    let records = filter.apply(&open_store(database)?.list_all()?);
    let summary = HistorySummary::from_records(&records);

    match format {
        OutputFormat::Text => Ok(HistoryReport::new(&records, &summary).to_string()),
        OutputFormat::Json => to_json(&HistoryJson {
            records: &records,
            summary: &summary,
        }),
    }
}

#[derive(Serialize)]
struct ClassifyJson<'a> {
    diagnosis: Diagnosis,
    confidence: f64,
    probability: f32,
    report: &'a str,
}

impl<'a> From<&'a Assessment> for ClassifyJson<'a> {
    fn from(assessment: &'a Assessment) -> Self {
        Self {
            diagnosis: assessment.diagnosis,
            confidence: round_confidence(assessment.confidence),
            probability: assessment.probability,
            report: assessment.report,
        }
    }
}

#[derive(Serialize)]
struct HistoryJson<'a> {
    records: &'a [DiagnosisRecord],
    summary: &'a HistorySummary,
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PulmolensError::Io(std::io::Error::other(e)))
}

fn parse_diagnosis(value: &str) -> std::result::Result<Diagnosis, String> {
    Diagnosis::from_str(value)
        .ok_or_else(|| format!("expected NORMAL or PNEUMONIA, got '{}'", value))
}
