use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_core::config::{
    data_dir_from_env_value, overpayment_policy_from_env_value, seed_baseline_from_env_value,
};
use clinic_core::{ClinicService, CoreConfig, InvoiceId, PatientId, ResultId, ResultStatus};

mod commands;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic records: patients, diagnostic results and billing")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every collection to the data directory (seeds the baseline on first run)
    Init,
    /// Manage patients
    #[command(subcommand)]
    Patient(PatientCommand),
    /// Manage diagnostic results
    #[command(subcommand)]
    Result(ResultCommand),
    /// Manage invoices and payments
    #[command(subcommand)]
    Invoice(InvoiceCommand),
    /// Show dashboard counters and revenue series
    Dashboard,
    /// Show billing totals and the status breakdown
    Report,
}

#[derive(Subcommand)]
enum PatientCommand {
    /// Register a new patient
    Add {
        #[arg(long)]
        name: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: String,
        #[arg(long)]
        contact: String,
        #[arg(long)]
        address: Option<String>,
        /// Medical history notes
        #[arg(long)]
        history: Option<String>,
        /// Files to upload with the record
        #[arg(long = "document")]
        documents: Vec<PathBuf>,
    },
    /// List all patients
    List,
    /// Find patients by name, id, contact or address
    Search { term: String },
    /// Print a patient with their results and invoices as JSON
    Show { id: PatientId },
    /// Change fields of an existing patient
    Update {
        id: PatientId,
        #[command(flatten)]
        fields: PatientFieldArgs,
    },
    /// Delete a patient and everything recorded against them
    Delete { id: PatientId },
    /// Upload a document to a patient
    Upload {
        id: PatientId,
        path: PathBuf,
        /// Media type (detected from the content when omitted)
        #[arg(long = "type")]
        media_type: Option<String>,
    },
    /// Export a patient profile to a JSON file
    Export {
        id: PatientId,
        /// Output file (defaults to patient_<id>_profile.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct PatientFieldArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    dob: Option<String>,
    #[arg(long)]
    contact: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    history: Option<String>,
}

#[derive(Subcommand)]
enum ResultCommand {
    /// Record a diagnostic result for a patient
    Add {
        patient_id: PatientId,
        test_name: String,
        /// Reading, e.g. "Normal"
        #[arg(long)]
        value: Option<String>,
        /// Test date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Pending or Completed
        #[arg(long)]
        status: Option<ResultStatus>,
        /// Files to attach
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },
    /// List results, optionally for one patient
    List {
        #[arg(long)]
        patient: Option<PatientId>,
    },
    /// Change fields of an existing result
    Update {
        id: ResultId,
        #[arg(long)]
        test_name: Option<String>,
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        status: Option<ResultStatus>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a result
    Delete { id: ResultId },
    /// Attach a file to a result
    Attach {
        id: ResultId,
        path: PathBuf,
        #[arg(long = "type")]
        media_type: Option<String>,
    },
}

#[derive(Subcommand)]
enum InvoiceCommand {
    /// Issue an invoice for a patient, from an amount or from line items
    Create {
        patient_id: PatientId,
        #[arg(long, conflicts_with = "items", required_unless_present = "items")]
        amount: Option<Decimal>,
        /// Line item as DESCRIPTION=AMOUNT (repeatable)
        #[arg(long = "item")]
        items: Vec<String>,
    },
    /// Record a payment against an invoice
    Pay {
        id: InvoiceId,
        amount: Decimal,
        /// Defaults to Cash
        #[arg(long)]
        method: Option<String>,
        #[arg(long)]
        reference: Option<String>,
    },
    /// List invoices, optionally for one patient
    List {
        #[arg(long)]
        patient: Option<PatientId>,
    },
    /// Show an invoice with its payments and settlement
    Show { id: InvoiceId },
    /// Export every invoice as CSV
    Csv {
        /// Output file (prints to stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Main entry point for the clinic records CLI
///
/// # Environment Variables
/// - `CLINIC_DATA_DIR`: directory for snapshot files (default: "clinic_data")
/// - `CLINIC_OVERPAYMENT`: `allow` or `reject` payments beyond the balance due (default: allow)
/// - `CLINIC_SEED_BASELINE`: fall back to the shipped dataset when nothing is stored
///   (default: true)
/// - `RUST_LOG`: log filter (default adds `clinic=info`)
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("clinic=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(());
    };

    let cfg = Arc::new(CoreConfig::new(
        data_dir_from_env_value(std::env::var("CLINIC_DATA_DIR").ok()),
        overpayment_policy_from_env_value(std::env::var("CLINIC_OVERPAYMENT").ok())?,
        seed_baseline_from_env_value(std::env::var("CLINIC_SEED_BASELINE").ok())?,
    )?);
    tracing::debug!(data_dir = %cfg.data_dir().display(), overpayment = %cfg.overpayment(), "config resolved");

    let service = ClinicService::open(cfg)?;

    match command {
        Commands::Init => commands::init(&service),
        Commands::Patient(cmd) => commands::patient(&service, cmd),
        Commands::Result(cmd) => commands::result(&service, cmd),
        Commands::Invoice(cmd) => commands::invoice(&service, cmd),
        Commands::Dashboard => commands::dashboard(&service),
        Commands::Report => commands::report(&service),
    }
}
