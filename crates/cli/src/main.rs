use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cellcount_auth::config::{credentials_file_from_env_value, session_ttl_from_env_value};
use cellcount_auth::{AuthConfig, AuthService, RegistrationRequest};
use cellcount_core::config::{data_dir_from_env_value, default_panel_from_env_value};
use cellcount_core::{
    reference_bands, CoreConfig, Gender, Panel, RecordId, RecordRepository, RecordStore,
};
use cellcount_export::{render_report_pdf, report_filename, write_records_csv};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cellcount")]
#[command(about = "CellCount differential counting records CLI")]
struct Cli {
    /// Data directory (overrides CELLCOUNT_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved records, oldest first
    List {
        /// Owner of the records
        #[arg(long)]
        user: String,
        /// Only records for this patient identifier
        #[arg(long)]
        patient: Option<String>,
    },
    /// List patient identifiers that have saved records
    Patients {
        #[arg(long)]
        user: String,
    },
    /// Write all records of a user to a CSV file
    ExportCsv {
        #[arg(long)]
        user: String,
        /// Output file
        out: PathBuf,
    },
    /// Render the PDF report of one record
    Report {
        #[arg(long)]
        user: String,
        /// Record id
        id: String,
        /// Output file (defaults to the generated report name in the current directory)
        out: Option<PathBuf>,
    },
    /// Delete a record by id, or by its exact save time
    Delete {
        #[arg(long)]
        user: String,
        /// Record id
        #[arg(required_unless_present = "timestamp", conflicts_with = "timestamp")]
        id: Option<String>,
        /// RFC 3339 save time, e.g. 2026-10-18T09:30:00.120Z
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Register a user in the credentials file
    AddUser {
        username: String,
        email: String,
        first_name: String,
        last_name: String,
        /// 8-20 characters with upper and lower case, a digit and one of @$!%*?&
        #[arg(long)]
        password: String,
    },
    /// Print reference bands for an age, gender and panel
    Bands {
        /// Age in whole years
        #[arg(long)]
        age: Option<u32>,
        /// male, female or unspecified
        #[arg(long, default_value = "unspecified")]
        gender: String,
        /// white_differential or simplified
        #[arg(long)]
        panel: Option<String>,
    },
}

fn core_config(data_dir: Option<PathBuf>) -> Result<Arc<CoreConfig>, Box<dyn std::error::Error>> {
    let data_dir = data_dir
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var("CELLCOUNT_DATA_DIR").ok()));
    let panel = default_panel_from_env_value(std::env::var("CELLCOUNT_DEFAULT_PANEL").ok())?;
    Ok(Arc::new(CoreConfig::new(data_dir, panel)))
}

fn auth_service(cfg: &CoreConfig) -> AuthService {
    let credentials = credentials_file_from_env_value(
        std::env::var("CELLCOUNT_CREDENTIALS_FILE").ok(),
        cfg.data_dir(),
    );
    let ttl = session_ttl_from_env_value(std::env::var("CELLCOUNT_SESSION_TTL_HOURS").ok());
    AuthService::new(Arc::new(AuthConfig::new(credentials, ttl)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = core_config(cli.data_dir)?;
    let records = RecordRepository::new(cfg.clone());

    match cli.command {
        Some(Commands::List { user, patient }) => {
            let store = records.store_for(&user)?;
            let list = store.list(patient.as_deref())?;
            if list.is_empty() {
                println!("No records found.");
            }
            for record in list {
                println!(
                    "{}  patient: {}  panel: {}  total: {}",
                    record.id(),
                    record.patient().patient_id_str(),
                    record.panel(),
                    record.total()
                );
            }
        }
        Some(Commands::Patients { user }) => {
            for id in records.store_for(&user)?.patient_ids()? {
                println!("{id}");
            }
        }
        Some(Commands::ExportCsv { user, out }) => {
            let list = records.store_for(&user)?.list(None)?;
            write_records_csv(&list, File::create(&out)?)?;
            println!("Exported {} records to {}", list.len(), out.display());
        }
        Some(Commands::Report { user, id, out }) => {
            let id: RecordId = id.parse()?;
            let Some(record) = records.store_for(&user)?.get(&id)? else {
                return Err(format!("Record {id} not found").into());
            };
            let out = out.unwrap_or_else(|| PathBuf::from(report_filename(&record)));
            std::fs::write(&out, render_report_pdf(&record)?)?;
            println!("Wrote report to {}", out.display());
        }
        Some(Commands::Delete {
            user,
            id,
            timestamp,
        }) => {
            let store = records.store_for(&user)?;
            let deleted = match (id, timestamp) {
                (Some(id), _) => store.delete(&id.parse()?)?,
                (None, Some(ts)) => {
                    let ts: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts)?.with_timezone(&Utc);
                    store.delete_at(ts)?
                }
                (None, None) => false,
            };
            if deleted {
                println!("Record deleted.");
            } else {
                println!("No matching record.");
            }
        }
        Some(Commands::AddUser {
            username,
            email,
            first_name,
            last_name,
            password,
        }) => {
            let username = auth_service(&cfg).register(&RegistrationRequest {
                username,
                email,
                first_name,
                last_name,
                password,
            })?;
            println!("Registered user {username}");
        }
        Some(Commands::Bands { age, gender, panel }) => {
            let gender: Gender = gender.parse()?;
            let panel: Panel = match panel {
                Some(p) => p.parse()?,
                None => cfg.default_panel(),
            };
            let bands = reference_bands(age, gender, panel);
            for cell in panel.cell_types() {
                if let Some(band) = bands.get(cell) {
                    println!("{:<24}{band}", cell.label());
                }
            }
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}
