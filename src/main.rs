//! PDF Section Editor
//!
//! Carve compressed PDFs into titled page-range sections on a magnetic
//! timeline, then publish each section to a content store with a catalog entry.

mod app;
mod constants;
mod core;
mod hotkeys;
mod state;
mod utils;

use std::error::Error;
use std::fs;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::{describe_report, publish_request, App, AppError};
use crate::core::catalog::JsonCatalog;
use crate::core::compress::compress_pdf;
use crate::core::config::AppConfig;
use crate::core::library::Library;
use crate::core::pdf::LopdfBackend;
use crate::core::publish::{PublishError, PublishRequest};

#[derive(Parser)]
#[command(name = "pdf-section-editor")]
#[command(about = "Split PDFs into sections on a timeline and publish them", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./pdf-section-editor.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List subject folders under the input root
    Subjects,

    /// List raw and compressed PDFs for a subject
    Library { subject: String },

    /// Compress a raw PDF so it can be added to the timeline
    Compress { subject: String, pdf: String },

    /// Start an editing session (reads commands from stdin or a script)
    Edit {
        subject: String,

        /// Read commands from this file instead of stdin
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Publish a request exported from an editing session
    Publish { request: PathBuf },

    /// Print the catalog path and checksum
    Catalog,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Subjects => {
            for subject in Library::from_config(&config).list_subjects()? {
                println!("{}", subject);
            }
        }
        Commands::Library { subject } => {
            let library = Library::from_config(&config);
            println!("source:");
            for pdf in library.list_source_pdfs(&subject)? {
                println!("  {}", pdf);
            }
            println!("compressed:");
            for pdf in library.list_extracted_pdfs(&subject)? {
                println!("  {}", pdf);
            }
        }
        Commands::Compress { subject, pdf } => {
            let compressed = compress_pdf(&config, &subject, &pdf)?;
            println!("{} {}", compressed.path.display(), compressed.checksum);
        }
        Commands::Edit { subject, script } => {
            let mut app = App::new(config, LopdfBackend, subject);
            let stdout = io::stdout();
            match script {
                Some(path) => {
                    let file = fs::File::open(&path)
                        .map_err(|source| AppError::Io { path, source })?;
                    app.run(BufReader::new(file), stdout.lock()).await?;
                }
                None => app.run(io::stdin().lock(), stdout.lock()).await?,
            }
        }
        Commands::Publish { request } => {
            let json = fs::read_to_string(&request).map_err(|source| AppError::Io {
                path: request.clone(),
                source,
            })?;
            let request: PublishRequest = serde_json::from_str(&json)?;
            match publish_request(&config, LopdfBackend, &request).await {
                Ok(report) => println!("{}", describe_report(&report)),
                Err(AppError::Publish(PublishError::Conflicts { ids, report })) => {
                    println!("{}", describe_report(&report));
                    return Err(AppError::Publish(PublishError::Conflicts { ids, report }));
                }
                Err(err) => return Err(err),
            }
        }
        Commands::Catalog => {
            let catalog = JsonCatalog::open(&config.catalog_path)?;
            println!("{} {}", catalog.path().display(), catalog.checksum()?);
        }
    }
    Ok(())
}
