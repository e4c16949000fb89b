use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crumbtrail_infrastructure::ConfigStorage;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::session::Session;

#[derive(Parser)]
#[command(name = "crumbtrail")]
#[command(version, about = "Crumbtrail - dashboard breadcrumb trail", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user's config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `crumbtrail_application=trace`
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Session store file, overriding `[storage] session_file`
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Read the dashboard catalog from a JSON file instead of the search API
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dashboard page and print the resulting trail
    Visit {
        /// Full page URL, e.g. http://localhost:3000/d/abc/overview?orgId=1
        url: String,
    },
    /// Navigate back from the current page
    Back {
        /// Page to go back from (defaults to the last visited page)
        #[arg(long)]
        url: Option<String>,
    },
    /// Click the trail item at INDEX (0 = oldest)
    Click {
        index: usize,

        /// Page showing the trail (defaults to the last visited page)
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the stored trail without contacting the catalog
    Show,
    /// Migrate a saved panel model to the nested options shape
    Migrate {
        /// Panel JSON file
        panel: PathBuf,

        /// Rewrite the file instead of printing the result
        #[arg(long)]
        in_place: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Commands::Migrate { panel, in_place } = &cli.command {
        return commands::migrate::run(panel, *in_place);
    }

    let storage = match &cli.config {
        Some(path) => ConfigStorage::new(path.clone()),
        None => ConfigStorage::default_location().context("Failed to locate config file")?,
    };
    let config = storage
        .load()
        .with_context(|| format!("Failed to load config from {}", storage.path().display()))?;

    let session = Session::open(config, cli.session_file, cli.catalog_file.as_deref())?;

    match cli.command {
        Commands::Visit { url } => commands::trail::visit(&session, &url).await?,
        Commands::Back { url } => commands::trail::back(&session, url).await?,
        Commands::Click { index, url } => commands::trail::click(&session, index, url).await?,
        Commands::Show => commands::trail::show(&session)?,
        Commands::Migrate { .. } => {}
    }

    Ok(())
}
