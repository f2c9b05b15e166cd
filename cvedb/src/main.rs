use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use domain_db::{cve_sources::nist, db};
use dotenvy::dotenv;
use env_logger::Env;
use std::{
    fs,
    path::{Path, PathBuf},
};

use cvedb::api::{self, ApiConfig};
use cvedb::configuration::{ApiSettings, DatabaseSettings};
use cvedb::import::{self, Outcome};

#[actix_web::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();

    dotenv().ok();

    let db_settings = DatabaseSettings::try_from_env()?;
    let api_settings = ApiSettings::try_from_env()?;

    // Setup logger
    {
        #[cfg(debug_assertions)]
        let default_env_filter = "debug";
        #[cfg(not(debug_assertions))]
        let default_env_filter = if api_settings.debug { "debug" } else { "info" };

        if opts.cmd.is_none() {
            // Init tracer for web application
            api::init_logger(default_env_filter)
        } else {
            // Init logger for non web application
            let env = Env::default().default_filter_or(default_env_filter);
            env_logger::Builder::from_env(env)
                .try_init()
                .map_err(anyhow::Error::from)
        }
        .context("Failed to setup logger")?;
    }

    match opts.cmd {
        Some(Commands::Import { json_file, force }) => {
            let database_path = Path::new(&db_settings.path);

            match import::run(&json_file, database_path, force, import::confirm_on_stdin)? {
                Outcome::Imported(report) => log::info!("{}", import::report_message(&report)),
                Outcome::Kept => log::info!("Import cancelled"),
            }
        }
        Some(Commands::Fetch {
            year,
            data_dir,
            refresh,
        }) => {
            let data_path = check_data_path(&data_dir)?;

            let year = match year {
                Some(year) => year,
                None => u16::try_from(chrono::Utc::now().year()).context("invalid current year")?,
            };

            let feed_path = nist::download(year, data_path, refresh)?;

            log::info!(
                "feed ready, load it with: cvedb import {}",
                feed_path.display()
            );
        }
        None => {
            let repository = db::SqliteRepository::new(&db_settings.path)
                .context("Cannot open database")?;
            repository.setup_database()?;

            let ApiSettings {
                address,
                port,
                debug,
            } = api_settings;

            log::info!("Start listening on {}:{}...", address, port);

            let api_config = ApiConfig {
                address,
                port,
                debug,
                repository,
            };

            api::run(api_config)?.await?
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(author, version = cvedb::version(), about)]
#[command(disable_help_subcommand = true)]
struct Opts {
    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuilds the database from a JSON feed file
    Import {
        /// JSON feed to load, optionally gzipped
        json_file: PathBuf,

        /// Overwrite an existing database without asking
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
    /// Downloads the NVD JSON feed of a year
    Fetch {
        /// Data path
        #[arg(short = 'd', long = "data", default_value_t = String::from("./data"))]
        data_dir: String,

        /// Force download files again
        #[arg(short = 'r', long = "refresh")]
        refresh: bool,

        /// The year to download, defaults to the current one
        year: Option<u16>,
    },
}

/// Handle data directory creation if not existing
fn check_data_path(data_path: &str) -> Result<&Path> {
    let data_path = Path::new(data_path);
    if !data_path.exists() {
        log::info!("creating {}", data_path.display());
        fs::create_dir_all(data_path)
            .with_context(|| format!("could not create {}", data_path.display()))?;
    }
    Ok(data_path)
}
