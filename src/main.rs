//! Pokedex - explore the Pokemon world from your terminal
//!
//! An interactive REPL that browses location areas, explores them for
//! Pokemon and catches them, using the public PokeAPI.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use pokedex::api::PokeApiClient;
use pokedex::app::Session;
use pokedex::cache::ResponseCache;
use pokedex::catch::CatchPolicy;
use pokedex::cli::{AppConfig, Cli};
use pokedex::logging;
use pokedex::persistence::{Persistence, DATA_FILE_NAME};
use pokedex::repl::{self, ExitReason};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = logging::init(config.log_level, &config.log_file) {
        eprintln!(
            "Warning: could not open log file {}: {}",
            config.log_file.display(),
            e
        );
    }

    let (cache, sweeper) = ResponseCache::start(config.cache_ttl);
    let client = match PokeApiClient::new(cache, config.timeout) {
        Ok(client) => client.with_base_url(config.base_url.as_str()),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let persistence = match &config.data_file {
        Some(path) => Persistence::with_path(path),
        None => match Persistence::resolve(DATA_FILE_NAME) {
            Ok(persistence) => persistence,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    // A save file that exists but cannot be read is left untouched
    let mut session = match Session::load(client, persistence, CatchPolicy::new(config.catch_range)) {
        Ok(session) => session,
        Err(e) => {
            error!(%e, "failed to load saved data");
            eprintln!("Error loading saved data: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let input = repl::spawn_stdin_reader();
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(%e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let mut code = ExitCode::SUCCESS;
    match repl::run(&mut session, input, io::stdout(), interrupt).await {
        Ok(reason) => {
            info!(?reason, "leaving the Pokedex");
            if reason == ExitReason::Interrupted {
                println!("Saving data before exit...");
            }
        }
        Err(e) => {
            error!(%e, "terminal output failed");
            code = ExitCode::FAILURE;
        }
    }

    match session.save() {
        Ok(()) => println!("Data saved successfully. Goodbye!"),
        Err(e) => {
            error!(%e, "final save failed");
            eprintln!("Error saving data: {}", e);
            code = ExitCode::FAILURE;
        }
    }

    sweeper.shutdown().await;
    code
}
