use clap::Parser;
use log::error;
use pulmolens_core::cli::{open_store, setup_logging, Cli};
use pulmolens_core::server::{serve, ServerConfig};
use pulmolens_core::{BurnClassifier, ClassifierConfig, PersistencePolicy, ScreeningService};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    // Without weights there is nothing to serve
    let classifier = match BurnClassifier::load(&cli.model, ClassifierConfig::default()) {
        Ok(classifier) => classifier,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let store = match open_store(&cli.database) {
        Ok(store) => store,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let policy = if cli.strict_persistence {
        PersistencePolicy::Required
    } else {
        PersistencePolicy::BestEffort
    };
    let service = Arc::new(ScreeningService::new(Arc::new(classifier), store, policy));

    let config = ServerConfig {
        bind: cli.bind,
        max_upload_bytes: cli.max_upload_bytes(),
    };

    if let Err(e) = serve(config, service).await {
        error!("Server failed: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
