use std::env;
use std::error::Error;
use std::path::Path;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use catalogue_indexer::catalogue::read_catalogue;
use catalogue_indexer::{Cli, Command, Dependencies, IndexingError};
use catalogue_indexer_pipeline::CancellationSignal;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Catalogue indexer failed");
        eprintln!("\nError: {}", e);

        // Print error chain for debugging
        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {}", err);
            source = err.source();
        }

        std::process::exit(1);
    }
}

/// Plain text logs by default, JSON lines with `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(cli: Cli) -> Result<(), IndexingError> {
    match cli.command {
        Command::Reindex { file } => {
            let dependencies = Dependencies::new(&cli.settings).await?;
            reindex(&dependencies, &file).await
        }
        Command::Analyze { codes, analyzer } => {
            let dependencies = Dependencies::new(&cli.settings).await?;
            analyze(&dependencies, &cli.settings.index_name, &analyzer, &codes).await
        }
    }
}

async fn reindex(dependencies: &Dependencies, file: &Path) -> Result<(), IndexingError> {
    let records = read_catalogue(file)?;

    let cancel = CancellationSignal::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, no further batches will be sent");
            signal.cancel();
        }
    });

    let report = dependencies.reindexer.run(records, &cancel).await?;

    info!(
        index = %report.index_name,
        documents = report.documents,
        failed = report.result.failed(),
        indexed = ?report.indexed_count,
        "Reindex complete"
    );
    println!("{}", report);
    Ok(())
}

async fn analyze(
    dependencies: &Dependencies,
    index: &str,
    analyzer: &str,
    codes: &[String],
) -> Result<(), IndexingError> {
    for code in codes {
        let tokens = dependencies.client.analyze(index, analyzer, code).await?;
        println!("{} -> [{}]", code, tokens.join(", "));
    }
    Ok(())
}
