//! availcal-server entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use availcal_core::{TracingConfig, init_tracing};
use availcal_server::{Cli, ServerResult, SignalHandler, serve};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config.with_format(cli.log_format)) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "availcal-server exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let config = cli.server_config()?;

    let signals = SignalHandler::new();
    signals.spawn_listener();

    serve(config, signals.shutdown()).await
}
