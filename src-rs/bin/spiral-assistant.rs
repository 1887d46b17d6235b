use std::env;
use std::process::ExitCode;

use spiral_assistant_rs::api::server::AssistantServer;
use spiral_assistant_rs::telemetry::init_tracing;
use spiral_assistant_rs::{AssistantConfig, AssistantSession};

fn main() -> ExitCode {
    let verbose = env::args().any(|arg| arg == "--verbose" || arg == "-v")
        || env::var("SPIRAL_DEBUG").map(|v| v == "1" || v == "true").unwrap_or(false);
    if let Err(err) = init_tracing(verbose) {
        eprintln!("failed to initialize logging: {}", err);
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(8080);

    // Blocking HTTP clients are built before the async runtime starts.
    let session = match AssistantSession::from_config(AssistantConfig::from_env()) {
        Ok(session) => session,
        Err(err) => {
            tracing::error!(error = %err, "cannot start assistant");
            return ExitCode::FAILURE;
        }
    };
    let server = AssistantServer::new(port, session);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "cannot start runtime");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(server.start()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server error");
            ExitCode::FAILURE
        }
    }
}
