// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Level};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use hec_receiver::{
    config::Config,
    receiver::{
        HecReceiver, COLLECTOR_ENDPOINT_PREFIX, HEALTH_ENDPOINT_PATH, INDEXES_ENDPOINT_PATH,
        TAIL_ENDPOINT_PREFIX,
    },
};

#[tokio::main]
pub async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Error creating config on mock HEC receiver startup: {e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = format!("h2=off,hyper=off,{}", config.log_level);

    // warnings and errors go to stderr, event summaries and everything else to stdout
    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr.with_max_level(Level::WARN).or_else(std::io::stdout))
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(false)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    info!("Starting mock HEC receiver");
    info!("  Region: {}", config.region);
    info!("  Log directory: {}", config.log_dir.display());
    info!("  Port: {}", config.port);
    info!("  Endpoints:");
    info!("    POST {COLLECTOR_ENDPOINT_PREFIX}/event - Submit events");
    info!("    GET  {HEALTH_ENDPOINT_PATH} - Health check");
    info!("    GET  {INDEXES_ENDPOINT_PATH} - List indexes");
    info!("    GET  {TAIL_ENDPOINT_PREFIX}<index>/<n> - Last n events of an index");

    let receiver = match HecReceiver::new(Arc::clone(&config)) {
        Ok(receiver) => receiver,
        Err(e) => {
            error!("Error creating mock HEC receiver: {e}");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown_signal(shutdown.clone()));

    match receiver.run(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error when running mock HEC receiver: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Cancels `shutdown` on Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating shutdown"),
        () = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
    shutdown.cancel();
}
