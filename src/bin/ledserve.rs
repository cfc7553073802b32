//! LED control service bootstrap.
//!
//! Parses the command line, initializes logging, owns the endpoint and
//! maps SIGINT/SIGTERM to its `stop()`. All actual behavior lives in the
//! library.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use ledserve::prelude::*;
use ledserve::runtime::LoopbackRuntime;

#[derive(Debug, Parser)]
#[command(name = "ledserve", about = "LED control service endpoint")]
struct Args {
    /// Use a statically configured routing setup instead of dynamic routing.
    #[arg(long)]
    static_routing: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    let routing = if args.static_routing {
        RoutingMode::Static
    } else {
        RoutingMode::Dynamic
    };

    let config = EndpointConfig::builder().routing(routing).build();
    let runtime = Arc::new(LoopbackRuntime::new(config.routing));
    let endpoint = Arc::new(ServiceEndpoint::new(Arc::clone(&runtime), config));

    if let Err(e) = endpoint.init().await {
        tracing::error!("couldn't initialize endpoint: {e}");
        return ExitCode::FAILURE;
    }

    // The bootstrap owns the endpoint; the signal task gets its own handle
    // and requests the stop explicitly.
    tokio::spawn({
        let endpoint = Arc::clone(&endpoint);
        async move {
            wait_for_shutdown_signal().await;
            tracing::info!("shutdown signal received");
            endpoint.stop();
        }
    });

    // The loopback runtime has no routing manager to wait for: the
    // endpoint counts as registered as soon as delivery starts.
    runtime.push_state(RegistrationEvent::Registered);

    endpoint.start().await;
    endpoint.shutdown().await;
    ExitCode::SUCCESS
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("no SIGTERM handler available: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
