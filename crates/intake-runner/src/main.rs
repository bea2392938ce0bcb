//! Intake pipeline binary: one task per process.

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use intake_runner::{CancelFlag, Pipeline, RunnerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("intake=info".parse().unwrap())
        .add_directive("aws_config=warn".parse().unwrap())
        .add_directive("aws_smithy_runtime=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting intake-runner");

    let config = RunnerConfig::from_env();
    let cancel = CancelFlag::new();

    // Observe operator interrupts between stages.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
            cancel.cancel();
        });
    }

    let pipeline = Pipeline::from_env(config, cancel);
    let report = pipeline.run().await;

    info!(
        status = %report.status,
        duration_secs = report.duration.as_secs_f64(),
        "Runner exiting"
    );
    std::process::exit(report.status.exit_code());
}
