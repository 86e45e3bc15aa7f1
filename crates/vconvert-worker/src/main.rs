//! Batch transcoding binary.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vconvert_media::{check_ffmpeg, FfmpegRunner, FfmpegTranscoder};
use vconvert_storage::S3Client;
use vconvert_worker::{exit_code, write_report, Orchestrator, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting vconvert");

    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };

    std::process::exit(code);
}

/// Pretty logs for terminals, JSON when `LOG_FORMAT=json`. Logs go to stderr
/// so stdout only carries the per-object lines and the summary.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("vconvert=info,aws_config=warn,aws_smithy_runtime=warn")
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> anyhow::Result<i32> {
    let config = WorkerConfig::from_env();
    config.validate()?;
    info!("Worker config: {:?}", config);

    let store = S3Client::from_env()
        .await
        .context("failed to configure storage client")?;
    info!("Using bucket {}", store.bucket());

    if let Err(e) = check_ffmpeg() {
        warn!("{}; every transcode will fail", e);
    }

    let mut ffmpeg = FfmpegRunner::new();
    if let Some(secs) = config.ffmpeg_timeout_secs {
        ffmpeg = ffmpeg.with_timeout(secs);
    }
    let transcoder = FfmpegTranscoder::new(ffmpeg);

    // Ctrl-C stops new jobs; in-flight jobs finish their step and clean up.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, finishing in-flight steps");
            let _ = shutdown_tx.send(true);
        }
    });

    let orchestrator = Orchestrator::new(&config, Arc::new(store), Arc::new(transcoder))
        .with_shutdown(shutdown_rx);

    let report = orchestrator.run(&config.accepted_extensions).await?;

    for outcome in &report.outcomes {
        println!("{}", outcome);
    }
    println!("{}", report.summary());

    if let Some(path) = &config.report_path {
        if let Err(e) = write_report(&report, path).await {
            warn!("Failed to write run report to {}: {}", path.display(), e);
        }
    }

    Ok(exit_code(&report, config.fail_on_item_error))
}
