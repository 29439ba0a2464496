//! Live content feed replay.
//!
//! Reads newline-delimited socket notifications from a capture file (or
//! stdin), decodes each frame and writes the typed output to stdout as NDJSON.
//!
//! Architecture:
//! - Tokio for line-buffered input and Ctrl-C handling
//! - Synchronous, stateless decoding per frame
//! - Feed-health counters logged every `FEED_STATS_INTERVAL` frames

use anyhow::Context;
use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{debug, error, info, warn};

use live_content_feed::config::{OutputMode, Settings};
use live_content_feed::protocol::{decode_notification, NotificationType};
use live_content_feed::stats::FeedStats;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration.
    let settings = Settings::from_env();

    // Initialize logging.
    init_logging(&settings);

    info!("=== Live Content Feed Replay ===");
    info!(
        source = settings.replay_path.as_deref().unwrap_or("stdin"),
        output = ?settings.output_mode,
        emit_unknown = settings.emit_unknown,
        "Configuration loaded"
    );

    // Validate settings.
    if let Err(errors) = settings.validate() {
        for e in &errors {
            error!(error = %e, "Configuration error");
        }
        anyhow::bail!("Configuration validation failed");
    }

    let input: Box<dyn AsyncRead + Unpin + Send> = match &settings.replay_path {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open replay file {path}"))?,
        ),
        None => Box::new(io::stdin()),
    };
    let mut lines = BufReader::new(input).lines();
    let mut stdout = io::stdout();
    let stats = FeedStats::new();
    let stats_interval = settings.stats_interval as u64;

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read replay input")? else {
                    info!("End of replay input");
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match decode_notification(line.as_bytes()) {
                    Ok(notification) => {
                        stats.record(&notification);
                        write_notification(&mut stdout, &notification, &settings).await?;
                    }
                    Err(e) => {
                        stats.record_error(&e);
                        warn!(
                            error = %e,
                            path = ?e.path(),
                            content_id = ?e.content_id(),
                            "Frame rejected"
                        );
                    }
                }

                if stats.frames() % stats_interval == 0 {
                    log_stats(&stats, "Feed health");
                }
            }
        }
    }

    // Graceful shutdown.
    stdout.flush().await?;
    log_stats(&stats, "Final feed health");
    info!("Replay complete.");

    Ok(())
}

async fn write_notification<W: AsyncWrite + Unpin>(
    out: &mut W,
    notification: &NotificationType,
    settings: &Settings,
) -> anyhow::Result<()> {
    match (settings.output_mode, notification) {
        (OutputMode::Notifications, _) => write_line(out, notification).await,
        (OutputMode::Containers, NotificationType::ContentChanges { contents, .. }) => {
            for container in contents
                .iter()
                .filter(|c| settings.emit_unknown || !c.is_unknown())
            {
                write_line(out, container).await?;
            }
            Ok(())
        }
        (OutputMode::Containers, NotificationType::ListeningStarted { session_token_id }) => {
            info!(session_token_id = %session_token_id, "Listening started");
            Ok(())
        }
        (OutputMode::Containers, NotificationType::Unknown) => {
            debug!("Skipping unknown notification");
            Ok(())
        }
    }
}

async fn write_line<W, T>(out: &mut W, value: &T) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    Ok(())
}

fn log_stats(stats: &FeedStats, message: &str) {
    let snap = stats.snapshot();
    info!(
        frames = snap.frames,
        containers = snap.containers,
        dropped = snap.dropped,
        unknown = snap.unknown,
        malformed = snap.malformed,
        protocol_violations = snap.protocol_violations,
        drop_rate = snap.drop_rate(),
        by_kind = ?snap.by_kind,
        "{}",
        message
    );
}

fn init_logging(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    // Logs go to stderr; stdout carries the decoded stream.
    if settings.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    }
}
