//! Stream command handlers.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;
use tokio::sync::broadcast::error::RecvError;

use rasd_core::stream::{SlotReport, StatusUpdate};
use rasd_core::{CameraId, StreamError, StreamManager, StreamSource, Transport, TransportHint};

use crate::cli::{GlobalOpts, StreamsArgs, StreamsCommand, TransportArg};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;
use crate::probe::HttpProbeBackend;

// ── Table rows ──────────────────────────────────────────────────────

/// A configured source together with the transport it resolves to.
#[derive(Debug, Serialize)]
struct SourceEntry {
    camera_id: CameraId,
    url: String,
    #[serde(rename = "type")]
    hint: TransportHint,
    transport: Transport,
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "Camera")]
    camera: String,
    #[tabled(rename = "Type")]
    hint: String,
    #[tabled(rename = "Transport")]
    transport: String,
    #[tabled(rename = "URL")]
    url: String,
}

impl From<&SourceEntry> for SourceRow {
    fn from(e: &SourceEntry) -> Self {
        Self {
            camera: e.camera_id.to_string(),
            hint: e.hint.to_string(),
            transport: e.transport.to_string(),
            url: e.url.clone(),
        }
    }
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Camera")]
    camera: String,
    #[tabled(rename = "Transport")]
    transport: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Playing")]
    playing: String,
    #[tabled(rename = "URL")]
    url: String,
}

fn status_row(r: &SlotReport, color: bool) -> StatusRow {
    StatusRow {
        camera: r.camera_id.to_string(),
        transport: r.transport.to_string(),
        status: output::status_badge(r.status, color),
        playing: if r.is_playing { "yes" } else { "no" }.into(),
        url: r.url.clone(),
    }
}

fn hint_from(arg: TransportArg) -> TransportHint {
    match arg {
        TransportArg::Auto => TransportHint::Auto,
        TransportArg::Hls => TransportHint::Hls,
        TransportArg::Flv => TransportHint::Flv,
        TransportArg::Mp4 => TransportHint::Mp4,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: StreamsArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let manager = open_manager(cfg, global)?;

    match args.command {
        StreamsCommand::List => {
            let entries: Vec<SourceEntry> = manager
                .config()
                .into_iter()
                .map(|(camera_id, source)| SourceEntry {
                    transport: source.transport.resolve(&source.url),
                    camera_id,
                    url: source.url,
                    hint: source.transport,
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &entries,
                |e| SourceRow::from(e),
                |e| e.camera_id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StreamsCommand::Set {
            camera,
            url,
            transport,
        } => {
            let camera = camera.trim();
            if camera.is_empty() {
                return Err(CliError::Validation {
                    field: "camera".into(),
                    reason: "must not be empty".into(),
                });
            }
            let parsed = url::Url::parse(url.trim()).map_err(|e| CliError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            })?;
            let hint = hint_from(transport);
            manager.set_source(CameraId::from(camera), StreamSource::new(parsed.as_str(), hint));
            if !global.quiet {
                eprintln!(
                    "Camera '{camera}' streams {} via {}",
                    parsed,
                    hint.resolve(parsed.as_str())
                );
            }
            Ok(())
        }

        StreamsCommand::Remove { camera } => {
            let camera_id = CameraId::from(camera.trim());
            if manager.remove_source(&camera_id).is_none() {
                return Err(CliError::NotFound {
                    resource_type: "stream".into(),
                    identifier: camera_id.to_string(),
                    list_command: "streams list".into(),
                });
            }
            Ok(())
        }

        StreamsCommand::Detect { url } => {
            let transport = Transport::detect(&url);
            output::print_output(&transport.to_string(), global.quiet);
            Ok(())
        }

        StreamsCommand::Connect { watch } => connect(&manager, watch, global).await,
    }
}

// ── Connect ─────────────────────────────────────────────────────────

fn open_manager(cfg: &Config, global: &GlobalOpts) -> Result<StreamManager, CliError> {
    let backend = HttpProbeBackend::new(cfg.probe_timeout())
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    let storage = config::open_storage(global, cfg);
    Ok(StreamManager::with_policy(
        Arc::new(backend),
        storage,
        cfg.reconnect_policy(),
    ))
}

async fn connect(manager: &StreamManager, watch: u64, global: &GlobalOpts) -> Result<(), CliError> {
    let configured = manager.config();
    if configured.values().all(|s| s.url.trim().is_empty()) {
        return Err(CliError::NoStreams);
    }

    let spinner = (!global.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Connecting {} camera(s)...", configured.len()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let results = manager.connect_all().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if watch > 0 {
        print_report(manager, global);
        watch_status(manager, Duration::from_secs(watch), global).await;
    }
    print_report(manager, global);

    let report = manager.status_report();
    manager.disconnect_all();
    first_failure(&report, results)
}

/// Print status changes until `duration` elapses or the user interrupts.
async fn watch_status(manager: &StreamManager, duration: Duration, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let mut rx = manager.subscribe();
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            update = rx.recv() => match update {
                Ok(update) => {
                    if !global.quiet {
                        eprintln!("{}", update_line(&update, color));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "status receiver lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

fn update_line(update: &StatusUpdate, color: bool) -> String {
    let badge = output::status_badge(update.status, color);
    match &update.message {
        Some(message) => format!("{}: {badge} ({message})", update.camera_id),
        None => format!("{}: {badge}", update.camera_id),
    }
}

fn print_report(manager: &StreamManager, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let report = manager.status_report();
    let out = output::render_list(
        &global.output,
        &report,
        |r| status_row(r, color),
        |r| format!("{}\t{}", r.camera_id, r.status.key()),
    );
    output::print_output(&out, global.quiet);
}

/// Error for the first camera not left connected, preferring the error
/// its first attempt returned.
fn first_failure(
    report: &[SlotReport],
    mut results: Vec<(CameraId, Result<(), StreamError>)>,
) -> Result<(), CliError> {
    let Some(failed) = report.iter().find(|r| !r.is_playing) else {
        return Ok(());
    };
    let attempt_error = results
        .iter_mut()
        .find(|(id, _)| *id == failed.camera_id)
        .and_then(|(_, result)| std::mem::replace(result, Ok(())).err());
    Err(match attempt_error {
        Some(err) => err.into(),
        None => CliError::StreamFailed {
            camera_id: failed.camera_id.to_string(),
            reason: failed.status.label(),
        },
    })
}
