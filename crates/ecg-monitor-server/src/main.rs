//! ECG Monitor Server
//!
//! Live variant of the monitor:
//! - Receives newline-terminated decimal voltage samples via UDP
//!   (port 12345), as sent by the acquisition board
//! - Runs the streaming estimation session on a fixed tick (10 ms)
//! - Broadcasts tick snapshots via WebSocket (ws://host:8080/ws/ecg)
//! - Serves heart-rate scalars over REST
//!
//! A simulated source (`--source simulate`) replaces the board for
//! demos and load testing.

use std::f64::consts::PI;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use clap::Parser;
use serde::Serialize;
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use ecg_monitor_core::{BpmStatus, Diagnostics, MonitorConfig, TickSnapshot};
use ecg_monitor_vitals::EcgSession;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ecg-monitor-server", about = "Streaming ECG heart-rate monitor")]
struct Args {
    /// HTTP port for REST API and WebSocket
    #[arg(long, default_value = "8080")]
    http_port: u16,

    /// UDP port for incoming voltage samples
    #[arg(long, default_value = "12345")]
    udp_port: u16,

    /// Tick interval in milliseconds
    #[arg(long, default_value = "10")]
    tick_ms: u64,

    /// Data source: udp, simulate
    #[arg(long, default_value = "udp")]
    source: String,

    /// Acquisition device address; when set, a "send" handshake is
    /// issued at startup to begin the stream
    #[arg(long, value_name = "ADDR")]
    device: Option<String>,

    /// Keep every Nth waveform sample in WebSocket frames
    #[arg(long, default_value = "10")]
    ws_decimate: usize,
}

// ── Data types ───────────────────────────────────────────────────────────────

/// One WebSocket frame: the tick snapshot, waveform decimated for
/// transport. Peak positions stay in full-resolution sample units;
/// clients divide by `decimation` to index the decimated waveform.
#[derive(Debug, Clone, Serialize)]
struct EcgUpdate {
    msg_type: &'static str,
    timestamp: f64,
    tick: u64,
    status: BpmStatus,
    smoothed_bpm: f64,
    instant_bpm: f64,
    window_secs: f64,
    decimation: usize,
    waveform: Vec<f64>,
    peak_positions: Vec<usize>,
    diagnostics: Diagnostics,
}

impl EcgUpdate {
    fn from_snapshot(snapshot: &TickSnapshot, tick: u64, decimation: usize) -> Self {
        let step = decimation.max(1);
        Self {
            msg_type: "ecg_update",
            timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
            tick,
            status: snapshot.bpm.status,
            smoothed_bpm: snapshot.bpm.smoothed_bpm,
            instant_bpm: snapshot.bpm.instant_bpm,
            window_secs: snapshot.window_secs,
            decimation: step,
            waveform: snapshot.waveform.iter().copied().step_by(step).collect(),
            peak_positions: snapshot.peak_positions.clone(),
            diagnostics: snapshot.diagnostics.clone(),
        }
    }
}

struct AppStateInner {
    session: EcgSession,
    latest: Option<TickSnapshot>,
    tick: u64,
    source: String,
    start_time: std::time::Instant,
    tx: broadcast::Sender<String>,
}

type SharedState = Arc<RwLock<AppStateInner>>;

// ── UDP receiver task ────────────────────────────────────────────────────────

async fn udp_receiver_task(
    samples: mpsc::UnboundedSender<f64>,
    udp_port: u16,
    device: Option<String>,
) {
    let addr = format!("0.0.0.0:{udp_port}");
    let socket = match UdpSocket::bind(&addr).await {
        Ok(s) => {
            info!("UDP listening on {addr} for voltage samples");
            s
        }
        Err(e) => {
            error!("Failed to bind UDP {addr}: {e}");
            return;
        }
    };

    // The acquisition board starts streaming on a "send" command.
    if let Some(device_addr) = device {
        match socket.send_to(b"send\n", &device_addr).await {
            Ok(_) => info!("Sent stream handshake to {device_addr}"),
            Err(e) => warn!("Handshake to {device_addr} failed: {e}"),
        }
    }

    let mut buf = [0u8; 2048];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, _src)) => {
                // Datagrams carry one or more newline-terminated
                // decimal samples; anything unparsable is dropped.
                let Ok(text) = std::str::from_utf8(&buf[..len]) else {
                    continue;
                };
                for line in text.lines() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match trimmed.parse::<f64>() {
                        Ok(value) if value.is_finite() => {
                            if samples.send(value).is_err() {
                                return;
                            }
                        }
                        _ => debug!("dropping unparsable sample {trimmed:?}"),
                    }
                }
            }
            Err(e) => {
                warn!("UDP recv error: {e}");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

// ── Simulated source task ────────────────────────────────────────────────────

/// Pushes a synthetic 72 BPM ECG in real time: QRS pulse train with
/// power-line interference and baseline wander, mirroring what the
/// board would deliver.
async fn simulated_source_task(samples: mpsc::UnboundedSender<f64>, fs_hz: f64, tick_ms: u64) {
    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
    let per_tick = (fs_hz * tick_ms as f64 / 1000.0).max(1.0) as u64;
    let beat_period = 60.0 / 72.0;
    let mut index: u64 = 0;
    info!("Simulated ECG source active ({per_tick} samples per {tick_ms} ms tick)");

    loop {
        interval.tick().await;
        for _ in 0..per_tick {
            let t = index as f64 / fs_hz;
            index += 1;
            let phase = (t % beat_period) / beat_period;
            let qrs = if phase < 0.05 {
                let x = (phase / 0.05 - 0.5) * 2.0;
                0.8 * (0.5 + 0.5 * (PI * x).cos())
            } else {
                0.0
            };
            let value = 1.65
                + qrs
                + 0.1 * (2.0 * PI * 60.0 * t).sin()
                + 0.15 * (2.0 * PI * 0.3 * t).sin();
            if samples.send(value).is_err() {
                return;
            }
        }
    }
}

// ── Tick task ────────────────────────────────────────────────────────────────

async fn tick_task(
    state: SharedState,
    mut samples: mpsc::UnboundedReceiver<f64>,
    tick_ms: u64,
    ws_decimate: usize,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
    let mut batch = Vec::new();

    loop {
        interval.tick().await;

        batch.clear();
        while let Ok(sample) = samples.try_recv() {
            batch.push(sample);
        }
        if batch.is_empty() {
            continue;
        }

        let mut s = state.write().await;
        if let Some(snapshot) = s.session.tick(&batch) {
            s.tick += 1;
            let update = EcgUpdate::from_snapshot(&snapshot, s.tick, ws_decimate);
            if let Ok(json) = serde_json::to_string(&update) {
                let _ = s.tx.send(json);
            }
            s.latest = Some(snapshot);
        }
    }
}

// ── WebSocket handler ────────────────────────────────────────────────────────

async fn ws_ecg_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws_client(socket, state))
}

async fn handle_ws_client(mut socket: WebSocket, state: SharedState) {
    let mut rx = {
        let s = state.read().await;
        s.tx.subscribe()
    };

    info!("WebSocket client connected");

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {} // ignore client messages
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

// ── REST endpoints ───────────────────────────────────────────────────────────

async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let s = state.read().await;
    Json(serde_json::json!({
        "status": "ok",
        "source": s.source,
        "tick": s.tick,
        "uptime_secs": s.start_time.elapsed().as_secs(),
        "clients": s.tx.receiver_count(),
    }))
}

async fn heart_rate(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let s = state.read().await;
    match &s.latest {
        Some(snapshot) => Json(serde_json::json!({
            "status": snapshot.bpm.status,
            "smoothed_bpm": snapshot.bpm.smoothed_bpm,
            "instant_bpm": snapshot.bpm.instant_bpm,
            "peaks_in_window": snapshot.diagnostics.peaks_in_window,
            "history_len": snapshot.diagnostics.history_len,
            "total_samples": snapshot.diagnostics.total_samples,
            "skipped_stages": snapshot.diagnostics.skipped_stages,
            "timestamp": chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        })),
        None => Json(serde_json::json!({
            "status": "no_data",
        })),
    }
}

async fn info_page() -> Html<&'static str> {
    Html(
        "<html><body>\
         <h1>ECG Monitor Server</h1>\
         <ul>\
         <li><a href='/health'>/health</a>: server health</li>\
         <li><a href='/api/v1/heart-rate'>/api/v1/heart-rate</a>: latest heart rate</li>\
         <li>ws://localhost:8080/ws/ecg: snapshot stream</li>\
         </ul>\
         </body></html>",
    )
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = MonitorConfig::default();
    let session = match EcgSession::new(config.clone()) {
        Ok(session) => session,
        Err(e) => {
            error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let (tx, _) = broadcast::channel::<String>(256);
    let state: SharedState = Arc::new(RwLock::new(AppStateInner {
        session,
        latest: None,
        tick: 0,
        source: args.source.clone(),
        start_time: std::time::Instant::now(),
        tx,
    }));

    let (sample_tx, sample_rx) = mpsc::unbounded_channel::<f64>();
    match args.source.as_str() {
        "simulate" => {
            tokio::spawn(simulated_source_task(sample_tx, config.fs_hz, args.tick_ms));
        }
        _ => {
            tokio::spawn(udp_receiver_task(
                sample_tx,
                args.udp_port,
                args.device.clone(),
            ));
        }
    }
    tokio::spawn(tick_task(
        state.clone(),
        sample_rx,
        args.tick_ms,
        args.ws_decimate,
    ));

    let app = Router::new()
        .route("/", get(info_page))
        .route("/health", get(health))
        .route("/api/v1/heart-rate", get(heart_rate))
        .route("/ws/ecg", get(ws_ecg_handler))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.http_port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind HTTP {addr}: {e}");
            std::process::exit(1);
        }
    };
    info!("HTTP server listening on {addr}");

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        if tokio::signal::ctrl_c().await.is_err() {
            error!("failed to install CTRL+C handler");
        }
        info!("Shutdown signal received");
    });

    if let Err(e) = server.await {
        error!("Server error: {e}");
    }
    info!("Server shut down cleanly");
}
