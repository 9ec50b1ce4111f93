//! # Distribution Server
//!
//! WebSocket front end of the [`DistributionHub`].
//!
//! Routes:
//! - `GET /telemetry` upgrades to a WebSocket. The server pushes one text
//!   frame per sample: `{"event":"telemetry","data":{...}}`. Anything the
//!   client sends except Close is ignored.
//! - `GET /health` reports liveness and the current observer count.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{HeaderValue, Method};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::config::invalid;
use crate::error::Result;
use crate::telemetry::{DistributionHub, TelemetrySample};

/// Name of the only event pushed to observers.
pub const TELEMETRY_EVENT: &str = "telemetry";

/// Envelope for a sample on the wire.
#[derive(Debug, Serialize)]
pub struct TelemetryEvent<'a> {
    pub event: &'static str,
    pub data: &'a TelemetrySample,
}

impl<'a> TelemetryEvent<'a> {
    pub fn new(data: &'a TelemetrySample) -> Self {
        Self {
            event: TELEMETRY_EVENT,
            data,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Response body of `GET /health`.
#[derive(Debug, Serialize, PartialEq)]
pub struct Health {
    pub status: &'static str,
    pub observers: usize,
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    if allowed_origin == "*" {
        return Ok(layer.allow_origin(Any));
    }

    let origin = allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| invalid(format!("invalid allowed_origin {:?}: {}", allowed_origin, e)))?;
    Ok(layer.allow_origin(origin))
}

/// Build the router serving `hub`.
pub fn router(hub: DistributionHub, allowed_origin: &str) -> Result<Router> {
    Ok(Router::new()
        .route("/telemetry", get(telemetry_socket))
        .route("/health", get(health))
        .layer(cors_layer(allowed_origin)?)
        .with_state(hub))
}

/// Route function reporting liveness.
pub async fn health(State(hub): State<DistributionHub>) -> Json<Health> {
    Json(Health {
        status: "ok",
        observers: hub.observer_count(),
    })
}

/// Route function which accepts a WebSocket connection and begins forwarding
/// telemetry samples.
pub async fn telemetry_socket(ws: WebSocketUpgrade, State(hub): State<DistributionHub>) -> Response {
    ws.on_upgrade(move |socket| forward_telemetry(socket, hub))
}

async fn forward_telemetry(socket: WebSocket, hub: DistributionHub) {
    let mut subscription = hub.join();
    let id = subscription.id();
    let (mut writer, mut reader) = socket.split();

    loop {
        tokio::select! {
            sample = subscription.recv() => {
                let Some(sample) = sample else { break };

                let json = match TelemetryEvent::new(&sample).to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize telemetry for {}: {}", id, e);
                        continue;
                    }
                };

                if let Err(e) = writer.send(Message::Text(json)).await {
                    debug!("Connection with {} severed: {}", id, e);
                    break;
                }
            }
            message = reader.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!("Read error from {}: {}", id, e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = writer.close().await;
    hub.leave(id);
}
