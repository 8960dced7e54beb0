//! `WebSocket` handler for viewport streaming.
//!
//! Clients connect to `GET /ws/board?x=&y=&width=&height=` and receive a
//! JSON-encoded [`BoardUpdate`] text frame for every broadcast generation,
//! clipped to their viewport. The viewport is validated before the
//! upgrade; a bad one is answered with `400` and no socket is opened.
//!
//! Each connection owns a [`StopSignal`]. It fires when the client closes
//! the socket, when a frame cannot be written, or when the hub drops the
//! subscriber, and [`run_subscription`] then releases everything.
//! Pings are answered by the protocol layer on the next write.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use lifestream_core::StopSignal;
use lifestream_types::{BoardUpdate, SubscribeRequest, Viewport};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::hub::now_nanos;
use crate::state::AppState;
use crate::subscription::run_subscription;

/// Validate the requested viewport, then upgrade and start streaming.
///
/// # Route
///
/// `GET /ws/board`
///
/// # Errors
///
/// Returns [`ApiError::InvalidQuery`] for missing or malformed parameters
/// and [`ApiError::InvalidViewport`] for a viewport that does not fit the
/// grid. A request that is not a `WebSocket` upgrade gets Axum's own
/// upgrade rejection.
pub async fn ws_board(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SubscribeRequest>, QueryRejection>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let Query(request) = query.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let viewport = state.hub.check_viewport(request.viewport())?;

    Ok(match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_ws(socket, state, viewport))
            .into_response(),
        Err(rejection) => rejection.into_response(),
    })
}

/// Drive one connection until it is cancelled.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>, viewport: Viewport) {
    debug!(%viewport, "WebSocket client connected");

    let (sink, stream) = socket.split();
    let cancel = StopSignal::new();
    let watcher = tokio::spawn(watch_incoming(stream, cancel.clone()));

    let result = run_subscription(Arc::clone(&state.hub), viewport, cancel, move |updates| {
        forward_updates(updates, sink)
    })
    .await;
    watcher.abort();

    if let Err(e) = result {
        // Validated before the upgrade; only reachable if the grid changed.
        warn!("WebSocket subscription rejected: {e}");
    }
}

/// Write each update as a text frame until the stream or the socket ends.
async fn forward_updates(
    mut updates: mpsc::Receiver<BoardUpdate>,
    mut sink: SplitSink<WebSocket, Message>,
) {
    while let Some(mut update) = updates.recv().await {
        // Stamp at the moment the frame is written, not when it was queued.
        update.sent_timestamp_nanos = now_nanos();
        let json = match serde_json::to_string(&update) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to serialize board update: {e}");
                continue;
            }
        };
        if sink.send(Message::Text(json.into())).await.is_err() {
            debug!("WebSocket client disconnected (send failed)");
            return;
        }
    }
    debug!("Update stream closed, closing WebSocket");
    let _ = sink.close().await;
}

/// Fire `cancel` once the client closes or the socket errors.
async fn watch_incoming(mut stream: SplitStream<WebSocket>, cancel: StopSignal) {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client sent close");
                break;
            }
            Err(e) => {
                debug!("WebSocket error: {e}");
                break;
            }
            Ok(_) => {
                // Viewers have nothing to say; ignore text and binary.
            }
        }
    }
    cancel.stop();
}
