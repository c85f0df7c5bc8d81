//! SSE transport implementation.
//!
//! MCP over Server-Sent Events:
//! - `GET /sse` opens an event stream. The first event (`endpoint`) tells the
//!   client where to post frames; every later `message` event carries one
//!   JSON-RPC response.
//! - `POST /messages/?session_id=<id>` delivers one JSON-RPC frame to the
//!   session. The HTTP response only acknowledges receipt (202); the answer
//!   travels back over the event stream.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument, warn};

use super::config::SseConfig;
use super::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::core::session::{SessionError, SessionId, SessionManager};
use crate::domains::tools::definitions::angel::common::{ANGEL_API_BASE, fetch_angel_status};

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<SessionManager>,
    config: Arc<SseConfig>,
}

/// Build the axum router for the SSE transport.
pub fn router(sessions: Arc<SessionManager>, config: &SseConfig) -> Router {
    let state = AppState {
        sessions,
        config: Arc::new(config.clone()),
    };

    let mut app = Router::new()
        .route(&config.sse_path, get(handle_sse))
        .route(&config.message_path, post(handle_message))
        .route("/health", get(health_check))
        .route("/query/angel", get(query_angel))
        .route("/", get(root_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Closes the session when the event stream is dropped.
struct SessionGuard {
    sessions: Arc<SessionManager>,
    id: SessionId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let sessions = Arc::clone(&self.sessions);
        let id = self.id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if sessions.close(&id).await {
                        info!("Client disconnected from session {}", id);
                    }
                });
            }
            Err(_) => warn!("No runtime available to close session {}", id),
        }
    }
}

fn message_event(frame: &JsonRpcResponse) -> Event {
    match Event::default().event("message").json_data(frame) {
        Ok(event) => event,
        Err(e) => {
            error!("Failed to encode frame: {}", e);
            Event::default().comment("dropped unencodable frame")
        }
    }
}

/// Open an event stream bound to a new session.
#[instrument(skip_all)]
async fn handle_sse(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session, rx) = state.sessions.open().await;
    let endpoint = format!("{}?session_id={}", state.config.message_path, session.id());
    info!("SSE stream opened for session {}", session.id());

    let guard = SessionGuard {
        sessions: Arc::clone(&state.sessions),
        id: session.id(),
    };

    let frames = ReceiverStream::new(rx).map(move |frame| {
        let _guard = &guard;
        Ok(message_event(&frame))
    });
    let events = stream::once(async move { Ok(Event::default().event("endpoint").data(endpoint)) })
        .chain(frames);

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.config.keep_alive_secs.max(1)))
            .text("keep-alive"),
    )
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

fn reject(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    warn!("Rejected frame: {}", message);
    (status, message).into_response()
}

/// Accept one JSON-RPC frame for an open session.
#[instrument(skip_all, fields(session))]
async fn handle_message(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let query: MessageQuery = match serde_urlencoded::from_str(query.as_deref().unwrap_or("")) {
        Ok(q) => q,
        Err(e) => return reject(StatusCode::BAD_REQUEST, format!("Invalid query: {}", e)),
    };

    let Some(raw_id) = query.session_id else {
        return reject(StatusCode::BAD_REQUEST, "session_id is required");
    };
    tracing::Span::current().record("session", raw_id.as_str());

    let id: SessionId = match raw_id.parse() {
        Ok(id) => id,
        Err(e) => return reject(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let message = format!("Could not parse message: {}", e);
            // Also reported on the session's stream.
            if let Ok(session) = state.sessions.get(&id).await {
                if let Err(e) = session.send(JsonRpcResponse::parse_error(&message)).await {
                    debug!("Parse error not delivered: {}", e);
                }
            }
            return reject(StatusCode::BAD_REQUEST, message);
        }
    };

    info!("Received frame: {}", request.method);
    match state.sessions.handle_frame(&id, request).await {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(e @ SessionError::NotFound(_)) => reject(StatusCode::NOT_FOUND, e.to_string()),
        Err(e @ (SessionError::Closed(_) | SessionError::Transport(_))) => {
            reject(StatusCode::GONE, e.to_string())
        }
        Err(e) => reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    let server = state.sessions.server();
    Json(serde_json::json!({
        "name": server.name(),
        "version": server.version(),
        "transport": "SSE",
        "endpoints": {
            "sse": state.config.sse_path,
            "messages": state.config.message_path,
            "health": "/health",
            "query": "/query/angel"
        },
        "tools": server.registry().names(),
        "protocol": "JSON-RPC 2.0"
    }))
}

/// Plain JSON view of the existence answer, without an MCP session.
async fn query_angel() -> Response {
    match fetch_angel_status(&format!("{}/existence", ANGEL_API_BASE)).await {
        Some(status) => Json(serde_json::json!({
            "message": status.message,
            "exists": status.exists,
            "confidence": status.details.confidence
        }))
        .into_response(),
        None => (StatusCode::BAD_GATEWAY, "无法获取天使存在信息。").into_response(),
    }
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "sessions": state.sessions.active_count().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
