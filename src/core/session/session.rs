//! A single client session.
//!
//! A `Session` is bound to one event stream for its whole life. It owns the
//! sending half of that stream exclusively, routes inbound frames to the
//! protocol handler, and tracks its in-flight tool calls so they can be
//! cancelled individually or all at once when the session closes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::SessionError;
use super::state::{SessionId, SessionState};
use crate::core::config::{InFlightPolicy, MAX_OUTBOUND_BUFFER, SessionConfig};
use crate::core::server::{McpServer, parse_call_params};
use crate::core::transport::{
    JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, TransportError, TransportResult,
};

/// Server-side state of one client connection.
pub struct Session {
    id: SessionId,
    policy: InFlightPolicy,
    state: watch::Sender<SessionState>,
    /// Set once an `initialize` request has been answered.
    initialized: AtomicBool,
    /// Sending half of the event stream. Taken (released) once closed.
    outbound: RwLock<Option<mpsc::Sender<JsonRpcResponse>>>,
    /// Parent of every in-flight call's token.
    shutdown: CancellationToken,
    /// In-flight `tools/call` requests, keyed by rendered request id.
    in_flight: Mutex<HashMap<String, CancellationToken>>,
    opened_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("policy", &self.policy)
            .field("opened_at", &self.opened_at)
            .finish_non_exhaustive()
    }
}

/// Render a JSON-RPC id as a map key. `1` and `"1"` stay distinct.
fn request_key(id: &Value) -> String {
    id.to_string()
}

impl Session {
    /// Create a session and the receiving half of its event stream.
    pub fn new(id: SessionId, config: &SessionConfig) -> (Self, mpsc::Receiver<JsonRpcResponse>) {
        let (tx, rx) = mpsc::channel(config.outbound_buffer.clamp(1, MAX_OUTBOUND_BUFFER));
        let (state, _) = watch::channel(SessionState::Connecting);

        let session = Self {
            id,
            policy: config.in_flight_policy,
            state,
            initialized: AtomicBool::new(false),
            outbound: RwLock::new(Some(tx)),
            shutdown: CancellationToken::new(),
            in_flight: Mutex::new(HashMap::new()),
            opened_at: Utc::now(),
        };

        (session, rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribe to lifecycle changes.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Move to `next`, if the lifecycle allows it.
    pub fn transition(&self, next: SessionState) -> Result<(), SessionError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                debug!("Session {}: {} -> {}", self.id, current, next);
                *current = next;
                true
            } else {
                outcome = Err(SessionError::InvalidTransition {
                    from: *current,
                    to: next,
                });
                false
            }
        });
        outcome
    }

    /// Write one frame to the event stream.
    pub async fn send(&self, frame: JsonRpcResponse) -> TransportResult<()> {
        let sender = self
            .outbound
            .read()
            .await
            .clone()
            .ok_or_else(|| TransportError::channel_closed(self.id))?;

        sender
            .send(frame)
            .await
            .map_err(|_| TransportError::channel_closed(self.id))
    }

    /// Number of tool calls currently running.
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    /// Handle one inbound frame.
    ///
    /// Requests other than `tools/call` are answered before this returns;
    /// `tools/call` runs on its own task and answers when it completes.
    #[instrument(skip_all, fields(session = %self.id, method = %request.method))]
    pub async fn handle_frame(
        self: &Arc<Self>,
        server: &McpServer,
        request: JsonRpcRequest,
    ) -> Result<(), SessionError> {
        let state = self.state();
        if !state.is_open() {
            return Err(SessionError::Closed(self.id.to_string()));
        }

        if request.jsonrpc != JSONRPC_VERSION {
            return self
                .respond(JsonRpcResponse::invalid_request(
                    request.id,
                    "Unsupported JSON-RPC version",
                ))
                .await;
        }

        if request.is_notification() {
            self.handle_notification(request).await;
            return Ok(());
        }

        let id = request.id.clone();
        match request.method.as_str() {
            "initialize" => {
                let result = server.initialize(request.params.as_ref());
                self.respond(JsonRpcResponse::success(id, result)).await?;
                self.initialized.store(true, Ordering::Release);
                Ok(())
            }
            "ping" => self.respond(JsonRpcResponse::success(id, json!({}))).await,
            "tools/list" | "tools/call" if !state.is_ready() => {
                self.respond(JsonRpcResponse::invalid_request(
                    id,
                    "Session not initialized",
                ))
                .await
            }
            "tools/list" => {
                self.respond(JsonRpcResponse::success(id, server.list_tools()))
                    .await
            }
            "tools/call" => self.spawn_call(server.clone(), request).await,
            method => {
                warn!("Unknown method: {}", method);
                self.respond(JsonRpcResponse::method_not_found(id, method))
                    .await
            }
        }
    }

    /// Send a response; a dead stream forces the session to close.
    async fn respond(&self, response: JsonRpcResponse) -> Result<(), SessionError> {
        if let Err(e) = self.send(response).await {
            warn!("Failed to deliver frame: {}", e);
            self.close().await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn handle_notification(&self, request: JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" if !self.initialized.load(Ordering::Acquire) => {
                warn!("Session {}: initialized before initialize, ignoring", self.id);
            }
            "notifications/initialized" => match self.transition(SessionState::Ready) {
                Ok(()) => info!("Session {} ready", self.id),
                Err(e) => warn!("Ignoring initialized notification: {}", e),
            },
            "notifications/cancelled" => {
                let key = request
                    .params
                    .as_ref()
                    .and_then(|p| p.get("requestId"))
                    .map(request_key);
                match key {
                    Some(key) => {
                        if self.cancel_request(&key).await {
                            info!("Cancelled request {}", key);
                        } else {
                            debug!("No in-flight request {} to cancel", key);
                        }
                    }
                    None => warn!("Cancellation without requestId"),
                }
            }
            other => debug!("Ignoring notification: {}", other),
        }
    }

    async fn spawn_call(
        self: &Arc<Self>,
        server: McpServer,
        request: JsonRpcRequest,
    ) -> Result<(), SessionError> {
        let JsonRpcRequest { id, params, .. } = request;

        let invocation = match parse_call_params(params) {
            Ok(invocation) => invocation,
            Err(msg) => return self.respond(JsonRpcResponse::invalid_params(id, msg)).await,
        };

        let key = request_key(id.as_ref().unwrap_or(&Value::Null));
        let Some(token) = self.track(&key).await else {
            return self
                .respond(JsonRpcResponse::invalid_request(
                    id,
                    format!("Request {} is already in flight", key),
                ))
                .await;
        };

        let session = Arc::clone(self);
        tokio::spawn(async move {
            let result = server.call_tool(invocation, &token).await;

            if token.is_cancelled() {
                debug!("Request {} cancelled; no response sent", key);
            } else {
                let response = match serde_json::to_value(&result) {
                    Ok(value) => JsonRpcResponse::success(id, value),
                    Err(e) => JsonRpcResponse::internal_error(id, e.to_string()),
                };
                if session.respond(response).await.is_err() {
                    debug!("Result of request {} was not delivered", key);
                }
            }

            session.untrack(&key).await;
        });

        Ok(())
    }

    /// Register an in-flight call. `None` if the id is already in flight.
    async fn track(&self, key: &str) -> Option<CancellationToken> {
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.contains_key(key) {
            return None;
        }
        let token = self.shutdown.child_token();
        in_flight.insert(key.to_string(), token.clone());
        Some(token)
    }

    async fn untrack(&self, key: &str) {
        let drained = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.remove(key);
            in_flight.is_empty()
        };

        if drained && self.state() == SessionState::Closing {
            self.finish_close().await;
        }
    }

    /// Cancel one in-flight call.
    pub async fn cancel_request(&self, key: &str) -> bool {
        match self.in_flight.lock().await.get(key) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Begin closing the session.
    ///
    /// In-flight calls are cancelled or drained according to the configured
    /// policy; the session reaches `Closed` once none remain. Returns `false`
    /// if the session was already closing.
    pub async fn close(&self) -> bool {
        if self.transition(SessionState::Closing).is_err() {
            return false;
        }

        let pending = self.in_flight_count().await;
        info!(
            "Session {} closing ({} in-flight, policy {:?})",
            self.id, pending, self.policy
        );

        if self.policy == InFlightPolicy::Cancel {
            self.shutdown.cancel();
        }

        if self.in_flight.lock().await.is_empty() {
            self.finish_close().await;
        }
        true
    }

    async fn finish_close(&self) {
        if self.transition(SessionState::Closed).is_ok() {
            self.outbound.write().await.take();
            info!("Session {} closed", self.id);
        }
    }
}
