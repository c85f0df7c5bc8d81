//! Session manager.
//!
//! Binds each open event stream to its own [`Session`] and routes posted
//! frames to the right one. Sessions share nothing but the protocol handler,
//! whose tool registry is read-only.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};

use super::error::SessionError;
use super::session::Session;
use super::state::SessionId;
use crate::core::server::McpServer;
use crate::core::transport::{JsonRpcRequest, JsonRpcResponse};

/// Registry of live sessions.
#[derive(Debug)]
pub struct SessionManager {
    server: McpServer,
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(server: McpServer) -> Self {
        Self {
            server,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn server(&self) -> &McpServer {
        &self.server
    }

    /// Open a new session and return it with the receiving half of its
    /// event stream.
    pub async fn open(&self) -> (Arc<Session>, mpsc::Receiver<JsonRpcResponse>) {
        let (session, rx) = Session::new(SessionId::new(), &self.server.config().sessions);
        let session = Arc::new(session);

        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::clone(&session));
        info!("Session {} opened", session.id());

        (session, rx)
    }

    /// Look up a session by id.
    pub async fn get(&self, id: &SessionId) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Route one inbound frame to its session.
    pub async fn handle_frame(
        &self,
        id: &SessionId,
        request: JsonRpcRequest,
    ) -> Result<(), SessionError> {
        let session = self.get(id).await?;
        session.handle_frame(&self.server, request).await
    }

    /// Remove a session and begin closing it.
    ///
    /// Returns `false` if no such session was registered.
    pub async fn close(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(session) => {
                session.close().await;
                true
            }
            None => {
                debug!("Session {} already removed", id);
                false
            }
        }
    }

    /// Close every session.
    pub async fn shutdown(&self) {
        let sessions: Vec<_> = self.sessions.write().await.drain().map(|(_, s)| s).collect();
        info!("Closing {} sessions", sessions.len());
        for session in sessions {
            session.close().await;
        }
    }

    /// Number of registered sessions.
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
