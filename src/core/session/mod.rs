//! Session layer.
//!
//! One [`Session`] exists per open event stream. Its lifecycle is
//! `Connecting → Ready → Closing → Closed`; the [`SessionManager`] creates
//! sessions, routes posted frames to them and closes them on disconnect or
//! shutdown.

mod error;
mod manager;
#[allow(clippy::module_inception)]
mod session;
mod state;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::Session;
pub use state::{SessionId, SessionState};
