//! Acquisition of paired connection/session resources.
//!
//! [`SessionManager::acquire`] opens a connection and then a plain or XA session. If the session
//! cannot be created the connection is closed before the error is returned, so a caller never
//! holds a session without its connection.

mod context;
mod manager;

pub use context::{ContainerType, SessionContext};
pub use manager::{AcquireState, Credentials, SessionManager};
