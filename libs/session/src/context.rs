use std::fmt;
use std::sync::Arc;

use mqc_errors::{ClientError, ErrorKind, codes};
use mqc_provider::{Connection, ConnectionMetaData, Session, TransportError, XaResource};
use mqc_telemetry::record_cleanup_failure;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Environment the context was created for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    /// Plain application; the caller manages the context directly.
    #[default]
    Standalone,
    /// Hosted by a container that coordinates transactions on the caller's behalf.
    Managed,
}

/// One acquired connection and session pair.
///
/// Owned by a single caller. Dropping an unclosed context closes it best-effort.
pub struct SessionContext {
    connection: Box<dyn Connection>,
    session: Box<dyn Session>,
    xa_resource: Option<Arc<dyn XaResource>>,
    container: ContainerType,
    closed: bool,
}

impl SessionContext {
    pub(crate) fn new(
        connection: Box<dyn Connection>,
        session: Box<dyn Session>,
        xa_resource: Option<Arc<dyn XaResource>>,
        container: ContainerType,
    ) -> Self {
        Self {
            connection,
            session,
            xa_resource,
            container,
            closed: false,
        }
    }

    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    pub fn connection_id(&self) -> &str {
        self.connection.id()
    }

    pub fn container_type(&self) -> ContainerType {
        self.container
    }

    pub fn is_transactional(&self) -> bool {
        self.xa_resource.is_some()
    }

    /// Transaction resource for an external coordinator; only transactional contexts have one.
    pub fn transaction_resource(&self) -> Result<Arc<dyn XaResource>, ClientError> {
        self.xa_resource
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| ClientError::coded(ErrorKind::InvalidState, codes::NOT_TRANSACTIONAL))
    }

    pub fn metadata(&self) -> ConnectionMetaData {
        ConnectionMetaData::from_properties(self.connection.properties())
    }

    /// Closes the session, then the connection.
    ///
    /// Both closes are attempted; the first failure is returned.
    pub fn close(mut self) -> Result<(), ClientError> {
        self.shutdown()
            .map_err(|err| ClientError::translated(ErrorKind::Provider, codes::CLOSE_FAILED, err))
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        let session = self.session.close();
        let connection = self.connection.close();
        debug!(connection = %self.connection.id(), "session context closed");
        session.and(connection)
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.shutdown() {
            warn!(connection = %self.connection.id(), error = %err, "close on drop failed; suppressed");
            record_cleanup_failure("drop");
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("connection", &self.connection.id())
            .field("transactional", &self.is_transactional())
            .field("container", &self.container)
            .field("closed", &self.closed)
            .finish()
    }
}
