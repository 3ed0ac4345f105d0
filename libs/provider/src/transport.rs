use std::sync::Arc;

use crate::config::FactoryProperties;
use crate::errors::TransportError;

/// Connection-factory capability exposed by every provider.
pub trait ConnectionFactory: Send + Sync {
    /// Opens a connection with the provider's default identity.
    fn create_connection(&self) -> Result<Box<dyn Connection>, TransportError>;

    fn create_connection_with(
        &self,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn Connection>, TransportError>;
}

/// An open provider connection.
pub trait Connection: Send {
    fn id(&self) -> &str;

    /// Construction properties the owning factory was built with.
    fn properties(&self) -> &FactoryProperties;

    fn create_session(&mut self) -> Result<Box<dyn Session>, TransportError>;

    fn create_xa_session(&mut self) -> Result<XaSession, TransportError>;

    /// Closes the connection and any sessions it still owns. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), TransportError>;

    fn is_closed(&self) -> bool;
}

pub trait Session: Send {
    fn close(&mut self) -> Result<(), TransportError>;

    fn is_closed(&self) -> bool;
}

/// Handle an external transaction coordinator enlists.
pub trait XaResource: Send + Sync {
    /// Identifier of the resource manager behind this handle.
    fn resource_manager_id(&self) -> &str;

    fn is_same_resource_manager(&self, other: &dyn XaResource) -> bool {
        self.resource_manager_id() == other.resource_manager_id()
    }
}

/// Session created for distributed transactions, paired with its transaction resource.
pub struct XaSession {
    pub session: Box<dyn Session>,
    pub resource: Arc<dyn XaResource>,
}
