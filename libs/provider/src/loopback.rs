//! In-process provider that needs no broker.
//!
//! Connections only track their own open/closed state, which is enough to exercise session
//! acquisition end to end. When `loopback.user` and `loopback.password` are configured,
//! credentialed connections must match them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;
use uuid::Uuid;

use crate::config::FactoryProperties;
use crate::errors::TransportError;
use crate::registry::FactoryHandle;
use crate::transport::{Connection, ConnectionFactory, Session, XaResource, XaSession};

pub const PROVIDER_ID: &str = "loopback";
pub const USER_KEY: &str = "loopback.user";
pub const PASSWORD_KEY: &str = "loopback.password";

/// Registry constructor for the loopback provider.
pub fn construct(props: &FactoryProperties) -> Result<FactoryHandle, TransportError> {
    Ok(Arc::new(LoopbackFactory::new(props.clone())?))
}

pub struct LoopbackFactory {
    props: FactoryProperties,
    credentials: Option<(String, String)>,
}

impl LoopbackFactory {
    pub fn new(props: FactoryProperties) -> Result<Self, TransportError> {
        let credentials = match (props.get(USER_KEY), props.get(PASSWORD_KEY)) {
            (Some(user), Some(password)) => Some((user.to_string(), password.to_string())),
            (None, None) => None,
            (Some(_), None) => return Err(missing_pair(PASSWORD_KEY, USER_KEY)),
            (None, Some(_)) => return Err(missing_pair(USER_KEY, PASSWORD_KEY)),
        };
        Ok(Self { props, credentials })
    }

    fn open(&self) -> Box<dyn Connection> {
        let connection = LoopbackConnection {
            id: Uuid::new_v4().to_string(),
            props: self.props.clone(),
            sessions: Vec::new(),
            closed: false,
        };
        debug!(connection = %connection.id, target_url = %self.props.target(), "loopback connection opened");
        Box::new(connection)
    }
}

fn missing_pair(missing: &str, present: &str) -> TransportError {
    TransportError::InvalidProperty {
        key: missing.to_string(),
        reason: format!("required when `{present}` is set"),
    }
}

impl ConnectionFactory for LoopbackFactory {
    fn create_connection(&self) -> Result<Box<dyn Connection>, TransportError> {
        Ok(self.open())
    }

    fn create_connection_with(
        &self,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn Connection>, TransportError> {
        if let Some((expected_user, expected_password)) = &self.credentials {
            if expected_user != user || expected_password != password {
                return Err(TransportError::AuthenticationRejected {
                    user: user.to_string(),
                });
            }
        }
        Ok(self.open())
    }
}

pub struct LoopbackConnection {
    id: String,
    props: FactoryProperties,
    sessions: Vec<Arc<AtomicBool>>,
    closed: bool,
}

impl LoopbackConnection {
    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    fn track_session(&mut self) -> LoopbackSession {
        let closed = Arc::new(AtomicBool::new(false));
        self.sessions.push(Arc::clone(&closed));
        LoopbackSession { closed }
    }
}

impl Connection for LoopbackConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn properties(&self) -> &FactoryProperties {
        &self.props
    }

    fn create_session(&mut self) -> Result<Box<dyn Session>, TransportError> {
        self.ensure_open()?;
        Ok(Box::new(self.track_session()))
    }

    fn create_xa_session(&mut self) -> Result<XaSession, TransportError> {
        self.ensure_open()?;
        let session = self.track_session();
        Ok(XaSession {
            session: Box::new(session),
            resource: Arc::new(LoopbackXaResource {
                resource_manager_id: self.props.target().to_string(),
            }),
        })
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        for session in self.sessions.drain(..) {
            session.store(true, Ordering::SeqCst);
        }
        self.closed = true;
        debug!(connection = %self.id, "loopback connection closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

struct LoopbackSession {
    closed: Arc<AtomicBool>,
}

impl Session for LoopbackSession {
    fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct LoopbackXaResource {
    resource_manager_id: String,
}

impl XaResource for LoopbackXaResource {
    fn resource_manager_id(&self) -> &str {
        &self.resource_manager_id
    }
}
