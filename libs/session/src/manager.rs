use std::fmt;

use mqc_errors::{ClientError, ErrorKind, codes};
use mqc_provider::{ConnectionFactory, ProviderConfig, ProviderRegistry, TransportError};
use mqc_telemetry::{record_acquire, record_cleanup_failure};
use tracing::{debug, instrument, warn};

use crate::context::{ContainerType, SessionContext};

/// Steps of one acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireState {
    Start,
    ConnectionOpen,
    SessionOpen,
    Ready,
    /// Connecting failed; nothing to release.
    FailedCleanupNone,
    /// The session failed; the open connection was closed.
    FailedCleanupConnection,
}

impl AcquireState {
    fn outcome(self) -> &'static str {
        match self {
            AcquireState::Ready => "ready",
            AcquireState::FailedCleanupNone => "connection_failed",
            AcquireState::FailedCleanupConnection => "session_failed",
            AcquireState::Start | AcquireState::ConnectionOpen | AcquireState::SessionOpen => {
                "in_progress"
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Creates [`SessionContext`]s. Holds no per-attempt state, so one manager can serve
/// concurrent callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionManager {
    container: ContainerType,
}

impl SessionManager {
    pub fn new(container: ContainerType) -> Self {
        Self { container }
    }

    /// Opens a connection through `factory`, then a session on it.
    ///
    /// Connection failures are classified as [`ErrorKind::Security`] or [`ErrorKind::Provider`]
    /// and no session is attempted. A session failure closes the connection first; a failure of
    /// that close is logged and never replaces the session error.
    #[instrument(
        name = "session.acquire",
        skip(self, factory, credentials),
        fields(user = credentials.map(|c| c.user.as_str()))
    )]
    pub fn acquire(
        &self,
        factory: &dyn ConnectionFactory,
        credentials: Option<&Credentials>,
        transactional: bool,
    ) -> Result<SessionContext, ClientError> {
        transition(AcquireState::Start);
        let opened = match credentials {
            Some(credentials) => {
                factory.create_connection_with(&credentials.user, credentials.password())
            }
            None => factory.create_connection(),
        };
        let mut connection = match opened {
            Ok(connection) => connection,
            Err(err) => {
                return Err(fail(
                    AcquireState::FailedCleanupNone,
                    transactional,
                    classify_connect_failure(err),
                ));
            }
        };
        transition(AcquireState::ConnectionOpen);

        let created = if transactional {
            connection
                .create_xa_session()
                .map(|xa| (xa.session, Some(xa.resource)))
        } else {
            connection.create_session().map(|session| (session, None))
        };
        let (session, xa_resource) = match created {
            Ok(parts) => parts,
            Err(err) => {
                if let Err(close_err) = connection.close() {
                    warn!(
                        connection = %connection.id(),
                        error = %close_err,
                        "closing connection after session failure failed; suppressed"
                    );
                    record_cleanup_failure("acquire");
                }
                return Err(fail(
                    AcquireState::FailedCleanupConnection,
                    transactional,
                    ClientError::translated(ErrorKind::Provider, codes::SESSION_CREATE, err),
                ));
            }
        };
        transition(AcquireState::SessionOpen);

        let context = SessionContext::new(connection, session, xa_resource, self.container);
        transition(AcquireState::Ready);
        record_acquire(AcquireState::Ready.outcome(), transactional);
        debug!(connection = %context.connection_id(), "session context ready");
        Ok(context)
    }

    /// Loads `config.provider` from `registry` and acquires a context from it.
    ///
    /// The factory is dropped once the connection exists; the context keeps only the connection.
    pub fn acquire_from_config(
        &self,
        registry: &ProviderRegistry,
        config: &ProviderConfig,
        credentials: Option<&Credentials>,
        transactional: bool,
    ) -> Result<SessionContext, ClientError> {
        let factory = registry.load(config)?;
        self.acquire(factory.as_ref(), credentials, transactional)
    }
}

fn transition(state: AcquireState) {
    debug!(?state, "acquire transition");
}

fn fail(state: AcquireState, transactional: bool, err: ClientError) -> ClientError {
    transition(state);
    record_acquire(state.outcome(), transactional);
    warn!(code = err.code(), kind = %err.kind(), error = %err, "session acquisition failed");
    err
}

fn classify_connect_failure(err: TransportError) -> ClientError {
    if err.is_security() {
        ClientError::translated(ErrorKind::Security, codes::AUTHENTICATION, err)
    } else {
        ClientError::translated(ErrorKind::Provider, codes::CONNECTION_CREATE, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("admin", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn security_failures_are_classified_separately() {
        let err = classify_connect_failure(TransportError::AccessDenied("queue".into()));
        assert_eq!(err.kind(), ErrorKind::Security);
        assert_eq!(err.code(), codes::AUTHENTICATION);

        let err = classify_connect_failure(TransportError::Refused("busy".into()));
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.code(), codes::CONNECTION_CREATE);
    }

    #[test]
    fn only_terminal_states_have_outcomes() {
        assert_eq!(AcquireState::Ready.outcome(), "ready");
        assert_eq!(AcquireState::FailedCleanupConnection.outcome(), "session_failed");
        assert_eq!(AcquireState::ConnectionOpen.outcome(), "in_progress");
    }
}
