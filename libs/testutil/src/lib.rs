//! Scripted provider used to drive the connection core through its failure paths.
//!
//! A [`ScriptedFactory`] injects [`Fault`]s at chosen steps and records every open and close on a
//! shared [`Probe`], so tests can assert which resources were released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mqc_errors::{ClientError, ErrorKind};
use mqc_provider::{
    Connection, ConnectionFactory, FactoryHandle, FactoryProperties, ProviderConfig,
    ProviderRegistry, RegistryError, Session, TransportError, XaResource, XaSession,
};

/// Failure to inject at a scripted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    AuthenticationRejected,
    AccessDenied,
    Refused,
    Io,
}

impl Fault {
    pub fn to_error(self, step: &str) -> TransportError {
        match self {
            Fault::AuthenticationRejected => TransportError::AuthenticationRejected {
                user: step.to_string(),
            },
            Fault::AccessDenied => TransportError::AccessDenied(step.to_string()),
            Fault::Refused => TransportError::Refused(step.to_string()),
            Fault::Io => TransportError::Io(std::io::Error::other(format!("{step} reset"))),
        }
    }
}

/// Steps that fail, keyed by where the fault is raised.
#[derive(Debug, Clone, Copy, Default)]
pub struct Script {
    pub connect: Option<Fault>,
    pub session: Option<Fault>,
    pub xa_session: Option<Fault>,
    pub session_close: Option<Fault>,
    pub connection_close: Option<Fault>,
}

/// Counters shared between a factory and everything it creates.
#[derive(Debug, Default)]
pub struct Probe {
    connections_opened: AtomicUsize,
    connection_close_attempts: AtomicUsize,
    connections_closed: AtomicUsize,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    last_user: Mutex<Option<String>>,
}

impl Probe {
    pub fn connections_opened(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
    }

    pub fn connection_close_attempts(&self) -> usize {
        self.connection_close_attempts.load(Ordering::SeqCst)
    }

    pub fn connections_closed(&self) -> usize {
        self.connections_closed.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }

    /// Connections opened and not successfully closed.
    pub fn open_connections(&self) -> usize {
        self.connections_opened() - self.connections_closed()
    }

    /// User passed to the last credentialed connect, if any.
    pub fn last_user(&self) -> Option<String> {
        self.last_user.lock().ok().and_then(|user| user.clone())
    }
}

pub struct ScriptedFactory {
    script: Script,
    props: FactoryProperties,
    probe: Arc<Probe>,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Self {
        let props = ProviderConfig::new("scripted")
            .factory_properties()
            .expect("default properties are valid");
        Self::with_properties(script, props)
    }

    pub fn with_properties(script: Script, props: FactoryProperties) -> Self {
        Self {
            script,
            props,
            probe: Arc::new(Probe::default()),
        }
    }

    pub fn probe(&self) -> Arc<Probe> {
        Arc::clone(&self.probe)
    }

    fn open(&self) -> Result<Box<dyn Connection>, TransportError> {
        if let Some(fault) = self.script.connect {
            return Err(fault.to_error("connect"));
        }
        let n = self.probe.connections_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection {
            id: format!("scripted-{n}"),
            script: self.script,
            props: self.props.clone(),
            probe: Arc::clone(&self.probe),
            closed: false,
        }))
    }
}

impl ConnectionFactory for ScriptedFactory {
    fn create_connection(&self) -> Result<Box<dyn Connection>, TransportError> {
        self.open()
    }

    fn create_connection_with(
        &self,
        user: &str,
        _password: &str,
    ) -> Result<Box<dyn Connection>, TransportError> {
        if let Ok(mut last) = self.probe.last_user.lock() {
            *last = Some(user.to_string());
        }
        self.open()
    }
}

/// Registers a scripted provider under `id`; every factory it builds reports to the returned
/// probe.
pub fn register_scripted(
    registry: &ProviderRegistry,
    id: &str,
    script: Script,
) -> Result<Arc<Probe>, RegistryError> {
    let probe = Arc::new(Probe::default());
    let shared = Arc::clone(&probe);
    registry.register(id, move |props: &FactoryProperties| {
        let factory = ScriptedFactory {
            script,
            props: props.clone(),
            probe: Arc::clone(&shared),
        };
        Ok(Arc::new(factory) as FactoryHandle)
    })?;
    Ok(probe)
}

struct ScriptedConnection {
    id: String,
    script: Script,
    props: FactoryProperties,
    probe: Arc<Probe>,
    closed: bool,
}

impl ScriptedConnection {
    fn open_session(&self, fault: Option<Fault>, step: &str) -> Result<ScriptedSession, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if let Some(fault) = fault {
            return Err(fault.to_error(step));
        }
        self.probe.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            fault: self.script.session_close,
            probe: Arc::clone(&self.probe),
            closed: false,
        })
    }
}

impl Connection for ScriptedConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn properties(&self) -> &FactoryProperties {
        &self.props
    }

    fn create_session(&mut self) -> Result<Box<dyn Session>, TransportError> {
        Ok(Box::new(self.open_session(self.script.session, "session")?))
    }

    fn create_xa_session(&mut self) -> Result<XaSession, TransportError> {
        let session = self.open_session(self.script.xa_session, "xa_session")?;
        Ok(XaSession {
            session: Box::new(session),
            resource: Arc::new(ScriptedXaResource(self.id.clone())),
        })
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.probe
            .connection_close_attempts
            .fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = self.script.connection_close {
            return Err(fault.to_error("connection_close"));
        }
        self.closed = true;
        self.probe.connections_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

struct ScriptedSession {
    fault: Option<Fault>,
    probe: Arc<Probe>,
    closed: bool,
}

impl Session for ScriptedSession {
    fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        if let Some(fault) = self.fault {
            return Err(fault.to_error("session_close"));
        }
        self.closed = true;
        self.probe.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

struct ScriptedXaResource(String);

impl XaResource for ScriptedXaResource {
    fn resource_manager_id(&self) -> &str {
        &self.0
    }
}

/// Asserts the classification and code of a surfaced error.
#[track_caller]
pub fn assert_client_error(err: &ClientError, kind: ErrorKind, code: &str) {
    assert_eq!(err.kind(), kind, "unexpected kind for `{err}`");
    assert_eq!(err.code(), code, "unexpected code for `{err}`");
    assert!(
        err.message().starts_with(&format!("[{code}]: ")),
        "message `{err}` lacks the code prefix"
    );
}
