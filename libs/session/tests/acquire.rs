use std::error::Error;

use mqc_errors::{ErrorKind, codes};
use mqc_provider::{ProviderConfig, ProviderRegistry, TransportError};
use mqc_session::{ContainerType, Credentials, SessionManager};
use mqc_testutil::{Fault, Script, ScriptedFactory, assert_client_error, register_scripted};

fn manager() -> SessionManager {
    SessionManager::new(ContainerType::Standalone)
}

#[test]
fn plain_acquire_yields_ready_context() {
    let factory = ScriptedFactory::new(Script::default());
    let probe = factory.probe();

    let ctx = manager().acquire(&factory, None, false).unwrap();
    assert!(!ctx.is_transactional());
    assert!(!ctx.connection().is_closed());
    assert!(!ctx.session().is_closed());
    assert_eq!(ctx.container_type(), ContainerType::Standalone);
    assert_eq!(probe.connections_opened(), 1);
    assert_eq!(probe.sessions_opened(), 1);

    ctx.close().unwrap();
    assert_eq!(probe.sessions_closed(), 1);
    assert_eq!(probe.connections_closed(), 1);
}

#[test]
fn transactional_acquire_exposes_resource() {
    let factory = ScriptedFactory::new(Script::default());
    let ctx = manager().acquire(&factory, None, true).unwrap();
    assert!(ctx.is_transactional());
    let resource = ctx.transaction_resource().unwrap();
    assert_eq!(resource.resource_manager_id(), ctx.connection_id());
}

#[test]
fn plain_context_has_no_transaction_resource() {
    let factory = ScriptedFactory::new(Script::default());
    let ctx = manager().acquire(&factory, None, false).unwrap();
    let err = ctx.transaction_resource().err().unwrap();
    assert_client_error(&err, ErrorKind::InvalidState, codes::NOT_TRANSACTIONAL);
}

#[test]
fn credentials_are_forwarded() {
    let factory = ScriptedFactory::new(Script::default());
    let probe = factory.probe();
    let creds = Credentials::new("guest", "guest");
    manager().acquire(&factory, Some(&creds), false).unwrap();
    assert_eq!(probe.last_user().as_deref(), Some("guest"));
}

#[test]
fn rejected_credentials_become_security_error() {
    for fault in [Fault::AuthenticationRejected, Fault::AccessDenied] {
        let factory = ScriptedFactory::new(Script {
            connect: Some(fault),
            ..Script::default()
        });
        let probe = factory.probe();
        let err = manager()
            .acquire(&factory, Some(&Credentials::new("bob", "nope")), false)
            .unwrap_err();
        assert_client_error(&err, ErrorKind::Security, codes::AUTHENTICATION);
        assert_eq!(probe.sessions_opened(), 0);
    }
}

#[test]
fn other_connect_failures_become_provider_error() {
    let factory = ScriptedFactory::new(Script {
        connect: Some(Fault::Io),
        ..Script::default()
    });
    let probe = factory.probe();
    let err = manager().acquire(&factory, None, true).unwrap_err();
    assert_client_error(&err, ErrorKind::Provider, codes::CONNECTION_CREATE);
    assert_eq!(probe.connections_opened(), 0);
    assert_eq!(probe.connection_close_attempts(), 0);
}

#[test]
fn session_failure_closes_connection_and_keeps_original_error() {
    let factory = ScriptedFactory::new(Script {
        session: Some(Fault::Refused),
        ..Script::default()
    });
    let probe = factory.probe();

    let err = manager().acquire(&factory, None, false).unwrap_err();
    assert_client_error(&err, ErrorKind::Provider, codes::SESSION_CREATE);
    let source = err
        .source()
        .and_then(|source| source.downcast_ref::<TransportError>())
        .expect("session error kept as source");
    assert!(matches!(source, TransportError::Refused(step) if step == "session"));
    assert_eq!(probe.connections_opened(), 1);
    assert_eq!(probe.connections_closed(), 1);
    assert_eq!(probe.open_connections(), 0);
}

#[test]
fn xa_session_failure_also_closes_connection() {
    let factory = ScriptedFactory::new(Script {
        xa_session: Some(Fault::Refused),
        ..Script::default()
    });
    let probe = factory.probe();
    let err = manager().acquire(&factory, None, true).unwrap_err();
    assert_eq!(err.code(), codes::SESSION_CREATE);
    assert_eq!(probe.open_connections(), 0);
}

#[test]
#[tracing_test::traced_test]
fn cleanup_failure_is_suppressed() {
    let factory = ScriptedFactory::new(Script {
        session: Some(Fault::Refused),
        connection_close: Some(Fault::Io),
        ..Script::default()
    });
    let probe = factory.probe();

    let err = manager().acquire(&factory, None, false).unwrap_err();
    assert_client_error(&err, ErrorKind::Provider, codes::SESSION_CREATE);
    assert!(!err.message().contains("connection_close"));
    assert_eq!(probe.connection_close_attempts(), 1);
    assert!(logs_contain("closing connection after session failure failed; suppressed"));
}

#[test]
fn close_reports_first_failure_but_closes_both() {
    let factory = ScriptedFactory::new(Script {
        session_close: Some(Fault::Io),
        ..Script::default()
    });
    let probe = factory.probe();
    let ctx = manager().acquire(&factory, None, false).unwrap();

    let err = ctx.close().unwrap_err();
    assert_client_error(&err, ErrorKind::Provider, codes::CLOSE_FAILED);
    assert!(err.message().contains("session_close reset"));
    assert_eq!(probe.connections_closed(), 1);
}

#[test]
fn dropping_context_releases_connection() {
    let factory = ScriptedFactory::new(Script::default());
    let probe = factory.probe();
    {
        let _ctx = manager().acquire(&factory, None, false).unwrap();
        assert_eq!(probe.open_connections(), 1);
    }
    assert_eq!(probe.open_connections(), 0);
    assert_eq!(probe.sessions_closed(), 1);
}

#[test]
fn managed_container_is_recorded() {
    let factory = ScriptedFactory::new(Script::default());
    let ctx = SessionManager::new(ContainerType::Managed)
        .acquire(&factory, None, true)
        .unwrap();
    assert_eq!(ctx.container_type(), ContainerType::Managed);
}

#[test]
fn acquire_from_config_uses_registered_provider() {
    let registry = ProviderRegistry::new();
    let probe = register_scripted(&registry, "scripted", Script::default()).unwrap();
    let config = ProviderConfig::new("scripted")
        .with_property("port", "7676")
        .with_property("imqSetJMSXConsumerTXID", "true");

    let ctx = manager()
        .acquire_from_config(&registry, &config, None, false)
        .unwrap();
    assert_eq!(ctx.connection().properties().target(), "tcp://localhost:7676");
    assert!(ctx.metadata().supports("JMSXConsumerTXID"));
    assert_eq!(probe.connections_opened(), 1);
}

#[test]
fn acquire_from_config_surfaces_resolution_errors() {
    let registry = ProviderRegistry::new();
    let err = manager()
        .acquire_from_config(&registry, &ProviderConfig::new("missing"), None, false)
        .unwrap_err();
    assert_client_error(&err, ErrorKind::ProviderResolution, codes::PROVIDER_RESOLUTION);
}

#[test]
fn parallel_acquisitions_are_independent() {
    let factory = std::sync::Arc::new(ScriptedFactory::new(Script::default()));
    let probe = factory.probe();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let factory = std::sync::Arc::clone(&factory);
            std::thread::spawn(move || {
                let ctx = manager()
                    .acquire(factory.as_ref(), None, i % 2 == 0)
                    .unwrap();
                ctx.close().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(probe.connections_opened(), 8);
    assert_eq!(probe.open_connections(), 0);
}
