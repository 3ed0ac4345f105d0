use mqc_errors::{ErrorKind, codes};
use mqc_provider::loopback::{PASSWORD_KEY, PROVIDER_ID, USER_KEY};
use mqc_provider::{ProviderConfig, ProviderRegistry};
use mqc_session::{Credentials, SessionManager};

fn secured_config() -> ProviderConfig {
    ProviderConfig::new(PROVIDER_ID)
        .with_property("host", "broker.local")
        .with_property(USER_KEY, "admin")
        .with_property(PASSWORD_KEY, "admin")
}

#[test]
fn loopback_round_trip() {
    let registry = ProviderRegistry::with_builtin();
    assert_eq!(registry.names(), [PROVIDER_ID]);

    let ctx = SessionManager::default()
        .acquire_from_config(
            &registry,
            &secured_config(),
            Some(&Credentials::new("admin", "admin")),
            true,
        )
        .unwrap();
    let resource = ctx.transaction_resource().unwrap();
    assert_eq!(resource.resource_manager_id(), "tcp://broker.local:50607");
    assert_eq!(
        ctx.metadata().jmsx_property_names().collect::<Vec<_>>(),
        ["JMSXGroupID", "JMSXGroupSeq", "JMSXDeliveryCount"]
    );
    ctx.close().unwrap();
}

#[test]
fn loopback_rejects_wrong_password() {
    let registry = ProviderRegistry::with_builtin();
    let err = SessionManager::default()
        .acquire_from_config(
            &registry,
            &secured_config(),
            Some(&Credentials::new("admin", "wrong")),
            false,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Security);
    assert_eq!(err.code(), codes::AUTHENTICATION);
    assert!(err.message().ends_with("authentication rejected for user `admin`"));
}

#[test]
fn loopback_with_half_credentials_fails_to_resolve() {
    let registry = ProviderRegistry::with_builtin();
    let config = ProviderConfig::new(PROVIDER_ID).with_property(USER_KEY, "admin");
    let err = SessionManager::default()
        .acquire_from_config(&registry, &config, None, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderResolution);
}
