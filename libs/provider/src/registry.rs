use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use mqc_errors::{ClientError, ErrorKind, codes};
use mqc_telemetry::record_provider_load;
use tracing::{info, instrument, warn};

use crate::config::{FactoryProperties, ProviderConfig};
use crate::errors::TransportError;
use crate::transport::ConnectionFactory;

/// Opaque handle to a constructed provider.
pub type FactoryHandle = Arc<dyn ConnectionFactory>;

type Constructor =
    Arc<dyn Fn(&FactoryProperties) -> Result<FactoryHandle, TransportError> + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("provider `{0}` already registered")]
    AlreadyRegistered(String),
    #[error("provider `{0}` is not registered")]
    UnknownProvider(String),
    #[error("provider `{provider}` failed to construct: {source}")]
    Construction {
        provider: String,
        #[source]
        source: TransportError,
    },
    #[error("provider `{0}` panicked during construction")]
    ConstructorPanicked(String),
}

/// Thread-safe registry of provider constructors keyed by provider id.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mqc_provider::{Connection, ConnectionFactory, ProviderConfig, ProviderRegistry, TransportError};
///
/// struct Offline;
///
/// impl ConnectionFactory for Offline {
///     fn create_connection(&self) -> Result<Box<dyn Connection>, TransportError> {
///         Err(TransportError::Refused("offline".into()))
///     }
///
///     fn create_connection_with(
///         &self,
///         _user: &str,
///         _password: &str,
///     ) -> Result<Box<dyn Connection>, TransportError> {
///         self.create_connection()
///     }
/// }
///
/// let registry = ProviderRegistry::new();
/// registry.register("offline", |_props| Ok(Arc::new(Offline))).unwrap();
/// let factory = registry.load(&ProviderConfig::new("offline")).unwrap();
/// assert!(factory.create_connection().is_err());
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    entries: DashMap<String, Constructor>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the providers compiled into this crate.
    #[cfg(feature = "loopback")]
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry
            .register(crate::loopback::PROVIDER_ID, crate::loopback::construct)
            .ok();
        registry
    }

    pub fn register<F>(&self, id: impl Into<String>, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn(&FactoryProperties) -> Result<FactoryHandle, TransportError> + Send + Sync + 'static,
    {
        match self.entries.entry(id.into()) {
            Entry::Occupied(entry) => Err(RegistryError::AlreadyRegistered(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(constructor));
                Ok(())
            }
        }
    }

    /// Registered provider ids, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Resolves `config.provider` and constructs its connection factory.
    ///
    /// Malformed properties, an unknown provider id, and a constructor that fails or panics all
    /// surface as [`ErrorKind::ProviderResolution`].
    #[instrument(name = "provider.load", skip(self, config), fields(provider = %config.provider))]
    pub fn load(&self, config: &ProviderConfig) -> Result<FactoryHandle, ClientError> {
        let provider = config.provider.as_str();
        let props = config.factory_properties().map_err(|err| {
            warn!(error = %err, "rejecting provider properties");
            record_provider_load(provider, "invalid_properties");
            ClientError::translated(
                ErrorKind::ProviderResolution,
                codes::PROVIDER_PROPERTIES,
                err,
            )
        })?;

        // Clone the constructor out so the map shard is not held while it runs.
        let constructor = self.entries.get(provider).map(|entry| Arc::clone(entry.value()));
        let Some(constructor) = constructor else {
            record_provider_load(provider, "unknown");
            return Err(resolution_error(RegistryError::UnknownProvider(
                provider.to_string(),
            )));
        };

        match panic::catch_unwind(AssertUnwindSafe(|| constructor(&props))) {
            Ok(Ok(factory)) => {
                info!(target_url = %props.target(), "provider loaded");
                record_provider_load(provider, "ok");
                Ok(factory)
            }
            Ok(Err(source)) => {
                record_provider_load(provider, "construction_failed");
                Err(resolution_error(RegistryError::Construction {
                    provider: provider.to_string(),
                    source,
                }))
            }
            Err(_) => {
                record_provider_load(provider, "panicked");
                Err(resolution_error(RegistryError::ConstructorPanicked(
                    provider.to_string(),
                )))
            }
        }
    }
}

fn resolution_error(err: RegistryError) -> ClientError {
    warn!(error = %err, "provider resolution failed");
    ClientError::translated(ErrorKind::ProviderResolution, codes::PROVIDER_RESOLUTION, err)
}
