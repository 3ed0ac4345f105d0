//! Provider resolution and transport contracts shared by the connection core.
//!
//! Vendors register a constructor under a provider id at startup; [`ProviderRegistry::load`]
//! turns a [`ProviderConfig`] into a [`FactoryHandle`] exposing only connection creation.

pub mod config;
pub mod errors;
#[cfg(feature = "loopback")]
pub mod loopback;
pub mod metadata;
pub mod registry;
pub mod transport;

pub use config::{ConfigError, FactoryProperties, ProviderConfig};
pub use errors::TransportError;
pub use metadata::ConnectionMetaData;
pub use registry::{FactoryHandle, ProviderRegistry, RegistryError};
pub use transport::{Connection, ConnectionFactory, Session, XaResource, XaSession};
