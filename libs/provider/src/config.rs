use std::collections::BTreeMap;
use std::ffi::OsString;

use serde::{Deserialize, Serialize};

pub const PROVIDER_KEY: &str = "providerClassName";
pub const HOST_KEY: &str = "host";
pub const PORT_KEY: &str = "port";
pub const DRIVER_NAME_KEY: &str = "driverName";
/// Key under which the composed `tcp://host:port` target is handed to the provider.
pub const MESSAGE_CHANNELS_KEY: &str = "messageChannels";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "50607";

const ENV_PROVIDER: &str = "MQC_PROVIDER";
const ENV_HOST: &str = "MQC_HOST";
const ENV_PORT: &str = "MQC_PORT";
const ENV_PROPERTY_PREFIX: &str = "MQC_PROP_";

/// Errors produced while reading or validating provider configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("provider config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("provider config is invalid: {0}")]
    Invalid(String),
    #[error("port `{0}` is not a valid TCP port")]
    InvalidPort(String),
}

/// Provider selection plus the property bag handed to it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "providerClassName")]
    pub provider: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ProviderConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Parses and validates a config from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ProviderConfig = serde_json::from_str(content)?;
        config.ensure_valid()?;
        Ok(config)
    }

    /// Builds a config from a flat property bag where `providerClassName` names the provider
    /// and every other key is passed through.
    pub fn from_properties(properties: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut properties = properties.clone();
        let provider = properties.remove(PROVIDER_KEY).unwrap_or_default();
        let config = Self {
            provider,
            properties,
        };
        config.ensure_valid()?;
        Ok(config)
    }

    /// Reads `MQC_PROVIDER`, `MQC_HOST`, `MQC_PORT` and `MQC_PROP_<key>` passthrough entries.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Like [`ProviderConfig::from_vars`], skipping entries whose key or value is not UTF-8.
    pub fn from_os_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        Self::from_vars(vars.into_iter().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            match key.as_str() {
                ENV_PROVIDER => config.provider = value,
                ENV_HOST => {
                    config.properties.insert(HOST_KEY.into(), value);
                }
                ENV_PORT => {
                    config.properties.insert(PORT_KEY.into(), value);
                }
                _ => {
                    if let Some(name) = key.strip_prefix(ENV_PROPERTY_PREFIX) {
                        if !name.is_empty() {
                            config.properties.insert(name.to_string(), value);
                        }
                    }
                }
            }
        }
        config.ensure_valid()?;
        Ok(config)
    }

    fn ensure_valid(&self) -> Result<(), ConfigError> {
        if self.provider.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{PROVIDER_KEY} must not be empty"
            )));
        }
        Ok(())
    }

    /// Builds the construction properties handed to the provider.
    ///
    /// Passthrough keys are copied verbatim. `host` and `port` fall back to their defaults when
    /// absent or blank, `driverName` defaults to the provider id, and `messageChannels` is always
    /// set to the composed `tcp://host:port` target. The port must parse as a non-zero TCP port
    /// but is kept in the target as written.
    pub fn factory_properties(&self) -> Result<FactoryProperties, ConfigError> {
        let mut values = self.properties.clone();
        let host = non_blank(&values, HOST_KEY).unwrap_or(DEFAULT_HOST).to_string();
        let port_raw = non_blank(&values, PORT_KEY).unwrap_or(DEFAULT_PORT).to_string();
        let port = port_raw
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| ConfigError::InvalidPort(port_raw.clone()))?;

        values
            .entry(DRIVER_NAME_KEY.to_string())
            .or_insert_with(|| self.provider.clone());
        values.insert(
            MESSAGE_CHANNELS_KEY.to_string(),
            format!("tcp://{host}:{port_raw}"),
        );
        values.insert(HOST_KEY.to_string(), host.clone());
        values.insert(PORT_KEY.to_string(), port_raw);

        Ok(FactoryProperties { values, host, port })
    }
}

fn non_blank<'a>(values: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    values
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Resolved construction properties for one provider instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FactoryProperties {
    values: BTreeMap<String, String>,
    host: String,
    port: u16,
}

impl FactoryProperties {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parses `key` the way boolean connection flags are read: only a case-insensitive `true`,
    /// with no surrounding whitespace, enables the flag.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The `tcp://host:port` connection target.
    pub fn target(&self) -> &str {
        self.get(MESSAGE_CHANNELS_KEY).unwrap_or_default()
    }
}
