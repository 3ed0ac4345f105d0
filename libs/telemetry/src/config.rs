use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub json_logs: bool,
    /// Filter directive used when `RUST_LOG` is unset or invalid.
    pub default_directive: String,
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str) -> Self {
        Self::from_lookup(default_service_name, |key| env::var(key).ok())
    }

    fn from_lookup<F>(default_service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_name =
            lookup("MQC_SERVICE_NAME").unwrap_or_else(|| default_service_name.to_string());
        let json_logs = lookup("LOG_FORMAT")
            .map(|v| !matches!(v.to_lowercase().as_str(), "text" | "pretty" | "plain"))
            .unwrap_or(false);
        let default_directive = lookup("MQC_LOG_LEVEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".into());

        Self {
            service_name,
            json_logs,
            default_directive,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> TelemetryConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TelemetryConfig::from_lookup("mqc-probe", |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_text_logs_at_info() {
        let cfg = config(&[]);
        assert_eq!(cfg.service_name, "mqc-probe");
        assert!(!cfg.json_logs);
        assert_eq!(cfg.default_directive, "info");
    }

    #[test]
    fn log_format_selects_json() {
        assert!(config(&[("LOG_FORMAT", "json")]).json_logs);
        assert!(!config(&[("LOG_FORMAT", "Pretty")]).json_logs);
    }

    #[test]
    fn overrides_are_respected() {
        let cfg = config(&[("MQC_SERVICE_NAME", "billing"), ("MQC_LOG_LEVEL", "debug")]);
        assert_eq!(cfg.service_name, "billing");
        assert_eq!(cfg.default_directive, "debug");
    }
}
