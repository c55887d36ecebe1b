use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Top-level configuration for the distribution service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MasterConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Service identity metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

/// Allocation engine behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// How an allocation pass commits supply to orders.
    #[serde(default)]
    pub fulfillment_policy: FulfillmentPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fulfillment_policy: FulfillmentPolicy::default(),
        }
    }
}

/// Commitment strategy for an allocation pass.
///
/// `AllOrNothing` is the canonical policy: an order is only touched when its
/// full remaining need can be covered in one pass. `Partial` consumes
/// whatever eligible excess exists and leaves the order open until complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentPolicy {
    #[default]
    AllOrNothing,
    Partial,
}

impl std::fmt::Display for FulfillmentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentPolicy::AllOrNothing => write!(f, "all_or_nothing"),
            FulfillmentPolicy::Partial => write!(f, "partial"),
        }
    }
}

/// Expiry sweeper scheduling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweeperConfig {
    /// Seconds between expiry sweeps.
    #[serde(default = "default_sweep_interval_seconds")]
    pub interval_seconds: u64,
    /// Run one sweep immediately on startup.
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_sweep_interval_seconds(),
            run_on_startup: default_run_on_startup(),
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Output format: pretty, json, or compact.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfillment_policy_default() {
        assert_eq!(FulfillmentPolicy::default(), FulfillmentPolicy::AllOrNothing);
    }

    #[test]
    fn test_minimal_yaml_applies_defaults() {
        let yaml = r#"
service:
  name: vaxdist
  description: Vaccine distribution engine
  version: 1.0.0
"#;
        let config: MasterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sweeper.interval_seconds, 600);
        assert!(config.sweeper.run_on_startup);
        assert_eq!(config.engine.fulfillment_policy, FulfillmentPolicy::AllOrNothing);
        assert_eq!(config.logging.format, "pretty");
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_policy_parses_snake_case() {
        let yaml = r#"
service:
  name: vaxdist
  description: d
  version: 1.0.0
engine:
  fulfillment_policy: partial
"#;
        let config: MasterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.engine.fulfillment_policy, FulfillmentPolicy::Partial);
    }
}
