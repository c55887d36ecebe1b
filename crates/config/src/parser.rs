use crate::*;
use common::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MasterConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read config file {:?}: {}", path, e)))?;

    debug!("Config file content length: {} bytes", content.len());

    // Perform environment variable substitution
    let substituted = substitution::substitute_env_vars(&content)?;
    debug!("Environment variable substitution completed");

    // Parse YAML
    let config: MasterConfig = serde_yaml::from_str(&substituted)
        .map_err(|e| Error::config(format!("failed to parse YAML configuration: {}", e)))?;

    info!("Configuration loaded successfully");
    Ok(config)
}

#[instrument]
pub fn generate_default_config() -> MasterConfig {
    MasterConfig {
        service: ServiceConfig {
            name: "vaxdist".to_string(),
            description: "Vaccine distribution allocation engine".to_string(),
            version: "1.0.0".to_string(),
        },
        engine: EngineConfig::default(),
        sweeper: SweeperConfig::default(),
        logging: LoggingConfig::default(),
        metrics: MetricsConfig::default(),
    }
}

#[instrument]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &MasterConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| Error::config(format!("failed to serialize configuration: {}", e)))?;

    fs::write(path, yaml)
        .map_err(|e| Error::config(format!("failed to write config file {:?}: {}", path, e)))?;

    info!("Configuration saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = generate_default_config();
        let report = validate_config(&config);
        assert!(report.is_valid(), "default config must validate: {:?}", report.errors);
    }

    #[test]
    fn test_default_config_yaml_roundtrip() {
        let config = generate_default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: MasterConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.service.name, config.service.name);
        assert_eq!(back.sweeper.interval_seconds, config.sweeper.interval_seconds);
        assert_eq!(back.engine.fulfillment_policy, config.engine.fulfillment_policy);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = load_config("/nonexistent/vaxdist.yaml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
