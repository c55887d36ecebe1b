use crate::*;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Service name is required")]
    MissingServiceName,

    #[error("Service description is required")]
    MissingServiceDescription,

    #[error("Invalid version format: {0}. Must be in format X.Y.Z (e.g., 1.0.0)")]
    InvalidVersionFormat(String),

    #[error("Sweeper interval_seconds must be a positive integer")]
    InvalidSweepInterval,

    #[error("Invalid logging format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Metrics port must not be 0 when metrics are enabled")]
    InvalidMetricsPort,
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a loaded configuration and produce a report of errors, warnings
/// and applied defaults.
pub fn validate_config(config: &MasterConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_service(&config.service, &mut report);
    validate_sweeper(&config.sweeper, &mut report);
    validate_logging(&config.logging, &mut report);
    validate_metrics(&config.metrics, &mut report);

    report
}

fn validate_service(service: &ServiceConfig, report: &mut ValidationReport) {
    if service.name.trim().is_empty() {
        report.errors.push(ValidationError::MissingServiceName);
    }
    if service.description.trim().is_empty() {
        report.errors.push(ValidationError::MissingServiceDescription);
    }
    if !is_semver_like(&service.version) {
        report
            .errors
            .push(ValidationError::InvalidVersionFormat(service.version.clone()));
    }
}

fn validate_sweeper(sweeper: &SweeperConfig, report: &mut ValidationReport) {
    if sweeper.interval_seconds == 0 {
        report.errors.push(ValidationError::InvalidSweepInterval);
    } else if sweeper.interval_seconds < 60 {
        report.warnings.push(ValidationWarning {
            field: "sweeper.interval_seconds".to_string(),
            message: format!(
                "interval of {}s is unusually short; sweeps contend with allocation passes",
                sweeper.interval_seconds
            ),
        });
    }
    if sweeper.interval_seconds == default_sweep_interval_seconds() {
        report.defaults_applied.push(DefaultApplied {
            field: "sweeper.interval_seconds".to_string(),
            value: default_sweep_interval_seconds().to_string(),
        });
    }
}

fn validate_logging(logging: &LoggingConfig, report: &mut ValidationReport) {
    match logging.format.to_lowercase().as_str() {
        "pretty" | "json" | "compact" => {}
        other => report
            .errors
            .push(ValidationError::InvalidLogFormat(other.to_string())),
    }
}

fn validate_metrics(metrics: &MetricsConfig, report: &mut ValidationReport) {
    if metrics.enabled && metrics.port == 0 {
        report.errors.push(ValidationError::InvalidMetricsPort);
    }
}

fn is_semver_like(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
