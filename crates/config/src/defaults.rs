//! Serde default helpers for the master configuration.

/// Matches the production scheduler cadence (10 minutes).
pub fn default_sweep_interval_seconds() -> u64 {
    600
}

pub fn default_run_on_startup() -> bool {
    true
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}
