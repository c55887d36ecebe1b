use common::Result;
use regex::Regex;
use std::env;
use tracing::{debug, warn};

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("static pattern");
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for caps in re.captures_iter(content) {
        let var_name = caps.get(1).or(caps.get(2)).map(|m| m.as_str()).unwrap_or_default();
        let placeholder = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        if var_name.is_empty() {
            continue;
        }

        match env::var(var_name) {
            Ok(value) => {
                debug!("Substituting environment variable: {} = \"{}\"", var_name, value);
                result = result.replace(placeholder, &value);
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", var_name);
                missing_vars.push(var_name.to_string());
                // Keep the placeholder; the validator reports it later
            }
        }
    }

    if !missing_vars.is_empty() {
        debug!("Environment variables not set: {:?}", missing_vars);
    }

    Ok(result)
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    let re = Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("static pattern");
    re.is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_braced_variable() {
        env::set_var("VAXDIST_TEST_REGION", "north");
        let out = substitute_env_vars("region: ${VAXDIST_TEST_REGION}").unwrap();
        assert_eq!(out, "region: north");
    }

    #[test]
    fn test_missing_variable_keeps_placeholder() {
        env::remove_var("VAXDIST_TEST_MISSING");
        let out = substitute_env_vars("value: ${VAXDIST_TEST_MISSING}").unwrap();
        assert!(has_unresolved_env_vars(&out));
    }

    #[test]
    fn test_plain_content_untouched() {
        let out = substitute_env_vars("interval_seconds: 600").unwrap();
        assert_eq!(out, "interval_seconds: 600");
        assert!(!has_unresolved_env_vars(&out));
    }
}
