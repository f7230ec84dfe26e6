use crate::models::ModelConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a config before it is saved. Every problem is reported, not just the first.
pub fn validate_model_config(config: &ModelConfig) -> ValidationReport {
    let mut errors = Vec::new();

    if config.base_url.trim().is_empty() {
        errors.push("API base URL must not be empty".to_string());
    } else if !is_valid_url(&config.base_url) {
        errors.push("API base URL must start with http:// or https://".to_string());
    }

    if config.api_token.trim().is_empty() {
        errors.push("API token must not be empty".to_string());
    }

    if config.model_name.trim().is_empty() {
        errors.push("Model name must not be empty".to_string());
    }

    ValidationReport { errors }
}

/// `^https?://.+`, case-insensitive.
pub fn is_valid_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

/// `#RGB` or `#RRGGBB`.
pub fn is_valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = ModelConfig::new("https://api.example.com", "sk", "model");
        assert!(validate_model_config(&config).is_valid());
    }

    #[test]
    fn test_reports_every_problem() {
        let report = validate_model_config(&ModelConfig::new("  ", "", " "));
        assert_eq!(report.errors.len(), 3);

        let report = validate_model_config(&ModelConfig::new("ftp://x", "sk", "m"));
        assert_eq!(
            report.errors,
            vec!["API base URL must start with http:// or https://".to_string()]
        );
    }

    #[test]
    fn test_urls() {
        assert!(is_valid_url("HTTPS://API.EXAMPLE.COM"));
        assert!(is_valid_url("http://localhost:8080"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("api.example.com"));
    }

    #[test]
    fn test_colors() {
        assert!(is_valid_color("#6366F1"));
        assert!(is_valid_color("#abc"));
        assert!(!is_valid_color("6366F1"));
        assert!(!is_valid_color("#6366F"));
        assert!(!is_valid_color("#GGGGGG"));
    }
}
