// src/config.rs
use crate::errors::{CoachError, Result};
use crate::extractor::{DEFAULT_DESCRIPTION_SELECTOR, DEFAULT_TITLE_SELECTOR, Extractor};

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";

/// Where the analysis service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CoachError::Config(format!(
                "service url must start with http:// or https://, got '{}'",
                base_url
            )));
        }
        Ok(Self {
            base_url: base_url.to_string(),
        })
    }
}

/// Selectors used to find the problem on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    pub title: String,
    pub description: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE_SELECTOR.to_string(),
            description: DEFAULT_DESCRIPTION_SELECTOR.to_string(),
        }
    }
}

impl SelectorConfig {
    pub fn extractor(&self) -> Extractor {
        Extractor::new(&self.title, &self.description)
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub selectors: SelectorConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so it can be fed
    /// something other than the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let service = match lookup("LEETCOACH_SERVICE_URL") {
            Some(url) => ServiceConfig::new(&url)?,
            None => ServiceConfig::default(),
        };

        let defaults = SelectorConfig::default();
        let selectors = SelectorConfig {
            title: non_empty(lookup("LEETCOACH_TITLE_SELECTOR")).unwrap_or(defaults.title),
            description: non_empty(lookup("LEETCOACH_DESCRIPTION_SELECTOR"))
                .unwrap_or(defaults.description),
        };

        Ok(AppConfig { service, selectors })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.service.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.selectors.title, DEFAULT_TITLE_SELECTOR);
        assert_eq!(config.selectors.description, DEFAULT_DESCRIPTION_SELECTOR);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("LEETCOACH_SERVICE_URL", "http://localhost:9000/"),
            ("LEETCOACH_TITLE_SELECTOR", "h1.title"),
            ("LEETCOACH_DESCRIPTION_SELECTOR", "  "),
        ]))
        .unwrap();
        assert_eq!(config.service.base_url, "http://localhost:9000");
        assert_eq!(config.selectors.title, "h1.title");
        assert_eq!(config.selectors.description, DEFAULT_DESCRIPTION_SELECTOR);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = AppConfig::from_lookup(lookup(&[("LEETCOACH_SERVICE_URL", "127.0.0.1:8000")]))
            .unwrap_err();
        assert!(matches!(err, CoachError::Config(_)));
    }
}
