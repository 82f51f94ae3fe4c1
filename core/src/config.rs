//! Client configuration.
//!
//! Every field has a default, so a config can be deserialized from a partial
//! JSON document or built with the setters.

use serde::Deserialize;

use crate::error::FetchError;

/// Upper bound on redirects followed by a single fetch.
pub const DEFAULT_MAX_REDIRECTS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Base against which relative fetch URLs are resolved.
    pub base_url: Option<String>,
    pub max_redirects: u32,
    /// Sent with every request unless the request sets the same header.
    pub default_headers: Vec<(String, String)>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            default_headers: Vec::new(),
        }
    }
}

impl FetchConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Resolve `url` against `base_url`. Absolute URLs pass through.
    pub(crate) fn resolve(&self, url: &str) -> Result<url::Url, FetchError> {
        match &self.base_url {
            Some(base) => {
                let base = url::Url::parse(base).map_err(|e| FetchError::invalid_url(base, e))?;
                base.join(url).map_err(|e| FetchError::invalid_url(url, e))
            }
            None => url::Url::parse(url).map_err(|e| FetchError::invalid_url(url, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.max_redirects, 20);
        assert!(config.base_url.is_none());
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = FetchConfig::from_json(r#"{"base_url":"http://localhost:3000"}"#).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);

        let config =
            FetchConfig::from_json(r#"{"max_redirects":3,"default_headers":[["Accept","*/*"]]}"#).unwrap();
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.default_headers, vec![("Accept".to_string(), "*/*".to_string())]);
    }

    #[test]
    fn resolves_relative_urls_against_base() {
        let config = FetchConfig::default().base_url("http://localhost:3000/app/");
        assert_eq!(config.resolve("/hello").unwrap().as_str(), "http://localhost:3000/hello");
        assert_eq!(config.resolve("json").unwrap().as_str(), "http://localhost:3000/app/json");
        assert_eq!(
            config.resolve("http://other.test/x").unwrap().as_str(),
            "http://other.test/x"
        );
    }

    #[test]
    fn relative_url_without_base_is_an_error() {
        let err = FetchConfig::default().resolve("/hello").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
