//! Remote store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{StoreError, StoreResult};

/// Default backend base URL.
///
/// Overridable at compile time so packaged builds can point at a different
/// project without code changes.
pub const DEFAULT_API_URL: &str = match option_env!("LINEUP_API_URL") {
    Some(url) => url,
    None => "https://roster.example-project.supabase.co",
};

/// Default publishable API key (compile-time overridable).
pub const DEFAULT_ANON_KEY: &str = match option_env!("LINEUP_ANON_KEY") {
    Some(key) => key,
    None => "dev-anon-key",
};

/// Collection holding the roster documents.
///
/// The deployed schema predates this client and keeps its Spanish name.
pub const DEFAULT_COLLECTION: &str = "Jugadores";

/// Configuration for the remote roster store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend base URL, e.g. `https://project.supabase.co`.
    pub api_url: String,
    /// Publishable API key sent with every request.
    pub anon_key: String,
    /// Collection (table) holding the roster documents.
    pub collection: String,
    /// Interval between live-feed heartbeats.
    pub heartbeat_interval: Duration,
    /// First reconnect delay; doubles per failed attempt.
    pub reconnect_base_delay: Duration,
    /// Ceiling for the reconnect delay.
    pub reconnect_max_delay: Duration,
    /// Reconnect attempts before the live feed gives up.
    pub max_reconnect_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            anon_key: DEFAULT_ANON_KEY.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            heartbeat_interval: Duration::from_secs(30),
            reconnect_base_delay: Duration::from_secs(2),
            reconnect_max_delay: Duration::from_secs(30),
            max_reconnect_attempts: 10,
        }
    }
}

impl StoreConfig {
    /// Creates a config for the given backend, defaults elsewhere.
    pub fn new(api_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            anon_key: anon_key.into(),
            ..Self::default()
        }
    }

    /// Checks the config is usable before any network call is made.
    pub fn validate(&self) -> StoreResult<()> {
        let url = Url::parse(&self.api_url).map_err(|e| {
            StoreError::Config(format!("invalid API URL '{}': {}", self.api_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(StoreError::Config(format!(
                "API URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(StoreError::Config("anon key is empty".to_string()));
        }
        if self.collection.trim().is_empty() {
            return Err(StoreError::Config("collection name is empty".to_string()));
        }
        Ok(())
    }

    /// REST endpoint for the roster collection.
    pub fn rest_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.api_url.trim_end_matches('/'),
            self.collection
        )
    }

    /// Auth endpoint for the given action (`token`, `logout`).
    pub fn auth_url(&self, action: &str) -> String {
        format!("{}/auth/v1/{}", self.api_url.trim_end_matches('/'), action)
    }

    /// Live-feed WebSocket URL derived from the API URL.
    pub fn feed_url(&self) -> StoreResult<String> {
        let url = Url::parse(&self.api_url).map_err(|e| {
            StoreError::Config(format!("invalid API URL '{}': {}", self.api_url, e))
        })?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(StoreError::Config(format!(
                    "cannot derive feed URL from scheme '{}'",
                    other
                )))
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| StoreError::Config("API URL has no host".to_string()))?;
        let port = match url.port() {
            Some(port) => format!(":{}", port),
            None => String::new(),
        };
        Ok(format!(
            "{}://{}{}/feed/v1?apikey={}",
            scheme, host, port, self.anon_key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StoreConfig {
        StoreConfig::new("https://roster.example.co", "test-anon-key")
    }

    #[test]
    fn defaults_validate() {
        assert!(StoreConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unparsable_url() {
        let cfg = StoreConfig::new("not a url", "key");
        assert!(matches!(cfg.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let cfg = StoreConfig::new("ftp://roster.example.co", "key");
        assert!(matches!(cfg.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn rejects_blank_anon_key() {
        let cfg = StoreConfig::new("https://roster.example.co", "   ");
        assert!(matches!(cfg.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn rejects_blank_collection() {
        let mut cfg = config();
        cfg.collection = "".to_string();
        assert!(matches!(cfg.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn rest_url_includes_collection() {
        let cfg = config();
        assert_eq!(
            cfg.rest_url(),
            "https://roster.example.co/rest/v1/Jugadores"
        );
    }

    #[test]
    fn rest_url_tolerates_trailing_slash() {
        let cfg = StoreConfig::new("https://roster.example.co/", "key");
        assert_eq!(
            cfg.rest_url(),
            "https://roster.example.co/rest/v1/Jugadores"
        );
    }

    #[test]
    fn auth_url_shape() {
        let cfg = config();
        assert_eq!(
            cfg.auth_url("token"),
            "https://roster.example.co/auth/v1/token"
        );
        assert_eq!(
            cfg.auth_url("logout"),
            "https://roster.example.co/auth/v1/logout"
        );
    }

    #[test]
    fn feed_url_swaps_scheme() {
        let cfg = config();
        assert_eq!(
            cfg.feed_url().unwrap(),
            "wss://roster.example.co/feed/v1?apikey=test-anon-key"
        );

        let plain = StoreConfig::new("http://localhost:54321", "key");
        assert_eq!(
            plain.feed_url().unwrap(),
            "ws://localhost:54321/feed/v1?apikey=key"
        );
    }
}
