//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::collections::BTreeSet;
use std::env;

/// Default upstream analytics API base URL.
pub const DEFAULT_BASE_URL: &str = "https://mixpanel.com/api";

/// Proxy configuration parameters.
///
/// Credentials have no defaults. Missing credentials do not stop startup;
/// see [`Config::missing_required`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream base URL, without trailing slash
    pub base_url: String,
    /// Project identifier sent with every upstream request
    pub project_id: String,
    /// Service-account username for Basic auth
    pub sa_username: String,
    /// Service-account secret for Basic auth
    pub sa_secret: String,
    /// Permitted event names; empty allows every event
    pub allowed_events: BTreeSet<String>,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MIXPANEL_BASE` - Upstream base URL (default: https://mixpanel.com/api)
    /// - `MIXPANEL_PROJECT_ID` - Project id
    /// - `MIXPANEL_SA_USERNAME` - Service-account username
    /// - `MIXPANEL_SA_SECRET` - Service-account secret
    /// - `ALLOWED_EVENTS` - Comma-separated allow-list (default: empty, allow all)
    /// - `PORT` - HTTP server port (default: 8080)
    pub fn from_env() -> Self {
        Self {
            base_url: normalize_base_url(
                &env::var("MIXPANEL_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            ),
            project_id: trimmed_var("MIXPANEL_PROJECT_ID"),
            sa_username: trimmed_var("MIXPANEL_SA_USERNAME"),
            sa_secret: trimmed_var("MIXPANEL_SA_SECRET"),
            allowed_events: parse_allowed_events(
                &env::var("ALLOWED_EVENTS").unwrap_or_default(),
            ),
            server_port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        }
    }

    // == Missing Required ==
    /// Names of required settings that are empty.
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("MIXPANEL_BASE", &self.base_url),
            ("MIXPANEL_PROJECT_ID", &self.project_id),
            ("MIXPANEL_SA_USERNAME", &self.sa_username),
            ("MIXPANEL_SA_SECRET", &self.sa_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: String::new(),
            sa_username: String::new(),
            sa_secret: String::new(),
            allowed_events: BTreeSet::new(),
            server_port: 8080,
        }
    }
}

fn trimmed_var(name: &str) -> String {
    env::var(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Splits a comma-separated list, dropping blanks and surrounding whitespace.
pub fn parse_allowed_events(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(String::from)
        .collect()
}
