//! Client configuration

use std::fmt;

/// Default Blink GraphQL endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.blink.sv/graphql";

/// Configuration for a [`BlinkClient`](crate::client::BlinkClient).
///
/// Holds the API key and endpoint; constructed once and passed into the
/// client rather than read from ambient process state.
#[derive(Clone)]
pub struct Config {
    /// Blink API key, sent as the `X-API-KEY` header on every request
    pub api_key: String,
    /// GraphQL endpoint URL
    pub endpoint: String,
}

impl Config {
    /// Create a config for the production Blink endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Override the GraphQL endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
