//! Configuration for the API gateway

use std::env;

/// Configuration for the API gateway
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// Shared secret for gateway webhook signatures
    pub webhook_secret: String,
    /// Currency code passed to the gateway
    pub currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            webhook_secret: env::var("GATEWAY_WEBHOOK_SECRET")
                .unwrap_or_else(|_| "whsec_dev".to_string()),
            currency: env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
        }
    }
}

impl AppConfig {
    /// Create a new configuration using environment variables
    pub fn new() -> Self {
        Self::default()
    }
}
