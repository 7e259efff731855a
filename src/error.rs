//! Configuration error types.
//!
//! All configuration constructors return `Result<T, ConfigError>` so that a
//! misconfigured process fails at startup instead of serving unauthenticated
//! traffic.
//!
//! # Example
//!
//! ```rust
//! use stickycart::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building or loading the application
/// configuration.
///
/// Every variant is fatal at startup: the server must refuse to start
/// rather than run without credentials.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key (client identifier) cannot be empty.
    #[error("API key cannot be empty. Set SHOPIFY_API_KEY to the app's client id.")]
    EmptyApiKey,

    /// API secret key cannot be empty.
    #[error("API secret cannot be empty. Set SHOPIFY_API_SECRET to the app's shared secret.")]
    EmptyApiSecret,

    /// Shop domain does not match the platform's naming pattern.
    #[error("Invalid shop domain '{domain}'. Expected 'shop-name' or 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Expected a URL with scheme, e.g. 'https://stickycart.example.com'.")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// OAuth scope list is invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// Why the scope list was rejected.
        reason: String,
    },

    /// A required environment variable is missing.
    #[error("Missing required environment variable '{name}'. The server refuses to start without it.")]
    MissingEnv {
        /// The name of the missing variable.
        name: &'static str,
    },

    /// A required builder field was never set.
    #[error("Missing required configuration field '{field}'.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
