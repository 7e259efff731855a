//! Application configuration.
//!
//! Configuration is an explicit immutable value built once at startup and
//! passed by reference into every component. Nothing in request-handling
//! code reads the process environment, which keeps handlers unit-testable
//! without environment mutation.
//!
//! # Example
//!
//! ```rust
//! use stickycart::{ApiKey, ApiSecret, AppConfig, HostUrl};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("client-id").unwrap())
//!     .api_secret(ApiSecret::new("shared-secret").unwrap())
//!     .host(HostUrl::new("https://stickycart.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.api_version(), stickycart::config::DEFAULT_API_VERSION);
//! ```

mod newtypes;

pub use newtypes::{ApiKey, ApiSecret, HostUrl, ShopDomain};

use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Platform API version used for webhook registration calls.
pub const DEFAULT_API_VERSION: &str = "2024-07";

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &str = "write_products";

/// Immutable process-wide configuration.
///
/// `AppConfig` is `Clone + Send + Sync`; the shared secret inside it is the
/// only state shared across concurrent requests, and it is read-only.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_key: ApiKey,
    api_secret: ApiSecret,
    host: HostUrl,
    scopes: AuthScopes,
    api_version: String,
    platform_origin: Option<HostUrl>,
}

// Compile-time check that the config can be shared across tasks.
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

impl AppConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Loads configuration from the process environment.
    ///
    /// Recognized variables: `SHOPIFY_API_KEY`, `SHOPIFY_API_SECRET`, `HOST`
    /// (all required), `SCOPES` (comma-separated, default
    /// [`DEFAULT_SCOPES`]), `SHOPIFY_API_VERSION` (default
    /// [`DEFAULT_API_VERSION`]).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or any
    /// value fails validation. Callers must treat this as startup-fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            std::env::var(name).map_err(|_| ConfigError::MissingEnv { name })
        };

        let api_key = ApiKey::new(require("SHOPIFY_API_KEY")?)?;
        let api_secret = ApiSecret::new(require("SHOPIFY_API_SECRET")?)?;
        let host = HostUrl::new(require("HOST")?)?;
        let scopes: AuthScopes = std::env::var("SCOPES")
            .unwrap_or_else(|_| DEFAULT_SCOPES.to_string())
            .parse()?;
        let api_version =
            std::env::var("SHOPIFY_API_VERSION").unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        Self::builder()
            .api_key(api_key)
            .api_secret(api_secret)
            .host(host)
            .scopes(scopes)
            .api_version(api_version)
            .build()
    }

    /// Returns the client identifier.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the shared secret.
    #[must_use]
    pub const fn api_secret(&self) -> &ApiSecret {
        &self.api_secret
    }

    /// Returns this service's public base URL.
    #[must_use]
    pub const fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Returns the requested OAuth scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the platform API version string.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Returns the origin for outbound platform calls for `shop`.
    ///
    /// This is `https://{shop}` unless a platform origin override is
    /// configured (integration tests point this at a local mock server).
    #[must_use]
    pub fn platform_origin_for(&self, shop: &ShopDomain) -> String {
        match &self.platform_origin {
            Some(origin) => origin.as_ref().to_string(),
            None => format!("https://{}", shop.as_ref()),
        }
    }

    /// Returns the public webhook endpoint registered with the platform.
    #[must_use]
    pub fn webhook_address(&self) -> String {
        format!("{}/webhooks", self.host.as_ref())
    }
}

/// Builder for [`AppConfig`].
///
/// `api_key`, `api_secret`, and `host` are required; everything else has a
/// default.
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret: Option<ApiSecret>,
    host: Option<HostUrl>,
    scopes: Option<AuthScopes>,
    api_version: Option<String>,
    platform_origin: Option<HostUrl>,
}

impl AppConfigBuilder {
    /// Sets the client identifier (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the shared secret (required).
    #[must_use]
    pub fn api_secret(mut self, secret: ApiSecret) -> Self {
        self.api_secret = Some(secret);
        self
    }

    /// Sets the public base URL of this service (required).
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the requested OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the platform API version string.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Overrides the `https://{shop}` origin for outbound platform calls.
    ///
    /// Integration tests use this to point token exchange and webhook
    /// registration at a local mock server.
    #[must_use]
    pub fn platform_origin(mut self, origin: HostUrl) -> Self {
        self.platform_origin = Some(origin);
        self
    }

    /// Builds the [`AppConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key`,
    /// `api_secret`, or `host` was never set.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret = self
            .api_secret
            .ok_or(ConfigError::MissingRequiredField { field: "api_secret" })?;
        let host = self
            .host
            .ok_or(ConfigError::MissingRequiredField { field: "host" })?;

        Ok(AppConfig {
            api_key,
            api_secret,
            host,
            scopes: self
                .scopes
                .unwrap_or_else(|| DEFAULT_SCOPES.parse().unwrap_or_default()),
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            platform_origin: self.platform_origin,
        })
    }
}
