//! Validated newtype wrappers for configuration values.
//!
//! Raw strings are rejected at the boundary: every wrapper validates on
//! construction, so downstream code never has to re-check a domain or a
//! credential.

use std::fmt;

use crate::error::ConfigError;

/// The app's client identifier on the platform.
///
/// # Example
///
/// ```rust
/// use stickycart::ApiKey;
///
/// let key = ApiKey::new("my-client-id").unwrap();
/// assert_eq!(key.as_ref(), "my-client-id");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The shared secret used for HMAC verification and token exchange.
///
/// The `Debug` implementation masks the value so the secret cannot land in
/// logs through a stray `{:?}`.
///
/// # Example
///
/// ```rust
/// use stickycart::ApiSecret;
///
/// let secret = ApiSecret::new("shhh").unwrap();
/// assert_eq!(format!("{secret:?}"), "ApiSecret(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecret(String);

impl ApiSecret {
    /// Creates a new validated shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecret`] if the secret is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptyApiSecret);
        }
        Ok(Self(secret))
    }
}

impl AsRef<str> for ApiSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecret(*****)")
    }
}

/// A validated merchant shop domain.
///
/// Accepts either the bare shop name (`my-store`) or the full platform
/// domain (`my-store.myshopify.com`); both normalize to the full form.
/// Anything else is rejected before an outbound URL is ever built from it,
/// which closes the open-redirect path through a crafted `shop` parameter.
///
/// # Example
///
/// ```rust
/// use stickycart::ShopDomain;
///
/// let shop = ShopDomain::new("my-store").unwrap();
/// assert_eq!(shop.as_ref(), "my-store.myshopify.com");
///
/// assert!(ShopDomain::new("evil.example.com/../").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopDomain(String);

impl ShopDomain {
    const SUFFIX: &'static str = ".myshopify.com";

    /// Creates a new validated shop domain, normalizing the bare-name form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the input does not match
    /// the platform's naming pattern.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let input: String = domain.into();
        let normalized = input.trim().to_lowercase();

        let name = match normalized.strip_suffix(Self::SUFFIX) {
            Some(name) => name,
            // A dot without the platform suffix is some other host entirely.
            None if normalized.contains('.') => {
                return Err(ConfigError::InvalidShopDomain { domain: input })
            }
            None => normalized.as_str(),
        };

        if !Self::name_is_valid(name) {
            return Err(ConfigError::InvalidShopDomain { domain: input });
        }

        Ok(if normalized.ends_with(Self::SUFFIX) {
            Self(normalized)
        } else {
            Self(format!("{normalized}{}", Self::SUFFIX))
        })
    }

    // Shop names are lowercase alphanumerics and interior hyphens.
    fn name_is_valid(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('-')
            && !name.ends_with('-')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The externally reachable base URL of this service.
///
/// Must carry an explicit scheme. A trailing slash is trimmed so paths can
/// be appended with plain string formatting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl(String);

impl HostUrl {
    /// Creates a new validated host URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL has no scheme or
    /// no host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url: String = url.into();
        let trimmed = url.trim().trim_end_matches('/');

        let Some((scheme, rest)) = trimmed.split_once("://") else {
            return Err(ConfigError::InvalidHostUrl { url });
        };
        let host_ok = !rest.is_empty() && !rest.starts_with(['/', '?', '#', ':']);
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) || !host_ok {
            return Err(ConfigError::InvalidHostUrl { url });
        }

        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_rejects_empty_string() {
        assert!(matches!(ApiKey::new(""), Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn api_secret_masks_value_in_debug() {
        let secret = ApiSecret::new("super-secret").unwrap();
        let debug = format!("{secret:?}");
        assert_eq!(debug, "ApiSecret(*****)");
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn shop_domain_normalizes_bare_name() {
        let shop = ShopDomain::new("test-shop").unwrap();
        assert_eq!(shop.as_ref(), "test-shop.myshopify.com");
    }

    #[test]
    fn shop_domain_accepts_full_form() {
        let shop = ShopDomain::new("Test-Shop.myshopify.com").unwrap();
        assert_eq!(shop.as_ref(), "test-shop.myshopify.com");
    }

    #[test]
    fn shop_domain_rejects_foreign_hosts() {
        assert!(ShopDomain::new("evil.example.com").is_err());
        assert!(ShopDomain::new("shop.myshopify.com.evil.example").is_err());
    }

    #[test]
    fn shop_domain_rejects_malformed_names() {
        assert!(ShopDomain::new("").is_err());
        assert!(ShopDomain::new("my shop").is_err());
        assert!(ShopDomain::new("my_shop").is_err());
        assert!(ShopDomain::new("-shop").is_err());
        assert!(ShopDomain::new("shop-").is_err());
    }

    #[test]
    fn host_url_accepts_scheme_and_port() {
        let host = HostUrl::new("http://127.0.0.1:3000").unwrap();
        assert_eq!(host.as_ref(), "http://127.0.0.1:3000");
    }

    #[test]
    fn host_url_trims_trailing_slash() {
        let host = HostUrl::new("https://app.example.com/").unwrap();
        assert_eq!(host.as_ref(), "https://app.example.com");
    }

    #[test]
    fn host_url_rejects_missing_scheme_or_host() {
        assert!(HostUrl::new("app.example.com").is_err());
        assert!(HostUrl::new("https://").is_err());
        assert!(HostUrl::new("://app.example.com").is_err());
    }
}
