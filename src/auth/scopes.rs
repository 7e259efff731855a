//! OAuth scope handling.
//!
//! Scopes arrive as a comma-separated list (environment variable or builder
//! input) and render back to the same form for the authorize URL.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A set of OAuth scopes requested during installation.
///
/// Parsing trims whitespace, drops duplicates, and keeps the set ordered so
/// the rendered form is deterministic.
///
/// # Example
///
/// ```rust
/// use stickycart::AuthScopes;
///
/// let scopes: AuthScopes = "write_products, read_themes".parse().unwrap();
/// assert_eq!(scopes.to_string(), "read_themes,write_products");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no scopes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns `true` if `scope` is in the set.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Returns an iterator over the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();
        for token in s.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if !token
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("scope '{token}' contains invalid characters"),
                });
            }
            scopes.insert(token.to_string());
        }
        Ok(Self { scopes })
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for scope in &self.scopes {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(scope)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts_comma_separated_list() {
        let scopes: AuthScopes = "write_products,read_orders".parse().unwrap();
        assert_eq!(scopes.to_string(), "read_orders,write_products");
    }

    #[test]
    fn trims_whitespace_and_dedupes() {
        let scopes: AuthScopes = " write_products , write_products ".parse().unwrap();
        assert_eq!(scopes.to_string(), "write_products");
    }

    #[test]
    fn empty_string_parses_to_empty_set() {
        let scopes: AuthScopes = "".parse().unwrap();
        assert!(scopes.is_empty());
    }

    #[test]
    fn rejects_invalid_characters() {
        let result: Result<AuthScopes, _> = "write products".parse();
        assert!(matches!(result, Err(ConfigError::InvalidScopes { .. })));
    }

    #[test]
    fn contains_checks_membership() {
        let scopes: AuthScopes = "write_products".parse().unwrap();
        assert!(scopes.contains("write_products"));
        assert!(!scopes.contains("read_orders"));
    }
}
