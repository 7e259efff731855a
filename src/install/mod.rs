//! Installation coordinator: the one-time OAuth handshake per merchant.
//!
//! [`begin_install`] produces the redirect into the platform's authorize
//! page; [`complete_install`] validates the callback, exchanges the
//! authorization code for an access token, triggers webhook registration,
//! and hands the merchant back to the platform's own admin surface.
//!
//! Nothing here persists: the access token lives only for the duration of
//! the flow, and the anti-forgery state is self-authenticating (see
//! [`StateParam`]).

mod state;
pub(crate) mod webhooks;

pub use state::StateParam;
pub use webhooks::REGISTERED_TOPICS;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{AppConfig, ShopDomain};
use crate::verify::{verify_callback_signature, CallbackParams, VerifyError};

/// Errors surfaced by the install flow.
///
/// Each variant corresponds to one contractual HTTP outcome; the mapping to
/// status codes lives in the server layer.
#[derive(Debug, Error)]
pub enum InstallError {
    /// A required callback parameter was absent.
    #[error("missing required parameter '{name}'")]
    MissingParam {
        /// Name of the absent parameter.
        name: &'static str,
    },

    /// The shop parameter does not match the platform's domain pattern.
    #[error("invalid shop domain '{domain}'")]
    InvalidShop {
        /// The rejected input.
        domain: String,
    },

    /// The callback's query HMAC did not verify.
    #[error(transparent)]
    InvalidSignature(#[from] VerifyError),

    /// The state parameter was absent or not one this service issued.
    #[error("state parameter missing or not issued by this service")]
    InvalidState,

    /// The code-for-token exchange failed. Not retried: a used code cannot
    /// be redeemed twice, so recovery means restarting from `/auth`.
    #[error("token exchange failed with status {status}: {message}")]
    TokenExchange {
        /// Upstream HTTP status, `0` for transport errors.
        status: u16,
        /// Upstream error detail.
        message: String,
    },
}

/// An access token obtained from the code exchange.
///
/// Held in memory for the remainder of the install flow only; the `Debug`
/// form is masked like the shared secret's.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    fn new(token: String) -> Self {
        Self(token)
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

/// Result of [`begin_install`]: where to send the merchant.
#[derive(Clone, Debug)]
pub struct BeginInstall {
    /// Full platform authorize URL.
    pub authorize_url: String,
    /// The anti-forgery state embedded in that URL.
    pub state: StateParam,
}

/// Result of [`complete_install`]: the post-install redirect target.
#[derive(Clone, Debug)]
pub struct InstallRedirect {
    /// The platform-hosted admin surface for this app.
    pub location: String,
}

/// Starts the OAuth flow for `shop`.
///
/// Validates the shop domain before any URL is constructed, then builds the
/// authorize URL with client id, scopes, callback URL, and a fresh state.
///
/// # Errors
///
/// [`InstallError::InvalidShop`] when the domain fails validation.
pub fn begin_install(config: &AppConfig, shop: &str) -> Result<BeginInstall, InstallError> {
    let shop = ShopDomain::new(shop).map_err(|_| InstallError::InvalidShop {
        domain: shop.to_string(),
    })?;

    let state = StateParam::issue(config.api_secret().as_ref());
    let redirect_uri = format!("{}/auth/callback", config.host());

    let params = [
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().to_string()),
        ("redirect_uri", redirect_uri),
        ("state", state.to_string()),
    ];
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let authorize_url = format!("https://{}/admin/oauth/authorize?{query}", shop.as_ref());

    info!(shop = %shop, "install flow started");
    Ok(BeginInstall {
        authorize_url,
        state,
    })
}

#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

/// Completes the OAuth flow from the callback query.
///
/// Order is contractual: parameter presence, query-HMAC verification, state
/// verification, shop validation, all before the single outbound token
/// exchange. Webhook registration runs after a token is obtained and is
/// best-effort; its failure never changes the outcome.
///
/// # Errors
///
/// See [`InstallError`]. The token exchange is never retried here.
pub async fn complete_install(
    config: &AppConfig,
    http: &reqwest::Client,
    params: &CallbackParams,
) -> Result<InstallRedirect, InstallError> {
    let shop_param = params
        .get("shop")
        .ok_or(InstallError::MissingParam { name: "shop" })?;
    let code = params
        .get("code")
        .ok_or(InstallError::MissingParam { name: "code" })?;

    verify_callback_signature(params, config.api_secret().as_ref())?;

    match params.get("state") {
        Some(state) if StateParam::verify(state, config.api_secret().as_ref()) => {}
        _ => return Err(InstallError::InvalidState),
    }

    let shop = ShopDomain::new(shop_param).map_err(|_| InstallError::InvalidShop {
        domain: shop_param.to_string(),
    })?;

    let token = exchange_code(config, http, &shop, code).await?;
    info!(shop = %shop, "access token obtained");

    webhooks::register_webhooks(config, http, &shop, &token).await;

    Ok(InstallRedirect {
        location: format!(
            "https://{}/admin/apps/{}",
            shop.as_ref(),
            config.api_key().as_ref()
        ),
    })
}

/// Exchanges the authorization code for an access token.
///
/// A single POST with a bounded timeout (from the shared client); failures
/// are surfaced, not retried.
async fn exchange_code(
    config: &AppConfig,
    http: &reqwest::Client,
    shop: &ShopDomain,
    code: &str,
) -> Result<AccessToken, InstallError> {
    let url = format!(
        "{}/admin/oauth/access_token",
        config.platform_origin_for(shop)
    );
    let body = TokenExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret().as_ref(),
        code,
    };

    let response = http
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| InstallError::TokenExchange {
            status: 0,
            message: format!("transport error: {e}"),
        })?;

    let status = response.status().as_u16();
    if !response.status().is_success() {
        let message = response.text().await.unwrap_or_default();
        warn!(shop = %shop, status, "token exchange rejected");
        return Err(InstallError::TokenExchange { status, message });
    }

    let token: TokenExchangeResponse =
        response
            .json()
            .await
            .map_err(|e| InstallError::TokenExchange {
                status,
                message: format!("malformed token response: {e}"),
            })?;

    Ok(AccessToken::new(token.access_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecret, HostUrl};
    use crate::verify::compute_query_signature;

    fn test_config() -> AppConfig {
        AppConfig::builder()
            .api_key(ApiKey::new("client-id").unwrap())
            .api_secret(ApiSecret::new("shhh").unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap())
            .scopes("write_products".parse().unwrap())
            .build()
            .unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> CallbackParams {
        CallbackParams::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        )
    }

    /// Builds a callback query whose hmac and state are both valid.
    fn signed_callback(config: &AppConfig, shop: &str, code: &str) -> CallbackParams {
        let secret = config.api_secret().as_ref();
        let state = StateParam::issue(secret);
        let unsigned = params(&[("shop", shop), ("code", code), ("state", state.as_ref())]);
        let signature = compute_query_signature(&unsigned.to_signable_string(), secret);
        params(&[
            ("shop", shop),
            ("code", code),
            ("state", state.as_ref()),
            ("hmac", &signature),
        ])
    }

    #[test]
    fn begin_install_builds_authorize_url() {
        let config = test_config();
        let begin = begin_install(&config, "test-shop").unwrap();

        assert!(begin
            .authorize_url
            .starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
        assert!(begin.authorize_url.contains("client_id=client-id"));
        assert!(begin.authorize_url.contains("scope=write_products"));
        assert!(begin.authorize_url.contains(&format!(
            "redirect_uri={}",
            urlencoding::encode("https://app.example.com/auth/callback")
        )));
        assert!(begin.authorize_url.contains(&format!(
            "state={}",
            urlencoding::encode(begin.state.as_ref())
        )));
    }

    #[test]
    fn begin_install_rejects_malformed_shop_before_building_url() {
        let config = test_config();
        let result = begin_install(&config, "evil.example.com");
        assert!(matches!(result, Err(InstallError::InvalidShop { .. })));
    }

    #[tokio::test]
    async fn complete_install_requires_shop_and_code() {
        let config = test_config();
        let http = reqwest::Client::new();

        let missing_code = params(&[("shop", "test.myshopify.com")]);
        let result = complete_install(&config, &http, &missing_code).await;
        assert!(matches!(
            result,
            Err(InstallError::MissingParam { name: "code" })
        ));

        let missing_shop = params(&[("code", "abc")]);
        let result = complete_install(&config, &http, &missing_shop).await;
        assert!(matches!(
            result,
            Err(InstallError::MissingParam { name: "shop" })
        ));
    }

    #[tokio::test]
    async fn complete_install_rejects_bad_signature_before_network() {
        let config = test_config();
        let http = reqwest::Client::new();
        let state = StateParam::issue(config.api_secret().as_ref());
        let bad = params(&[
            ("shop", "test.myshopify.com"),
            ("code", "abc"),
            ("state", state.as_ref()),
            ("hmac", "feedfacefeedface"),
        ]);

        let result = complete_install(&config, &http, &bad).await;
        assert!(matches!(
            result,
            Err(InstallError::InvalidSignature(
                VerifyError::SignatureMismatch
            ))
        ));
    }

    #[tokio::test]
    async fn complete_install_rejects_unissued_state() {
        let config = test_config();
        let http = reqwest::Client::new();
        let secret = config.api_secret().as_ref();

        let unsigned = params(&[
            ("shop", "test.myshopify.com"),
            ("code", "abc"),
            ("state", "not-one-of-ours"),
        ]);
        let signature = compute_query_signature(&unsigned.to_signable_string(), secret);
        let forged_state = params(&[
            ("shop", "test.myshopify.com"),
            ("code", "abc"),
            ("state", "not-one-of-ours"),
            ("hmac", &signature),
        ]);

        let result = complete_install(&config, &http, &forged_state).await;
        assert!(matches!(result, Err(InstallError::InvalidState)));
    }

    #[tokio::test]
    async fn complete_install_surfaces_transport_failure_as_token_exchange_error() {
        // No platform origin override and an unroutable shop: the exchange
        // must fail as a TokenExchange error, after all local checks pass.
        let config = AppConfig::builder()
            .api_key(ApiKey::new("client-id").unwrap())
            .api_secret(ApiSecret::new("shhh").unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap())
            .platform_origin(HostUrl::new("http://127.0.0.1:9").unwrap())
            .build()
            .unwrap();
        let http = reqwest::Client::new();
        let callback = signed_callback(&config, "test.myshopify.com", "abc");

        let result = complete_install(&config, &http, &callback).await;
        assert!(matches!(result, Err(InstallError::TokenExchange { .. })));
    }

    #[test]
    fn access_token_debug_is_masked() {
        let token = AccessToken::new("shpat_abc123".to_string());
        assert_eq!(format!("{token:?}"), "AccessToken(*****)");
    }
}
