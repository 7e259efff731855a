//! Webhook registration against the platform's management API.
//!
//! Registration runs after a successful token exchange and is deliberately
//! best-effort: a registration hiccup must not block the merchant's install,
//! so failures land in the log and nowhere else.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{AppConfig, ShopDomain};
use crate::webhooks::WebhookTopic;

use super::AccessToken;

/// Topics registered through the management API.
///
/// The compliance topics (`customers/data_request`, `customers/redact`,
/// `shop/redact`) are absent on purpose: the platform delivers those
/// automatically and rejects manual subscriptions for them.
pub const REGISTERED_TOPICS: &[WebhookTopic] = &[WebhookTopic::AppUninstalled];

#[derive(Serialize)]
struct RegistrationRequest<'a> {
    webhook: RegistrationBody<'a>,
}

#[derive(Serialize)]
struct RegistrationBody<'a> {
    topic: &'a str,
    address: &'a str,
    format: &'static str,
}

/// Registers every topic in [`REGISTERED_TOPICS`] for `shop`.
///
/// One POST per topic, bearer token in the `X-Shopify-Access-Token` header.
/// Each failure is logged and the rest of the list still runs; the install
/// response has already been decided by the time this matters.
pub async fn register_webhooks(
    config: &AppConfig,
    http: &reqwest::Client,
    shop: &ShopDomain,
    token: &AccessToken,
) {
    let url = format!(
        "{}/admin/api/{}/webhooks.json",
        config.platform_origin_for(shop),
        config.api_version()
    );
    let address = config.webhook_address();

    for topic in REGISTERED_TOPICS {
        debug_assert!(
            !topic.is_compliance(),
            "compliance topics are platform-managed and must not be registered"
        );

        let body = RegistrationRequest {
            webhook: RegistrationBody {
                topic: topic.as_str(),
                address: &address,
                format: "json",
            },
        };

        let result = http
            .post(&url)
            .header("X-Shopify-Access-Token", token.as_ref())
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(shop = %shop, topic = topic.as_str(), "webhook registered");
            }
            Ok(response) => {
                warn!(
                    shop = %shop,
                    topic = topic.as_str(),
                    status = response.status().as_u16(),
                    "webhook registration rejected by platform"
                );
            }
            Err(error) => {
                warn!(
                    shop = %shop,
                    topic = topic.as_str(),
                    error = %error,
                    "webhook registration request failed"
                );
            }
        }
    }
}
