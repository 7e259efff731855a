//! Inbound webhook deliveries: topics, verification, and dispatch.
//!
//! A delivery enters as a [`RawDelivery`] holding the body bytes exactly as
//! received. The only way to reach a [`VerifiedDelivery`], and therefore
//! the only way to parse the payload, is [`RawDelivery::verify`], which
//! consumes the raw form. That makes the verify-before-parse ordering a
//! property of the types rather than of caller discipline.
//!
//! Dispatch acknowledges every verified delivery immediately. Compliance
//! topics get nothing but the acknowledgment; other topics hand the payload
//! to a [`WebhookProcessor`] on a spawned task whose failures terminate in
//! the log, never in the HTTP response.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::verify::{verify_webhook_signature, VerifyError};

/// Header carrying the base64 HMAC-SHA256 signature of the raw body.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// Header carrying the delivery topic, e.g. `app/uninstalled`.
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// Header carrying the originating shop domain.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// Known delivery topics.
///
/// The string forms use the platform's exact casing; a mismatch here would
/// silently break compliance callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WebhookTopic {
    /// Merchant requested a customer's stored data.
    CustomersDataRequest,
    /// Customer asked for their data to be erased.
    CustomersRedact,
    /// Shop closed; all shop data must be erased.
    ShopRedact,
    /// Merchant uninstalled the app.
    AppUninstalled,
}

impl WebhookTopic {
    /// Parses the topic header value. Unknown topics yield `None` and are
    /// still acknowledged by the dispatcher.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customers/data_request" => Some(Self::CustomersDataRequest),
            "customers/redact" => Some(Self::CustomersRedact),
            "shop/redact" => Some(Self::ShopRedact),
            "app/uninstalled" => Some(Self::AppUninstalled),
            _ => None,
        }
    }

    /// The platform's wire form of this topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomersDataRequest => "customers/data_request",
            Self::CustomersRedact => "customers/redact",
            Self::ShopRedact => "shop/redact",
            Self::AppUninstalled => "app/uninstalled",
        }
    }

    /// Whether this is one of the mandatory data-compliance topics, which
    /// must be acknowledged with zero downstream dependency.
    #[must_use]
    pub const fn is_compliance(self) -> bool {
        matches!(
            self,
            Self::CustomersDataRequest | Self::CustomersRedact | Self::ShopRedact
        )
    }
}

/// Errors from webhook handling after verification.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error(transparent)]
    Verification(#[from] VerifyError),

    /// The verified payload was not valid JSON.
    #[error("webhook payload is not valid JSON: {message}")]
    PayloadParse {
        /// Parser detail.
        message: String,
    },

    /// Deferred processing failed; logged only, never surfaced over HTTP.
    #[error("deferred webhook processing failed: {message}")]
    Processing {
        /// Processor detail.
        message: String,
    },
}

/// An inbound delivery before signature verification.
///
/// Carries the body as the exact byte sequence received. There is no
/// payload accessor here on purpose.
#[derive(Debug, Clone)]
pub struct RawDelivery {
    body: Vec<u8>,
    hmac: Option<String>,
    topic: Option<String>,
    shop_domain: Option<String>,
}

impl RawDelivery {
    /// Builds a delivery from the raw body and the relevant header values.
    #[must_use]
    pub fn new(
        body: Vec<u8>,
        hmac: Option<String>,
        topic: Option<String>,
        shop_domain: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac,
            topic,
            shop_domain,
        }
    }

    /// Returns the topic header value, for rejection logging.
    #[must_use]
    pub fn topic_header(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Verifies the signature over the raw body and, on success, converts
    /// into a [`VerifiedDelivery`]. Consumes `self`: there is no way back
    /// to the unverified form.
    ///
    /// # Errors
    ///
    /// [`VerifyError`] when the signature is absent or does not match.
    pub fn verify(self, secret: &str) -> Result<VerifiedDelivery, VerifyError> {
        verify_webhook_signature(&self.body, self.hmac.as_deref(), secret)?;

        let topic_raw = self.topic.unwrap_or_default();
        Ok(VerifiedDelivery {
            topic: WebhookTopic::parse(&topic_raw),
            topic_raw,
            shop_domain: self.shop_domain,
            body: self.body,
        })
    }
}

/// A delivery whose signature has been verified.
///
/// Only this type exposes the payload.
#[derive(Debug, Clone)]
pub struct VerifiedDelivery {
    topic: Option<WebhookTopic>,
    topic_raw: String,
    shop_domain: Option<String>,
    body: Vec<u8>,
}

impl VerifiedDelivery {
    /// Returns the parsed topic, `None` for unknown topics.
    #[must_use]
    pub fn topic(&self) -> Option<WebhookTopic> {
        self.topic
    }

    /// Returns the topic header value as received.
    #[must_use]
    pub fn topic_raw(&self) -> &str {
        &self.topic_raw
    }

    /// Returns the originating shop domain, if the header was present.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    /// Parses the payload as JSON.
    ///
    /// Available only after verification, so parsing can never precede the
    /// signature check.
    ///
    /// # Errors
    ///
    /// [`WebhookError::PayloadParse`] when the body is not valid JSON.
    pub fn payload(&self) -> Result<serde_json::Value, WebhookError> {
        serde_json::from_slice(&self.body).map_err(|e| WebhookError::PayloadParse {
            message: e.to_string(),
        })
    }
}

/// Deferred handling for acknowledged deliveries.
///
/// Implementations must be idempotent: the platform delivers at least once,
/// so the same payload can arrive more than once.
#[async_trait]
pub trait WebhookProcessor: Send + Sync {
    /// Handles a delivery after the acknowledgment has been decided.
    async fn process(&self, delivery: &VerifiedDelivery) -> Result<(), WebhookError>;
}

/// Default processor: records the event and does nothing else.
///
/// This service holds no merchant data, so uninstall cleanup is a log line.
/// Re-processing the same payload is a no-op by construction.
#[derive(Debug, Default, Clone)]
pub struct LogProcessor;

#[async_trait]
impl WebhookProcessor for LogProcessor {
    async fn process(&self, delivery: &VerifiedDelivery) -> Result<(), WebhookError> {
        info!(
            topic = delivery.topic_raw(),
            shop = delivery.shop_domain().unwrap_or("<unknown>"),
            "webhook processed"
        );
        Ok(())
    }
}

/// Routes verified deliveries to their post-acknowledgment handling.
#[derive(Clone)]
pub struct Dispatcher {
    processor: Arc<dyn WebhookProcessor>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given processor.
    #[must_use]
    pub fn new(processor: Arc<dyn WebhookProcessor>) -> Self {
        Self { processor }
    }

    /// Classifies a verified delivery and schedules any deferred work.
    ///
    /// Returns immediately in all cases; the caller sends the 200. For
    /// compliance topics nothing is scheduled at all, since the acknowledgment
    /// must not depend on any downstream call. For every other topic the
    /// processor runs on a spawned task and its errors end in the log.
    pub fn dispatch(&self, delivery: VerifiedDelivery) {
        if delivery.topic().is_some_and(WebhookTopic::is_compliance) {
            info!(
                topic = delivery.topic_raw(),
                shop = delivery.shop_domain().unwrap_or("<unknown>"),
                "compliance webhook acknowledged"
            );
            return;
        }

        let processor = Arc::clone(&self.processor);
        tokio::spawn(async move {
            if let Err(err) = processor.process(&delivery).await {
                // Already acknowledged; there is no HTTP error to return.
                error!(
                    topic = delivery.topic_raw(),
                    error = %err,
                    "deferred webhook processing failed"
                );
            }
        });
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
