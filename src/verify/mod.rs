//! HMAC signature verification for webhook deliveries and OAuth callbacks.
//!
//! The platform signs two different message shapes with the same shared
//! secret, and the two must never be unified:
//!
//! - **Webhook-body mode**: the digest is computed over the raw request body
//!   exactly as transmitted, and the signature header is base64-encoded.
//! - **OAuth-query mode**: the digest is computed over the callback's query
//!   parameters (minus the `hmac` parameter itself) sorted by key, and the
//!   signature is hex-encoded.
//!
//! Each mode has its own entry point with its own input type, so a caller
//! cannot feed the wrong message shape to the wrong encoder.
//!
//! # Security
//!
//! All comparisons are constant-time via [`subtle`], and a missing signature
//! fails closed before any digest is compared.
//!
//! # Example
//!
//! ```rust
//! use stickycart::verify::{compute_body_signature, verify_webhook_signature};
//!
//! let body = br#"{"a":1}"#;
//! let signature = compute_body_signature(body, "shhh");
//! assert!(verify_webhook_signature(body, Some(&signature), "shhh").is_ok());
//! assert!(verify_webhook_signature(body, None, "shhh").is_err());
//! ```

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a signature check can fail.
///
/// The two variants map to the same unauthenticated HTTP outcome; callers
/// may distinguish them in logs but must not distinguish them in responses.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// The signature header or parameter was absent.
    #[error("request carried no signature")]
    MissingSignature,

    /// The signature did not match the request contents.
    #[error("signature did not match request contents")]
    SignatureMismatch,
}

/// Computes the hex-encoded HMAC-SHA256 digest used in OAuth-query mode.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_query_signature(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Computes the base64-encoded HMAC-SHA256 digest used in webhook-body mode.
///
/// Takes raw bytes, not a string: the digest must cover the body exactly as
/// transmitted, with no re-encoding in between.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_body_signature(raw_body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(raw_body);
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Constant-time string equality.
///
/// Used for every signature and state comparison; a short-circuiting `==`
/// here would leak the digest position-by-position through timing.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Verifies a webhook delivery signature (webhook-body mode).
///
/// `raw_body` must be the body bytes exactly as received; parsing or
/// re-serializing the body before this call invalidates the check.
///
/// # Errors
///
/// [`VerifyError::MissingSignature`] if `signature` is `None`, otherwise
/// [`VerifyError::SignatureMismatch`] when the digests differ.
pub fn verify_webhook_signature(
    raw_body: &[u8],
    signature: Option<&str>,
    secret: &str,
) -> Result<(), VerifyError> {
    let signature = signature.ok_or(VerifyError::MissingSignature)?;
    let computed = compute_body_signature(raw_body, secret);
    if constant_time_compare(&computed, signature) {
        Ok(())
    } else {
        Err(VerifyError::SignatureMismatch)
    }
}

/// Query parameters from an OAuth callback, as received.
///
/// Holds the decoded key/value pairs in arrival order; signing sorts a copy,
/// so the input order never affects the digest.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pairs: Vec<(String, String)>,
}

impl CallbackParams {
    /// Name of the signature parameter, excluded from the signed message.
    pub const SIGNATURE_KEY: &'static str = "hmac";

    /// Builds the parameter set from decoded key/value pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Returns the first value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the provided signature parameter, if present.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.get(Self::SIGNATURE_KEY)
    }

    /// Renders the signable message: every parameter except the signature,
    /// sorted by key byte-wise ascending, as `key=value` joined with `&`.
    /// Values are taken verbatim with no extra escaping.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        let mut signable: Vec<&(String, String)> = self
            .pairs
            .iter()
            .filter(|(k, _)| k != Self::SIGNATURE_KEY)
            .collect();
        signable.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        signable
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Verifies an OAuth callback signature (OAuth-query mode).
///
/// # Errors
///
/// [`VerifyError::MissingSignature`] if the `hmac` parameter is absent; in
/// that case no digest is computed at all. Otherwise
/// [`VerifyError::SignatureMismatch`] when the hex digests differ.
pub fn verify_callback_signature(
    params: &CallbackParams,
    secret: &str,
) -> Result<(), VerifyError> {
    let provided = params.signature().ok_or(VerifyError::MissingSignature)?;
    let computed = compute_query_signature(&params.to_signable_string(), secret);
    if constant_time_compare(&computed, provided) {
        Ok(())
    } else {
        Err(VerifyError::SignatureMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> CallbackParams {
        CallbackParams::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        )
    }

    #[test]
    fn query_signature_matches_known_vector() {
        // HMAC-SHA256("message", "key")
        assert_eq!(
            compute_query_signature("message", "key"),
            "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
        );
    }

    #[test]
    fn body_signature_matches_known_vector() {
        // Same vector, base64-encoded.
        assert_eq!(
            compute_body_signature(b"message", "key"),
            "bp7ym3X//Ft6uuUn1Y/a2y/kLnIZARl2kXNDBl9Y7Uo="
        );
    }

    #[test]
    fn body_signature_is_deterministic_over_identical_bytes() {
        let body = br#"{"product_id":42,"qty":1}"#;
        assert_eq!(
            compute_body_signature(body, "shhh"),
            compute_body_signature(body, "shhh")
        );
    }

    #[test]
    fn flipping_any_byte_changes_the_body_digest() {
        let body = b"sticky add to cart payload";
        let reference = compute_body_signature(body, "shhh");
        for i in 0..body.len() {
            let mut mutated = body.to_vec();
            mutated[i] ^= 0x01;
            assert_ne!(compute_body_signature(&mutated, "shhh"), reference);
        }
    }

    #[test]
    fn body_signature_accepts_non_utf8_bytes() {
        let body: &[u8] = &[0x80, 0xff, 0x00, 0xfe];
        let signature = compute_body_signature(body, "shhh");
        assert!(verify_webhook_signature(body, Some(&signature), "shhh").is_ok());
    }

    #[test]
    fn webhook_verification_fails_closed_on_missing_signature() {
        let result = verify_webhook_signature(b"{}", None, "shhh");
        assert_eq!(result, Err(VerifyError::MissingSignature));
    }

    #[test]
    fn webhook_verification_rejects_flipped_signature() {
        let body = br#"{"a":1}"#;
        let mut signature = compute_body_signature(body, "shhh");
        // Flip the final base64 character.
        let last = signature.pop().unwrap();
        signature.push(if last == 'A' { 'B' } else { 'A' });
        assert_eq!(
            verify_webhook_signature(body, Some(&signature), "shhh"),
            Err(VerifyError::SignatureMismatch)
        );
    }

    #[test]
    fn signable_string_sorts_keys_and_skips_hmac() {
        let p = params(&[
            ("state", "xyz"),
            ("hmac", "deadbeef"),
            ("shop", "test.myshopify.com"),
            ("code", "abc"),
        ]);
        assert_eq!(
            p.to_signable_string(),
            "code=abc&shop=test.myshopify.com&state=xyz"
        );
    }

    #[test]
    fn callback_verification_accepts_correct_hex_signature() {
        let secret = "shhh";
        let signature =
            compute_query_signature("code=abc&shop=test.myshopify.com&state=xyz", secret);
        let p = params(&[
            ("shop", "test.myshopify.com"),
            ("code", "abc"),
            ("state", "xyz"),
            ("hmac", &signature),
        ]);
        assert!(verify_callback_signature(&p, secret).is_ok());
    }

    #[test]
    fn callback_verification_is_parameter_order_independent() {
        let secret = "shhh";
        let signature =
            compute_query_signature("code=abc&shop=test.myshopify.com&state=xyz", secret);
        let reordered = params(&[
            ("state", "xyz"),
            ("hmac", &signature),
            ("shop", "test.myshopify.com"),
            ("code", "abc"),
        ]);
        assert!(verify_callback_signature(&reordered, secret).is_ok());
    }

    #[test]
    fn callback_verification_fails_closed_on_missing_hmac() {
        let p = params(&[("shop", "test.myshopify.com"), ("code", "abc")]);
        assert_eq!(
            verify_callback_signature(&p, "shhh"),
            Err(VerifyError::MissingSignature)
        );
    }

    #[test]
    fn callback_verification_rejects_tampered_value() {
        let secret = "shhh";
        let signature =
            compute_query_signature("code=abc&shop=test.myshopify.com&state=xyz", secret);
        let p = params(&[
            ("shop", "test.myshopify.com"),
            ("code", "abc-tampered"),
            ("state", "xyz"),
            ("hmac", &signature),
        ]);
        assert_eq!(
            verify_callback_signature(&p, secret),
            Err(VerifyError::SignatureMismatch)
        );
    }

    #[test]
    fn modes_are_not_interchangeable() {
        let secret = "shhh";
        let message = "code=abc&shop=test.myshopify.com";

        // A valid query-mode signature must not pass body-mode verification
        // over the serialized-equivalent bytes, and vice versa.
        let query_signature = compute_query_signature(message, secret);
        assert!(
            verify_webhook_signature(message.as_bytes(), Some(&query_signature), secret).is_err()
        );

        let body_signature = compute_body_signature(message.as_bytes(), secret);
        let p = params(&[
            ("code", "abc"),
            ("shop", "test.myshopify.com"),
            ("hmac", &body_signature),
        ]);
        assert!(verify_callback_signature(&p, secret).is_err());
    }

    #[test]
    fn constant_time_compare_handles_unequal_lengths() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(!constant_time_compare("abc", ""));
    }
}
