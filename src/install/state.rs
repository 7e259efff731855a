//! Anti-forgery state parameter for the OAuth flow.
//!
//! This service keeps no session store, so the state parameter is made
//! self-authenticating instead of being persisted: the value is a random
//! nonce plus an HMAC tag over that nonce under the shared secret. The
//! callback handler can then check that the state was minted by this
//! process family without any storage. A restart mid-flow invalidates
//! nothing, since the tag depends only on the secret.

use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::verify::{compute_query_signature, constant_time_compare};

/// A single-use anti-forgery token carried through the authorize redirect.
///
/// # Example
///
/// ```rust
/// use stickycart::install::StateParam;
///
/// let state = StateParam::issue("shared-secret");
/// assert!(StateParam::verify(state.as_ref(), "shared-secret"));
/// assert!(!StateParam::verify(state.as_ref(), "other-secret"));
/// assert!(!StateParam::verify("forged", "shared-secret"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParam(String);

impl StateParam {
    const NONCE_LENGTH: usize = 15;

    /// Issues a fresh state value: `{nonce}.{hex HMAC tag}`.
    #[must_use]
    pub fn issue(secret: &str) -> Self {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::NONCE_LENGTH)
            .map(char::from)
            .collect();
        let tag = compute_query_signature(&nonce, secret);
        Self(format!("{nonce}.{tag}"))
    }

    /// Checks that `value` carries a tag minted under `secret`.
    ///
    /// The tag comparison is constant-time.
    #[must_use]
    pub fn verify(value: &str, secret: &str) -> bool {
        let Some((nonce, tag)) = value.split_once('.') else {
            return false;
        };
        if nonce.len() != Self::NONCE_LENGTH {
            return false;
        }
        constant_time_compare(&compute_query_signature(nonce, secret), tag)
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
