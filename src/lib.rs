//! Backend service for a sticky add-to-cart storefront app.
//!
//! The crate is organized around three concerns:
//!
//! - [`verify`]: HMAC-SHA256 request authentication in its two distinct
//!   modes (raw-body webhook signatures and sorted query-string OAuth
//!   signatures), always compared in constant time.
//! - [`install`]: the OAuth installation flow with authorize redirect,
//!   callback verification, token exchange, and webhook registration.
//! - [`webhooks`]: inbound delivery verification and dispatch, with
//!   immediate acknowledgment for compliance topics and deferred processing
//!   for the rest.
//!
//! [`server`] wires these into an axum router; [`config`] carries the
//! credentials and endpoints everything else reads.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stickycart::server::{router, AppState};
//! use stickycart::webhooks::{Dispatcher, LogProcessor};
//! use stickycart::{ApiKey, ApiSecret, AppConfig, HostUrl};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("client-id").unwrap())
//!     .api_secret(ApiSecret::new("shared-secret").unwrap())
//!     .host(HostUrl::new("https://stickycart.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let app = router(AppState {
//!     config: Arc::new(config),
//!     http: reqwest::Client::new(),
//!     dispatcher: Dispatcher::new(Arc::new(LogProcessor)),
//! });
//! # let _ = app;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod install;
pub mod server;
pub mod verify;
pub mod webhooks;

pub use auth::AuthScopes;
pub use config::{ApiKey, ApiSecret, AppConfig, HostUrl, ShopDomain};
pub use error::ConfigError;
pub use install::{begin_install, complete_install, InstallError};
pub use verify::{CallbackParams, VerifyError};
pub use webhooks::{WebhookError, WebhookTopic};
