//! Authentication support types.

mod scopes;

pub use scopes::AuthScopes;
