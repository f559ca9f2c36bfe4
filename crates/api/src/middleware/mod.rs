//! Request extractors shared by all handlers.
//!
//! - [`auth::AuthUser`] -- the verified caller behind the bearer token.
//! - [`extract::ValidatedJson`] -- a JSON body that passed its `validator` rules.
//! - [`extract::ApiPath`], [`extract::ApiQuery`] -- path and query parameters
//!   whose rejections use the JSON error body.

pub mod auth;
pub mod extract;
