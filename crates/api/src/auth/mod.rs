//! Bearer-token verification.
//!
//! - [`TokenVerifier`] -- turns a raw bearer token into a verified [`Caller`].
//! - [`keycloak::KeycloakVerifier`] -- RS256 tokens checked against a realm's JWKS.

pub mod keycloak;

use async_trait::async_trait;
use timeasy_core::identity::Caller;

pub use keycloak::KeycloakVerifier;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token header has no key id")]
    MissingKeyId,

    #[error("no signing key with id '{0}'")]
    UnknownKey(String),

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("token subject '{0}' is not a user id")]
    InvalidSubject(String),

    #[error("cannot fetch signing keys: {0}")]
    KeyFetch(#[from] reqwest::Error),
}

/// Verifies bearer tokens issued by the identity provider.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Caller, AuthError>;
}
