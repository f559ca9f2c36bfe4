//! Keycloak access-token verification.
//!
//! Tokens are RS256 JWTs signed by one of the realm's keys. The key set is
//! fetched from the realm's JWKS endpoint, cached by key id and refetched
//! when a token names a key id the cache does not know (key rotation).
//! Refetches are serialised and at most one is attempted per
//! [`KEY_REFRESH_COOLDOWN`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use timeasy_core::identity::Caller;
use timeasy_core::roles::RoleSet;
use timeasy_core::types::EntityId;
use tokio::sync::{Mutex, RwLock};

use super::{AuthError, TokenVerifier};
use crate::config::KeycloakConfig;

/// Claims this service reads from a Keycloak access token.
#[derive(Debug, Clone, Deserialize)]
pub struct KeycloakClaims {
    pub sub: String,
    #[serde(default)]
    pub realm_access: RealmAccess,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

impl KeycloakClaims {
    /// `sub` becomes the user id; realm roles outside `USER`/`ADMIN` are dropped.
    pub fn into_caller(self) -> Result<Caller, AuthError> {
        let user_id = self
            .sub
            .parse::<EntityId>()
            .map_err(|_| AuthError::InvalidSubject(self.sub.clone()))?;
        let roles = RoleSet::parse_lenient(&self.realm_access.roles);
        Ok(Caller::new(user_id, roles))
    }
}

/// Minimum time between two fetches of the realm's key set.
pub const KEY_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

pub struct KeycloakVerifier {
    http: reqwest::Client,
    certs_url: String,
    validation: Validation,
    keys: RwLock<HashMap<String, DecodingKey>>,
    /// When the key set was last fetched, successfully or not.
    last_refresh: Mutex<Option<Instant>>,
    refresh_cooldown: Duration,
}

impl KeycloakVerifier {
    pub fn new(config: &KeycloakConfig) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[config.issuer()]);
        validation.validate_aud = false;

        Self {
            http: reqwest::Client::new(),
            certs_url: config.certs_url(),
            validation,
            keys: RwLock::new(HashMap::new()),
            last_refresh: Mutex::new(None),
            refresh_cooldown: KEY_REFRESH_COOLDOWN,
        }
    }

    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    async fn cached_key(&self, kid: &str) -> Option<DecodingKey> {
        self.keys.read().await.get(kid).cloned()
    }

    /// Look up `kid`, refetching the key set on a miss unless a fetch
    /// happened within the cooldown. Concurrent misses share one fetch.
    async fn key_after_refresh(&self, kid: &str) -> Result<Option<DecodingKey>, AuthError> {
        let mut last_refresh = self.last_refresh.lock().await;

        // Filled by whoever held the lock before us.
        if let Some(key) = self.cached_key(kid).await {
            return Ok(Some(key));
        }
        if (*last_refresh).is_some_and(|at| at.elapsed() < self.refresh_cooldown) {
            tracing::debug!(kid = %kid, "Unknown signing key, refresh on cooldown");
            return Ok(None);
        }

        *last_refresh = Some(Instant::now());
        self.refresh_keys().await?;
        Ok(self.cached_key(kid).await)
    }

    /// Replace the cache with the realm's current key set.
    async fn refresh_keys(&self) -> Result<(), AuthError> {
        let set: JwkSet = self
            .http
            .get(&self.certs_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut keys = HashMap::with_capacity(set.keys.len());
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => tracing::debug!(kid = %kid, error = %e, "Skipping unusable signing key"),
            }
        }

        tracing::info!(url = %self.certs_url, keys = keys.len(), "Signing keys refreshed");
        *self.keys.write().await = keys;
        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for KeycloakVerifier {
    async fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let key = match self.cached_key(&kid).await {
            Some(key) => key,
            None => self
                .key_after_refresh(&kid)
                .await?
                .ok_or_else(|| AuthError::UnknownKey(kid.clone()))?,
        };

        let data = decode::<KeycloakClaims>(token, &key, &self.validation)?;
        data.claims.into_caller()
    }
}
