//! OIDC token verification against the realm's JWKS.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use crate::auth::claims::Claims;
use crate::auth::discovery::{cache_ttl_from_headers, Discovery, DEFAULT_CACHE_TTL};

const CLOCK_SKEW_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Keys could not be fetched from the provider.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

enum VerifierMode {
    Jwks(Arc<Discovery>),
    StaticKey {
        kid: Option<String>,
        algorithm: Algorithm,
        decoding_key: Arc<DecodingKey>,
    },
}

struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifies provider-issued JWTs. The audience check is optional: access
/// tokens carry the account audience rather than the client id.
pub struct OidcVerifier {
    http: reqwest::Client,
    issuer: String,
    audience: Option<String>,
    mode: VerifierMode,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl OidcVerifier {
    pub fn new(
        http: reqwest::Client,
        discovery: Arc<Discovery>,
        audience: Option<String>,
    ) -> Self {
        let issuer = discovery.realm_url().to_string();
        Self {
            http,
            issuer,
            audience,
            mode: VerifierMode::Jwks(discovery),
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Fixed key, no network. `kid` of `None` accepts tokens without one.
    pub fn with_static_key(
        issuer: impl Into<String>,
        audience: Option<String>,
        kid: Option<String>,
        algorithm: Algorithm,
        decoding_key: DecodingKey,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            issuer: issuer.into(),
            audience,
            mode: VerifierMode::StaticKey {
                kid,
                algorithm,
                decoding_key: Arc::new(decoding_key),
            },
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let header = decode_header(token)
            .map_err(|e| VerifyError::Invalid(format!("invalid JWT header: {e}")))?;

        let (algorithm, key) = match &self.mode {
            VerifierMode::StaticKey {
                kid,
                algorithm,
                decoding_key,
            } => {
                if kid.is_some() && header.kid != *kid {
                    return Err(VerifyError::Invalid("unknown JWT kid".to_string()));
                }
                (*algorithm, decoding_key.clone())
            }
            VerifierMode::Jwks(discovery) => {
                if header.alg != Algorithm::RS256 {
                    return Err(VerifyError::Invalid(format!(
                        "unexpected JWT alg: {:?}",
                        header.alg
                    )));
                }
                let kid = header
                    .kid
                    .as_deref()
                    .ok_or_else(|| VerifyError::Invalid("missing JWT kid".to_string()))?;
                (Algorithm::RS256, self.key_for_kid(discovery, kid).await?)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }
        validation.leeway = CLOCK_SKEW_SECS;

        let data = decode::<Claims>(token, key.as_ref(), &validation)
            .map_err(|e| VerifyError::Invalid(format!("JWT validation failed: {e}")))?;
        Ok(data.claims)
    }

    async fn key_for_kid(
        &self,
        discovery: &Discovery,
        kid: &str,
    ) -> Result<Arc<DecodingKey>, VerifyError> {
        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        // A kid we have not seen may mean the realm rotated keys.
        for force_refresh in [false, true] {
            self.refresh_jwks(discovery, force_refresh).await?;
            if let Some(key) = self.cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(VerifyError::Invalid(format!("JWT kid not found in JWKS: {kid}")))
    }

    async fn cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > Instant::now())
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, discovery: &Discovery, force_refresh: bool) -> Result<(), VerifyError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh
            && self
                .jwks_cache
                .read()
                .await
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
        {
            return Ok(());
        }

        let jwks_uri = discovery
            .metadata()
            .await
            .map_err(|e| VerifyError::Unavailable(format!("{e:#}")))?
            .jwks_uri;
        tracing::debug!(%jwks_uri, "refreshing JWKS cache");

        let response = self
            .http
            .get(&jwks_uri)
            .send()
            .await
            .map_err(|e| VerifyError::Unavailable(format!("JWKS request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(VerifyError::Unavailable(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);
        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| VerifyError::Unavailable(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(VerifyError::Unavailable(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });
        tracing::debug!(ttl_secs = ttl.as_secs(), "JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    #[serde(default)]
    kid: String,
    kty: String,
    alg: Option<String>,
    #[serde(default)]
    n: String,
    #[serde(default)]
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

/// RSA signing keys only; Keycloak also publishes encryption keys.
fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();
    for jwk in jwks.keys {
        if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
            continue;
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            continue;
        }
        if jwk.use_.as_deref().is_some_and(|u| u != "sig") {
            continue;
        }
        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "skipping invalid RSA JWKS key");
            }
        }
    }
    keys_by_kid
}

/// Token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, VerifyError> {
    let value =
        header.ok_or_else(|| VerifyError::Invalid("missing Authorization header".to_string()))?;
    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        VerifyError::Invalid("Authorization header is missing Bearer token".to_string())
    })?;
    if token.trim().is_empty() {
        return Err(VerifyError::Invalid("Bearer token is empty".to_string()));
    }
    Ok(token.trim())
}
