//! OIDC discovery document for the configured realm.

use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::header::{HeaderMap, CACHE_CONTROL};
use serde::Deserialize;
use tokio::sync::RwLock;

pub(crate) const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Endpoints advertised at `{realm}/.well-known/openid-configuration`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}

struct CachedMetadata {
    metadata: ProviderMetadata,
    expires_at: Instant,
}

/// Fetches the discovery document on first use and caches it.
pub struct Discovery {
    http: reqwest::Client,
    realm_url: String,
    cache: RwLock<Option<CachedMetadata>>,
}

impl Discovery {
    pub fn new(http: reqwest::Client, realm_url: impl Into<String>) -> Self {
        Self {
            http,
            realm_url: realm_url.into(),
            cache: RwLock::new(None),
        }
    }

    pub fn realm_url(&self) -> &str {
        &self.realm_url
    }

    pub async fn metadata(&self) -> anyhow::Result<ProviderMetadata> {
        if let Some(cached) = self
            .cache
            .read()
            .await
            .as_ref()
            .filter(|c| c.expires_at > Instant::now())
        {
            return Ok(cached.metadata.clone());
        }

        let url = format!("{}/.well-known/openid-configuration", self.realm_url);
        tracing::debug!(%url, "fetching OIDC discovery document");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("OIDC discovery request failed")?
            .error_for_status()
            .context("OIDC discovery returned error status")?;
        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);
        let metadata: ProviderMetadata = response
            .json()
            .await
            .context("invalid OIDC discovery JSON")?;

        *self.cache.write().await = Some(CachedMetadata {
            metadata: metadata.clone(),
            expires_at: Instant::now() + ttl,
        });
        Ok(metadata)
    }
}

pub(crate) fn cache_ttl_from_headers(headers: &HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
}
