use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::auth::discovery::Discovery;
use crate::config::KeycloakConfig;

const SCOPES: &str = "openid profile email";

/// Token endpoint response of the authorization-code grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Client side of the OIDC authorization-code flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authorization_url(&self, state: &str) -> anyhow::Result<String>;
    async fn exchange_code(&self, code: &str) -> anyhow::Result<TokenResponse>;
    async fn end_session_url(
        &self,
        id_token_hint: &str,
        post_logout_redirect_uri: &str,
    ) -> anyhow::Result<String>;
}

pub struct KeycloakProvider {
    http: reqwest::Client,
    discovery: Arc<Discovery>,
    config: KeycloakConfig,
}

impl KeycloakProvider {
    pub fn new(http: reqwest::Client, discovery: Arc<Discovery>, config: KeycloakConfig) -> Self {
        Self {
            http,
            discovery,
            config,
        }
    }
}

#[async_trait]
impl IdentityProvider for KeycloakProvider {
    async fn authorization_url(&self, state: &str) -> anyhow::Result<String> {
        let endpoint = self.discovery.metadata().await?.authorization_endpoint;
        authorization_url(&endpoint, &self.config, state)
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<TokenResponse> {
        let endpoint = self.discovery.metadata().await?.token_endpoint;
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let token = self
            .http
            .post(&endpoint)
            .form(&params)
            .send()
            .await
            .context("token request failed")?
            .error_for_status()
            .context("exchange token")?
            .json::<TokenResponse>()
            .await
            .context("invalid token response")?;
        Ok(token)
    }

    async fn end_session_url(
        &self,
        id_token_hint: &str,
        post_logout_redirect_uri: &str,
    ) -> anyhow::Result<String> {
        let endpoint = self
            .discovery
            .metadata()
            .await
            .ok()
            .and_then(|m| m.end_session_endpoint)
            .unwrap_or_else(|| self.config.default_logout_url());
        end_session_url(&endpoint, id_token_hint, post_logout_redirect_uri)
    }
}

pub(crate) fn authorization_url(
    endpoint: &str,
    config: &KeycloakConfig,
    state: &str,
) -> anyhow::Result<String> {
    let url = Url::parse_with_params(
        endpoint,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", SCOPES),
            ("state", state),
        ],
    )
    .context("parse authorization endpoint")?;
    Ok(url.into())
}

pub(crate) fn end_session_url(
    endpoint: &str,
    id_token_hint: &str,
    post_logout_redirect_uri: &str,
) -> anyhow::Result<String> {
    let url = Url::parse_with_params(
        endpoint,
        &[
            ("id_token_hint", id_token_hint),
            ("post_logout_redirect_uri", post_logout_redirect_uri),
        ],
    )
    .context("parse logout URL")?;
    Ok(url.into())
}
