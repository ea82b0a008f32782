use anyhow::Context;
use serde::Deserialize;

/// Identity provider (Keycloak realm) client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct KeycloakConfig {
    pub url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl KeycloakConfig {
    /// Issuer URL of the realm, also the base for OIDC discovery.
    pub fn realm_url(&self) -> String {
        format!("{}/realms/{}", self.url.trim_end_matches('/'), self.realm)
    }

    /// End-session endpoint used when discovery does not advertise one.
    pub fn default_logout_url(&self) -> String {
        format!("{}/protocol/openid-connect/logout", self.realm_url())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub keycloak: KeycloakConfig,
    pub state_cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let keycloak = KeycloakConfig {
            url: std::env::var("KEYCLOAK_URL").unwrap_or_else(|_| "http://localhost:8081".into()),
            realm: std::env::var("KEYCLOAK_REALM").unwrap_or_else(|_| "recipeshare".into()),
            client_id: std::env::var("KEYCLOAK_CLIENT_ID")
                .unwrap_or_else(|_| "recipeshare".into()),
            client_secret: std::env::var("KEYCLOAK_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .context("KEYCLOAK_CLIENT_SECRET is not set")?,
            redirect_url: std::env::var("KEYCLOAK_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api/v1/callback".into()),
        };
        let state_cookie_secure = std::env::var("STATE_COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        Ok(Self {
            database_url,
            max_connections,
            keycloak,
            state_cookie_secure,
        })
    }
}
