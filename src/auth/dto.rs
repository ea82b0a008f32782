use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::auth::provider::TokenResponse;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutQuery {
    #[serde(default)]
    pub id_token_hint: String,
    #[serde(default)]
    pub post_logout_redirect_uri: String,
}

/// Tokens handed back to the client after a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry: Option<OffsetDateTime>,
    pub expires_in: i64,
    pub id_token: String,
}

impl CredentialResponse {
    pub fn new(token: TokenResponse, id_token: String, issued_at: OffsetDateTime) -> Self {
        let expires_in = token.expires_in.unwrap_or_default();
        let expiry = if expires_in > 0 {
            issued_at.checked_add(Duration::seconds(expires_in))
        } else {
            None
        };
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            refresh_token: token.refresh_token,
            expiry,
            expires_in,
            id_token,
        }
    }
}
