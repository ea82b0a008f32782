use std::sync::Arc;

use anyhow::Context;
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::auth::dto::{CredentialResponse, LogoutQuery};
use crate::auth::login_state::StateGenerator;
use crate::auth::provider::IdentityProvider;
use crate::auth::verifier::OidcVerifier;
use crate::users::services::UserService;

/// Redirect target plus the `state` value to remember in a cookie.
pub struct LoginRedirect {
    pub state: String,
    pub url: String,
}

/// Authorization-code login against the identity provider.
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    id_verifier: Arc<OidcVerifier>,
    states: Arc<dyn StateGenerator>,
    users: Arc<UserService>,
}

impl AuthService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        id_verifier: Arc<OidcVerifier>,
        states: Arc<dyn StateGenerator>,
        users: Arc<UserService>,
    ) -> Self {
        Self {
            provider,
            id_verifier,
            states,
            users,
        }
    }

    pub async fn begin_login(&self) -> anyhow::Result<LoginRedirect> {
        let state = self.states.generate().context("generate login state")?;
        let url = self.provider.authorization_url(&state).await?;
        Ok(LoginRedirect { state, url })
    }

    /// Exchange the code, verify the identity token and upsert its user.
    #[instrument(skip_all)]
    pub async fn complete_login(&self, code: &str) -> anyhow::Result<CredentialResponse> {
        let token = self.provider.exchange_code(code).await?;
        let id_token = token.id_token.clone().context("id token is missing")?;

        let claims = self
            .id_verifier
            .verify(&id_token)
            .await
            .context("verify token")?;
        let user = self
            .users
            .upsert_with_claims(&claims)
            .await
            .context("upsert user")?;

        info!(user_id = %user.id, "user logged in");
        Ok(CredentialResponse::new(token, id_token, OffsetDateTime::now_utc()))
    }

    pub async fn logout_url(&self, query: &LogoutQuery) -> anyhow::Result<String> {
        self.provider
            .end_session_url(&query.id_token_hint, &query.post_logout_redirect_uri)
            .await
    }
}
