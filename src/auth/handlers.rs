use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    WithRejection,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{CallbackQuery, CredentialResponse, LogoutQuery},
        login_state::{states_match, STATE_COOKIE, STATE_COOKIE_MAX_AGE_SECS},
    },
    error::{AppError, Result},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", get(logout))
}

#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> Result<(CookieJar, Redirect)> {
    let redirect = state.auth.begin_login().await?;

    let cookie = Cookie::build((STATE_COOKIE, redirect.state))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.state_cookie_secure)
        .max_age(time::Duration::seconds(STATE_COOKIE_MAX_AGE_SECS));

    Ok((jar.add(cookie), Redirect::temporary(&redirect.url)))
}

#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Query(query), _): WithRejection<Query<CallbackQuery>, AppError>,
) -> Result<(CookieJar, Json<CredentialResponse>)> {
    let Some(expected) = jar.get(STATE_COOKIE).map(|c| c.value().to_string()) else {
        warn!("callback without state cookie");
        return Err(AppError::BadRequest("State cookie not found".into()));
    };

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        warn!("callback without authorization code");
        return Err(AppError::BadRequest("Authorization code not found".into()));
    };

    if !states_match(&expected, query.state.as_deref().unwrap_or_default()) {
        warn!("callback state does not match cookie");
        return Err(AppError::BadRequest("Invalid state".into()));
    }

    let credential = state.auth.complete_login(&code).await?;
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));
    Ok((jar, Json(credential)))
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<LogoutQuery>, AppError>,
) -> Result<Redirect> {
    let url = state.auth.logout_url(&query).await?;
    Ok(Redirect::temporary(&url))
}
