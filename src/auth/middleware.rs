//! Bearer-token authentication for protected routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use crate::auth::verifier::{extract_bearer_token, VerifyError};
use crate::error::AppError;
use crate::state::AppState;

/// Verifies the access token and stores its [`Claims`](crate::auth::claims::Claims)
/// in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let token = extract_bearer_token(auth_header).map_err(|e| match e {
        VerifyError::Invalid(msg) | VerifyError::Unavailable(msg) => AppError::Unauthorized(msg),
    })?;

    let claims = match state.access_verifier.verify(token).await {
        Ok(claims) => claims,
        Err(VerifyError::Unavailable(e)) => {
            error!(error = %e, "access token could not be verified");
            return Err(AppError::Unauthorized("Invalid token".into()));
        }
        Err(e) => {
            warn!(error = %e, "rejected access token");
            return Err(AppError::Unauthorized("Invalid token".into()));
        }
    };

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
