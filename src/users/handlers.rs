use axum::{
    extract::{Path, State},
    routing::{get, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::{
    auth::claims::Claims,
    dto::ListResponse,
    error::{AppError, Result},
    recipes::dto::FoodRecipeResponse,
    state::AppState,
    users::dto::{UserRequest, UserResponse},
};

const NOT_FOUND: &str = "User not found";
const FORBIDDEN_UPDATE: &str = "You do not have permission to update this user";

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/users/:id", put(update_user))
        .route("/users/:id/food-recipes", get(list_user_recipes))
}

#[instrument(skip(state, claims), fields(user_id = %claims.id))]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .resolve_caller(&claims)
        .await
        .map_err(|e| e.respond_not_found(NOT_FOUND))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, AppError>,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .get_by_id(&id)
        .await
        .map_err(|e| e.respond_not_found(NOT_FOUND))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, claims, body), fields(user_id = %claims.id))]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<String>, AppError>,
    WithRejection(Json(body), _): WithRejection<Json<UserRequest>, AppError>,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .update(&id, body, &claims)
        .await
        .map_err(|e| e.respond(NOT_FOUND, FORBIDDEN_UPDATE))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, claims), fields(user_id = %claims.id))]
pub async fn list_user_recipes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<String>, AppError>,
) -> Result<Json<ListResponse<FoodRecipeResponse>>> {
    let recipes = state
        .users
        .get_recipes(&id, &claims)
        .await
        .map_err(|e| e.respond_not_found(NOT_FOUND))?;
    Ok(Json(ListResponse::new(
        recipes.len() as i64,
        recipes.into_iter().map(Into::into).collect(),
    )))
}
