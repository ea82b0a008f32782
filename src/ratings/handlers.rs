use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::{
    auth::claims::Claims,
    dto::ListResponse,
    error::{AppError, Result},
    ratings::dto::{FavoriteRequest, FavoriteResponse, RatingRequest, RatingResponse},
    state::AppState,
};

const NOT_FOUND: &str = "Recipe not found";

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/food-recipes/:id/ratings", get(list_ratings))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/food-recipes/:id/ratings", post(create_rating))
        .route("/food-recipes/:id/favorite", get(get_favorite).put(set_favorite))
}

#[instrument(skip(state, claims, body), fields(user_id = %claims.id))]
pub async fn create_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(recipe_id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(body), _): WithRejection<Json<RatingRequest>, AppError>,
) -> Result<(StatusCode, Json<RatingResponse>)> {
    let rating = state
        .ratings
        .create(body, recipe_id, &claims)
        .await
        .map_err(|e| e.respond(NOT_FOUND, "Unauthorized"))?;
    Ok((StatusCode::CREATED, Json(rating.into())))
}

#[instrument(skip(state))]
pub async fn list_ratings(
    State(state): State<AppState>,
    WithRejection(Path(recipe_id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<ListResponse<RatingResponse>>> {
    let ratings = state
        .ratings
        .get_by_recipe(recipe_id)
        .await
        .map_err(|e| e.respond(NOT_FOUND, "Unauthorized"))?;
    Ok(Json(ListResponse::new(
        ratings.len() as i64,
        ratings.into_iter().map(Into::into).collect(),
    )))
}

#[instrument(skip(state, claims, body), fields(user_id = %claims.id))]
pub async fn set_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(recipe_id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(body), _): WithRejection<Json<FavoriteRequest>, AppError>,
) -> Result<Json<FavoriteResponse>> {
    let is_favorited = state
        .ratings
        .favorite(body, recipe_id, &claims)
        .await
        .map_err(|e| e.respond(NOT_FOUND, "Unauthorized"))?;
    Ok(Json(FavoriteResponse {
        food_recipe_id: recipe_id,
        is_favorited,
    }))
}

#[instrument(skip(state, claims), fields(user_id = %claims.id))]
pub async fn get_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(recipe_id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<FavoriteResponse>> {
    let is_favorited = state
        .ratings
        .is_favorite(recipe_id, &claims)
        .await
        .map_err(|e| e.respond(NOT_FOUND, "Unauthorized"))?;
    Ok(Json(FavoriteResponse {
        food_recipe_id: recipe_id,
        is_favorited,
    }))
}
