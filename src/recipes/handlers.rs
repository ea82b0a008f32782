use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::{
    auth::claims::Claims,
    dto::{ListResponse, RecipeQuery},
    error::{AppError, MessageResponse, Result},
    recipes::dto::{FoodRecipeRequest, FoodRecipeResponse},
    state::AppState,
};

const NOT_FOUND: &str = "Recipe not found";
const FORBIDDEN_UPDATE: &str = "You do not have permission to update this recipe";
const FORBIDDEN_DELETE: &str = "You do not have permission to delete this recipe";

// --- public routes ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/food-recipes", get(list_recipes))
        .route("/food-recipes/:id", get(get_recipe))
}

// --- bearer token required ---

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/food-recipes", post(create_recipe))
        .route("/food-recipes/:id", put(update_recipe).delete(delete_recipe))
        .route("/me/favorites", get(list_favorites))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<RecipeQuery>, AppError>,
) -> Result<Json<ListResponse<FoodRecipeResponse>>> {
    let (recipes, total) = state
        .recipes
        .get(&query)
        .await
        .map_err(|e| e.respond_not_found(NOT_FOUND))?;
    Ok(Json(ListResponse::new(
        total,
        recipes.into_iter().map(Into::into).collect(),
    )))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<FoodRecipeResponse>> {
    let recipe = state
        .recipes
        .get_by_id(id)
        .await
        .map_err(|e| e.respond_not_found(NOT_FOUND))?;
    Ok(Json(recipe.into()))
}

#[instrument(skip(state, claims, body), fields(user_id = %claims.id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(body), _): WithRejection<Json<FoodRecipeRequest>, AppError>,
) -> Result<(StatusCode, Json<FoodRecipeResponse>)> {
    let recipe = state
        .recipes
        .create(body, &claims)
        .await
        .map_err(|e| e.respond_not_found(NOT_FOUND))?;
    Ok((StatusCode::CREATED, Json(recipe.into())))
}

#[instrument(skip(state, claims, body), fields(user_id = %claims.id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(body), _): WithRejection<Json<FoodRecipeRequest>, AppError>,
) -> Result<Json<FoodRecipeResponse>> {
    let recipe = state
        .recipes
        .update(body, id, &claims)
        .await
        .map_err(|e| e.respond(NOT_FOUND, FORBIDDEN_UPDATE))?;
    Ok(Json(recipe.into()))
}

#[instrument(skip(state, claims), fields(user_id = %claims.id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<MessageResponse>> {
    state
        .recipes
        .delete(id, &claims)
        .await
        .map_err(|e| e.respond(NOT_FOUND, FORBIDDEN_DELETE))?;
    Ok(Json(MessageResponse::new("Recipe deleted successfully")))
}

#[instrument(skip(state, claims), fields(user_id = %claims.id))]
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Query(query), _): WithRejection<Query<RecipeQuery>, AppError>,
) -> Result<Json<ListResponse<FoodRecipeResponse>>> {
    let (recipes, total) = state
        .recipes
        .get_favorites(&query, &claims)
        .await
        .map_err(|e| e.respond(NOT_FOUND, "Unauthorized"))?;
    Ok(Json(ListResponse::new(
        total,
        recipes.into_iter().map(Into::into).collect(),
    )))
}
