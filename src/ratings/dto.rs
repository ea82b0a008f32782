use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::ratings::repo_types::Rating;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RatingRequest {
    #[serde(default)]
    #[validate(required, range(min = 1.0, max = 5.0))]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: i64,
    pub score: f64,
    pub food_recipe_id: i64,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Rating> for RatingResponse {
    fn from(r: Rating) -> Self {
        Self {
            id: r.id,
            score: r.score,
            food_recipe_id: r.food_recipe_id,
            user_id: r.user_id,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    #[serde(default)]
    #[validate(required)]
    pub is_favorited: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub food_recipe_id: i64,
    pub is_favorited: bool,
}
