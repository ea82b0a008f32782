use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::recipes::repo_types::{FoodRecipe, Lookup, Owner, RecipeFields};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FoodRecipeRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredient: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub cooking_duration_id: Option<i64>,
    #[serde(default)]
    pub difficulty_id: Option<i64>,
}

impl From<FoodRecipeRequest> for RecipeFields {
    fn from(r: FoodRecipeRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            ingredient: r.ingredient,
            instruction: r.instruction,
            image_url: r.image_url,
            cooking_duration_id: r.cooking_duration_id,
            difficulty_id: r.difficulty_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub id: i64,
    pub name: String,
}

impl From<Lookup> for LookupResponse {
    fn from(l: Lookup) -> Self {
        Self { id: l.id, name: l.name }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeOwnerResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
}

impl From<Owner> for RecipeOwnerResponse {
    fn from(o: Owner) -> Self {
        Self {
            id: o.id,
            first_name: o.first_name,
            last_name: o.last_name,
            image_url: o.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodRecipeResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub ingredient: String,
    pub instruction: String,
    pub image_url: Option<String>,
    pub cooking_duration: Option<LookupResponse>,
    pub difficulty: Option<LookupResponse>,
    pub user_id: String,
    pub user: Option<RecipeOwnerResponse>,
    pub average_rating: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<FoodRecipe> for FoodRecipeResponse {
    fn from(r: FoodRecipe) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            ingredient: r.ingredient,
            instruction: r.instruction,
            image_url: r.image_url,
            cooking_duration: r.cooking_duration.map(Into::into),
            difficulty: r.difficulty.map(Into::into),
            user_id: r.user_id,
            user: r.owner.map(Into::into),
            average_rating: r.average_rating,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
