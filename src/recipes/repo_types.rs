use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::ratings::repo_types::{average_score, Rating};

/// Static lookup row (cooking duration or difficulty).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lookup {
    pub id: i64,
    pub name: String,
}

/// Owner fields joined from `users`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Owner {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoodRecipe {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub ingredient: String,
    pub instruction: String,
    pub image_url: Option<String>,
    pub cooking_duration: Option<Lookup>,
    pub difficulty: Option<Lookup>,
    pub user_id: String,
    pub owner: Option<Owner>,
    pub ratings: Vec<Rating>,
    /// Derived from `ratings` on every read, never stored.
    pub average_rating: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl FoodRecipe {
    pub fn with_average_rating(mut self) -> Self {
        self.average_rating = average_score(&self.ratings);
        self
    }
}

/// Joined row as selected by the recipe queries.
#[derive(Debug, FromRow)]
pub struct FoodRecipeRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub ingredient: String,
    pub instruction: String,
    pub image_url: Option<String>,
    pub cooking_duration_id: Option<i64>,
    pub cooking_duration_name: Option<String>,
    pub difficulty_id: Option<i64>,
    pub difficulty_name: Option<String>,
    pub user_id: String,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub user_image_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<FoodRecipeRow> for FoodRecipe {
    fn from(r: FoodRecipeRow) -> Self {
        let lookup = |id: Option<i64>, name: Option<String>| {
            id.map(|id| Lookup {
                id,
                name: name.unwrap_or_default(),
            })
        };
        let owner = match (r.user_first_name, r.user_last_name) {
            (Some(first_name), Some(last_name)) => Some(Owner {
                id: r.user_id.clone(),
                first_name,
                last_name,
                image_url: r.user_image_url,
            }),
            _ => None,
        };
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            ingredient: r.ingredient,
            instruction: r.instruction,
            image_url: r.image_url,
            cooking_duration: lookup(r.cooking_duration_id, r.cooking_duration_name),
            difficulty: lookup(r.difficulty_id, r.difficulty_name),
            user_id: r.user_id,
            owner,
            ratings: Vec::new(),
            average_rating: 0.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Column values written on create, and on update where `None` keeps the
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct RecipeFields {
    pub name: String,
    pub description: Option<String>,
    pub ingredient: Option<String>,
    pub instruction: Option<String>,
    pub image_url: Option<String>,
    pub cooking_duration_id: Option<i64>,
    pub difficulty_id: Option<i64>,
}
