use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Rating record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub id: i64,
    pub score: f64,
    pub food_recipe_id: i64,
    pub user_id: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub score: f64,
    pub food_recipe_id: i64,
    pub user_id: String,
}

/// Mean score of a rating set, 0 when there are none.
pub fn average_score(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: f64 = ratings.iter().map(|r| r.score).sum();
    total / ratings.len() as f64
}
