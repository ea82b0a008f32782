use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::ratings::repo_types::{NewRating, Rating};

/// Ratings plus the per-user favorite toggle.
#[async_trait]
pub trait RatingRepository: Send + Sync {
    async fn create(&self, rating: &NewRating) -> anyhow::Result<Rating>;
    async fn list_by_recipe(&self, recipe_id: i64) -> anyhow::Result<Vec<Rating>>;
    async fn is_favorite(&self, recipe_id: i64, user_id: &str) -> anyhow::Result<bool>;
    /// Upsert on (food_recipe_id, user_id), reviving a soft-deleted row.
    async fn add_favorite(&self, recipe_id: i64, user_id: &str) -> anyhow::Result<()>;
    /// Soft-delete the active favorite row, if any.
    async fn remove_favorite(&self, recipe_id: i64, user_id: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgRatingRepository {
    db: PgPool,
}

impl PgRatingRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RatingRepository for PgRatingRepository {
    async fn create(&self, rating: &NewRating) -> anyhow::Result<Rating> {
        let rating = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (score, food_recipe_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, score, food_recipe_id, user_id, created_at
            "#,
        )
        .bind(rating.score)
        .bind(rating.food_recipe_id)
        .bind(&rating.user_id)
        .fetch_one(&self.db)
        .await
        .context("insert rating")?;
        Ok(rating)
    }

    async fn list_by_recipe(&self, recipe_id: i64) -> anyhow::Result<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, score, food_recipe_id, user_id, created_at
              FROM ratings
             WHERE food_recipe_id = $1 AND deleted_at IS NULL
             ORDER BY id ASC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await
        .context("list ratings by recipe")?;
        Ok(ratings)
    }

    async fn is_favorite(&self, recipe_id: i64, user_id: &str) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM favorites
                 WHERE food_recipe_id = $1 AND user_id = $2 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(recipe_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("query favorite")?;
        Ok(exists)
    }

    async fn add_favorite(&self, recipe_id: i64, user_id: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO favorites (food_recipe_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (food_recipe_id, user_id) DO UPDATE
               SET updated_at = now(),
                   deleted_at = NULL
            "#,
        )
        .bind(recipe_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .context("upsert favorite")?;
        Ok(())
    }

    async fn remove_favorite(&self, recipe_id: i64, user_id: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE favorites
               SET deleted_at = now(),
                   updated_at = now()
             WHERE food_recipe_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(recipe_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .context("delete favorite")?;
        Ok(())
    }
}
