use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::dto::RecipeQuery;
use crate::ratings::repo_types::Rating;
use crate::recipes::repo_types::{FoodRecipe, FoodRecipeRow, RecipeFields};

/// Recipe persistence. Every read returns recipes with their live ratings
/// loaded; soft-deleted recipes are never returned.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn create(&self, user_id: &str, fields: &RecipeFields) -> anyhow::Result<FoodRecipe>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<FoodRecipe>>;
    async fn list(&self, query: &RecipeQuery) -> anyhow::Result<Vec<FoodRecipe>>;
    async fn count(&self, search: &str) -> anyhow::Result<i64>;
    async fn update(&self, id: i64, fields: &RecipeFields) -> anyhow::Result<Option<FoodRecipe>>;
    /// Soft-delete. Returns false when no live recipe had that id.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
    async fn list_favorites(
        &self,
        user_id: &str,
        query: &RecipeQuery,
    ) -> anyhow::Result<Vec<FoodRecipe>>;
    async fn count_favorites(&self, user_id: &str, search: &str) -> anyhow::Result<i64>;
    async fn list_by_user(&self, user_id: &str) -> anyhow::Result<Vec<FoodRecipe>>;
}

const RECIPE_SELECT: &str = r#"
    SELECT r.id, r.name, r.description, r.ingredient, r.instruction, r.image_url,
           r.cooking_duration_id, cd.name AS cooking_duration_name,
           r.difficulty_id, d.name AS difficulty_name,
           r.user_id, u.first_name AS user_first_name, u.last_name AS user_last_name,
           u.image_url AS user_image_url,
           r.created_at, r.updated_at
      FROM food_recipes r
      LEFT JOIN cooking_durations cd ON cd.id = r.cooking_duration_id
      LEFT JOIN difficulties d ON d.id = r.difficulty_id
      LEFT JOIN users u ON u.id = r.user_id
"#;

const SEARCH_FILTER: &str = "(r.name ILIKE $1 OR r.description ILIKE $1)";

const FAVORITE_JOIN: &str = r#"
      JOIN favorites f
        ON f.food_recipe_id = r.id AND f.user_id = $4 AND f.deleted_at IS NULL
"#;

/// `%term%` with LIKE metacharacters escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct PgRecipeRepository {
    db: PgPool,
}

impl PgRecipeRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn with_ratings(&self, mut recipes: Vec<FoodRecipe>) -> anyhow::Result<Vec<FoodRecipe>> {
        if recipes.is_empty() {
            return Ok(recipes);
        }
        let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, score, food_recipe_id, user_id, created_at
              FROM ratings
             WHERE food_recipe_id = ANY($1) AND deleted_at IS NULL
             ORDER BY id ASC
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&self.db)
        .await
        .context("load ratings for recipes")?;

        let mut by_recipe: HashMap<i64, Vec<Rating>> = HashMap::new();
        for rating in ratings {
            by_recipe.entry(rating.food_recipe_id).or_default().push(rating);
        }
        for recipe in &mut recipes {
            recipe.ratings = by_recipe.remove(&recipe.id).unwrap_or_default();
        }
        Ok(recipes)
    }

    async fn fetch_one_live(&self, id: i64) -> anyhow::Result<Option<FoodRecipe>> {
        let sql = format!("{RECIPE_SELECT} WHERE r.id = $1 AND r.deleted_at IS NULL");
        let row = sqlx::query_as::<_, FoodRecipeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("get recipe by id")?;
        match row {
            Some(row) => Ok(self.with_ratings(vec![row.into()]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RecipeRepository for PgRecipeRepository {
    async fn create(&self, user_id: &str, fields: &RecipeFields) -> anyhow::Result<FoodRecipe> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO food_recipes
                (name, description, ingredient, instruction, image_url,
                 cooking_duration_id, difficulty_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&fields.name)
        .bind(fields.description.as_deref().unwrap_or_default())
        .bind(fields.ingredient.as_deref().unwrap_or_default())
        .bind(fields.instruction.as_deref().unwrap_or_default())
        .bind(&fields.image_url)
        .bind(fields.cooking_duration_id)
        .bind(fields.difficulty_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("insert recipe")?;

        self.fetch_one_live(id)
            .await?
            .context("created recipe vanished")
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<FoodRecipe>> {
        self.fetch_one_live(id).await
    }

    async fn list(&self, query: &RecipeQuery) -> anyhow::Result<Vec<FoodRecipe>> {
        let sql = format!(
            "{RECIPE_SELECT} WHERE r.deleted_at IS NULL AND {SEARCH_FILTER} \
             ORDER BY r.name ASC, r.id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, FoodRecipeRow>(&sql)
            .bind(like_pattern(query.term()))
            .bind(query.limit)
            .bind(query.offset())
            .fetch_all(&self.db)
            .await
            .context("list recipes")?;
        self.with_ratings(rows.into_iter().map(Into::into).collect())
            .await
    }

    async fn count(&self, search: &str) -> anyhow::Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM food_recipes r WHERE r.deleted_at IS NULL AND {SEARCH_FILTER}"
        );
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(like_pattern(search))
            .fetch_one(&self.db)
            .await
            .context("count recipes")?;
        Ok(count)
    }

    async fn update(&self, id: i64, fields: &RecipeFields) -> anyhow::Result<Option<FoodRecipe>> {
        let result = sqlx::query(
            r#"
            UPDATE food_recipes
               SET name = $2,
                   description = COALESCE($3, description),
                   ingredient = COALESCE($4, ingredient),
                   instruction = COALESCE($5, instruction),
                   image_url = COALESCE($6, image_url),
                   cooking_duration_id = COALESCE($7, cooking_duration_id),
                   difficulty_id = COALESCE($8, difficulty_id),
                   updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.ingredient)
        .bind(&fields.instruction)
        .bind(&fields.image_url)
        .bind(fields.cooking_duration_id)
        .bind(fields.difficulty_id)
        .execute(&self.db)
        .await
        .context("update recipe")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_one_live(id).await
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE food_recipes
               SET deleted_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await
        .context("delete recipe")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(
        &self,
        user_id: &str,
        query: &RecipeQuery,
    ) -> anyhow::Result<Vec<FoodRecipe>> {
        let sql = format!(
            "{RECIPE_SELECT} {FAVORITE_JOIN} WHERE r.deleted_at IS NULL AND {SEARCH_FILTER} \
             ORDER BY r.name ASC, r.id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, FoodRecipeRow>(&sql)
            .bind(like_pattern(query.term()))
            .bind(query.limit)
            .bind(query.offset())
            .bind(user_id)
            .fetch_all(&self.db)
            .await
            .context("list favorite recipes")?;
        self.with_ratings(rows.into_iter().map(Into::into).collect())
            .await
    }

    async fn count_favorites(&self, user_id: &str, search: &str) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
              FROM food_recipes r
              JOIN favorites f
                ON f.food_recipe_id = r.id AND f.user_id = $2 AND f.deleted_at IS NULL
             WHERE r.deleted_at IS NULL
               AND (r.name ILIKE $1 OR r.description ILIKE $1)
            "#,
        )
        .bind(like_pattern(search))
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("count favorite recipes")?;
        Ok(count)
    }

    async fn list_by_user(&self, user_id: &str) -> anyhow::Result<Vec<FoodRecipe>> {
        let sql = format!(
            "{RECIPE_SELECT} WHERE r.user_id = $1 AND r.deleted_at IS NULL \
             ORDER BY r.name ASC, r.id ASC"
        );
        let rows = sqlx::query_as::<_, FoodRecipeRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await
            .context("list recipes by user")?;
        self.with_ratings(rows.into_iter().map(Into::into).collect())
            .await
    }
}
