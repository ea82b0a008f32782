use std::sync::Arc;

use tracing::{debug, instrument};
use validator::Validate;

use crate::auth::claims::Claims;
use crate::error::{ServiceError, ServiceResult};
use crate::ratings::dto::{FavoriteRequest, RatingRequest};
use crate::ratings::repo::RatingRepository;
use crate::ratings::repo_types::{NewRating, Rating};
use crate::recipes::repo::RecipeRepository;
use crate::users::services::UserService;

pub struct RatingService {
    repo: Arc<dyn RatingRepository>,
    recipes: Arc<dyn RecipeRepository>,
    users: Arc<UserService>,
}

impl RatingService {
    pub fn new(
        repo: Arc<dyn RatingRepository>,
        recipes: Arc<dyn RecipeRepository>,
        users: Arc<UserService>,
    ) -> Self {
        Self {
            repo,
            recipes,
            users,
        }
    }

    #[instrument(skip(self, request, claims), fields(user_id = %claims.id))]
    pub async fn create(
        &self,
        request: RatingRequest,
        recipe_id: i64,
        claims: &Claims,
    ) -> ServiceResult<Rating> {
        request.validate()?;
        let score = request.score.unwrap_or_default();

        let user = self.users.resolve_caller(claims).await?;
        self.ensure_recipe(recipe_id).await?;

        let rating = self
            .repo
            .create(&NewRating {
                score,
                food_recipe_id: recipe_id,
                user_id: user.id,
            })
            .await?;
        debug!(rating_id = rating.id, "rating stored");
        Ok(rating)
    }

    pub async fn get_by_recipe(&self, recipe_id: i64) -> ServiceResult<Vec<Rating>> {
        Ok(self.repo.list_by_recipe(recipe_id).await?)
    }

    /// Set or clear the caller's favorite and return the resulting state.
    #[instrument(skip(self, request, claims), fields(user_id = %claims.id))]
    pub async fn favorite(
        &self,
        request: FavoriteRequest,
        recipe_id: i64,
        claims: &Claims,
    ) -> ServiceResult<bool> {
        request.validate()?;
        let favorited = request.is_favorited.unwrap_or_default();

        let user = self.users.resolve_caller(claims).await?;
        self.ensure_recipe(recipe_id).await?;

        if favorited {
            self.repo.add_favorite(recipe_id, &user.id).await?;
        } else {
            self.repo.remove_favorite(recipe_id, &user.id).await?;
        }
        Ok(favorited)
    }

    pub async fn is_favorite(&self, recipe_id: i64, claims: &Claims) -> ServiceResult<bool> {
        let user = self.users.resolve_caller(claims).await?;
        Ok(self.repo.is_favorite(recipe_id, &user.id).await?)
    }

    async fn ensure_recipe(&self, recipe_id: i64) -> ServiceResult<()> {
        match self.recipes.find_by_id(recipe_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound),
        }
    }
}
