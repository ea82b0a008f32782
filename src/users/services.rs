use std::sync::Arc;

use tracing::{debug, instrument};
use validator::Validate;

use crate::auth::claims::Claims;
use crate::error::{ServiceError, ServiceResult};
use crate::recipes::repo::RecipeRepository;
use crate::recipes::repo_types::FoodRecipe;
use crate::users::dto::UserRequest;
use crate::users::repo::UserRepository;
use crate::users::repo_types::User;

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    recipes: Arc<dyn RecipeRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, recipes: Arc<dyn RecipeRepository>) -> Self {
        Self { repo, recipes }
    }

    /// Create or refresh the user behind a verified login.
    #[instrument(skip(self, claims), fields(user_id = %claims.id))]
    pub async fn upsert_with_claims(&self, claims: &Claims) -> ServiceResult<User> {
        claims.validate()?;

        let user = self
            .repo
            .find_by_id(&claims.id)
            .await?
            .unwrap_or_else(|| User::new(&claims.id))
            .apply_claims(claims);

        let saved = self.repo.save(&user).await?;
        debug!("user upserted from claims");
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<User> {
        self.repo.find_by_id(id).await?.ok_or(ServiceError::NotFound)
    }

    /// Resolve the caller to a stored user.
    pub async fn resolve_caller(&self, claims: &Claims) -> ServiceResult<User> {
        if claims.id.is_empty() {
            return Err(ServiceError::UserNotFound);
        }
        self.repo
            .find_by_id(&claims.id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    pub async fn get_recipes(&self, user_id: &str, claims: &Claims) -> ServiceResult<Vec<FoodRecipe>> {
        self.resolve_caller(claims).await?;

        let recipes = self.recipes.list_by_user(user_id).await?;
        Ok(recipes
            .into_iter()
            .map(FoodRecipe::with_average_rating)
            .collect())
    }

    pub async fn update(&self, id: &str, request: UserRequest, claims: &Claims) -> ServiceResult<User> {
        let mut user = self.get_by_id(id).await?;
        if user.id != claims.id {
            return Err(ServiceError::Forbidden);
        }
        request.validate()?;

        user.first_name = request.first_name;
        user.last_name = request.last_name;
        if request.image_url.is_some() {
            user.image_url = request.image_url;
        }
        Ok(self.repo.save(&user).await?)
    }
}
