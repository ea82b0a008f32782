use std::sync::Arc;

use tracing::{debug, instrument};
use validator::Validate;

use crate::auth::claims::Claims;
use crate::dto::RecipeQuery;
use crate::error::{ServiceError, ServiceResult};
use crate::recipes::dto::FoodRecipeRequest;
use crate::recipes::repo::RecipeRepository;
use crate::recipes::repo_types::FoodRecipe;
use crate::users::services::UserService;

pub struct RecipeService {
    repo: Arc<dyn RecipeRepository>,
    users: Arc<UserService>,
}

impl RecipeService {
    pub fn new(repo: Arc<dyn RecipeRepository>, users: Arc<UserService>) -> Self {
        Self { repo, users }
    }

    #[instrument(skip(self, request, claims), fields(user_id = %claims.id))]
    pub async fn create(&self, request: FoodRecipeRequest, claims: &Claims) -> ServiceResult<FoodRecipe> {
        request.validate()?;
        let owner = self.users.resolve_caller(claims).await?;

        let recipe = self.repo.create(&owner.id, &request.into()).await?;
        debug!(recipe_id = recipe.id, "recipe created");
        Ok(recipe.with_average_rating())
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<FoodRecipe> {
        self.repo
            .find_by_id(id)
            .await?
            .map(FoodRecipe::with_average_rating)
            .ok_or(ServiceError::NotFound)
    }

    /// One page of recipes plus the size of the whole filtered set.
    pub async fn get(&self, query: &RecipeQuery) -> ServiceResult<(Vec<FoodRecipe>, i64)> {
        query.validate()?;

        let recipes = self.repo.list(query).await?;
        let total = self.repo.count(query.term()).await?;
        Ok((
            recipes.into_iter().map(FoodRecipe::with_average_rating).collect(),
            total,
        ))
    }

    /// Ownership is checked before the payload is validated.
    #[instrument(skip(self, request, claims), fields(user_id = %claims.id))]
    pub async fn update(
        &self,
        request: FoodRecipeRequest,
        id: i64,
        claims: &Claims,
    ) -> ServiceResult<FoodRecipe> {
        self.owned_by(id, claims).await?;
        request.validate()?;

        self.repo
            .update(id, &request.into())
            .await?
            .map(FoodRecipe::with_average_rating)
            .ok_or(ServiceError::NotFound)
    }

    #[instrument(skip(self, claims), fields(user_id = %claims.id))]
    pub async fn delete(&self, id: i64, claims: &Claims) -> ServiceResult<()> {
        self.owned_by(id, claims).await?;

        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound);
        }
        debug!(recipe_id = id, "recipe soft-deleted");
        Ok(())
    }

    pub async fn get_favorites(
        &self,
        query: &RecipeQuery,
        claims: &Claims,
    ) -> ServiceResult<(Vec<FoodRecipe>, i64)> {
        if claims.id.is_empty() {
            return Err(ServiceError::Forbidden);
        }
        query.validate()?;

        let recipes = self.repo.list_favorites(&claims.id, query).await?;
        let total = self.repo.count_favorites(&claims.id, query.term()).await?;
        Ok((
            recipes.into_iter().map(FoodRecipe::with_average_rating).collect(),
            total,
        ))
    }

    async fn owned_by(&self, id: i64, claims: &Claims) -> ServiceResult<FoodRecipe> {
        let recipe = self.repo.find_by_id(id).await?.ok_or(ServiceError::NotFound)?;
        if recipe.user_id != claims.id {
            return Err(ServiceError::Forbidden);
        }
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{claims_for, MemoryStore};

    fn service(store: &MemoryStore) -> RecipeService {
        let users = Arc::new(UserService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        ));
        RecipeService::new(Arc::new(store.clone()), users)
    }

    fn named(name: &str) -> FoodRecipeRequest {
        FoodRecipeRequest {
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_stamps_owner_from_claims() {
        let store = MemoryStore::default();
        store.seed_user("chef");
        let recipes = service(&store);

        let created = recipes.create(named("Name"), &claims_for("chef")).await.unwrap();
        assert_eq!(created.name, "Name");
        assert_eq!(created.user_id, "chef");
        assert_eq!(created.average_rating, 0.0);
    }

    #[tokio::test]
    async fn create_by_unknown_caller_is_user_not_found() {
        let store = MemoryStore::default();
        let err = service(&store)
            .create(named("Name"), &claims_for("never-logged-in"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound));
        assert_eq!(store.recipe_count(), 0);
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload() {
        let store = MemoryStore::default();
        let err = service(&store)
            .create(named(""), &claims_for("chef"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.recipe_count(), 0);
    }

    #[tokio::test]
    async fn get_by_id_attaches_average_rating() {
        let store = MemoryStore::default();
        let id = store.seed_recipe("chef", "Larb");
        store.seed_rating(id, "a", 5.0);
        store.seed_rating(id, "b", 4.0);
        store.seed_rating(id, "b", 3.0);

        let recipe = service(&store).get_by_id(id).await.unwrap();
        assert_eq!(recipe.ratings.len(), 3);
        assert_eq!(recipe.average_rating, 4.0);

        let err = service(&store).get_by_id(999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn second_page_returns_records_eleven_to_twenty() {
        let store = MemoryStore::default();
        for i in 1..=25 {
            store.seed_recipe("chef", &format!("Recipe {i:02}"));
        }

        let (page, total) = service(&store)
            .get(&RecipeQuery::new(None, 2, 10))
            .await
            .unwrap();
        assert_eq!(total, 25);
        let names: Vec<_> = page.iter().map(|r| r.name.as_str()).collect();
        let expected: Vec<_> = (11..=20).map(|i| format!("Recipe {i:02}")).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn search_filters_name_and_description_case_insensitively() {
        let store = MemoryStore::default();
        store.seed_recipe("chef", "Pad Thai");
        store.seed_recipe("chef", "Khao Soi");
        let massaman = store.seed_recipe("chef", "Massaman");
        store.set_description(massaman, "a Thai curry");

        let (page, total) = service(&store)
            .get(&RecipeQuery::new(Some("thai"), 1, 1))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Massaman");
    }

    #[tokio::test]
    async fn get_rejects_zero_page() {
        let store = MemoryStore::default();
        let err = service(&store)
            .get(&RecipeQuery::new(None, 0, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn update_by_non_owner_is_forbidden_even_with_invalid_payload() {
        let store = MemoryStore::default();
        let id = store.seed_recipe("owner", "Som Tam");
        let recipes = service(&store);

        let err = recipes
            .update(named(""), id, &claims_for("intruder"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));

        let err = recipes
            .update(named("x"), 404, &claims_for("owner"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn update_keeps_fields_left_out() {
        let store = MemoryStore::default();
        let id = store.seed_recipe("owner", "Som Tam");
        store.set_description(id, "papaya salad");
        let recipes = service(&store);

        let updated = recipes
            .update(
                FoodRecipeRequest {
                    name: "Som Tam Thai".into(),
                    ingredient: Some("papaya".into()),
                    ..Default::default()
                },
                id,
                &claims_for("owner"),
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Som Tam Thai");
        assert_eq!(updated.description, "papaya salad");
        assert_eq!(updated.ingredient, "papaya");
    }

    #[tokio::test]
    async fn delete_checks_owner_then_hides_recipe() {
        let store = MemoryStore::default();
        let id = store.seed_recipe("owner", "Tom Kha");
        let recipes = service(&store);

        let err = recipes.delete(id, &claims_for("other")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));

        recipes.delete(id, &claims_for("owner")).await.unwrap();
        assert!(matches!(
            recipes.get_by_id(id).await.unwrap_err(),
            ServiceError::NotFound
        ));
        assert!(matches!(
            recipes.delete(id, &claims_for("owner")).await.unwrap_err(),
            ServiceError::NotFound
        ));
    }

    #[tokio::test]
    async fn favorites_require_caller_and_follow_active_rows() {
        let store = MemoryStore::default();
        let a = store.seed_recipe("chef", "A");
        let b = store.seed_recipe("chef", "B");
        store.seed_favorite(a, "fan");
        store.seed_favorite(b, "fan");
        store.seed_favorite(b, "someone-else");
        let recipes = service(&store);

        let err = recipes
            .get_favorites(&RecipeQuery::new(None, 1, 10), &Claims::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));

        let (list, total) = recipes
            .get_favorites(&RecipeQuery::new(None, 1, 10), &claims_for("fan"))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(list.len(), 2);
    }
}
