//! In-memory collaborators for unit and router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use time::OffsetDateTime;

use crate::auth::claims::Claims;
use crate::auth::login_state::StateGenerator;
use crate::auth::provider::{self, IdentityProvider, TokenResponse};
use crate::auth::verifier::OidcVerifier;
use crate::config::KeycloakConfig;
use crate::dto::RecipeQuery;
use crate::ratings::repo::RatingRepository;
use crate::ratings::repo_types::{NewRating, Rating};
use crate::recipes::repo::RecipeRepository;
use crate::recipes::repo_types::{FoodRecipe, Lookup, Owner, RecipeFields};
use crate::users::repo::UserRepository;
use crate::users::repo_types::User;

pub const TEST_SECRET: &[u8] = b"recipeshare-test-secret";
pub const TEST_ISSUER: &str = "http://localhost:8081/realms/test";
pub const TEST_CLIENT_ID: &str = "recipeshare";

const COOKING_DURATIONS: &[(i64, &str)] = &[(1, "5 - 10"), (2, "11 - 30"), (3, "31 - 60"), (4, "60+")];
const DIFFICULTIES: &[(i64, &str)] = &[(1, "Easy"), (2, "Medium"), (3, "Hard")];

fn lookup(table: &[(i64, &str)], id: Option<i64>) -> Option<Lookup> {
    let id = id?;
    table.iter().find(|(k, _)| *k == id).map(|(id, name)| Lookup {
        id: *id,
        name: name.to_string(),
    })
}

pub fn claims_for(id: &str) -> Claims {
    Claims {
        id: id.to_string(),
        first_name: format!("First {id}"),
        last_name: "Tester".to_string(),
        picture: None,
    }
}

/// HS256 token with `iss` and `exp` filled in unless given.
pub fn sign_token(claims: serde_json::Value) -> String {
    let mut claims = claims;
    let now = OffsetDateTime::now_utc().unix_timestamp();
    if let Some(map) = claims.as_object_mut() {
        map.entry("iss").or_insert_with(|| TEST_ISSUER.into());
        map.entry("exp").or_insert_with(|| (now + 3600).into());
        map.entry("iat").or_insert_with(|| now.into());
    }
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .unwrap()
}

/// `Authorization` header value for a caller with [`claims_for`] claims.
pub fn bearer(user_id: &str) -> String {
    let claims = claims_for(user_id);
    format!(
        "Bearer {}",
        sign_token(serde_json::json!({
            "sub": claims.id,
            "given_name": claims.first_name,
            "family_name": claims.last_name,
            "aud": "account",
        }))
    )
}

pub fn test_verifier(audience: Option<&str>) -> OidcVerifier {
    OidcVerifier::with_static_key(
        TEST_ISSUER,
        audience.map(str::to_string),
        None,
        Algorithm::HS256,
        DecodingKey::from_secret(TEST_SECRET),
    )
}

pub fn test_keycloak() -> KeycloakConfig {
    KeycloakConfig {
        url: "http://localhost:8081".into(),
        realm: "test".into(),
        client_id: TEST_CLIENT_ID.into(),
        client_secret: "test".into(),
        redirect_url: "http://localhost:8080/api/v1/callback".into(),
    }
}

pub struct FixedState(pub String);

impl StateGenerator for FixedState {
    fn generate(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct FakeProvider {
    pub id_token: Option<String>,
    pub fail_exchange: bool,
}

impl FakeProvider {
    pub fn with_id_token(id_token: String) -> Self {
        Self {
            id_token: Some(id_token),
            fail_exchange: false,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn authorization_url(&self, state: &str) -> anyhow::Result<String> {
        let config = test_keycloak();
        let endpoint = format!("{}/protocol/openid-connect/auth", config.realm_url());
        provider::authorization_url(&endpoint, &config, state)
    }

    async fn exchange_code(&self, _code: &str) -> anyhow::Result<TokenResponse> {
        if self.fail_exchange {
            anyhow::bail!("exchange token: invalid_grant");
        }
        Ok(TokenResponse {
            access_token: "access-token".into(),
            token_type: "Bearer".into(),
            refresh_token: Some("refresh-token".into()),
            expires_in: Some(300),
            id_token: self.id_token.clone(),
        })
    }

    async fn end_session_url(
        &self,
        id_token_hint: &str,
        post_logout_redirect_uri: &str,
    ) -> anyhow::Result<String> {
        provider::end_session_url(
            &test_keycloak().default_logout_url(),
            id_token_hint,
            post_logout_redirect_uri,
        )
    }
}

struct StoredRecipe {
    recipe: FoodRecipe,
    deleted: bool,
}

struct StoredFavorite {
    recipe_id: i64,
    user_id: String,
    deleted: bool,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    recipes: Vec<StoredRecipe>,
    ratings: Vec<Rating>,
    favorites: Vec<StoredFavorite>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn hydrate(&self, recipe: &FoodRecipe) -> FoodRecipe {
        let mut recipe = recipe.clone();
        recipe.owner = self.users.get(&recipe.user_id).map(|u| Owner {
            id: u.id.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            image_url: u.image_url.clone(),
        });
        recipe.ratings = self
            .ratings
            .iter()
            .filter(|r| r.food_recipe_id == recipe.id)
            .cloned()
            .collect();
        recipe
    }

    fn live(&self) -> impl Iterator<Item = &FoodRecipe> {
        self.recipes.iter().filter(|s| !s.deleted).map(|s| &s.recipe)
    }

    fn is_favorite(&self, recipe_id: i64, user_id: &str) -> bool {
        self.favorites
            .iter()
            .any(|f| f.recipe_id == recipe_id && f.user_id == user_id && !f.deleted)
    }

    fn search(&self, term: &str, favorites_of: Option<&str>) -> Vec<FoodRecipe> {
        let term = term.to_lowercase();
        let mut found: Vec<FoodRecipe> = self
            .live()
            .filter(|r| {
                r.name.to_lowercase().contains(&term)
                    || r.description.to_lowercase().contains(&term)
            })
            .filter(|r| favorites_of.map_or(true, |u| self.is_favorite(r.id, u)))
            .map(|r| self.hydrate(r))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        found
    }
}

fn page(recipes: Vec<FoodRecipe>, query: &RecipeQuery) -> Vec<FoodRecipe> {
    recipes
        .into_iter()
        .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(query.limit).unwrap_or(0))
        .collect()
}

/// One shared in-memory database implementing every repository trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn seed_user(&self, id: &str) {
        let claims = claims_for(id);
        let user = User::new(id).apply_claims(&claims);
        self.lock().users.insert(id.to_string(), user);
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.lock().users.get(id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn seed_recipe(&self, user_id: &str, name: &str) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        let now = OffsetDateTime::now_utc();
        inner.recipes.push(StoredRecipe {
            recipe: FoodRecipe {
                id,
                name: name.to_string(),
                description: String::new(),
                ingredient: String::new(),
                instruction: String::new(),
                image_url: None,
                cooking_duration: lookup(COOKING_DURATIONS, Some(1)),
                difficulty: lookup(DIFFICULTIES, Some(1)),
                user_id: user_id.to_string(),
                owner: None,
                ratings: Vec::new(),
                average_rating: 0.0,
                created_at: now,
                updated_at: now,
            },
            deleted: false,
        });
        id
    }

    pub fn set_description(&self, recipe_id: i64, description: &str) {
        let mut inner = self.lock();
        if let Some(stored) = inner.recipes.iter_mut().find(|s| s.recipe.id == recipe_id) {
            stored.recipe.description = description.to_string();
        }
    }

    pub fn recipe_count(&self) -> usize {
        self.lock().live().count()
    }

    pub fn seed_rating(&self, recipe_id: i64, user_id: &str, score: f64) {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.ratings.push(Rating {
            id,
            score,
            food_recipe_id: recipe_id,
            user_id: user_id.to_string(),
            created_at: OffsetDateTime::now_utc(),
        });
    }

    pub fn seed_favorite(&self, recipe_id: i64, user_id: &str) {
        self.lock().favorites.push(StoredFavorite {
            recipe_id,
            user_id: user_id.to_string(),
            deleted: false,
        });
    }

    /// Favorite rows for the pair, soft-deleted ones included.
    pub fn favorite_rows(&self, recipe_id: i64, user_id: &str) -> usize {
        self.lock()
            .favorites
            .iter()
            .filter(|f| f.recipe_id == recipe_id && f.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.get(id).cloned())
    }

    async fn save(&self, user: &User) -> anyhow::Result<User> {
        let mut saved = user.clone();
        saved.updated_at = OffsetDateTime::now_utc();
        self.lock().users.insert(saved.id.clone(), saved.clone());
        Ok(saved)
    }
}

#[async_trait]
impl RecipeRepository for MemoryStore {
    async fn create(&self, user_id: &str, fields: &RecipeFields) -> anyhow::Result<FoodRecipe> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let now = OffsetDateTime::now_utc();
        let recipe = FoodRecipe {
            id,
            name: fields.name.clone(),
            description: fields.description.clone().unwrap_or_default(),
            ingredient: fields.ingredient.clone().unwrap_or_default(),
            instruction: fields.instruction.clone().unwrap_or_default(),
            image_url: fields.image_url.clone(),
            cooking_duration: lookup(COOKING_DURATIONS, fields.cooking_duration_id),
            difficulty: lookup(DIFFICULTIES, fields.difficulty_id),
            user_id: user_id.to_string(),
            owner: None,
            ratings: Vec::new(),
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        };
        let hydrated = inner.hydrate(&recipe);
        inner.recipes.push(StoredRecipe {
            recipe,
            deleted: false,
        });
        Ok(hydrated)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<FoodRecipe>> {
        let inner = self.lock();
        let found = inner.live().find(|r| r.id == id).map(|r| inner.hydrate(r));
        Ok(found)
    }

    async fn list(&self, query: &RecipeQuery) -> anyhow::Result<Vec<FoodRecipe>> {
        Ok(page(self.lock().search(query.term(), None), query))
    }

    async fn count(&self, search: &str) -> anyhow::Result<i64> {
        Ok(self.lock().search(search, None).len() as i64)
    }

    async fn update(&self, id: i64, fields: &RecipeFields) -> anyhow::Result<Option<FoodRecipe>> {
        let mut inner = self.lock();
        let Some(stored) = inner
            .recipes
            .iter_mut()
            .find(|s| s.recipe.id == id && !s.deleted)
        else {
            return Ok(None);
        };
        let recipe = &mut stored.recipe;
        recipe.name = fields.name.clone();
        if let Some(v) = &fields.description {
            recipe.description = v.clone();
        }
        if let Some(v) = &fields.ingredient {
            recipe.ingredient = v.clone();
        }
        if let Some(v) = &fields.instruction {
            recipe.instruction = v.clone();
        }
        if fields.image_url.is_some() {
            recipe.image_url = fields.image_url.clone();
        }
        if fields.cooking_duration_id.is_some() {
            recipe.cooking_duration = lookup(COOKING_DURATIONS, fields.cooking_duration_id);
        }
        if fields.difficulty_id.is_some() {
            recipe.difficulty = lookup(DIFFICULTIES, fields.difficulty_id);
        }
        recipe.updated_at = OffsetDateTime::now_utc();
        let updated = recipe.clone();
        let hydrated = inner.hydrate(&updated);
        Ok(Some(hydrated))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.lock();
        let deleted = match inner
            .recipes
            .iter_mut()
            .find(|s| s.recipe.id == id && !s.deleted)
        {
            Some(stored) => {
                stored.deleted = true;
                true
            }
            None => false,
        };
        Ok(deleted)
    }

    async fn list_favorites(
        &self,
        user_id: &str,
        query: &RecipeQuery,
    ) -> anyhow::Result<Vec<FoodRecipe>> {
        Ok(page(self.lock().search(query.term(), Some(user_id)), query))
    }

    async fn count_favorites(&self, user_id: &str, search: &str) -> anyhow::Result<i64> {
        Ok(self.lock().search(search, Some(user_id)).len() as i64)
    }

    async fn list_by_user(&self, user_id: &str) -> anyhow::Result<Vec<FoodRecipe>> {
        let mut recipes = self.lock().search("", None);
        recipes.retain(|r| r.user_id == user_id);
        Ok(recipes)
    }
}

#[async_trait]
impl RatingRepository for MemoryStore {
    async fn create(&self, rating: &NewRating) -> anyhow::Result<Rating> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let rating = Rating {
            id,
            score: rating.score,
            food_recipe_id: rating.food_recipe_id,
            user_id: rating.user_id.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.ratings.push(rating.clone());
        Ok(rating)
    }

    async fn list_by_recipe(&self, recipe_id: i64) -> anyhow::Result<Vec<Rating>> {
        Ok(self
            .lock()
            .ratings
            .iter()
            .filter(|r| r.food_recipe_id == recipe_id)
            .cloned()
            .collect())
    }

    async fn is_favorite(&self, recipe_id: i64, user_id: &str) -> anyhow::Result<bool> {
        Ok(self.lock().is_favorite(recipe_id, user_id))
    }

    async fn add_favorite(&self, recipe_id: i64, user_id: &str) -> anyhow::Result<()> {
        let mut inner = self.lock();
        match inner
            .favorites
            .iter_mut()
            .find(|f| f.recipe_id == recipe_id && f.user_id == user_id)
        {
            Some(existing) => existing.deleted = false,
            None => inner.favorites.push(StoredFavorite {
                recipe_id,
                user_id: user_id.to_string(),
                deleted: false,
            }),
        }
        Ok(())
    }

    async fn remove_favorite(&self, recipe_id: i64, user_id: &str) -> anyhow::Result<()> {
        let mut inner = self.lock();
        for f in inner
            .favorites
            .iter_mut()
            .filter(|f| f.recipe_id == recipe_id && f.user_id == user_id)
        {
            f.deleted = true;
        }
        Ok(())
    }
}
