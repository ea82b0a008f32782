use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::users::repo_types::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>>;

    /// Insert or update keyed on the subject id.
    async fn save(&self, user: &User) -> anyhow::Result<User>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, image_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn save(&self, user: &User) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, first_name, last_name, image_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
               SET first_name = EXCLUDED.first_name,
                   last_name  = EXCLUDED.last_name,
                   image_url  = EXCLUDED.image_url,
                   updated_at = now()
            RETURNING id, first_name, last_name, image_url, created_at, updated_at
            "#,
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.image_url)
        .fetch_one(&self.db)
        .await
        .context("upsert user")?;
        Ok(user)
    }
}
