use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::claims::Claims;

/// User record in the database. `id` is the identity provider's subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Empty record for a subject that has never logged in.
    pub fn new(id: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            first_name: String::new(),
            last_name: String::new(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overlay identity attributes from verified claims. A missing picture
    /// claim keeps the stored image.
    pub fn apply_claims(mut self, claims: &Claims) -> Self {
        self.id = claims.id.clone();
        self.first_name = claims.first_name.clone();
        self.last_name = claims.last_name.clone();
        if let Some(picture) = &claims.picture {
            self.image_url = Some(picture.clone());
        }
        self
    }
}
