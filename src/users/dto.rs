use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::users::repo_types::User;

/// Profile update body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub last_name: String,
    #[serde(default)]
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            image_url: u.image_url,
        }
    }
}
