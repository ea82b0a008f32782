use serde::{Deserialize, Serialize};
use validator::Validate;

/// Identity attributes read from a verified OIDC token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Claims {
    #[serde(rename = "sub")]
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(rename = "given_name", default)]
    pub first_name: String,
    #[serde(rename = "family_name", default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}
