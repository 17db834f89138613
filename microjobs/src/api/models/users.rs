//! API models for users and the authenticated caller.

use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account type; admins manage settings, employers post jobs, workers reserve them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    Employer,
    Worker,
}

/// The authenticated user making a request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub user_type: UserType,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}
