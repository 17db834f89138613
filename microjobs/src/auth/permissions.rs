//! Authorization checks on top of an authenticated [`CurrentUser`].

use crate::api::models::users::CurrentUser;
use crate::errors::{Error, Result};
use crate::types::{Operation, Resource};

/// Require the caller to be an admin for `action` on `resource`.
///
/// Admin surfaces answer a non-admin caller the same way as an anonymous one: 401.
pub fn require_admin(user: &CurrentUser, action: Operation, resource: Resource) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, %action, %resource, "Admin permission denied");
        Err(Error::Unauthenticated { message: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::UserType;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn user(user_type: UserType) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            user_type,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&user(UserType::Admin), Operation::ReadAll, Resource::CommissionSettings).is_ok());

        let err = require_admin(&user(UserType::Employer), Operation::UpdateAll, Resource::CommissionSettings).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.user_message(), "Unauthorized");
    }
}
