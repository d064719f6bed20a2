//! Ownership rule for todos.
//!
//! Resolved once per request from the authenticated identity, then applied
//! to every read, update, delete and list.

use uuid::Uuid;

use crate::auth::{extractors::AuthUser, repo_types::Role};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// May touch only rows owned by this user.
    Owner(Uuid),
    /// May touch every row.
    Admin,
}

impl Access {
    pub fn for_user(user: &AuthUser) -> Self {
        match user.role {
            Role::Admin => Access::Admin,
            Role::User => Access::Owner(user.user_id),
        }
    }

    pub fn authorize(&self, owner_id: Uuid) -> Result<(), ApiError> {
        match self {
            Access::Admin => Ok(()),
            Access::Owner(id) if *id == owner_id => Ok(()),
            Access::Owner(_) => Err(ApiError::Forbidden),
        }
    }

    /// Owner filter for list queries; `None` means every row.
    pub fn list_scope(&self) -> Option<Uuid> {
        match self {
            Access::Admin => None,
            Access::Owner(id) => Some(*id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "u@x.com".into(),
            role,
        }
    }

    #[test]
    fn owner_may_touch_own_rows_only() {
        let u = user(Role::User);
        let access = u.access();
        assert_eq!(access, Access::Owner(u.user_id));
        assert!(access.authorize(u.user_id).is_ok());
        assert!(matches!(
            access.authorize(Uuid::new_v4()),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn admin_may_touch_any_row() {
        let access = user(Role::Admin).access();
        assert_eq!(access, Access::Admin);
        assert!(access.authorize(Uuid::new_v4()).is_ok());
        assert_eq!(access.list_scope(), None);
    }

    #[test]
    fn owner_lists_are_scoped() {
        let u = user(Role::User);
        assert_eq!(u.access().list_scope(), Some(u.user_id));
    }
}
