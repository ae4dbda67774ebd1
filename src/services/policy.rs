//! Authorization policy: role gating and ownership gating, kept as two
//! independent checks so handlers compose them instead of re-deriving a
//! combined boolean.

use crate::error::AppError;
use crate::models::Role;

/// The identity resolved for the current request. Built once by the
/// authentication extractor and immutable afterwards.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
}

/// Role-gate: the operation requires one of `allowed`.
pub fn require_role(user: &CurrentUser, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!(
            "User role {} is not authorized to access this route",
            user.role
        )))
    }
}

/// Ownership-gate: mutation of an owned resource requires the caller to be
/// its owner or an admin. Admin bypasses ownership, never role-gates.
pub fn require_owner(
    user: &CurrentUser,
    owner_id: &str,
    resource_id: &str,
) -> Result<(), AppError> {
    if user.id == owner_id || user.role == Role::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!(
            "User {} is not authorized to modify resource {}",
            user.id,
            resource_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Role) -> CurrentUser {
        CurrentUser {
            id: id.to_string(),
            role,
        }
    }

    #[test]
    fn role_gate_allows_member_roles() {
        let publisher = user("u1", Role::Publisher);
        assert!(require_role(&publisher, &[Role::Publisher, Role::Admin]).is_ok());
    }

    #[test]
    fn role_gate_rejects_and_names_the_role() {
        let plain = user("u1", Role::User);
        let err = require_role(&plain, &[Role::Publisher, Role::Admin]).unwrap_err();
        match err {
            AppError::Forbidden(e) => assert!(e.to_string().contains("user")),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn owner_may_mutate() {
        let owner = user("u1", Role::Publisher);
        assert!(require_owner(&owner, "u1", "b1").is_ok());
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = user("root", Role::Admin);
        assert!(require_owner(&admin, "somebody-else", "b1").is_ok());
    }

    #[test]
    fn non_owner_non_admin_is_forbidden() {
        for role in [Role::User, Role::Publisher] {
            let stranger = user("u2", role);
            let err = require_owner(&stranger, "u1", "b1").unwrap_err();
            match err {
                AppError::Forbidden(e) => {
                    let msg = e.to_string();
                    assert!(msg.contains("u2"));
                    assert!(msg.contains("b1"));
                }
                other => panic!("expected Forbidden, got {:?}", other),
            }
        }
    }

    #[test]
    fn ownership_and_role_checks_are_independent() {
        // An admin passes the ownership gate but still fails a role gate that
        // excludes admin.
        let admin = user("root", Role::Admin);
        assert!(require_owner(&admin, "u1", "b1").is_ok());
        assert!(require_role(&admin, &[Role::User]).is_err());
    }
}
