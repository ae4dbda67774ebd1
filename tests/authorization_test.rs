use bootcamp_service::error::AppError;
use bootcamp_service::models::Role;
use bootcamp_service::services::policy::{require_owner, require_role, CurrentUser};

fn identity(id: &str, role: Role) -> CurrentUser {
    CurrentUser {
        id: id.to_string(),
        role,
    }
}

#[test]
fn publisher_routes_reject_plain_users() {
    let user = identity("u1", Role::User);
    let err = require_role(&user, &[Role::Publisher, Role::Admin]).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(err.to_string().contains("user"));
}

#[test]
fn mutation_requires_owner_or_admin() {
    let owner = identity("owner-1", Role::Publisher);
    let admin = identity("admin-1", Role::Admin);
    let stranger = identity("stranger-1", Role::Publisher);

    assert!(require_owner(&owner, "owner-1", "bootcamp-1").is_ok());
    assert!(require_owner(&admin, "owner-1", "bootcamp-1").is_ok());

    let err = require_owner(&stranger, "owner-1", "bootcamp-1").unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let msg = err.to_string();
    assert!(msg.contains("stranger-1"));
    assert!(msg.contains("bootcamp-1"));
}

#[test]
fn admin_bypasses_ownership_but_not_role_gates() {
    let admin = identity("admin-1", Role::Admin);
    assert!(require_owner(&admin, "somebody", "r1").is_ok());
    // A gate that names only plain users still excludes admin.
    assert!(require_role(&admin, &[Role::User]).is_err());
}

#[test]
fn review_routes_admit_users_and_admins_only() {
    let publisher = identity("p1", Role::Publisher);
    assert!(require_role(&publisher, &[Role::User, Role::Admin]).is_err());
    assert!(require_role(&identity("u1", Role::User), &[Role::User, Role::Admin]).is_ok());
    assert!(require_role(&identity("a1", Role::Admin), &[Role::User, Role::Admin]).is_ok());
}
