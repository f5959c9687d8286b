//! Users. Profile edits are allowed on oneself or by an admin.

use libsql::Connection;

use crate::catalog;
use crate::config::Rbac;
use crate::gate::{self, Requirement};
use crate::password;
use crate::principal::Principal;
use crate::store::roles;
use crate::store::users::{self, NewUser, User, UserChanges, UserPatch};
use crate::store::{Listing, Page};
use crate::{Error, Result};

const LIST: Requirement = Requirement::new(catalog::USER_VIEW_ALL);
const VIEW: Requirement = Requirement::new(catalog::USER_VIEW);
const CREATE: Requirement = Requirement::new(catalog::USER_CREATE);
const UPDATE: Requirement = Requirement::new(catalog::USER_UPDATE);
const DELETE: Requirement = Requirement::new(catalog::USER_DELETE);

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() || username.chars().any(char::is_whitespace) {
        return Err(Error::Validation(
            "Username must be non-empty and contain no whitespace".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(Error::Validation(format!("Invalid email address: {email}"))),
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(Error::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

pub async fn list(conn: &Connection, principal: &Principal, page: Page) -> Result<Listing<User>> {
    LIST.enforce(principal)?;
    let data = users::list(conn, page).await?;
    let total = users::count(conn).await?;
    Ok(Listing::new(data, total, page))
}

pub async fn get(conn: &Connection, principal: &Principal, id: i64) -> Result<User> {
    VIEW.enforce(principal)?;
    users::get(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {id}")))
}

/// Create a user in the requested role, or in `rbac.default_role`.
///
/// Creating a user directly in the ADMIN role is subject to the same
/// escalation guard as role assignment.
pub async fn create(
    conn: &Connection,
    principal: &Principal,
    rbac: &Rbac,
    new: &NewUser,
) -> Result<User> {
    CREATE.enforce(principal)?;
    validate_username(&new.username)?;
    validate_email(&new.email)?;
    validate_password(&new.password)?;

    let role = match new.role_id {
        Some(role_id) => roles::get(conn, role_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Role {role_id}")))?,
        None => roles::get_by_name(conn, &rbac.default_role)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Default role {}", rbac.default_role)))?,
    };
    gate::require_may_grant(principal, &role.name)?;

    let hash = password::hash_blocking(&new.password).await?;
    let user = users::insert(conn, &new.username, &new.email, &hash, role.id).await?;
    tracing::info!(user_id = user.id, role = %role.name, by = principal.username(), "User created");
    Ok(user)
}

/// Edit a profile. Non-admins may only edit themselves; this is decided
/// from the ids alone, before the target row is read.
pub async fn update(
    conn: &Connection,
    principal: &Principal,
    id: i64,
    patch: &UserPatch,
) -> Result<User> {
    UPDATE.enforce(principal)?;
    gate::require_owner_or_admin(principal, id)?;

    if let Some(username) = &patch.username {
        validate_username(username)?;
    }
    if let Some(email) = &patch.email {
        validate_email(email)?;
    }
    let password_hash = match &patch.password {
        Some(p) => {
            validate_password(p)?;
            Some(password::hash_blocking(p).await?)
        }
        None => None,
    };

    let changes = UserChanges {
        username: patch.username.clone(),
        email: patch.email.clone(),
        password_hash,
    };
    users::update(conn, id, &changes)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {id}")))
}

pub async fn delete(conn: &Connection, principal: &Principal, id: i64) -> Result<()> {
    DELETE.enforce(principal)?;
    if !users::delete(conn, id).await? {
        return Err(Error::NotFound(format!("User {id}")));
    }
    tracing::info!(user_id = id, by = principal.username(), "User deleted");
    Ok(())
}
