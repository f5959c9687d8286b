//! The permission catalog as an administrable resource.

use libsql::Connection;

use crate::catalog;
use crate::gate::Requirement;
use crate::principal::Principal;
use crate::store::permissions::{self, NewPermission, Permission, PermissionPatch};
use crate::store::{Listing, Page};
use crate::{Error, Result};

const LIST: Requirement = Requirement::new(catalog::PERMISSION_VIEW_ALL);
const VIEW: Requirement = Requirement::new(catalog::PERMISSION_VIEW);
const CREATE: Requirement = Requirement::new(catalog::PERMISSION_CREATE);
const UPDATE: Requirement = Requirement::new(catalog::PERMISSION_UPDATE);
const DELETE: Requirement = Requirement::new(catalog::PERMISSION_DELETE);

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(Error::Validation(
            "Permission name must be non-empty and contain no whitespace".into(),
        ));
    }
    Ok(())
}

pub async fn list(
    conn: &Connection,
    principal: &Principal,
    page: Page,
) -> Result<Listing<Permission>> {
    LIST.enforce(principal)?;
    let data = permissions::list(conn, page).await?;
    let total = permissions::count(conn).await?;
    Ok(Listing::new(data, total, page))
}

pub async fn get(conn: &Connection, principal: &Principal, id: i64) -> Result<Permission> {
    VIEW.enforce(principal)?;
    permissions::get(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Permission {id}")))
}

pub async fn create(
    conn: &Connection,
    principal: &Principal,
    new: &NewPermission,
) -> Result<Permission> {
    CREATE.enforce(principal)?;
    validate_name(&new.name)?;
    let permission = permissions::insert(conn, new).await?;
    tracing::info!(permission = %permission.name, by = principal.username(), "Permission created");
    Ok(permission)
}

pub async fn update(
    conn: &Connection,
    principal: &Principal,
    id: i64,
    patch: &PermissionPatch,
) -> Result<Permission> {
    UPDATE.enforce(principal)?;
    permissions::update(conn, id, patch)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Permission {id}")))
}

/// Deleting a permission also unlinks it from every role.
pub async fn delete(conn: &Connection, principal: &Principal, id: i64) -> Result<()> {
    DELETE.enforce(principal)?;
    if !permissions::delete(conn, id).await? {
        return Err(Error::NotFound(format!("Permission {id}")));
    }
    tracing::info!(permission_id = id, by = principal.username(), "Permission deleted");
    Ok(())
}
