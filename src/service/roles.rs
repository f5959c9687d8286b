//! Roles and their permission membership.

use libsql::Connection;
use serde::Deserialize;
use schemars::JsonSchema;

use crate::catalog;
use crate::gate::{self, Requirement};
use crate::graph;
use crate::principal::Principal;
use crate::store::roles::{self, NewRole, Role, RoleDetail, RolePatch};
use crate::store::{Listing, Page};
use crate::{Error, Result};

const LIST: Requirement = Requirement::new(catalog::ROLE_VIEW_ALL);
const VIEW: Requirement = Requirement::new(catalog::ROLE_VIEW);
const CREATE: Requirement = Requirement::new(catalog::ROLE_CREATE);
const UPDATE: Requirement = Requirement::new(catalog::ROLE_UPDATE);
const DELETE: Requirement = Requirement::new(catalog::ROLE_DELETE);
const ASSIGN: Requirement = Requirement::new(catalog::ROLE_ASSIGN);
const ADD_PERMISSION: Requirement = Requirement::new(catalog::ROLE_ADD_PERMISSION);
const REMOVE_PERMISSION: Requirement = Requirement::new(catalog::ROLE_REMOVE_PERMISSION);
const UPDATE_PERMISSIONS: Requirement = Requirement::new(catalog::ROLE_UPDATE_PERMISSIONS);

/// Request body for replacing a role's permissions.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PermissionIds {
    pub permission_ids: Vec<i64>,
}

async fn load(conn: &Connection, id: i64) -> Result<Role> {
    roles::get(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Role {id}")))
}

async fn detail(conn: &Connection, role: Role) -> Result<RoleDetail> {
    let permissions = graph::permissions_of(conn, role.id).await?;
    Ok(RoleDetail::new(role, permissions))
}

pub async fn list(
    conn: &Connection,
    principal: &Principal,
    page: Page,
) -> Result<Listing<RoleDetail>> {
    LIST.enforce(principal)?;
    let mut data = Vec::new();
    for role in roles::list(conn, page).await? {
        data.push(detail(conn, role).await?);
    }
    let total = roles::count(conn).await?;
    Ok(Listing::new(data, total, page))
}

pub async fn get(conn: &Connection, principal: &Principal, id: i64) -> Result<RoleDetail> {
    VIEW.enforce(principal)?;
    let role = load(conn, id).await?;
    detail(conn, role).await
}

/// The name is upper-cased. Only an admin may create a role named ADMIN.
pub async fn create(conn: &Connection, principal: &Principal, new: &NewRole) -> Result<RoleDetail> {
    CREATE.enforce(principal)?;
    gate::require_may_grant(principal, &roles::normalize_name(&new.name)?)?;
    let role = roles::insert(conn, new).await?;
    tracing::info!(role = %role.name, by = principal.username(), "Role created");
    detail(conn, role).await
}

/// Renaming a role to ADMIN is an escalation and needs an admin.
pub async fn update(
    conn: &Connection,
    principal: &Principal,
    id: i64,
    patch: &RolePatch,
) -> Result<RoleDetail> {
    UPDATE.enforce(principal)?;
    let current = load(conn, id).await?;
    if let Some(name) = &patch.name {
        let name = roles::normalize_name(name)?;
        if name != current.name {
            gate::require_may_grant(principal, &name)?;
        }
    }
    let role = roles::update(conn, id, patch)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Role {id}")))?;
    detail(conn, role).await
}

/// Deleting a role deletes every user holding it.
pub async fn delete(conn: &Connection, principal: &Principal, id: i64) -> Result<()> {
    DELETE.enforce(principal)?;
    if !roles::delete(conn, id).await? {
        return Err(Error::NotFound(format!("Role {id}")));
    }
    Ok(())
}

/// Assign `role_id` to `user_id`.
///
/// Holding `role:assign` is not enough to hand out ADMIN: the acting
/// principal must already be an admin.
pub async fn assign(
    conn: &Connection,
    principal: &Principal,
    role_id: i64,
    user_id: i64,
) -> Result<()> {
    ASSIGN.enforce(principal)?;
    let role = load(conn, role_id).await?;
    gate::require_may_grant(principal, &role.name)?;
    graph::assign_role(conn, user_id, role.id).await
}

pub async fn add_permission(
    conn: &Connection,
    principal: &Principal,
    role_id: i64,
    permission_id: i64,
) -> Result<()> {
    ADD_PERMISSION.enforce(principal)?;
    graph::add_permission(conn, role_id, permission_id).await
}

pub async fn remove_permission(
    conn: &Connection,
    principal: &Principal,
    role_id: i64,
    permission_id: i64,
) -> Result<()> {
    REMOVE_PERMISSION.enforce(principal)?;
    graph::remove_permission(conn, role_id, permission_id).await
}

/// Replace the role's permissions; unknown ids are ignored.
pub async fn sync_permissions(
    conn: &Connection,
    principal: &Principal,
    role_id: i64,
    ids: &PermissionIds,
) -> Result<RoleDetail> {
    UPDATE_PERMISSIONS.enforce(principal)?;
    graph::sync_permissions(conn, role_id, &ids.permission_ids).await?;
    let role = load(conn, role_id).await?;
    detail(conn, role).await
}
