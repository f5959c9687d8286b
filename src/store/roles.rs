//! Role rows.
//!
//! Role names are stored upper-cased; [`normalize_name`] is applied on both
//! insert and rename so the uniqueness check is case-insensitive in effect.

use libsql::{Connection, Row, params};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Page;
use super::permissions::Permission;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Role {
    pub(crate) fn from_row(row: &Row, offset: i32) -> Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            description: row.get(offset + 2)?,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.name == crate::catalog::ADMIN_ROLE
    }
}

/// A role together with its permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct RoleDetail {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<Permission>,
}

impl RoleDetail {
    pub fn new(role: Role, permissions: Vec<Permission>) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            permissions,
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RolePatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Trim and upper-case a role name, rejecting empty names.
pub fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Role name must not be empty".to_string()));
    }
    Ok(name.to_uppercase())
}

pub async fn get(conn: &Connection, id: i64) -> Result<Option<Role>> {
    let mut rows = conn
        .query(
            "SELECT id, name, description FROM roles WHERE id = ?1",
            params![id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Role::from_row(&row, 0)?)),
        None => Ok(None),
    }
}

pub async fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Role>> {
    let mut rows = conn
        .query(
            "SELECT id, name, description FROM roles WHERE name = ?1",
            params![name],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Role::from_row(&row, 0)?)),
        None => Ok(None),
    }
}

pub async fn list(conn: &Connection, page: Page) -> Result<Vec<Role>> {
    let mut rows = conn
        .query(
            "SELECT id, name, description FROM roles ORDER BY id LIMIT ?1 OFFSET ?2",
            params![page.limit, page.skip],
        )
        .await?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(Role::from_row(&row, 0)?);
    }
    Ok(out)
}

pub async fn count(conn: &Connection) -> Result<i64> {
    super::count(conn, "SELECT COUNT(*) FROM roles", ()).await
}

pub async fn insert(conn: &Connection, new: &NewRole) -> Result<Role> {
    let name = normalize_name(&new.name)?;
    conn.execute(
        "INSERT INTO roles (name, description) VALUES (?1, ?2)",
        params![name, new.description.clone()],
    )
    .await
    .map_err(|e| Error::from_constraint(e, "Role name"))?;

    let id = conn.last_insert_rowid();
    get(conn, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Role {id} vanished after insert")))
}

/// Apply a patch; returns `None` when the role does not exist.
pub async fn update(conn: &Connection, id: i64, patch: &RolePatch) -> Result<Option<Role>> {
    let tx = crate::db::write(conn).await?;
    if let Some(name) = &patch.name {
        let name = normalize_name(name)?;
        tx.execute(
            "UPDATE roles SET name = ?1 WHERE id = ?2",
            params![name, id],
        )
        .await
        .map_err(|e| Error::from_constraint(e, "Role name"))?;
    }
    if let Some(description) = &patch.description {
        tx.execute(
            "UPDATE roles SET description = ?1 WHERE id = ?2",
            params![description.as_str(), id],
        )
        .await?;
    }
    tx.commit().await?;
    get(conn, id).await
}

/// Delete a role, its permission links, its users and their items in one
/// transaction. Returns whether the role existed.
pub async fn delete(conn: &Connection, id: i64) -> Result<bool> {
    let tx = crate::db::write(conn).await?;
    tx.execute(
        "DELETE FROM items WHERE owner_id IN (SELECT id FROM users WHERE role_id = ?1)",
        params![id],
    )
    .await?;
    let users = tx
        .execute("DELETE FROM users WHERE role_id = ?1", params![id])
        .await?;
    tx.execute("DELETE FROM role_permissions WHERE role_id = ?1", params![id])
        .await?;
    let deleted = tx
        .execute("DELETE FROM roles WHERE id = ?1", params![id])
        .await?;
    tx.commit().await?;

    if deleted > 0 {
        tracing::info!(role_id = id, users_removed = users, "Role deleted");
    }
    Ok(deleted > 0)
}
