//! Permission rows.

use libsql::{Connection, Row, params};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Page;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Permission {
    pub(crate) fn from_row(row: &Row, offset: i32) -> Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            description: row.get(offset + 2)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewPermission {
    pub name: String,
    pub description: Option<String>,
}

/// Permission names never change after creation, so only the description
/// is patchable.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PermissionPatch {
    pub description: Option<String>,
}

pub async fn get(conn: &Connection, id: i64) -> Result<Option<Permission>> {
    let mut rows = conn
        .query(
            "SELECT id, name, description FROM permissions WHERE id = ?1",
            params![id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Permission::from_row(&row, 0)?)),
        None => Ok(None),
    }
}

pub async fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Permission>> {
    let mut rows = conn
        .query(
            "SELECT id, name, description FROM permissions WHERE name = ?1",
            params![name],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Permission::from_row(&row, 0)?)),
        None => Ok(None),
    }
}

/// Newest first.
pub async fn list(conn: &Connection, page: Page) -> Result<Vec<Permission>> {
    let mut rows = conn
        .query(
            "SELECT id, name, description FROM permissions ORDER BY id DESC LIMIT ?1 OFFSET ?2",
            params![page.limit, page.skip],
        )
        .await?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(Permission::from_row(&row, 0)?);
    }
    Ok(out)
}

pub async fn count(conn: &Connection) -> Result<i64> {
    super::count(conn, "SELECT COUNT(*) FROM permissions", ()).await
}

pub async fn insert(conn: &Connection, new: &NewPermission) -> Result<Permission> {
    conn.execute(
        "INSERT INTO permissions (name, description) VALUES (?1, ?2)",
        params![new.name.as_str(), new.description.clone()],
    )
    .await
    .map_err(|e| Error::from_constraint(e, "Permission name"))?;

    let id = conn.last_insert_rowid();
    get(conn, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Permission {id} vanished after insert")))
}

/// Apply a patch; returns `None` when the permission does not exist.
pub async fn update(
    conn: &Connection,
    id: i64,
    patch: &PermissionPatch,
) -> Result<Option<Permission>> {
    if let Some(description) = &patch.description {
        conn.execute(
            "UPDATE permissions SET description = ?1 WHERE id = ?2",
            params![description.as_str(), id],
        )
        .await?;
    }
    get(conn, id).await
}

/// Delete a permission and its role links in one transaction.
/// Returns whether a row was deleted.
pub async fn delete(conn: &Connection, id: i64) -> Result<bool> {
    let tx = crate::db::write(conn).await?;
    tx.execute(
        "DELETE FROM role_permissions WHERE permission_id = ?1",
        params![id],
    )
    .await?;
    let deleted = tx
        .execute("DELETE FROM permissions WHERE id = ?1", params![id])
        .await?;
    tx.commit().await?;
    Ok(deleted > 0)
}
