//! The many-to-many association between roles and permissions.
//!
//! This is the substrate the [`gate`](crate::gate) evaluates against. All
//! operations take ids, check both endpoints exist, and report a missing
//! endpoint as [`Error::NotFound`]. Membership is a set: the
//! `(role_id, permission_id)` primary key makes duplicate pairs
//! impossible, and every insert is `OR IGNORE`.

use std::collections::BTreeSet;

use libsql::{Connection, params};
use tracing::info;

use crate::store::permissions::{self, Permission};
use crate::store::{roles, users};
use crate::{Error, Result};

async fn require_role(conn: &Connection, role_id: i64) -> Result<roles::Role> {
    roles::get(conn, role_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Role {role_id}")))
}

async fn require_permission(conn: &Connection, permission_id: i64) -> Result<Permission> {
    permissions::get(conn, permission_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Permission {permission_id}")))
}

/// The role's permissions ordered by id.
pub async fn permissions_of(conn: &Connection, role_id: i64) -> Result<Vec<Permission>> {
    let mut rows = conn
        .query(
            "SELECT p.id, p.name, p.description FROM permissions p \
             JOIN role_permissions rp ON rp.permission_id = p.id \
             WHERE rp.role_id = ?1 ORDER BY p.id",
            params![role_id],
        )
        .await?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(Permission::from_row(&row, 0)?);
    }
    Ok(out)
}

/// The flat set of permission names held by a role.
pub async fn permission_names_of(conn: &Connection, role_id: i64) -> Result<BTreeSet<String>> {
    let mut rows = conn
        .query(
            "SELECT p.name FROM permissions p \
             JOIN role_permissions rp ON rp.permission_id = p.id \
             WHERE rp.role_id = ?1",
            params![role_id],
        )
        .await?;
    let mut out = BTreeSet::new();
    while let Some(row) = rows.next().await? {
        out.insert(row.get::<String>(0)?);
    }
    Ok(out)
}

/// Link a permission to a role. Linking an existing pair is a no-op.
pub async fn add_permission(conn: &Connection, role_id: i64, permission_id: i64) -> Result<()> {
    let role = require_role(conn, role_id).await?;
    let permission = require_permission(conn, permission_id).await?;

    let added = conn
        .execute(
            "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) VALUES (?1, ?2)",
            params![role_id, permission_id],
        )
        .await?;
    if added > 0 {
        info!(role = %role.name, permission = %permission.name, "Permission added to role");
    }
    Ok(())
}

/// Unlink a permission from a role. Removing an absent pair is not an error.
pub async fn remove_permission(conn: &Connection, role_id: i64, permission_id: i64) -> Result<()> {
    let role = require_role(conn, role_id).await?;
    let permission = require_permission(conn, permission_id).await?;

    let removed = conn
        .execute(
            "DELETE FROM role_permissions WHERE role_id = ?1 AND permission_id = ?2",
            params![role_id, permission_id],
        )
        .await?;
    if removed > 0 {
        info!(role = %role.name, permission = %permission.name, "Permission removed from role");
    }
    Ok(())
}

/// Replace the role's permission set with `permission_ids`.
///
/// Ids that do not exist in the catalog are dropped, duplicates collapse,
/// and the previous membership is discarded entirely. Runs in one
/// transaction; concurrent syncs resolve last-writer-wins.
pub async fn sync_permissions(
    conn: &Connection,
    role_id: i64,
    permission_ids: &[i64],
) -> Result<Vec<Permission>> {
    let tx = crate::db::write(conn).await?;
    let role = require_role(&tx, role_id).await?;
    tx.execute(
        "DELETE FROM role_permissions WHERE role_id = ?1",
        params![role_id],
    )
    .await?;
    let mut linked = 0u64;
    for permission_id in permission_ids {
        linked += tx
            .execute(
                "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) \
                 SELECT ?1, id FROM permissions WHERE id = ?2",
                params![role_id, *permission_id],
            )
            .await?;
    }
    tx.commit().await?;

    let requested = permission_ids.iter().collect::<BTreeSet<_>>().len() as u64;
    if linked < requested {
        tracing::debug!(
            role = %role.name,
            dropped = requested - linked,
            "Unknown permission ids ignored during sync"
        );
    }
    info!(role = %role.name, permissions = linked, "Role permissions replaced");

    permissions_of(conn, role_id).await
}

/// Point a user at a role.
///
/// This is the raw graph mutation; the escalation guard for the ADMIN role
/// lives in [`crate::service::roles::assign`].
pub async fn assign_role(conn: &Connection, user_id: i64, role_id: i64) -> Result<()> {
    let role = require_role(conn, role_id).await?;
    if !users::set_role(conn, user_id, role_id).await? {
        return Err(Error::NotFound(format!("User {user_id}")));
    }
    info!(user_id, role = %role.name, "Role assigned");
    Ok(())
}
