//! The fixed permission vocabulary and bootstrap seeding.
//!
//! Permission names are stable `resource:action` strings. Routes refer to
//! them through the constants below so a typo fails to compile rather
//! than silently denying everyone.

use libsql::Connection;
use tracing::info;

use crate::Result;

/// Name of the privileged role.
pub const ADMIN_ROLE: &str = "ADMIN";
/// Name of the seeded storage staff role.
pub const STAFF_ROLE: &str = "STAFF";

pub const ITEM_VIEW_ALL: &str = "item:view_all";
pub const ITEM_VIEW: &str = "item:view";
pub const ITEM_CREATE: &str = "item:create";
pub const ITEM_UPDATE: &str = "item:update";
pub const ITEM_DELETE: &str = "item:delete";

pub const PERMISSION_VIEW_ALL: &str = "permission:view_all";
pub const PERMISSION_VIEW: &str = "permission:view";
pub const PERMISSION_CREATE: &str = "permission:create";
pub const PERMISSION_UPDATE: &str = "permission:update";
pub const PERMISSION_DELETE: &str = "permission:delete";

pub const ROLE_VIEW_ALL: &str = "role:view_all";
pub const ROLE_VIEW: &str = "role:view";
pub const ROLE_CREATE: &str = "role:create";
pub const ROLE_UPDATE: &str = "role:update";
pub const ROLE_DELETE: &str = "role:delete";
pub const ROLE_ASSIGN: &str = "role:assign";
pub const ROLE_ADD_PERMISSION: &str = "role:add_permission";
pub const ROLE_REMOVE_PERMISSION: &str = "role:remove_permission";
pub const ROLE_UPDATE_PERMISSIONS: &str = "role:update_permissions";

pub const USER_VIEW_ALL: &str = "user:view_all";
pub const USER_VIEW: &str = "user:view";
pub const USER_CREATE: &str = "user:create";
pub const USER_UPDATE: &str = "user:update";
pub const USER_DELETE: &str = "user:delete";

/// Every permission seeded at bootstrap, with its description.
pub const PERMISSIONS: &[(&str, &str)] = &[
    (ITEM_VIEW_ALL, "List items"),
    (ITEM_VIEW, "View a single item"),
    (ITEM_CREATE, "Create items"),
    (ITEM_UPDATE, "Edit items"),
    (ITEM_DELETE, "Delete items"),
    (PERMISSION_VIEW_ALL, "List permissions"),
    (PERMISSION_VIEW, "View a single permission"),
    (PERMISSION_CREATE, "Create permissions"),
    (PERMISSION_UPDATE, "Edit permissions"),
    (PERMISSION_DELETE, "Delete permissions"),
    (ROLE_VIEW_ALL, "List roles"),
    (ROLE_VIEW, "View a single role"),
    (ROLE_CREATE, "Create roles"),
    (ROLE_UPDATE, "Edit roles"),
    (ROLE_DELETE, "Delete roles"),
    (ROLE_ASSIGN, "Assign roles to users"),
    (ROLE_ADD_PERMISSION, "Add a permission to a role"),
    (ROLE_REMOVE_PERMISSION, "Remove a permission from a role"),
    (ROLE_UPDATE_PERMISSIONS, "Replace the permissions of a role"),
    (USER_VIEW_ALL, "List users"),
    (USER_VIEW, "View a single user"),
    (USER_CREATE, "Create users"),
    (USER_UPDATE, "Edit users"),
    (USER_DELETE, "Delete users"),
];

/// Permissions held by the seeded `STAFF` role.
pub const STAFF_PERMISSIONS: &[&str] = &[
    ITEM_VIEW_ALL,
    ITEM_VIEW,
    ITEM_CREATE,
    USER_VIEW,
    USER_UPDATE,
];

/// Seed the permission catalog and the `ADMIN` and `STAFF` roles.
///
/// Idempotent: rows that already exist are left as they are, so an
/// operator's later edits to seeded roles survive restarts.
pub async fn seed(conn: &Connection) -> Result<()> {
    let tx = crate::db::write(conn).await?;

    let mut created = 0u64;
    for (name, description) in PERMISSIONS {
        created += tx
            .execute(
                "INSERT OR IGNORE INTO permissions (name, description) VALUES (?1, ?2)",
                libsql::params![*name, *description],
            )
            .await?;
    }

    let admin = seed_role(&tx, ADMIN_ROLE, "Full access administrator").await?;
    if admin {
        tx.execute(
            "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) \
             SELECT r.id, p.id FROM roles r, permissions p WHERE r.name = ?1",
            libsql::params![ADMIN_ROLE],
        )
        .await?;
    }

    let staff = seed_role(&tx, STAFF_ROLE, "Storage staff").await?;
    if staff {
        for name in STAFF_PERMISSIONS {
            tx.execute(
                "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) \
                 SELECT r.id, p.id FROM roles r, permissions p WHERE r.name = ?1 AND p.name = ?2",
                libsql::params![STAFF_ROLE, *name],
            )
            .await?;
        }
    }

    tx.commit().await?;
    info!(
        permissions_created = created,
        admin_created = admin,
        staff_created = staff,
        "Catalog seeded"
    );
    Ok(())
}

/// Create an `ADMIN` user unless the username is already taken.
///
/// Runs outside the gate: this is the operator's way in on a fresh
/// database. Returns whether a user was created.
pub async fn seed_admin(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<bool> {
    if crate::store::users::get_by_username(conn, username)
        .await?
        .is_some()
    {
        info!(username, "Admin user already present");
        return Ok(false);
    }
    let role = crate::store::roles::get_by_name(conn, ADMIN_ROLE)
        .await?
        .ok_or_else(|| crate::Error::NotFound(format!("Role {ADMIN_ROLE}")))?;
    let hash = crate::password::hash_blocking(password).await?;
    crate::store::users::insert(conn, username, email, &hash, role.id).await?;
    info!(username, "Admin user created");
    Ok(true)
}

/// Insert a role if missing; returns whether it was created.
async fn seed_role(conn: &Connection, name: &str, description: &str) -> Result<bool> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO roles (name, description) VALUES (?1, ?2)",
            libsql::params![name, description],
        )
        .await?;
    Ok(inserted > 0)
}
