//! User rows. Users are always read joined with their role.

use libsql::{Connection, Row, params};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Page;
use super::roles::Role;
use crate::{Error, Result};

const SELECT: &str = "SELECT u.id, u.username, u.email, r.id, r.name, r.description \
                      FROM users u JOIN roles r ON r.id = u.role_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl User {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            role: Role::from_row(row, 3)?,
        })
    }
}

/// Request body for creating a user. `role_id` falls back to the
/// configured default role.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: Option<i64>,
}

/// Request body for editing a user. The role is changed only through
/// role assignment.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Column-level changes, with the password already hashed.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

pub async fn get(conn: &Connection, id: i64) -> Result<Option<User>> {
    let mut rows = conn
        .query(&format!("{SELECT} WHERE u.id = ?1"), params![id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(User::from_row(&row)?)),
        None => Ok(None),
    }
}

pub async fn get_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let mut rows = conn
        .query(&format!("{SELECT} WHERE u.username = ?1"), params![username])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(User::from_row(&row)?)),
        None => Ok(None),
    }
}

/// The user and their stored password hash, for login.
pub async fn credentials(conn: &Connection, username: &str) -> Result<Option<(User, String)>> {
    let mut rows = conn
        .query(
            "SELECT u.id, u.username, u.email, r.id, r.name, r.description, u.password_hash \
             FROM users u JOIN roles r ON r.id = u.role_id WHERE u.username = ?1",
            params![username],
        )
        .await?;
    match rows.next().await? {
        Some(row) => {
            let user = User::from_row(&row)?;
            let hash: String = row.get(6)?;
            Ok(Some((user, hash)))
        }
        None => Ok(None),
    }
}

pub async fn list(conn: &Connection, page: Page) -> Result<Vec<User>> {
    let mut rows = conn
        .query(
            &format!("{SELECT} ORDER BY u.id LIMIT ?1 OFFSET ?2"),
            params![page.limit, page.skip],
        )
        .await?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(User::from_row(&row)?);
    }
    Ok(out)
}

pub async fn count(conn: &Connection) -> Result<i64> {
    super::count(conn, "SELECT COUNT(*) FROM users", ()).await
}

pub async fn insert(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    role_id: i64,
) -> Result<User> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash, role_id) VALUES (?1, ?2, ?3, ?4)",
        params![username, email, password_hash, role_id],
    )
    .await
    .map_err(|e| Error::from_constraint(e, "Username or email"))?;

    let id = conn.last_insert_rowid();
    get(conn, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("User {id} vanished after insert")))
}

/// Apply column changes; returns `None` when the user does not exist.
pub async fn update(conn: &Connection, id: i64, changes: &UserChanges) -> Result<Option<User>> {
    let tx = crate::db::write(conn).await?;
    if let Some(username) = &changes.username {
        tx.execute(
            "UPDATE users SET username = ?1 WHERE id = ?2",
            params![username.as_str(), id],
        )
        .await
        .map_err(|e| Error::from_constraint(e, "Username"))?;
    }
    if let Some(email) = &changes.email {
        tx.execute(
            "UPDATE users SET email = ?1 WHERE id = ?2",
            params![email.as_str(), id],
        )
        .await
        .map_err(|e| Error::from_constraint(e, "Email"))?;
    }
    if let Some(hash) = &changes.password_hash {
        tx.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![hash.as_str(), id],
        )
        .await?;
    }
    tx.commit().await?;
    get(conn, id).await
}

/// Point the user at a different role. Returns whether the user existed.
pub async fn set_role(conn: &Connection, id: i64, role_id: i64) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE users SET role_id = ?1 WHERE id = ?2",
            params![role_id, id],
        )
        .await?;
    Ok(updated > 0)
}

/// Delete a user and the items they own in one transaction.
/// Returns whether the user existed.
pub async fn delete(conn: &Connection, id: i64) -> Result<bool> {
    let tx = crate::db::write(conn).await?;
    tx.execute("DELETE FROM items WHERE owner_id = ?1", params![id])
        .await?;
    let deleted = tx
        .execute("DELETE FROM users WHERE id = ?1", params![id])
        .await?;
    tx.commit().await?;
    Ok(deleted > 0)
}
