//! Item rows.
//!
//! Listing comes in two shapes, [`list_all`] and [`list_owned`]; callers
//! pick the query, there is no post-filtering.

use libsql::{Connection, Row, params};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Page;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub quantity: i64,
    pub owner_id: i64,
}

impl Item {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            sku: row.get(3)?,
            quantity: row.get(4)?,
            owner_id: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    #[serde(default)]
    pub quantity: i64,
}

impl NewItem {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Item name must not be empty".into()));
        }
        if self.sku.trim().is_empty() {
            return Err(Error::Validation("SKU must not be empty".into()));
        }
        if self.quantity < 0 {
            return Err(Error::Validation("Quantity must not be negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<i64>,
}

impl ItemPatch {
    pub fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::Validation("Item name must not be empty".into()));
        }
        if self.sku.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(Error::Validation("SKU must not be empty".into()));
        }
        if self.quantity.is_some_and(|q| q < 0) {
            return Err(Error::Validation("Quantity must not be negative".into()));
        }
        Ok(())
    }
}

const SELECT: &str = "SELECT id, name, description, sku, quantity, owner_id FROM items";

pub async fn get(conn: &Connection, id: i64) -> Result<Option<Item>> {
    let mut rows = conn
        .query(&format!("{SELECT} WHERE id = ?1"), params![id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Item::from_row(&row)?)),
        None => Ok(None),
    }
}

async fn collect(mut rows: libsql::Rows) -> Result<Vec<Item>> {
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(Item::from_row(&row)?);
    }
    Ok(out)
}

pub async fn list_all(conn: &Connection, page: Page) -> Result<Vec<Item>> {
    let rows = conn
        .query(
            &format!("{SELECT} ORDER BY id LIMIT ?1 OFFSET ?2"),
            params![page.limit, page.skip],
        )
        .await?;
    collect(rows).await
}

pub async fn list_owned(conn: &Connection, owner_id: i64, page: Page) -> Result<Vec<Item>> {
    let rows = conn
        .query(
            &format!("{SELECT} WHERE owner_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3"),
            params![owner_id, page.limit, page.skip],
        )
        .await?;
    collect(rows).await
}

pub async fn count_all(conn: &Connection) -> Result<i64> {
    super::count(conn, "SELECT COUNT(*) FROM items", ()).await
}

pub async fn count_owned(conn: &Connection, owner_id: i64) -> Result<i64> {
    super::count(
        conn,
        "SELECT COUNT(*) FROM items WHERE owner_id = ?1",
        params![owner_id],
    )
    .await
}

pub async fn insert(conn: &Connection, new: &NewItem, owner_id: i64) -> Result<Item> {
    conn.execute(
        "INSERT INTO items (name, description, sku, quantity, owner_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new.name.as_str(),
            new.description.clone(),
            new.sku.as_str(),
            new.quantity,
            owner_id
        ],
    )
    .await
    .map_err(|e| Error::from_constraint(e, "SKU"))?;

    let id = conn.last_insert_rowid();
    get(conn, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Item {id} vanished after insert")))
}

/// Apply only the supplied fields; returns `None` when the item does not exist.
pub async fn update(conn: &Connection, id: i64, patch: &ItemPatch) -> Result<Option<Item>> {
    let tx = crate::db::write(conn).await?;
    if let Some(name) = &patch.name {
        tx.execute(
            "UPDATE items SET name = ?1 WHERE id = ?2",
            params![name.as_str(), id],
        )
        .await?;
    }
    if let Some(description) = &patch.description {
        tx.execute(
            "UPDATE items SET description = ?1 WHERE id = ?2",
            params![description.as_str(), id],
        )
        .await?;
    }
    if let Some(sku) = &patch.sku {
        tx.execute(
            "UPDATE items SET sku = ?1 WHERE id = ?2",
            params![sku.as_str(), id],
        )
        .await
        .map_err(|e| Error::from_constraint(e, "SKU"))?;
    }
    if let Some(quantity) = patch.quantity {
        tx.execute(
            "UPDATE items SET quantity = ?1 WHERE id = ?2",
            params![quantity, id],
        )
        .await?;
    }
    tx.commit().await?;
    get(conn, id).await
}

/// Returns whether a row was deleted.
pub async fn delete(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM items WHERE id = ?1", params![id])
        .await?;
    Ok(deleted > 0)
}
