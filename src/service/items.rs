//! Items: owner-scoped inventory records.

use libsql::Connection;

use crate::catalog;
use crate::gate::{self, Requirement};
use crate::principal::Principal;
use crate::store::items::{self, Item, ItemPatch, NewItem};
use crate::store::{Listing, Page};
use crate::{Error, Result};

const LIST: Requirement = Requirement::new(catalog::ITEM_VIEW_ALL);
const VIEW: Requirement = Requirement::new(catalog::ITEM_VIEW);
const CREATE: Requirement = Requirement::new(catalog::ITEM_CREATE);
const UPDATE: Requirement = Requirement::new(catalog::ITEM_UPDATE);
const DELETE: Requirement = Requirement::new(catalog::ITEM_DELETE);

async fn load(conn: &Connection, id: i64) -> Result<Item> {
    items::get(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Item {id}")))
}

/// Admins see every item; everyone else sees only their own.
pub async fn list(conn: &Connection, principal: &Principal, page: Page) -> Result<Listing<Item>> {
    LIST.enforce(principal)?;
    if principal.is_admin() {
        let data = items::list_all(conn, page).await?;
        let total = items::count_all(conn).await?;
        Ok(Listing::new(data, total, page))
    } else {
        let data = items::list_owned(conn, principal.id(), page).await?;
        let total = items::count_owned(conn, principal.id()).await?;
        Ok(Listing::new(data, total, page))
    }
}

pub async fn get(conn: &Connection, principal: &Principal, id: i64) -> Result<Item> {
    VIEW.enforce(principal)?;
    let item = load(conn, id).await?;
    gate::require_owner_or_admin(principal, item.owner_id)?;
    Ok(item)
}

/// The new item is owned by the caller.
pub async fn create(conn: &Connection, principal: &Principal, new: &NewItem) -> Result<Item> {
    CREATE.enforce(principal)?;
    new.validate()?;
    let item = items::insert(conn, new, principal.id()).await?;
    tracing::info!(item_id = item.id, owner = principal.username(), "Item created");
    Ok(item)
}

pub async fn update(
    conn: &Connection,
    principal: &Principal,
    id: i64,
    patch: &ItemPatch,
) -> Result<Item> {
    UPDATE.enforce(principal)?;
    patch.validate()?;
    let item = load(conn, id).await?;
    gate::require_owner_or_admin(principal, item.owner_id)?;
    items::update(conn, id, patch)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Item {id}")))
}

pub async fn delete(conn: &Connection, principal: &Principal, id: i64) -> Result<()> {
    DELETE.enforce(principal)?;
    let item = load(conn, id).await?;
    gate::require_owner_or_admin(principal, item.owner_id)?;
    if !items::delete(conn, id).await? {
        return Err(Error::NotFound(format!("Item {id}")));
    }
    tracing::info!(item_id = id, by = principal.username(), "Item deleted");
    Ok(())
}
