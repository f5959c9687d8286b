//! Transactional CRUD over the RBAC tables and items.
//!
//! Functions here know nothing about principals or permissions; they are
//! the storage collaborator the services in [`crate::service`] call after
//! authorization has passed. Lookups return `Ok(None)` for missing rows and
//! leave the choice of `NotFound` to the caller.

pub mod items;
pub mod permissions;
pub mod roles;
pub mod users;

use libsql::Connection;
use schemars::JsonSchema;
use serde::Serialize;

use crate::Result;

/// Largest page a caller may request.
pub const MAX_LIMIT: i64 = 100;

/// Offset pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: MAX_LIMIT,
        }
    }
}

impl Page {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip: skip.max(0),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Parse `skip` and `limit` from a URI query string.
    ///
    /// Unknown keys are ignored; malformed numbers are a `BadRequest`.
    pub fn from_query(query: Option<&str>) -> Result<Self> {
        let mut page = Page::default();
        let Some(query) = query else {
            return Ok(page);
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let parse = |v: &str| {
                v.parse::<i64>().map_err(|_| {
                    crate::Error::BadRequest(format!("Invalid value for {key}: {v}"))
                })
            };
            match key.as_ref() {
                "skip" => page.skip = parse(value.as_ref())?,
                "limit" => page.limit = parse(value.as_ref())?,
                _ => {}
            }
        }
        Ok(Page::new(page.skip, page.limit))
    }
}

/// One page of a collection plus the size of the whole collection.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Listing<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

impl<T> Listing<T> {
    pub fn new(data: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            data,
            total,
            skip: page.skip,
            limit: page.limit,
        }
    }
}

/// Run a `SELECT COUNT(*)` style query.
pub(crate) async fn count(
    conn: &Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
) -> Result<i64> {
    let mut rows = conn.query(sql, params).await?;
    match rows.next().await? {
        Some(row) => Ok(row.get::<i64>(0)?),
        None => Ok(0),
    }
}
