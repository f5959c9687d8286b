//! The authorization gate and the ownership rules layered on top of it.
//!
//! A [`Requirement`] names one permission from the catalog. Services declare
//! their requirements as `const`s and check them before touching any row:
//!
//! ```ignore
//! const DELETE: Requirement = Requirement::new(catalog::ITEM_DELETE);
//!
//! DELETE.enforce(&principal)?;          // coarse RBAC, no row access
//! let item = load_item(conn, id)?;      // NotFound after the gate
//! gate::require_owner_or_admin(&principal, item.owner_id)?;
//! ```
//!
//! Evaluation is flat set membership: no role hierarchy, no wildcards.

use crate::principal::Principal;
use crate::{Error, Result};

/// A single required permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    permission: &'static str,
}

impl Requirement {
    pub const fn new(permission: &'static str) -> Self {
        Self { permission }
    }

    pub fn permission(&self) -> &'static str {
        self.permission
    }

    /// Pure predicate: does the principal's role hold this permission?
    pub fn authorize(&self, principal: &Principal) -> bool {
        check(principal, self.permission)
    }

    /// [`authorize`](Self::authorize), turning a denial into `Forbidden`.
    pub fn enforce(&self, principal: &Principal) -> Result<()> {
        if self.authorize(principal) {
            Ok(())
        } else {
            tracing::warn!(
                user = principal.username(),
                role = %principal.role().name,
                permission = self.permission,
                "Permission denied"
            );
            Err(Error::missing_permission(self.permission))
        }
    }
}

/// True iff `permission` is in the principal's flattened permission set.
pub fn check(principal: &Principal, permission: &str) -> bool {
    principal.holds(permission)
}

/// Owner-or-admin rule for mutating an owned resource.
pub fn require_owner_or_admin(principal: &Principal, owner_id: i64) -> Result<()> {
    if principal.is_admin() || principal.id() == owner_id {
        return Ok(());
    }
    tracing::warn!(
        user = principal.username(),
        owner_id,
        "Ownership check failed"
    );
    Err(Error::Forbidden("not the owner of this resource".to_string()))
}

/// Only an ADMIN may hand out the ADMIN role, whatever else they hold.
pub fn require_may_grant(principal: &Principal, role_name: &str) -> Result<()> {
    if role_name == crate::catalog::ADMIN_ROLE && !principal.is_admin() {
        tracing::warn!(
            user = principal.username(),
            "Non-admin attempted to grant the ADMIN role"
        );
        return Err(Error::Forbidden(
            "only an administrator may grant the ADMIN role".to_string(),
        ));
    }
    Ok(())
}
