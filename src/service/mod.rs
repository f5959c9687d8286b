//! Authorization-aware resource operations.
//!
//! Every public function here takes the acting [`Principal`](crate::principal::Principal)
//! and runs, in order:
//!
//! 1. the gate check for the operation's required permission,
//! 2. the row lookup (`NotFound`),
//! 3. ownership or escalation rules (`Forbidden`),
//! 4. the storage call.
//!
//! The HTTP layer in [`crate::api`] only extracts inputs and calls these.

pub mod auth;
pub mod items;
pub mod permissions;
pub mod roles;
pub mod users;
