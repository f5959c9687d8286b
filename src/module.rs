//! Module trait for pluggable API modules.
//!
//! Each resource in [`crate::api`] is a module that registers its
//! procedures on the shared [`Router`].

use crate::router::Router;

/// A pluggable API module.
///
/// Modules register their routes with the router and can hold their own
/// state, captured in the route closures (the auth module keeps its login
/// limiter this way).
pub trait Module: Send + Sync {
    /// Module name for identification and logging.
    fn name(&self) -> &'static str;

    /// Register routes with the router.
    fn routes(&self, router: &mut Router);
}
