//! HTTP surface: one [`Module`] per resource.

pub mod auth;
pub mod items;
pub mod permissions;
pub mod roles;
pub mod users;

use serde::Serialize;

use crate::config::Config;
use crate::module::Module;
use crate::openapi::Info;
use crate::router::Router;

pub use auth::AuthModule;
pub use items::ItemsModule;
pub use permissions::PermissionsModule;
pub use roles::RolesModule;
pub use users::UsersModule;

#[derive(Serialize)]
struct Welcome {
    message: &'static str,
    docs: &'static str,
}

/// Build the router with every module, the welcome route and the
/// OpenAPI document.
pub fn router(config: &Config) -> Router {
    let modules: Vec<Box<dyn Module>> = vec![
        Box::new(AuthModule::new(&config.server)),
        Box::new(ItemsModule),
        Box::new(UsersModule),
        Box::new(RolesModule),
        Box::new(PermissionsModule),
    ];

    let mut router = Router::new();
    router.get("/", |_ctx| async move {
        crate::response::ok(&Welcome {
            message: "Inventory management API",
            docs: "/api/openapi.json",
        })
    });
    for module in &modules {
        module.routes(&mut router);
        tracing::debug!(module = module.name(), "Module routes registered");
    }
    router.openapi(
        "/api/openapi.json",
        Info {
            title: "Inventory API",
            version: env!("CARGO_PKG_VERSION"),
        },
    );
    router
}
