//! `/api/permissions`

use crate::catalog;
use crate::module::Module;
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};
use crate::service::permissions;
use crate::store::Listing;
use crate::store::permissions::{NewPermission, Permission, PermissionPatch};
use crate::Result;

const TAG: &str = "permissions";

pub struct ListPermissions;

impl Procedure for ListPermissions {
    fn meta() -> Meta {
        Meta::get("/api/permissions")
            .summary("List permissions, newest first")
            .tag(TAG)
            .permission(catalog::PERMISSION_VIEW_ALL)
    }

    type Input = Empty;
    type Output = Listing<Permission>;

    async fn handle(ctx: Context, _input: Empty) -> Result<Listing<Permission>> {
        let (conn, principal) = ctx.authenticate().await?;
        permissions::list(&conn, &principal, ctx.page()?).await
    }
}

pub struct CreatePermission;

impl Procedure for CreatePermission {
    fn meta() -> Meta {
        Meta::post("/api/permissions")
            .summary("Create a permission")
            .tag(TAG)
            .status(201)
            .permission(catalog::PERMISSION_CREATE)
    }

    type Input = NewPermission;
    type Output = Permission;

    async fn handle(ctx: Context, input: NewPermission) -> Result<Permission> {
        let (conn, principal) = ctx.authenticate().await?;
        permissions::create(&conn, &principal, &input).await
    }
}

pub struct GetPermission;

impl Procedure for GetPermission {
    fn meta() -> Meta {
        Meta::get("/api/permissions/{id}")
            .summary("Get a permission")
            .tag(TAG)
            .permission(catalog::PERMISSION_VIEW)
    }

    type Input = Empty;
    type Output = Permission;

    async fn handle(ctx: Context, _input: Empty) -> Result<Permission> {
        let (conn, principal) = ctx.authenticate().await?;
        permissions::get(&conn, &principal, ctx.id_param("id")?).await
    }
}

pub struct UpdatePermission;

impl Procedure for UpdatePermission {
    fn meta() -> Meta {
        Meta::patch("/api/permissions/{id}")
            .summary("Update a permission's description")
            .tag(TAG)
            .permission(catalog::PERMISSION_UPDATE)
    }

    type Input = PermissionPatch;
    type Output = Permission;

    async fn handle(ctx: Context, input: PermissionPatch) -> Result<Permission> {
        let (conn, principal) = ctx.authenticate().await?;
        permissions::update(&conn, &principal, ctx.id_param("id")?, &input).await
    }
}

pub struct DeletePermission;

impl Procedure for DeletePermission {
    fn meta() -> Meta {
        Meta::delete("/api/permissions/{id}")
            .summary("Delete a permission and unlink it from every role")
            .tag(TAG)
            .status(204)
            .permission(catalog::PERMISSION_DELETE)
    }

    type Input = Empty;
    type Output = ();

    async fn handle(ctx: Context, _input: Empty) -> Result<()> {
        let (conn, principal) = ctx.authenticate().await?;
        permissions::delete(&conn, &principal, ctx.id_param("id")?).await
    }
}

pub struct PermissionsModule;

impl Module for PermissionsModule {
    fn name(&self) -> &'static str {
        "permissions"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<ListPermissions>();
        router.procedure::<CreatePermission>();
        router.procedure::<GetPermission>();
        router.procedure::<UpdatePermission>();
        router.procedure::<DeletePermission>();
    }
}
