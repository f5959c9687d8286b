//! `/api/roles`, including role assignment and the role-permission links.

use crate::catalog;
use crate::module::Module;
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};
use crate::service::roles::{self, PermissionIds};
use crate::store::Listing;
use crate::store::roles::{NewRole, RoleDetail, RolePatch};
use crate::Result;

const TAG: &str = "roles";

pub struct ListRoles;

impl Procedure for ListRoles {
    fn meta() -> Meta {
        Meta::get("/api/roles")
            .summary("List roles with their permissions")
            .tag(TAG)
            .permission(catalog::ROLE_VIEW_ALL)
    }

    type Input = Empty;
    type Output = Listing<RoleDetail>;

    async fn handle(ctx: Context, _input: Empty) -> Result<Listing<RoleDetail>> {
        let (conn, principal) = ctx.authenticate().await?;
        roles::list(&conn, &principal, ctx.page()?).await
    }
}

pub struct CreateRole;

impl Procedure for CreateRole {
    fn meta() -> Meta {
        Meta::post("/api/roles")
            .summary("Create a role")
            .tag(TAG)
            .status(201)
            .permission(catalog::ROLE_CREATE)
    }

    type Input = NewRole;
    type Output = RoleDetail;

    async fn handle(ctx: Context, input: NewRole) -> Result<RoleDetail> {
        let (conn, principal) = ctx.authenticate().await?;
        roles::create(&conn, &principal, &input).await
    }
}

pub struct GetRole;

impl Procedure for GetRole {
    fn meta() -> Meta {
        Meta::get("/api/roles/{id}")
            .summary("Get a role with its permissions")
            .tag(TAG)
            .permission(catalog::ROLE_VIEW)
    }

    type Input = Empty;
    type Output = RoleDetail;

    async fn handle(ctx: Context, _input: Empty) -> Result<RoleDetail> {
        let (conn, principal) = ctx.authenticate().await?;
        roles::get(&conn, &principal, ctx.id_param("id")?).await
    }
}

pub struct UpdateRole;

impl Procedure for UpdateRole {
    fn meta() -> Meta {
        Meta::put("/api/roles/{id}")
            .summary("Rename or describe a role")
            .tag(TAG)
            .permission(catalog::ROLE_UPDATE)
    }

    type Input = RolePatch;
    type Output = RoleDetail;

    async fn handle(ctx: Context, input: RolePatch) -> Result<RoleDetail> {
        let (conn, principal) = ctx.authenticate().await?;
        roles::update(&conn, &principal, ctx.id_param("id")?, &input).await
    }
}

pub struct DeleteRole;

impl Procedure for DeleteRole {
    fn meta() -> Meta {
        Meta::delete("/api/roles/{id}")
            .summary("Delete a role and every user holding it")
            .tag(TAG)
            .status(204)
            .permission(catalog::ROLE_DELETE)
    }

    type Input = Empty;
    type Output = ();

    async fn handle(ctx: Context, _input: Empty) -> Result<()> {
        let (conn, principal) = ctx.authenticate().await?;
        roles::delete(&conn, &principal, ctx.id_param("id")?).await
    }
}

pub struct AssignRole;

impl Procedure for AssignRole {
    fn meta() -> Meta {
        Meta::post("/api/roles/{id}/users/{user_id}")
            .summary("Assign the role to a user")
            .tag(TAG)
            .status(204)
            .permission(catalog::ROLE_ASSIGN)
    }

    type Input = Empty;
    type Output = ();

    async fn handle(ctx: Context, _input: Empty) -> Result<()> {
        let (conn, principal) = ctx.authenticate().await?;
        let role_id = ctx.id_param("id")?;
        let user_id = ctx.id_param("user_id")?;
        roles::assign(&conn, &principal, role_id, user_id).await
    }
}

pub struct AddPermission;

impl Procedure for AddPermission {
    fn meta() -> Meta {
        Meta::post("/api/roles/{id}/permissions/{permission_id}")
            .summary("Grant a permission to the role")
            .tag(TAG)
            .status(204)
            .permission(catalog::ROLE_ADD_PERMISSION)
    }

    type Input = Empty;
    type Output = ();

    async fn handle(ctx: Context, _input: Empty) -> Result<()> {
        let (conn, principal) = ctx.authenticate().await?;
        let role_id = ctx.id_param("id")?;
        let permission_id = ctx.id_param("permission_id")?;
        roles::add_permission(&conn, &principal, role_id, permission_id).await
    }
}

pub struct RemovePermission;

impl Procedure for RemovePermission {
    fn meta() -> Meta {
        Meta::delete("/api/roles/{id}/permissions/{permission_id}")
            .summary("Revoke a permission from the role")
            .tag(TAG)
            .status(204)
            .permission(catalog::ROLE_REMOVE_PERMISSION)
    }

    type Input = Empty;
    type Output = ();

    async fn handle(ctx: Context, _input: Empty) -> Result<()> {
        let (conn, principal) = ctx.authenticate().await?;
        let role_id = ctx.id_param("id")?;
        let permission_id = ctx.id_param("permission_id")?;
        roles::remove_permission(&conn, &principal, role_id, permission_id).await
    }
}

pub struct SyncPermissions;

impl Procedure for SyncPermissions {
    fn meta() -> Meta {
        Meta::put("/api/roles/{id}/permissions")
            .summary("Replace the role's permissions")
            .tag(TAG)
            .permission(catalog::ROLE_UPDATE_PERMISSIONS)
    }

    type Input = PermissionIds;
    type Output = RoleDetail;

    async fn handle(ctx: Context, input: PermissionIds) -> Result<RoleDetail> {
        let (conn, principal) = ctx.authenticate().await?;
        roles::sync_permissions(&conn, &principal, ctx.id_param("id")?, &input).await
    }
}

pub struct RolesModule;

impl Module for RolesModule {
    fn name(&self) -> &'static str {
        "roles"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<ListRoles>();
        router.procedure::<CreateRole>();
        router.procedure::<GetRole>();
        router.procedure::<UpdateRole>();
        router.procedure::<DeleteRole>();
        router.procedure::<AssignRole>();
        router.procedure::<AddPermission>();
        router.procedure::<RemovePermission>();
        router.procedure::<SyncPermissions>();
    }
}
