//! `/api/users`

use crate::catalog;
use crate::module::Module;
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};
use crate::service::users;
use crate::store::Listing;
use crate::store::users::{NewUser, User, UserPatch};
use crate::Result;

const TAG: &str = "users";

pub struct ListUsers;

impl Procedure for ListUsers {
    fn meta() -> Meta {
        Meta::get("/api/users")
            .summary("List users")
            .tag(TAG)
            .permission(catalog::USER_VIEW_ALL)
    }

    type Input = Empty;
    type Output = Listing<User>;

    async fn handle(ctx: Context, _input: Empty) -> Result<Listing<User>> {
        let (conn, principal) = ctx.authenticate().await?;
        users::list(&conn, &principal, ctx.page()?).await
    }
}

pub struct CreateUser;

impl Procedure for CreateUser {
    fn meta() -> Meta {
        Meta::post("/api/users")
            .summary("Create a user")
            .tag(TAG)
            .status(201)
            .permission(catalog::USER_CREATE)
    }

    type Input = NewUser;
    type Output = User;

    async fn handle(ctx: Context, input: NewUser) -> Result<User> {
        let (conn, principal) = ctx.authenticate().await?;
        users::create(&conn, &principal, &ctx.config.rbac, &input).await
    }
}

pub struct GetUser;

impl Procedure for GetUser {
    fn meta() -> Meta {
        Meta::get("/api/users/{id}")
            .summary("Get a user")
            .tag(TAG)
            .permission(catalog::USER_VIEW)
    }

    type Input = Empty;
    type Output = User;

    async fn handle(ctx: Context, _input: Empty) -> Result<User> {
        let (conn, principal) = ctx.authenticate().await?;
        users::get(&conn, &principal, ctx.id_param("id")?).await
    }
}

pub struct UpdateUser;

impl Procedure for UpdateUser {
    fn meta() -> Meta {
        Meta::patch("/api/users/{id}")
            .summary("Update a profile; non-admins may only update themselves")
            .tag(TAG)
            .permission(catalog::USER_UPDATE)
    }

    type Input = UserPatch;
    type Output = User;

    async fn handle(ctx: Context, input: UserPatch) -> Result<User> {
        let (conn, principal) = ctx.authenticate().await?;
        users::update(&conn, &principal, ctx.id_param("id")?, &input).await
    }
}

pub struct DeleteUser;

impl Procedure for DeleteUser {
    fn meta() -> Meta {
        Meta::delete("/api/users/{id}")
            .summary("Delete a user and their items")
            .tag(TAG)
            .status(204)
            .permission(catalog::USER_DELETE)
    }

    type Input = Empty;
    type Output = ();

    async fn handle(ctx: Context, _input: Empty) -> Result<()> {
        let (conn, principal) = ctx.authenticate().await?;
        users::delete(&conn, &principal, ctx.id_param("id")?).await
    }
}

pub struct UsersModule;

impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<ListUsers>();
        router.procedure::<CreateUser>();
        router.procedure::<GetUser>();
        router.procedure::<UpdateUser>();
        router.procedure::<DeleteUser>();
    }
}
