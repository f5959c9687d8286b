//! `/api/items`: inventory owned by the users who created it.

use crate::catalog;
use crate::module::Module;
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};
use crate::service::items;
use crate::store::Listing;
use crate::store::items::{Item, ItemPatch, NewItem};
use crate::Result;

const TAG: &str = "items";

pub struct ListItems;

impl Procedure for ListItems {
    fn meta() -> Meta {
        Meta::get("/api/items")
            .summary("List items; non-admins see only their own")
            .tag(TAG)
            .permission(catalog::ITEM_VIEW_ALL)
    }

    type Input = Empty;
    type Output = Listing<Item>;

    async fn handle(ctx: Context, _input: Empty) -> Result<Listing<Item>> {
        let (conn, principal) = ctx.authenticate().await?;
        items::list(&conn, &principal, ctx.page()?).await
    }
}

pub struct CreateItem;

impl Procedure for CreateItem {
    fn meta() -> Meta {
        Meta::post("/api/items")
            .summary("Create an item owned by the caller")
            .tag(TAG)
            .status(201)
            .permission(catalog::ITEM_CREATE)
    }

    type Input = NewItem;
    type Output = Item;

    async fn handle(ctx: Context, input: NewItem) -> Result<Item> {
        let (conn, principal) = ctx.authenticate().await?;
        items::create(&conn, &principal, &input).await
    }
}

pub struct GetItem;

impl Procedure for GetItem {
    fn meta() -> Meta {
        Meta::get("/api/items/{id}")
            .summary("Get an item")
            .tag(TAG)
            .permission(catalog::ITEM_VIEW)
    }

    type Input = Empty;
    type Output = Item;

    async fn handle(ctx: Context, _input: Empty) -> Result<Item> {
        let (conn, principal) = ctx.authenticate().await?;
        items::get(&conn, &principal, ctx.id_param("id")?).await
    }
}

pub struct UpdateItem;

impl Procedure for UpdateItem {
    fn meta() -> Meta {
        Meta::patch("/api/items/{id}")
            .summary("Update an item")
            .tag(TAG)
            .permission(catalog::ITEM_UPDATE)
    }

    type Input = ItemPatch;
    type Output = Item;

    async fn handle(ctx: Context, input: ItemPatch) -> Result<Item> {
        let (conn, principal) = ctx.authenticate().await?;
        items::update(&conn, &principal, ctx.id_param("id")?, &input).await
    }
}

pub struct DeleteItem;

impl Procedure for DeleteItem {
    fn meta() -> Meta {
        Meta::delete("/api/items/{id}")
            .summary("Delete an item")
            .tag(TAG)
            .status(204)
            .permission(catalog::ITEM_DELETE)
    }

    type Input = Empty;
    type Output = ();

    async fn handle(ctx: Context, _input: Empty) -> Result<()> {
        let (conn, principal) = ctx.authenticate().await?;
        items::delete(&conn, &principal, ctx.id_param("id")?).await
    }
}

pub struct ItemsModule;

impl Module for ItemsModule {
    fn name(&self) -> &'static str {
        "items"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<ListItems>();
        router.procedure::<CreateItem>();
        router.procedure::<GetItem>();
        router.procedure::<UpdateItem>();
        router.procedure::<DeleteItem>();
    }
}
