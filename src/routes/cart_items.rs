use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    dto::{self, CartItemJson},
    error::AppError,
    extract::Json,
    models::{CartItemEntity, CreateCartItemEntity, UpdateCartItemEntity},
    pagination::{Page, PageQuery},
    schema::cart_items,
    state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_cart_items, create_cart_item))
        .routes(utoipa_axum::routes!(get_cart_item, update_cart_item, delete_cart_item))
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct CartItemListQuery {
    /// Ordering field: `quantity`, `-` prefix for descending.
    pub ordering: Option<String>,
    /// Exact-match filter on the owning customer.
    pub customer_id: Option<i32>,
    pub quantity: Option<i32>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List cart items with their customer and gift card embedded.
#[utoipa::path(
    get,
    path = "/cart-items/",
    tags = ["CartItems"],
    params(CartItemListQuery),
    responses(
        (status = 200, description = "Paginated cart items", body = Page<CartItemJson>)
    )
)]
async fn list_cart_items(
    State(state): State<AppState>,
    Query(params): Query<CartItemListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let build = || {
        let mut query = cart_items::table.into_boxed();
        if let Some(customer_id) = params.customer_id {
            query = query.filter(cart_items::customer_id.eq(customer_id));
        }
        if let Some(quantity) = params.quantity {
            query = query.filter(cart_items::quantity.eq(quantity));
        }
        query
    };

    let count: i64 = build()
        .count()
        .get_result(conn)
        .await
        .context("Failed to count cart items")?;

    let query = match params.ordering.as_deref() {
        Some("quantity") => build().order(cart_items::quantity.asc()),
        Some("-quantity") => build().order(cart_items::quantity.desc()),
        _ => build().order(cart_items::id.asc()),
    };

    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let rows: Vec<CartItemEntity> = query
        .offset(page.offset())
        .limit(page.page_size())
        .select(CartItemEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get cart items")?;

    let results = dto::cart_items_json(conn, rows).await?;
    Ok(Json(Page::new(count, page, results)))
}

/// Add a gift card to a customer's cart.
#[utoipa::path(
    post,
    path = "/cart-items/",
    tags = ["CartItems"],
    request_body = CreateCartItemEntity,
    responses(
        (status = 201, description = "Created cart item", body = CartItemJson)
    )
)]
async fn create_cart_item(
    State(state): State<AppState>,
    Json(body): Json<CreateCartItemEntity>,
) -> Result<impl IntoResponse, AppError> {
    if body.quantity < 1 {
        return Err(AppError::FieldError(
            "quantity".to_string(),
            "Quantity must be at least 1.".to_string(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item: CartItemEntity = diesel::insert_into(cart_items::table)
        .values(body)
        .returning(CartItemEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create cart item")?;

    let mut results = dto::cart_items_json(conn, vec![item]).await?;
    let item = results.pop().context("Missing cart item projection")?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Fetch a cart item.
#[utoipa::path(
    get,
    path = "/cart-items/{id}/",
    tags = ["CartItems"],
    params(("id" = i32, Path, description = "Cart item ID")),
    responses(
        (status = 200, description = "Cart item", body = CartItemJson),
        (status = 404, description = "Unknown cart item")
    )
)]
async fn get_cart_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item: CartItemEntity = cart_items::table
        .find(id)
        .select(CartItemEntity::as_select())
        .first(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::cart_items_json(conn, vec![item]).await?;
    let item = results.pop().context("Missing cart item projection")?;
    Ok(Json(item))
}

/// Update a cart item.
#[utoipa::path(
    put,
    path = "/cart-items/{id}/",
    tags = ["CartItems"],
    params(("id" = i32, Path, description = "Cart item ID")),
    request_body = UpdateCartItemEntity,
    responses(
        (status = 200, description = "Updated cart item", body = CartItemJson),
        (status = 404, description = "Unknown cart item")
    )
)]
async fn update_cart_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateCartItemEntity>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(quantity) = body.quantity
        && quantity < 1
    {
        return Err(AppError::FieldError(
            "quantity".to_string(),
            "Quantity must be at least 1.".to_string(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item: CartItemEntity = diesel::update(cart_items::table.find(id))
        .set(&body)
        .returning(CartItemEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::cart_items_json(conn, vec![item]).await?;
    let item = results.pop().context("Missing cart item projection")?;
    Ok(Json(item))
}

/// Remove a cart item.
#[utoipa::path(
    delete,
    path = "/cart-items/{id}/",
    tags = ["CartItems"],
    params(("id" = i32, Path, description = "Cart item ID")),
    responses(
        (status = 204, description = "Cart item deleted"),
        (status = 404, description = "Unknown cart item")
    )
)]
async fn delete_cart_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(cart_items::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete cart item")?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
