use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, PgTextExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    dto::{self, OrderJson},
    error::AppError,
    extract::Json,
    models::{CreateOrderEntity, OrderEntity, UpdateOrderEntity},
    pagination::{Page, PageQuery},
    schema::orders,
    state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_orders, create_order))
        .routes(utoipa_axum::routes!(get_order, update_order, delete_order))
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct OrderListQuery {
    /// Free-text search over order status and payment status.
    pub search: Option<String>,
    /// Ordering field: `order_date` or `status`, `-` prefix for descending.
    pub ordering: Option<String>,
    /// Exact-match filter.
    pub status: Option<String>,
    pub customer_id: Option<i32>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateOrderReq {
    pub customer_id: i32,
    pub meal_kit_id: i32,
    #[schema(value_type = String)]
    pub total_price: BigDecimal,
}

/// List orders with customer and meal kit embedded.
#[utoipa::path(
    get,
    path = "/orders/",
    tags = ["Orders"],
    params(OrderListQuery),
    responses(
        (status = 200, description = "Paginated orders", body = Page<OrderJson>)
    )
)]
async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let build = || {
        let mut query = orders::table.into_boxed();
        if let Some(search) = &params.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                orders::status
                    .ilike(pattern.clone())
                    .or(orders::payment_status.ilike(pattern)),
            );
        }
        if let Some(status) = &params.status {
            query = query.filter(orders::status.eq(status.clone()));
        }
        if let Some(customer_id) = params.customer_id {
            query = query.filter(orders::customer_id.eq(customer_id));
        }
        query
    };

    let count: i64 = build()
        .count()
        .get_result(conn)
        .await
        .context("Failed to count orders")?;

    let query = match params.ordering.as_deref() {
        Some("order_date") => build().order(orders::order_date.asc()),
        Some("-order_date") => build().order(orders::order_date.desc()),
        Some("status") => build().order(orders::status.asc()),
        Some("-status") => build().order(orders::status.desc()),
        _ => build().order(orders::id.asc()),
    };

    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let rows: Vec<OrderEntity> = query
        .offset(page.offset())
        .limit(page.page_size())
        .select(OrderEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get orders")?;

    let results = dto::orders_json(conn, rows).await?;
    Ok(Json(Page::new(count, page, results)))
}

/// Create an order directly, without a payment intent. Orders created here
/// stay in `Pending` until paid through the payment endpoints.
#[utoipa::path(
    post,
    path = "/orders/",
    tags = ["Orders"],
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Created order", body = OrderJson),
        (status = 400, description = "Non-positive total price")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.total_price <= BigDecimal::from(0) {
        return Err(AppError::FieldError(
            "total_price".to_string(),
            "Total price must be positive.".to_string(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = diesel::insert_into(orders::table)
        .values(CreateOrderEntity {
            customer_id: body.customer_id,
            meal_kit_id: body.meal_kit_id,
            status: "Pending".to_string(),
            payment_status: "Pending".to_string(),
            razorpay_order_id: None,
            total_price: body.total_price,
            idempotency_key: None,
            currency: "INR".to_string(),
        })
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create order")?;

    let mut results = dto::orders_json(conn, vec![order]).await?;
    let order = results.pop().context("Missing order projection")?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Fetch an order.
#[utoipa::path(
    get,
    path = "/orders/{id}/",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = OrderJson),
        (status = 404, description = "Unknown order")
    )
)]
async fn get_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = orders::table
        .find(id)
        .select(OrderEntity::as_select())
        .first(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::orders_json(conn, vec![order]).await?;
    let order = results.pop().context("Missing order projection")?;
    Ok(Json(order))
}

/// Update an order's fulfilment status. Payment fields only move through the
/// payment endpoints.
#[utoipa::path(
    put,
    path = "/orders/{id}/",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderEntity,
    responses(
        (status = 200, description = "Updated order", body = OrderJson),
        (status = 404, description = "Unknown order")
    )
)]
async fn update_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateOrderEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = diesel::update(orders::table.find(id))
        .set(&body)
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::orders_json(conn, vec![order]).await?;
    let order = results.pop().context("Missing order projection")?;
    Ok(Json(order))
}

/// Delete an order.
#[utoipa::path(
    delete,
    path = "/orders/{id}/",
    tags = ["Orders"],
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Unknown order")
    )
)]
async fn delete_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(orders::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete order")?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
