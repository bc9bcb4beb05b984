use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{ExpressionMethods, PgTextExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    dto::{self, CustomerJson},
    error::AppError,
    extract::Json,
    models::{CustomerEntity, UpdateCustomerEntity},
    pagination::{Page, PageQuery},
    schema::customers,
    state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_customers))
        .routes(utoipa_axum::routes!(get_customer, update_customer, delete_customer))
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct CustomerListQuery {
    /// Free-text search over customer name and mobile.
    pub search: Option<String>,
    /// Ordering field: `customer_name` or `age`, `-` prefix for descending.
    pub ordering: Option<String>,
    pub gender: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List customers.
#[utoipa::path(
    get,
    path = "/customers/",
    tags = ["Customers"],
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Paginated customers", body = Page<CustomerJson>)
    )
)]
async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<CustomerListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let build = || {
        let mut query = customers::table.into_boxed();
        if let Some(search) = &params.search {
            let pattern = format!("%{search}%");
            query = query.filter(customers::customer_name.ilike(pattern));
        }
        if let Some(gender) = &params.gender {
            query = query.filter(customers::gender.eq(gender));
        }
        query
    };

    let count: i64 = build()
        .count()
        .get_result(conn)
        .await
        .context("Failed to count customers")?;

    let query = match params.ordering.as_deref() {
        Some("customer_name") => build().order(customers::customer_name.asc()),
        Some("-customer_name") => build().order(customers::customer_name.desc()),
        Some("age") => build().order(customers::age.asc()),
        Some("-age") => build().order(customers::age.desc()),
        _ => build().order(customers::id.asc()),
    };

    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let rows: Vec<CustomerEntity> = query
        .offset(page.offset())
        .limit(page.page_size())
        .select(CustomerEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get customers")?;

    let results = dto::customers_json(conn, rows).await?;
    Ok(Json(Page::new(count, page, results)))
}

/// Fetch a customer with their subscription plan.
#[utoipa::path(
    get,
    path = "/customers/{id}/",
    tags = ["Customers"],
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer", body = CustomerJson),
        (status = 404, description = "Unknown customer")
    )
)]
async fn get_customer(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let customer: CustomerEntity = customers::table
        .find(id)
        .select(CustomerEntity::as_select())
        .first(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::customers_json(conn, vec![customer]).await?;
    let customer = results.pop().context("Missing customer projection")?;
    Ok(Json(customer))
}

/// Update a customer.
#[utoipa::path(
    put,
    path = "/customers/{id}/",
    tags = ["Customers"],
    params(("id" = i32, Path, description = "Customer ID")),
    request_body = UpdateCustomerEntity,
    responses(
        (status = 200, description = "Updated customer", body = CustomerJson),
        (status = 404, description = "Unknown customer")
    )
)]
async fn update_customer(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateCustomerEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let customer: CustomerEntity = diesel::update(customers::table.find(id))
        .set(&body)
        .returning(CustomerEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::customers_json(conn, vec![customer]).await?;
    let customer = results.pop().context("Missing customer projection")?;
    Ok(Json(customer))
}

/// Delete a customer. Meal kits, orders, reviews, gift cards, cart items and
/// the chef plan cascade with it.
#[utoipa::path(
    delete,
    path = "/customers/{id}/",
    tags = ["Customers"],
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Unknown customer")
    )
)]
async fn delete_customer(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(customers::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete customer")?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
