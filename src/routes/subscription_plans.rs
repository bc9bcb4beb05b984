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
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    dto::{self, SubscriptionPlanJson},
    error::AppError,
    extract::Json,
    models::{CreateSubscriptionPlanEntity, SubscriptionPlanEntity, UpdateSubscriptionPlanEntity},
    pagination::{Page, PageQuery},
    schema::subscription_plans,
    state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_subscription_plans, create_subscription_plan))
        .routes(utoipa_axum::routes!(
            get_subscription_plan,
            update_subscription_plan,
            delete_subscription_plan
        ))
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct SubscriptionPlanListQuery {
    /// Free-text search over plan name and description.
    pub search: Option<String>,
    /// Ordering field: `price` or `meals_per_week`, `-` prefix for descending.
    pub ordering: Option<String>,
    #[param(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List subscription plans with their companies.
#[utoipa::path(
    get,
    path = "/subscription-plans/",
    tags = ["SubscriptionPlans"],
    params(SubscriptionPlanListQuery),
    responses(
        (status = 200, description = "Paginated subscription plans", body = Page<SubscriptionPlanJson>)
    )
)]
async fn list_subscription_plans(
    State(state): State<AppState>,
    Query(params): Query<SubscriptionPlanListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let build = || {
        let mut query = subscription_plans::table.into_boxed();
        if let Some(search) = &params.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                subscription_plans::plan_name
                    .ilike(pattern.clone())
                    .or(subscription_plans::description.ilike(pattern)),
            );
        }
        if let Some(price) = &params.price {
            query = query.filter(subscription_plans::price.eq(price.clone()));
        }
        query
    };

    let count: i64 = build()
        .count()
        .get_result(conn)
        .await
        .context("Failed to count subscription plans")?;

    let query = match params.ordering.as_deref() {
        Some("price") => build().order(subscription_plans::price.asc()),
        Some("-price") => build().order(subscription_plans::price.desc()),
        Some("meals_per_week") => build().order(subscription_plans::meals_per_week.asc()),
        Some("-meals_per_week") => build().order(subscription_plans::meals_per_week.desc()),
        _ => build().order(subscription_plans::id.asc()),
    };

    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let rows: Vec<SubscriptionPlanEntity> = query
        .offset(page.offset())
        .limit(page.page_size())
        .select(SubscriptionPlanEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get subscription plans")?;

    let results = dto::subscription_plans_json(conn, rows).await?;
    Ok(Json(Page::new(count, page, results)))
}

/// Create a subscription plan for a company.
#[utoipa::path(
    post,
    path = "/subscription-plans/",
    tags = ["SubscriptionPlans"],
    request_body = CreateSubscriptionPlanEntity,
    responses(
        (status = 201, description = "Created subscription plan", body = SubscriptionPlanJson)
    )
)]
async fn create_subscription_plan(
    State(state): State<AppState>,
    Json(body): Json<CreateSubscriptionPlanEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let plan: SubscriptionPlanEntity = diesel::insert_into(subscription_plans::table)
        .values(body)
        .returning(SubscriptionPlanEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create subscription plan")?;

    let mut results = dto::subscription_plans_json(conn, vec![plan]).await?;
    let plan = results.pop().context("Missing plan projection")?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Fetch a subscription plan.
#[utoipa::path(
    get,
    path = "/subscription-plans/{id}/",
    tags = ["SubscriptionPlans"],
    params(("id" = i32, Path, description = "Subscription plan ID")),
    responses(
        (status = 200, description = "Subscription plan", body = SubscriptionPlanJson),
        (status = 404, description = "Unknown subscription plan")
    )
)]
async fn get_subscription_plan(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let plan: SubscriptionPlanEntity = subscription_plans::table
        .find(id)
        .select(SubscriptionPlanEntity::as_select())
        .first(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::subscription_plans_json(conn, vec![plan]).await?;
    let plan = results.pop().context("Missing plan projection")?;
    Ok(Json(plan))
}

/// Update a subscription plan.
#[utoipa::path(
    put,
    path = "/subscription-plans/{id}/",
    tags = ["SubscriptionPlans"],
    params(("id" = i32, Path, description = "Subscription plan ID")),
    request_body = UpdateSubscriptionPlanEntity,
    responses(
        (status = 200, description = "Updated subscription plan", body = SubscriptionPlanJson),
        (status = 404, description = "Unknown subscription plan")
    )
)]
async fn update_subscription_plan(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateSubscriptionPlanEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let plan: SubscriptionPlanEntity = diesel::update(subscription_plans::table.find(id))
        .set(&body)
        .returning(SubscriptionPlanEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::subscription_plans_json(conn, vec![plan]).await?;
    let plan = results.pop().context("Missing plan projection")?;
    Ok(Json(plan))
}

/// Delete a subscription plan. Customers referencing it keep their rows with
/// the reference nulled out.
#[utoipa::path(
    delete,
    path = "/subscription-plans/{id}/",
    tags = ["SubscriptionPlans"],
    params(("id" = i32, Path, description = "Subscription plan ID")),
    responses(
        (status = 204, description = "Subscription plan deleted"),
        (status = 404, description = "Unknown subscription plan")
    )
)]
async fn delete_subscription_plan(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(subscription_plans::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete subscription plan")?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
