use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, PgTextExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    dto::{self, ChefPlanJson},
    error::AppError,
    extract::Json,
    models::{ChefPlanEntity, CreateChefPlanEntity, UpdateChefPlanEntity},
    pagination::{Page, PageQuery},
    schema::chef_plans,
    state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_chef_plans, create_chef_plan))
        .routes(utoipa_axum::routes!(get_chef_plan, update_chef_plan, delete_chef_plan))
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct ChefPlanListQuery {
    /// Free-text search over plan name and event type.
    pub search: Option<String>,
    /// Ordering field: `price` or `plan_name`, `-` prefix for descending.
    pub ordering: Option<String>,
    /// Exact-match filter.
    pub event_type: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List chef plans.
#[utoipa::path(
    get,
    path = "/chef-plans/",
    tags = ["ChefPlans"],
    params(ChefPlanListQuery),
    responses(
        (status = 200, description = "Paginated chef plans", body = Page<ChefPlanJson>)
    )
)]
async fn list_chef_plans(
    State(state): State<AppState>,
    Query(params): Query<ChefPlanListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let build = || {
        let mut query = chef_plans::table.into_boxed();
        if let Some(search) = &params.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                chef_plans::plan_name
                    .ilike(pattern.clone())
                    .or(chef_plans::event_type.ilike(pattern)),
            );
        }
        if let Some(event_type) = &params.event_type {
            query = query.filter(chef_plans::event_type.eq(event_type.clone()));
        }
        query
    };

    let count: i64 = build()
        .count()
        .get_result(conn)
        .await
        .context("Failed to count chef plans")?;

    let query = match params.ordering.as_deref() {
        Some("price") => build().order(chef_plans::price.asc()),
        Some("-price") => build().order(chef_plans::price.desc()),
        Some("plan_name") => build().order(chef_plans::plan_name.asc()),
        Some("-plan_name") => build().order(chef_plans::plan_name.desc()),
        _ => build().order(chef_plans::id.asc()),
    };

    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let rows: Vec<ChefPlanEntity> = query
        .offset(page.offset())
        .limit(page.page_size())
        .select(ChefPlanEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get chef plans")?;

    let results = dto::chef_plans_json(conn, rows).await?;
    Ok(Json(Page::new(count, page, results)))
}

/// Create a chef plan.
#[utoipa::path(
    post,
    path = "/chef-plans/",
    tags = ["ChefPlans"],
    request_body = CreateChefPlanEntity,
    responses(
        (status = 201, description = "Created chef plan", body = ChefPlanJson)
    )
)]
async fn create_chef_plan(
    State(state): State<AppState>,
    Json(body): Json<CreateChefPlanEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let plan: ChefPlanEntity = diesel::insert_into(chef_plans::table)
        .values(body)
        .returning(ChefPlanEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create chef plan")?;

    let mut results = dto::chef_plans_json(conn, vec![plan]).await?;
    let plan = results.pop().context("Missing chef plan projection")?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Fetch a chef plan.
#[utoipa::path(
    get,
    path = "/chef-plans/{id}/",
    tags = ["ChefPlans"],
    params(("id" = i32, Path, description = "Chef plan ID")),
    responses(
        (status = 200, description = "Chef plan", body = ChefPlanJson),
        (status = 404, description = "Unknown chef plan")
    )
)]
async fn get_chef_plan(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let plan: ChefPlanEntity = chef_plans::table
        .find(id)
        .select(ChefPlanEntity::as_select())
        .first(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::chef_plans_json(conn, vec![plan]).await?;
    let plan = results.pop().context("Missing chef plan projection")?;
    Ok(Json(plan))
}

/// Update a chef plan.
#[utoipa::path(
    put,
    path = "/chef-plans/{id}/",
    tags = ["ChefPlans"],
    params(("id" = i32, Path, description = "Chef plan ID")),
    request_body = UpdateChefPlanEntity,
    responses(
        (status = 200, description = "Updated chef plan", body = ChefPlanJson),
        (status = 404, description = "Unknown chef plan")
    )
)]
async fn update_chef_plan(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateChefPlanEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let plan: ChefPlanEntity = diesel::update(chef_plans::table.find(id))
        .set(&body)
        .returning(ChefPlanEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::chef_plans_json(conn, vec![plan]).await?;
    let plan = results.pop().context("Missing chef plan projection")?;
    Ok(Json(plan))
}

/// Delete a chef plan.
#[utoipa::path(
    delete,
    path = "/chef-plans/{id}/",
    tags = ["ChefPlans"],
    params(("id" = i32, Path, description = "Chef plan ID")),
    responses(
        (status = 204, description = "Chef plan deleted"),
        (status = 404, description = "Unknown chef plan")
    )
)]
async fn delete_chef_plan(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(chef_plans::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete chef plan")?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
