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
    dto::{self, MealKitJson},
    error::AppError,
    extract::Json,
    models::{CreateMealKitEntity, MealKitEntity, UpdateMealKitEntity},
    pagination::{Page, PageQuery},
    schema::meal_kits,
    state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_meal_kits, create_meal_kit))
        .routes(utoipa_axum::routes!(get_meal_kit, update_meal_kit, delete_meal_kit))
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct MealKitListQuery {
    /// Free-text search over meal name and ingredients.
    pub search: Option<String>,
    /// Ordering field: `price` or `meal_name`, `-` prefix for descending.
    pub ordering: Option<String>,
    /// Exact-match filter on the owning chef.
    pub chef_id: Option<i32>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List meal kits with their chef embedded.
#[utoipa::path(
    get,
    path = "/meal-kits/",
    tags = ["MealKits"],
    params(MealKitListQuery),
    responses(
        (status = 200, description = "Paginated meal kits", body = Page<MealKitJson>)
    )
)]
async fn list_meal_kits(
    State(state): State<AppState>,
    Query(params): Query<MealKitListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let build = || {
        let mut query = meal_kits::table.into_boxed();
        if let Some(search) = &params.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                meal_kits::meal_name
                    .ilike(pattern.clone())
                    .or(meal_kits::ingredients.ilike(pattern)),
            );
        }
        if let Some(chef_id) = params.chef_id {
            query = query.filter(meal_kits::chef_id.eq(chef_id));
        }
        query
    };

    let count: i64 = build()
        .count()
        .get_result(conn)
        .await
        .context("Failed to count meal kits")?;

    let query = match params.ordering.as_deref() {
        Some("price") => build().order(meal_kits::price.asc()),
        Some("-price") => build().order(meal_kits::price.desc()),
        Some("meal_name") => build().order(meal_kits::meal_name.asc()),
        Some("-meal_name") => build().order(meal_kits::meal_name.desc()),
        _ => build().order(meal_kits::id.asc()),
    };

    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let rows: Vec<MealKitEntity> = query
        .offset(page.offset())
        .limit(page.page_size())
        .select(MealKitEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get meal kits")?;

    let results = dto::meal_kits_json(conn, rows).await?;
    Ok(Json(Page::new(count, page, results)))
}

/// Publish a new meal kit under a chef.
#[utoipa::path(
    post,
    path = "/meal-kits/",
    tags = ["MealKits"],
    request_body = CreateMealKitEntity,
    responses(
        (status = 201, description = "Created meal kit", body = MealKitJson)
    )
)]
async fn create_meal_kit(
    State(state): State<AppState>,
    Json(body): Json<CreateMealKitEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let kit: MealKitEntity = diesel::insert_into(meal_kits::table)
        .values(body)
        .returning(MealKitEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create meal kit")?;

    let mut results = dto::meal_kits_json(conn, vec![kit]).await?;
    let kit = results.pop().context("Missing meal kit projection")?;
    Ok((StatusCode::CREATED, Json(kit)))
}

/// Fetch a meal kit.
#[utoipa::path(
    get,
    path = "/meal-kits/{id}/",
    tags = ["MealKits"],
    params(("id" = i32, Path, description = "Meal kit ID")),
    responses(
        (status = 200, description = "Meal kit", body = MealKitJson),
        (status = 404, description = "Unknown meal kit")
    )
)]
async fn get_meal_kit(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let kit: MealKitEntity = meal_kits::table
        .find(id)
        .select(MealKitEntity::as_select())
        .first(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::meal_kits_json(conn, vec![kit]).await?;
    let kit = results.pop().context("Missing meal kit projection")?;
    Ok(Json(kit))
}

/// Update a meal kit.
#[utoipa::path(
    put,
    path = "/meal-kits/{id}/",
    tags = ["MealKits"],
    params(("id" = i32, Path, description = "Meal kit ID")),
    request_body = UpdateMealKitEntity,
    responses(
        (status = 200, description = "Updated meal kit", body = MealKitJson),
        (status = 404, description = "Unknown meal kit")
    )
)]
async fn update_meal_kit(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateMealKitEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let kit: MealKitEntity = diesel::update(meal_kits::table.find(id))
        .set(&body)
        .returning(MealKitEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::meal_kits_json(conn, vec![kit]).await?;
    let kit = results.pop().context("Missing meal kit projection")?;
    Ok(Json(kit))
}

/// Delete a meal kit along with its orders and reviews.
#[utoipa::path(
    delete,
    path = "/meal-kits/{id}/",
    tags = ["MealKits"],
    params(("id" = i32, Path, description = "Meal kit ID")),
    responses(
        (status = 204, description = "Meal kit deleted"),
        (status = 404, description = "Unknown meal kit")
    )
)]
async fn delete_meal_kit(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(meal_kits::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete meal kit")?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
