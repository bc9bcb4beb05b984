use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, PgTextExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use validator::Validate;

use crate::{
    auth::password,
    error::AppError,
    extract::Json,
    models::{CompanyEntity, CreateCompanyEntity, CreateUserEntity, UpdateCompanyEntity, UserEntity},
    pagination::{Page, PageQuery},
    schema::{companies, users},
    state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_companies, create_company))
        .routes(utoipa_axum::routes!(get_company, update_company, delete_company))
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct CompanyListQuery {
    /// Free-text search over food type and category.
    pub search: Option<String>,
    /// Ordering field: `company_name` or `food_type`, `-` prefix for descending.
    pub ordering: Option<String>,
    /// Exact-match filter.
    pub company_name: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List companies.
#[utoipa::path(
    get,
    path = "/companies/",
    tags = ["Companies"],
    params(CompanyListQuery),
    responses(
        (status = 200, description = "Paginated companies", body = Page<CompanyEntity>)
    )
)]
async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<CompanyListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let build = || {
        let mut query = companies::table.into_boxed();
        if let Some(search) = &params.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                companies::food_type
                    .ilike(pattern.clone())
                    .or(companies::category.ilike(pattern)),
            );
        }
        if let Some(name) = &params.company_name {
            query = query.filter(companies::company_name.eq(name));
        }
        query
    };

    let count: i64 = build()
        .count()
        .get_result(conn)
        .await
        .context("Failed to count companies")?;

    let query = match params.ordering.as_deref() {
        Some("company_name") => build().order(companies::company_name.asc()),
        Some("-company_name") => build().order(companies::company_name.desc()),
        Some("food_type") => build().order(companies::food_type.asc()),
        Some("-food_type") => build().order(companies::food_type.desc()),
        _ => build().order(companies::id.asc()),
    };

    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let rows: Vec<CompanyEntity> = query
        .offset(page.offset())
        .limit(page.page_size())
        .select(CompanyEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get companies")?;

    Ok(Json(Page::new(count, page, rows)))
}

#[derive(Deserialize, Validate, Debug, ToSchema)]
pub struct RegisterCompanyReq {
    #[validate(length(min = 1, max = 255))]
    pub company_name: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(email)]
    pub email: String,
    #[serde(default = "default_food_type")]
    pub food_type: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_food_type() -> String {
    "both".to_string()
}

fn default_category() -> String {
    "lunch".to_string()
}

/// Register a company: one user row (company role, hashed credential) plus
/// the company profile, created in a single transaction.
#[utoipa::path(
    post,
    path = "/companies/",
    tags = ["Companies"],
    request_body = RegisterCompanyReq,
    responses(
        (status = 201, description = "Company registered", body = CompanyEntity),
        (status = 400, description = "Validation failed or name taken")
    )
)]
async fn create_company(
    State(state): State<AppState>,
    Json(body): Json<RegisterCompanyReq>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let password_hash = password::hash_password(&body.password)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let company = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let taken: i64 = users::table
                    .filter(users::username.eq(&body.company_name))
                    .count()
                    .get_result(conn)
                    .await
                    .context("Failed to check username")?;
                if taken > 0 {
                    return Err(AppError::FieldError(
                        "company_name".to_string(),
                        "A user with that name already exists.".to_string(),
                    ));
                }

                let user: UserEntity = diesel::insert_into(users::table)
                    .values(CreateUserEntity {
                        username: body.company_name.clone(),
                        password_hash,
                        email: Some(body.email.clone()),
                        is_chef: false,
                        is_customer: false,
                        is_company: true,
                    })
                    .returning(UserEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create user")?;

                let company: CompanyEntity = diesel::insert_into(companies::table)
                    .values(CreateCompanyEntity {
                        user_id: Some(user.id),
                        company_name: body.company_name,
                        email: body.email,
                        food_type: body.food_type,
                        category: body.category,
                    })
                    .returning(CompanyEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create company")?;

                Ok::<CompanyEntity, AppError>(company)
            })
        })
        .await?;

    Ok((StatusCode::CREATED, Json(company)))
}

/// Fetch a company.
#[utoipa::path(
    get,
    path = "/companies/{id}/",
    tags = ["Companies"],
    params(("id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company", body = CompanyEntity),
        (status = 404, description = "Unknown company")
    )
)]
async fn get_company(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let company: CompanyEntity = companies::table
        .find(id)
        .select(CompanyEntity::as_select())
        .first(conn)
        .await
        .map_err(AppError::from)?;

    Ok(Json(company))
}

/// Update a company.
#[utoipa::path(
    put,
    path = "/companies/{id}/",
    tags = ["Companies"],
    params(("id" = i32, Path, description = "Company ID")),
    request_body = UpdateCompanyEntity,
    responses(
        (status = 200, description = "Updated company", body = CompanyEntity),
        (status = 404, description = "Unknown company")
    )
)]
async fn update_company(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateCompanyEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let company: CompanyEntity = diesel::update(companies::table.find(id))
        .set(&body)
        .returning(CompanyEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(AppError::from)?;

    Ok(Json(company))
}

/// Delete a company.
#[utoipa::path(
    delete,
    path = "/companies/{id}/",
    tags = ["Companies"],
    params(("id" = i32, Path, description = "Company ID")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 404, description = "Unknown company")
    )
)]
async fn delete_company(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(companies::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete company")?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
