use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use validator::Validate;

use crate::{
    auth::{self, jwt, password},
    error::AppError,
    extract::Json,
    models::{
        BlacklistedTokenEntity, CreateBlacklistedTokenEntity, CreateCustomerEntity,
        CreateUserEntity, UserEntity,
    },
    schema::{customers, token_blacklist, users},
    state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(register))
        .routes(utoipa_axum::routes!(login))
        .routes(utoipa_axum::routes!(logout))
        .routes(utoipa_axum::routes!(token))
        .routes(utoipa_axum::routes!(token_refresh))
}

#[derive(Deserialize, Validate, Debug, ToSchema)]
pub struct RegisterReq {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(max = 20))]
    pub customer_name: Option<String>,
    pub age: Option<i32>,
    #[validate(length(min = 1, max = 10))]
    pub gender: String,
    #[validate(length(equal = 10, message = "Mobile number must be 10 digits"))]
    pub mobile: String,
    pub address: Option<String>,
}

/// Register a customer account: one user row plus one customer profile,
/// created in a single transaction.
#[utoipa::path(
    post,
    path = "/register/",
    tags = ["Auth"],
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Customer registered successfully"),
        (status = 400, description = "Validation failed or username taken")
    )
)]
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterReq>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let password_hash = password::hash_password(&body.password)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let customer_id = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let taken: i64 = users::table
                    .filter(users::username.eq(&body.username))
                    .count()
                    .get_result(conn)
                    .await
                    .context("Failed to check username")?;
                if taken > 0 {
                    return Err(AppError::FieldError(
                        "username".to_string(),
                        "A user with that username already exists.".to_string(),
                    ));
                }

                let user: UserEntity = diesel::insert_into(users::table)
                    .values(CreateUserEntity {
                        username: body.username,
                        password_hash,
                        email: None,
                        is_chef: false,
                        is_customer: true,
                        is_company: false,
                    })
                    .returning(UserEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create user")?;

                let customer_id: i32 = diesel::insert_into(customers::table)
                    .values(CreateCustomerEntity {
                        user_id: Some(user.id),
                        customer_name: body.customer_name,
                        gender: body.gender,
                        age: body.age,
                        mobile: body.mobile,
                        address: body.address,
                        subscription_plan_id: None,
                    })
                    .returning(customers::id)
                    .get_result(conn)
                    .await
                    .context("Failed to create customer")?;

                Ok::<i32, AppError>(customer_id)
            })
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "detail": "Customer registered successfully",
            "customer_id": customer_id,
        })),
    ))
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct LoginRes {
    pub refresh: String,
    pub access: String,
    pub user_type: String,
}

/// Authenticate and issue a JWT pair tagged with the resolved role.
#[utoipa::path(
    post,
    path = "/login/",
    tags = ["Auth"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Authenticated", body = LoginRes),
        (status = 401, description = "Invalid credentials or unrecognized role")
    )
)]
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let user = authenticate(conn, &body.username, &body.password).await?;

    let user_type = auth::resolve_user_type(&user)
        .ok_or_else(|| AppError::Unauthorized("User type not recognized".to_string()))?;

    let pair = jwt::issue_pair(&state.config.jwt, user.id, user_type)?;

    Ok(Json(LoginRes {
        refresh: pair.refresh,
        access: pair.access,
        user_type: user_type.to_string(),
    }))
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RefreshReq {
    pub refresh: String,
}

/// Blacklist the presented refresh token.
#[utoipa::path(
    post,
    path = "/logout/",
    tags = ["Auth"],
    request_body = RefreshReq,
    responses(
        (status = 205, description = "Token blacklisted"),
        (status = 401, description = "Invalid refresh token")
    )
)]
async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshReq>,
) -> Result<impl IntoResponse, AppError> {
    let claims = jwt::decode(&state.config.jwt, &body.refresh, jwt::REFRESH_TOKEN)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    diesel::insert_into(token_blacklist::table)
        .values(CreateBlacklistedTokenEntity {
            jti: claims.jti,
            user_id: claims.sub,
        })
        .on_conflict(token_blacklist::jti)
        .do_nothing()
        .execute(conn)
        .await
        .context("Failed to blacklist token")?;

    Ok(StatusCode::RESET_CONTENT)
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TokenPairRes {
    pub refresh: String,
    pub access: String,
}

/// Standard JWT pair issuance.
#[utoipa::path(
    post,
    path = "/token/",
    tags = ["Auth"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPairRes),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn token(
    State(state): State<AppState>,
    Json(body): Json<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let user = authenticate(conn, &body.username, &body.password).await?;

    let user_type = auth::resolve_user_type(&user).ok_or_else(|| {
        AppError::Unauthorized("No active account found with the given credentials".to_string())
    })?;

    let pair = jwt::issue_pair(&state.config.jwt, user.id, user_type)?;

    Ok(Json(TokenPairRes {
        refresh: pair.refresh,
        access: pair.access,
    }))
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TokenRefreshRes {
    pub access: String,
}

/// Exchange a refresh token for a new access token. Blacklisted tokens are
/// rejected.
#[utoipa::path(
    post,
    path = "/token/refresh/",
    tags = ["Auth"],
    request_body = RefreshReq,
    responses(
        (status = 200, description = "New access token", body = TokenRefreshRes),
        (status = 401, description = "Invalid, expired or blacklisted token")
    )
)]
async fn token_refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshReq>,
) -> Result<impl IntoResponse, AppError> {
    let claims = jwt::decode(&state.config.jwt, &body.refresh, jwt::REFRESH_TOKEN)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let blacklisted: Option<BlacklistedTokenEntity> = token_blacklist::table
        .find(claims.jti)
        .select(BlacklistedTokenEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to check token blacklist")?;
    if blacklisted.is_some() {
        return Err(AppError::Unauthorized("Token is blacklisted".to_string()));
    }

    let access = jwt::issue_access(&state.config.jwt, &claims)?;

    Ok(Json(TokenRefreshRes { access }))
}

async fn authenticate(
    conn: &mut diesel_async::AsyncPgConnection,
    username: &str,
    plaintext: &str,
) -> Result<UserEntity, AppError> {
    let user: Option<UserEntity> = users::table
        .filter(users::username.eq(username))
        .filter(users::is_active.eq(true))
        .select(UserEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to look up user")?;

    let user = user.ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !password::verify_password(plaintext, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    Ok(user)
}
