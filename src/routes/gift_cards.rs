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
    dto::{self, GiftCardJson},
    error::AppError,
    extract::Json,
    models::{CreateGiftCardEntity, GiftCardEntity, UpdateGiftCardEntity},
    pagination::{Page, PageQuery},
    schema::gift_cards,
    state::AppState,
};

const GIFT_AMOUNTS: [i32; 3] = [70, 140, 280];

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_gift_cards, create_gift_card))
        .routes(utoipa_axum::routes!(get_gift_card, update_gift_card, delete_gift_card))
}

fn check_gift_amount(amount: i32) -> Result<(), AppError> {
    if !GIFT_AMOUNTS.contains(&amount) {
        return Err(AppError::FieldError(
            "gift_amount".to_string(),
            "Gift amount must be one of 70, 140 or 280.".to_string(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct GiftCardListQuery {
    /// Free-text search over gift type.
    pub search: Option<String>,
    /// Ordering field: `gift_amount` or `quantity`, `-` prefix for descending.
    pub ordering: Option<String>,
    /// Exact-match filter.
    pub gift_amount: Option<i32>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List gift cards with their owning customer.
#[utoipa::path(
    get,
    path = "/gift-cards/",
    tags = ["GiftCards"],
    params(GiftCardListQuery),
    responses(
        (status = 200, description = "Paginated gift cards", body = Page<GiftCardJson>)
    )
)]
async fn list_gift_cards(
    State(state): State<AppState>,
    Query(params): Query<GiftCardListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let build = || {
        let mut query = gift_cards::table.into_boxed();
        if let Some(search) = &params.search {
            query = query.filter(gift_cards::gift_type.ilike(format!("%{search}%")));
        }
        if let Some(gift_amount) = params.gift_amount {
            query = query.filter(gift_cards::gift_amount.eq(gift_amount));
        }
        query
    };

    let count: i64 = build()
        .count()
        .get_result(conn)
        .await
        .context("Failed to count gift cards")?;

    let query = match params.ordering.as_deref() {
        Some("gift_amount") => build().order(gift_cards::gift_amount.asc()),
        Some("-gift_amount") => build().order(gift_cards::gift_amount.desc()),
        Some("quantity") => build().order(gift_cards::quantity.asc()),
        Some("-quantity") => build().order(gift_cards::quantity.desc()),
        _ => build().order(gift_cards::id.asc()),
    };

    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let rows: Vec<GiftCardEntity> = query
        .offset(page.offset())
        .limit(page.page_size())
        .select(GiftCardEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get gift cards")?;

    let results = dto::gift_cards_json(conn, rows).await?;
    Ok(Json(Page::new(count, page, results)))
}

/// Create a gift card for a customer.
#[utoipa::path(
    post,
    path = "/gift-cards/",
    tags = ["GiftCards"],
    request_body = CreateGiftCardEntity,
    responses(
        (status = 201, description = "Created gift card", body = GiftCardJson),
        (status = 400, description = "Gift amount outside the allowed denominations")
    )
)]
async fn create_gift_card(
    State(state): State<AppState>,
    Json(body): Json<CreateGiftCardEntity>,
) -> Result<impl IntoResponse, AppError> {
    check_gift_amount(body.gift_amount)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let card: GiftCardEntity = diesel::insert_into(gift_cards::table)
        .values(body)
        .returning(GiftCardEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create gift card")?;

    let mut results = dto::gift_cards_json(conn, vec![card]).await?;
    let card = results.pop().context("Missing gift card projection")?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// Fetch a gift card.
#[utoipa::path(
    get,
    path = "/gift-cards/{id}/",
    tags = ["GiftCards"],
    params(("id" = i32, Path, description = "Gift card ID")),
    responses(
        (status = 200, description = "Gift card", body = GiftCardJson),
        (status = 404, description = "Unknown gift card")
    )
)]
async fn get_gift_card(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let card: GiftCardEntity = gift_cards::table
        .find(id)
        .select(GiftCardEntity::as_select())
        .first(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::gift_cards_json(conn, vec![card]).await?;
    let card = results.pop().context("Missing gift card projection")?;
    Ok(Json(card))
}

/// Update a gift card.
#[utoipa::path(
    put,
    path = "/gift-cards/{id}/",
    tags = ["GiftCards"],
    params(("id" = i32, Path, description = "Gift card ID")),
    request_body = UpdateGiftCardEntity,
    responses(
        (status = 200, description = "Updated gift card", body = GiftCardJson),
        (status = 404, description = "Unknown gift card")
    )
)]
async fn update_gift_card(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateGiftCardEntity>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(amount) = body.gift_amount {
        check_gift_amount(amount)?;
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let card: GiftCardEntity = diesel::update(gift_cards::table.find(id))
        .set(&body)
        .returning(GiftCardEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::gift_cards_json(conn, vec![card]).await?;
    let card = results.pop().context("Missing gift card projection")?;
    Ok(Json(card))
}

/// Delete a gift card along with any cart items holding it.
#[utoipa::path(
    delete,
    path = "/gift-cards/{id}/",
    tags = ["GiftCards"],
    params(("id" = i32, Path, description = "Gift card ID")),
    responses(
        (status = 204, description = "Gift card deleted"),
        (status = 404, description = "Unknown gift card")
    )
)]
async fn delete_gift_card(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(gift_cards::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete gift card")?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::check_gift_amount;

    #[test]
    fn accepts_allowed_denominations() {
        for amount in [70, 140, 280] {
            assert!(check_gift_amount(amount).is_ok());
        }
    }

    #[test]
    fn rejects_other_amounts() {
        for amount in [0, 69, 100, 281, -70] {
            assert!(check_gift_amount(amount).is_err());
        }
    }
}
