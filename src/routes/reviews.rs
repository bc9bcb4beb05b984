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
    dto::{self, ReviewJson},
    error::AppError,
    extract::Json,
    models::{CreateReviewEntity, ReviewEntity, UpdateReviewEntity},
    pagination::{Page, PageQuery},
    schema::reviews,
    state::AppState,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(list_reviews, create_review))
        .routes(utoipa_axum::routes!(get_review, update_review, delete_review))
}

fn check_rating(rating: i32) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::FieldError(
            "rating".to_string(),
            "Rating must be between 1 and 5.".to_string(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct ReviewListQuery {
    /// Free-text search over review comments.
    pub search: Option<String>,
    /// Ordering field: `review_date` or `rating`, `-` prefix for descending.
    pub ordering: Option<String>,
    /// Exact-match filter.
    pub rating: Option<i32>,
    pub meal_kit_id: Option<i32>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// List reviews with customer and meal kit embedded.
#[utoipa::path(
    get,
    path = "/reviews/",
    tags = ["Reviews"],
    params(ReviewListQuery),
    responses(
        (status = 200, description = "Paginated reviews", body = Page<ReviewJson>)
    )
)]
async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let build = || {
        let mut query = reviews::table.into_boxed();
        if let Some(search) = &params.search {
            query = query.filter(reviews::comment.ilike(format!("%{search}%")));
        }
        if let Some(rating) = params.rating {
            query = query.filter(reviews::rating.eq(rating));
        }
        if let Some(meal_kit_id) = params.meal_kit_id {
            query = query.filter(reviews::meal_kit_id.eq(meal_kit_id));
        }
        query
    };

    let count: i64 = build()
        .count()
        .get_result(conn)
        .await
        .context("Failed to count reviews")?;

    let query = match params.ordering.as_deref() {
        Some("review_date") => build().order(reviews::review_date.asc()),
        Some("-review_date") => build().order(reviews::review_date.desc()),
        Some("rating") => build().order(reviews::rating.asc()),
        Some("-rating") => build().order(reviews::rating.desc()),
        _ => build().order(reviews::id.asc()),
    };

    let page = PageQuery {
        page: params.page,
        page_size: params.page_size,
    };
    let rows: Vec<ReviewEntity> = query
        .offset(page.offset())
        .limit(page.page_size())
        .select(ReviewEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get reviews")?;

    let results = dto::reviews_json(conn, rows).await?;
    Ok(Json(Page::new(count, page, results)))
}

/// Leave a review on a meal kit.
#[utoipa::path(
    post,
    path = "/reviews/",
    tags = ["Reviews"],
    request_body = CreateReviewEntity,
    responses(
        (status = 201, description = "Created review", body = ReviewJson),
        (status = 400, description = "Rating out of range")
    )
)]
async fn create_review(
    State(state): State<AppState>,
    Json(body): Json<CreateReviewEntity>,
) -> Result<impl IntoResponse, AppError> {
    check_rating(body.rating)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let review: ReviewEntity = diesel::insert_into(reviews::table)
        .values(body)
        .returning(ReviewEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create review")?;

    let mut results = dto::reviews_json(conn, vec![review]).await?;
    let review = results.pop().context("Missing review projection")?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Fetch a review.
#[utoipa::path(
    get,
    path = "/reviews/{id}/",
    tags = ["Reviews"],
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review", body = ReviewJson),
        (status = 404, description = "Unknown review")
    )
)]
async fn get_review(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let review: ReviewEntity = reviews::table
        .find(id)
        .select(ReviewEntity::as_select())
        .first(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::reviews_json(conn, vec![review]).await?;
    let review = results.pop().context("Missing review projection")?;
    Ok(Json(review))
}

/// Update a review's rating or comment.
#[utoipa::path(
    put,
    path = "/reviews/{id}/",
    tags = ["Reviews"],
    params(("id" = i32, Path, description = "Review ID")),
    request_body = UpdateReviewEntity,
    responses(
        (status = 200, description = "Updated review", body = ReviewJson),
        (status = 404, description = "Unknown review")
    )
)]
async fn update_review(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateReviewEntity>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(rating) = body.rating {
        check_rating(rating)?;
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let review: ReviewEntity = diesel::update(reviews::table.find(id))
        .set(&body)
        .returning(ReviewEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(AppError::from)?;

    let mut results = dto::reviews_json(conn, vec![review]).await?;
    let review = results.pop().context("Missing review projection")?;
    Ok(Json(review))
}

/// Delete a review.
#[utoipa::path(
    delete,
    path = "/reviews/{id}/",
    tags = ["Reviews"],
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 404, description = "Unknown review")
    )
)]
async fn delete_review(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = diesel::delete(reviews::table.find(id))
        .execute(conn)
        .await
        .context("Failed to delete review")?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::check_rating;

    #[test]
    fn accepts_ratings_one_through_five() {
        for rating in 1..=5 {
            assert!(check_rating(rating).is_ok());
        }
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        for rating in [0, 6, -1, 100] {
            assert!(check_rating(rating).is_err());
        }
    }
}
