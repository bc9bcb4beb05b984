use anyhow::Context;
use axum::{extract::State, response::IntoResponse};
use bigdecimal::BigDecimal;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    api::razorpay,
    auth::middleware,
    error::AppError,
    extract::Json,
    models::{CreateOrderEntity, OrderEntity},
    schema::{customers, meal_kits, orders},
    state::AppState,
};

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(initiate_payment))
        .routes(utoipa_axum::routes!(verify_payment))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::authorization,
        ))
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct InitiatePaymentReq {
    #[schema(value_type = Option<String>)]
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub user_id: Option<i32>,
    pub meal_kit_id: Option<i32>,
    /// Optional client-supplied idempotency token. Re-submitting the same
    /// token returns the already-created order instead of a new intent.
    pub idempotency_key: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct InitiatePaymentRes {
    /// Gateway order id.
    pub order_id: String,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    /// Local order id.
    pub order: i32,
}

/// Response for an idempotent replay, rebuilt entirely from the stored order
/// rather than the incoming request.
fn replay_response(order: &OrderEntity) -> Result<InitiatePaymentRes, AppError> {
    let amount = razorpay::to_minor_units(&order.total_price)
        .ok_or_else(|| AppError::Other(anyhow::anyhow!("Stored total price out of range")))?;
    Ok(InitiatePaymentRes {
        order_id: order.razorpay_order_id.clone().unwrap_or_default(),
        amount,
        currency: order.currency.clone(),
        order: order.id,
    })
}

/// Create a gateway payment intent and persist a pending order keyed to it.
#[utoipa::path(
    post,
    path = "/razorpay/",
    tags = ["Payments"],
    security(("bearerAuth" = [])),
    request_body = InitiatePaymentReq,
    responses(
        (status = 200, description = "Payment intent created", body = InitiatePaymentRes),
        (status = 400, description = "Missing or invalid fields"),
        (status = 404, description = "Unknown customer or meal kit"),
        (status = 503, description = "Gateway unreachable")
    )
)]
async fn initiate_payment(
    State(state): State<AppState>,
    Json(body): Json<InitiatePaymentReq>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(amount), Some(user_id), Some(meal_kit_id)) =
        (body.amount, body.user_id, body.meal_kit_id)
    else {
        return Err(AppError::BadRequest(
            "Amount, user ID, and meal kit ID are required".to_string(),
        ));
    };

    if amount <= BigDecimal::from(0) {
        return Err(AppError::BadRequest("Amount must be positive".to_string()));
    }

    let currency = body.currency.unwrap_or_else(|| "INR".to_string());
    let amount_minor = razorpay::to_minor_units(&amount)
        .ok_or_else(|| AppError::BadRequest("Amount is not a valid monetary value".to_string()))?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    // A repeated idempotency key short-circuits before any gateway call.
    if let Some(key) = &body.idempotency_key {
        let existing: Option<OrderEntity> = orders::table
            .filter(orders::idempotency_key.eq(key))
            .select(OrderEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to check idempotency key")?;

        if let Some(order) = existing {
            return Ok(Json(replay_response(&order)?));
        }
    }

    let customer_exists: i64 = customers::table
        .filter(customers::id.eq(user_id))
        .count()
        .get_result(conn)
        .await
        .context("Failed to look up customer")?;
    let meal_kit_exists: i64 = meal_kits::table
        .filter(meal_kits::id.eq(meal_kit_id))
        .count()
        .get_result(conn)
        .await
        .context("Failed to look up meal kit")?;
    if customer_exists == 0 || meal_kit_exists == 0 {
        return Err(AppError::NotFound);
    }

    let gateway_order =
        razorpay::create_order(&state.http_client, &state.config.razorpay, amount_minor, &currency)
            .await?;

    let order: OrderEntity = diesel::insert_into(orders::table)
        .values(CreateOrderEntity {
            customer_id: user_id,
            meal_kit_id,
            status: "Pending".into(),
            payment_status: "Pending".into(),
            razorpay_order_id: Some(gateway_order.id.clone()),
            total_price: amount,
            idempotency_key: body.idempotency_key,
            currency: currency.clone(),
        })
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create order")?;

    Ok(Json(InitiatePaymentRes {
        order_id: gateway_order.id,
        amount: gateway_order.amount,
        currency: gateway_order.currency,
        order: order.id,
    }))
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct VerifyPaymentReq {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub order_id: i32,
}

/// Verify a gateway callback signature and transition the order to
/// paid/completed. The transition is a single conditional update keyed on the
/// pending payment status, so duplicate callbacks cannot double-apply.
#[utoipa::path(
    post,
    path = "/verify/",
    tags = ["Payments"],
    security(("bearerAuth" = [])),
    request_body = VerifyPaymentReq,
    responses(
        (status = 200, description = "Payment verified"),
        (status = 400, description = "Invalid signature"),
        (status = 404, description = "Unknown order")
    )
)]
async fn verify_payment(
    State(state): State<AppState>,
    Json(body): Json<VerifyPaymentReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: Option<OrderEntity> = orders::table
        .find(body.order_id)
        .select(OrderEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to look up order")?;
    let order = order.ok_or(AppError::NotFound)?;

    // The signature must match the gateway order id this order was created
    // with, not whatever the caller claims.
    let stored_gateway_id = order
        .razorpay_order_id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Order has no payment intent".to_string()))?;

    let valid = body.razorpay_order_id == stored_gateway_id
        && razorpay::verify_signature(
            &state.config.razorpay.key_secret,
            stored_gateway_id,
            &body.razorpay_payment_id,
            &body.razorpay_signature,
        );
    if !valid {
        return Err(AppError::BadRequest("Invalid signature".to_string()));
    }

    let updated = diesel::update(
        orders::table
            .find(order.id)
            .filter(orders::payment_status.eq("Pending")),
    )
    .set((
        orders::payment_status.eq("Paid"),
        orders::status.eq("Completed"),
        orders::razorpay_payment_id.eq(&body.razorpay_payment_id),
        orders::razorpay_signature.eq(&body.razorpay_signature),
    ))
    .execute(conn)
    .await
    .context("Failed to update order")?;

    if updated == 0 {
        // Lost the race or a duplicate callback; already-paid is still a
        // success, anything else is gone.
        let payment_status: String = orders::table
            .find(order.id)
            .select(orders::payment_status)
            .get_result(conn)
            .await
            .map_err(|_| AppError::NotFound)?;
        if payment_status != "Paid" {
            return Err(AppError::BadRequest("Order is not payable".to_string()));
        }
    }

    Ok(Json(json!({ "success": "Payment verified successfully" })))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::Utc;

    use super::replay_response;
    use crate::models::OrderEntity;

    fn stored_order() -> OrderEntity {
        OrderEntity {
            id: 9,
            customer_id: 1,
            meal_kit_id: 2,
            status: "Pending".to_string(),
            payment_status: "Pending".to_string(),
            order_date: Utc::now(),
            razorpay_order_id: Some("order_abc".to_string()),
            razorpay_payment_id: None,
            razorpay_signature: None,
            total_price: BigDecimal::from_str("199.99").unwrap(),
            idempotency_key: Some("key-1".to_string()),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn replay_reports_the_stored_order_not_the_request() {
        let res = replay_response(&stored_order()).unwrap();

        assert_eq!(res.currency, "USD");
        assert_eq!(res.amount, 19999);
        assert_eq!(res.order_id, "order_abc");
        assert_eq!(res.order, 9);
    }
}
