/// Payment order endpoints
///
/// - `POST /payment-orders` - Create an order and enqueue its payment
/// - `GET /payment-orders` - List all orders
/// - `GET /payment-orders/:payment_order_id` - Fetch one order
///
/// Creating an order returns as soon as the row is committed and the job is
/// on the queue. The worker marks it paid later, so the response always has
/// `is_paid: false`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use payorder_shared::jobs::ProcessPaymentJob;
use payorder_shared::models::payment_order::{normalize_amount, CreatePaymentOrder, PaymentOrder};
use payorder_shared::models::user::User;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Create payment order request
///
/// `amount` may be a JSON number or a numeric string.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentOrderRequest {
    pub user_id: i64,
    pub amount: Decimal,
}

/// Create a payment order
///
/// # Endpoint
///
/// ```text
/// POST /payment-orders
/// Content-Type: application/json
///
/// { "user_id": 1, "amount": 19.99 }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "id": 1,
///   "user_id": 1,
///   "amount": 19.99,
///   "is_paid": false,
///   "created_at": "2025-01-01T12:00:00Z",
///   "updated_at": "2025-01-01T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: `user_id` does not reference a user
/// - `422 Unprocessable Entity`: malformed body, or amount out of range
/// - `503 Service Unavailable`: the order was saved but its job could not
///   be enqueued
pub async fn create_payment_order(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentOrderRequest>, JsonRejection>,
) -> ApiResult<Json<PaymentOrder>> {
    let Json(req) = body?;
    let amount = normalize_amount(req.amount)?;

    if !User::exists(&state.db, req.user_id).await? {
        return Err(ApiError::NotFound(format!("User {} not found", req.user_id)));
    }

    let order = PaymentOrder::create(
        &state.db,
        CreatePaymentOrder {
            user_id: req.user_id,
            amount,
        },
    )
    .await?;

    let stream_id = state
        .jobs
        .publish(&ProcessPaymentJob::new(order.id))
        .await
        .map_err(|e| {
            tracing::error!(
                payment_order_id = order.id,
                error = %e,
                "Payment order saved but job could not be enqueued"
            );
            e
        })?;

    tracing::info!(
        payment_order_id = order.id,
        user_id = order.user_id,
        amount = %order.amount,
        stream_id = %stream_id,
        "Payment order created"
    );

    Ok(Json(order))
}

/// List all payment orders in creation order
pub async fn list_payment_orders(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PaymentOrder>>> {
    let orders = PaymentOrder::list(&state.db).await?;
    Ok(Json(orders))
}

/// Fetch one payment order
///
/// # Errors
///
/// - `404 Not Found`: no order with this ID
pub async fn get_payment_order(
    State(state): State<AppState>,
    payment_order_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<PaymentOrder>> {
    let Path(payment_order_id) = payment_order_id?;

    let order = PaymentOrder::find_by_id(&state.db, payment_order_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Payment order {} not found", payment_order_id))
        })?;

    Ok(Json(order))
}
