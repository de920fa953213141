/// Payment order model and database operations
///
/// Orders are inserted unpaid by the API and flipped to paid exactly once by
/// the worker. Nothing else mutates them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payment_orders (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     amount NUMERIC(10, 2) NOT NULL,
///     is_paid BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use payorder_shared::models::payment_order::{CreatePaymentOrder, PaymentOrder};
/// use rust_decimal::Decimal;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let order = PaymentOrder::create(
///     &pool,
///     CreatePaymentOrder {
///         user_id: 1,
///         amount: Decimal::new(1999, 2),
///     },
/// )
/// .await?;
/// assert!(!order.is_paid);
///
/// let outcome = PaymentOrder::mark_paid(&pool, order.id).await?;
/// println!("{}", outcome.message(order.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

/// Fractional digits stored for `amount`
pub const AMOUNT_SCALE: u32 = 2;

/// Largest magnitude NUMERIC(10, 2) can hold: 99,999,999.99
pub const AMOUNT_MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, AMOUNT_SCALE);

/// A payment order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentOrder {
    /// Database-generated identifier
    pub id: i64,

    /// Owning user
    pub user_id: i64,

    /// Two fractional digits; rendered as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Set by the payment processor, never cleared
    pub is_paid: bool,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new payment order
#[derive(Debug, Clone)]
pub struct CreatePaymentOrder {
    pub user_id: i64,
    pub amount: Decimal,
}

/// The amount cannot be stored as NUMERIC(10, 2)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Amount {amount} is outside the supported range of ±{max}")]
pub struct AmountOutOfRange {
    pub amount: Decimal,
    pub max: Decimal,
}

/// Rounds an amount to cents and checks that it fits the column
///
/// Midpoints round to the even cent. Zero and negative amounts are accepted.
pub fn normalize_amount(amount: Decimal) -> Result<Decimal, AmountOutOfRange> {
    let rounded = amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven);

    if rounded.abs() > AMOUNT_MAX {
        return Err(AmountOutOfRange {
            amount,
            max: AMOUNT_MAX,
        });
    }

    Ok(rounded)
}

/// Result of trying to mark an order paid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The order was unpaid and is now paid
    Processed,

    /// No order with this ID exists
    NotFound,

    /// The order was already paid; nothing changed
    AlreadyPaid,
}

impl PaymentOutcome {
    /// Human-readable status line for an order
    pub fn message(&self, payment_order_id: i64) -> String {
        match self {
            PaymentOutcome::Processed => {
                format!("Payment order {} processed successfully.", payment_order_id)
            }
            PaymentOutcome::NotFound => format!("Payment order {} not found.", payment_order_id),
            PaymentOutcome::AlreadyPaid => {
                format!("Payment order {} already paid.", payment_order_id)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOutcome::Processed => "processed",
            PaymentOutcome::NotFound => "not_found",
            PaymentOutcome::AlreadyPaid => "already_paid",
        }
    }
}

impl PaymentOrder {
    /// Inserts an unpaid order
    ///
    /// The caller is expected to have checked that the user exists; if the
    /// user disappears in between, the foreign key rejects the insert with
    /// constraint `payment_orders_user_id_fkey`.
    pub async fn create(pool: &PgPool, data: CreatePaymentOrder) -> Result<Self, sqlx::Error> {
        let order = sqlx::query_as::<_, PaymentOrder>(
            r#"
            INSERT INTO payment_orders (user_id, amount)
            VALUES ($1, $2)
            RETURNING id, user_id, amount, is_paid, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.amount)
        .fetch_one(pool)
        .await?;

        Ok(order)
    }

    /// Finds an order by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let order = sqlx::query_as::<_, PaymentOrder>(
            r#"
            SELECT id, user_id, amount, is_paid, created_at, updated_at
            FROM payment_orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Lists every order in insertion order
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let orders = sqlx::query_as::<_, PaymentOrder>(
            r#"
            SELECT id, user_id, amount, is_paid, created_at, updated_at
            FROM payment_orders
            ORDER BY id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(orders)
    }

    /// Lists one user's orders in insertion order
    pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let orders = sqlx::query_as::<_, PaymentOrder>(
            r#"
            SELECT id, user_id, amount, is_paid, created_at, updated_at
            FROM payment_orders
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(orders)
    }

    /// Counts all orders
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payment_orders")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Flips `is_paid` from false to true
    ///
    /// The update only matches unpaid rows, so concurrent or repeated calls for
    /// the same order change it at most once. When nothing was updated a
    /// second query tells a missing order apart from one that was already paid.
    pub async fn mark_paid(pool: &PgPool, id: i64) -> Result<PaymentOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payment_orders
            SET is_paid = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_paid = FALSE
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(PaymentOutcome::Processed);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM payment_orders WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(if exists {
            PaymentOutcome::AlreadyPaid
        } else {
            PaymentOutcome::NotFound
        })
    }
}
