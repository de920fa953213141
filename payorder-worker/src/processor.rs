/// Payment processor
///
/// Marks one payment order paid. Each call ends in one of three outcomes,
/// which are logged and returned:
///
/// ```text
/// process_payment(id)
///   ├─> unpaid order    -> paid            "Payment order {id} processed successfully."
///   ├─> no such order   -> nothing changes "Payment order {id} not found."
///   └─> already paid    -> nothing changes "Payment order {id} already paid."
/// ```
///
/// A missing order is an outcome, not an error: it is not retried. Only a
/// database failure produces `Err`.

use payorder_shared::models::{PaymentOrder, PaymentOutcome};
use sqlx::PgPool;
use thiserror::Error;

/// Processor error
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Processes the payment for one order
pub async fn process_payment(
    pool: &PgPool,
    payment_order_id: i64,
) -> Result<PaymentOutcome, ProcessorError> {
    tracing::debug!(payment_order_id, "Processing payment");

    let outcome = PaymentOrder::mark_paid(pool, payment_order_id).await?;
    let message = outcome.message(payment_order_id);

    match outcome {
        PaymentOutcome::Processed => {
            tracing::info!(payment_order_id, outcome = outcome.as_str(), "{}", message);
        }
        PaymentOutcome::NotFound => {
            tracing::warn!(payment_order_id, outcome = outcome.as_str(), "{}", message);
        }
        PaymentOutcome::AlreadyPaid => {
            tracing::info!(payment_order_id, outcome = outcome.as_str(), "{}", message);
        }
    }

    Ok(outcome)
}
