/// Database models
///
/// - `user`: people who own payment orders
/// - `payment_order`: orders and the paid/unpaid transition
pub mod payment_order;
pub mod user;

pub use payment_order::{CreatePaymentOrder, PaymentOrder, PaymentOutcome};
pub use user::{CreateUser, User};
