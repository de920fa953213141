/// API route handlers
///
/// - `health`: health check endpoint
/// - `users`: create, list and fetch users
/// - `payment_orders`: create, list and fetch payment orders

pub mod health;
pub mod payment_orders;
pub mod users;
