/// User endpoints
///
/// - `POST /users` - Create a user
/// - `GET /users` - List all users
/// - `GET /users/:user_id` - Fetch one user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use payorder_shared::models::user::{CreateUser, User};
use serde::Deserialize;
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 30, message = "First name must be 1 to 30 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 30, message = "Last name must be 1 to 30 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Create a user
///
/// # Endpoint
///
/// ```text
/// POST /users
/// Content-Type: application/json
///
/// {
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "ada@example.com"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "id": 1,
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "ada@example.com",
///   "created_at": "2025-01-01T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: malformed field, or the email is taken
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(req) = body?;
    req.validate()?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::invalid_field("email", "Email already exists"));
    }

    // The unique index catches a concurrent insert of the same email
    let user = User::create(
        &state.db,
        CreateUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User created");

    Ok(Json(user))
}

/// List all users in creation order
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users))
}

/// Fetch one user
///
/// # Errors
///
/// - `404 Not Found`: no user with this ID
pub async fn get_user(
    State(state): State<AppState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<User>> {
    let Path(user_id) = user_id?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(first_name: &str, last_name: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request("Ada", "Lovelace", "ada@example.com").validate().is_ok());
    }

    #[test]
    fn test_name_length_limits() {
        let thirty = "a".repeat(30);
        assert!(request(&thirty, &thirty, "a@example.com").validate().is_ok());

        let err = request(&"a".repeat(31), "", "a@example.com").validate().unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("last_name"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn test_invalid_email() {
        let err = request("Ada", "Lovelace", "not-an-email").validate().unwrap_err();
        assert!(err.field_errors().contains_key("email"));
    }

    #[test]
    fn test_validation_errors_convert_to_details() {
        let err: ApiError = request("", "Lovelace", "nope").validate().unwrap_err().into();

        match err {
            ApiError::ValidationError(details) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "first_name"]);
                assert_eq!(details[0].message, "Invalid email format");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
