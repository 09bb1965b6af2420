/// User Routes
///
/// Registration, login and profile updates.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::TokenService;
use crate::database::{Database, User};
use crate::error::{AppError, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::validators::is_valid_email;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Both fields are optional; an empty value keeps the stored one
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of a user; never includes the password hash
#[derive(Serialize)]
pub struct UserResponse {
    pub id: u64,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: invalid email or empty password
/// - 409: email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    db: web::Data<Database>,
) -> Result<HttpResponse, AppError> {
    let CredentialsRequest { email, password } = form.into_inner();
    let email = is_valid_email(&email)?;
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()).into());
    }

    let user = web::block(move || db.create_user(&email, &password)).await??;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// POST /api/login
///
/// Returns a one-hour access token and a sixty-day refresh token.
///
/// # Errors
/// - 401: unknown email or wrong password (same response for both)
pub async fn login(
    form: web::Json<CredentialsRequest>,
    db: web::Data<Database>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let CredentialsRequest { email, password } = form.into_inner();

    let user = web::block(move || db.verify_password(&email, &password)).await??;

    let token = tokens.issue_access_token(user.id)?;
    let refresh_token = tokens.issue_refresh_token(user.id)?;

    tracing::info!(user_id = user.id, "User logged in successfully");

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: user.into(),
        token,
        refresh_token,
    }))
}

/// PUT /api/users
///
/// Requires an access token; updates the caller's own record.
pub async fn update_user(
    caller: web::ReqData<AuthenticatedUser>,
    form: web::Json<UpdateUserRequest>,
    db: web::Data<Database>,
) -> Result<HttpResponse, AppError> {
    let AuthenticatedUser(user_id) = caller.into_inner();
    let UpdateUserRequest { email, password } = form.into_inner();
    let email = if email.is_empty() {
        email
    } else {
        is_valid_email(&email)?
    };

    let user = web::block(move || db.update_user(user_id, &email, &password)).await??;

    tracing::info!(user_id = user_id, "User updated");
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
