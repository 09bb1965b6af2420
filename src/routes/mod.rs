mod admin;
mod chirps;
mod health_check;
mod polka;
mod tokens;
mod users;

pub use admin::{metrics, reset};
pub use chirps::{create_chirp, delete_chirp, get_chirp, get_chirps, validate_chirp};
pub use health_check::health_check;
pub use polka::polka_webhook;
pub use tokens::{refresh, revoke};
pub use users::{create_user, login, update_user};

use actix_web::HttpRequest;

use crate::error::{AppError, AuthError};

/// Raw `Authorization` header value
fn authorization_header(req: &HttpRequest) -> Result<String, AppError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .ok_or(AppError::Auth(AuthError::MissingToken))
}
