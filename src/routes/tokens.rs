use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use super::authorization_header;
use crate::auth::{refresh_access_token, revoke_bearer, TokenService};
use crate::database::Database;
use crate::error::AppError;

#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/refresh
///
/// Exchanges the refresh token in the Authorization header for a new access
/// token. The refresh token is consumed.
pub async fn refresh(
    req: HttpRequest,
    db: web::Data<Database>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let header = authorization_header(&req)?;

    let token = web::block(move || refresh_access_token(&db, &tokens, &header)).await??;

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
pub async fn revoke(req: HttpRequest, db: web::Data<Database>) -> Result<HttpResponse, AppError> {
    let header = authorization_header(&req)?;

    web::block(move || revoke_bearer(&db, &header)).await??;

    Ok(HttpResponse::NoContent().finish())
}
