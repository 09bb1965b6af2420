/// Billing provider webhook
///
/// Polka calls this when a user pays for Chirpy Red. Requests authenticate
/// with `Authorization: ApiKey <key>`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::authorization_header;
use crate::configuration::PolkaSettings;
use crate::database::Database;
use crate::error::{AppError, AuthError};

const API_KEY_PREFIX: &str = "ApiKey ";
const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct PolkaEvent {
    pub event: String,
    pub data: PolkaEventData,
}

#[derive(Deserialize)]
pub struct PolkaEventData {
    pub user_id: u64,
}

/// POST /api/polka/webhooks
///
/// # Errors
/// - 401: missing or wrong API key
/// - 404: upgraded user does not exist
pub async fn polka_webhook(
    req: HttpRequest,
    form: web::Json<PolkaEvent>,
    db: web::Data<Database>,
    polka: web::Data<PolkaSettings>,
) -> Result<HttpResponse, AppError> {
    let header = authorization_header(&req)?;
    match header.strip_prefix(API_KEY_PREFIX) {
        Some(key) if !polka.api_key.is_empty() && key.trim() == polka.api_key => {}
        _ => {
            tracing::warn!("Webhook called with an invalid API key");
            return Err(AppError::Auth(AuthError::TokenInvalid));
        }
    }

    let PolkaEvent { event, data } = form.into_inner();
    if event != USER_UPGRADED {
        tracing::debug!(event = %event, "Ignoring unsupported webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    web::block(move || db.upgrade_to_chirpy_red(data.user_id)).await??;

    Ok(HttpResponse::NoContent().finish())
}
