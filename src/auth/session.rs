/// Session and Revocation Flow
///
/// Refresh tokens are single use: exchanging one revokes it before the new
/// access token is minted, so a replay fails even if a later step errors.

use crate::auth::jwt::{extract_bearer, TokenService};
use crate::database::Database;
use crate::error::{AppError, AuthError};

/// Exchange a refresh token (`Authorization` header value) for a new access token
///
/// # Errors
/// `TokenInvalid`/`TokenExpired`/`MissingToken` for a bad refresh token,
/// `TokenInvalid` for one already revoked or whose user no longer exists,
/// store errors if the revocation cannot be recorded
pub fn refresh_access_token(
    db: &Database,
    tokens: &TokenService,
    header: &str,
) -> Result<String, AppError> {
    let (user_id, raw_token) = tokens.validate_refresh_token(header)?;

    if db.is_token_revoked(&raw_token) {
        tracing::warn!(user_id = user_id, "Attempt to reuse revoked refresh token");
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    db.revoke_token(&raw_token)?;

    let user = db.get_user_by_id(user_id)?.ok_or_else(|| {
        tracing::warn!(user_id = user_id, "Refresh token subject no longer exists");
        AppError::Auth(AuthError::TokenInvalid)
    })?;

    let access_token = tokens.issue_access_token(user.id)?;
    tracing::info!(user_id = user.id, "Access token refreshed");
    Ok(access_token)
}

/// Revoke any bearer token without validating it
pub fn revoke_bearer(db: &Database, header: &str) -> Result<(), AppError> {
    let token = extract_bearer(header)?;
    db.revoke_token(token)?;
    tracing::info!("Token revoked");
    Ok(())
}

/// Authorize a request carrying an access token
///
/// Checks signature, expiry and issuer, then the revocation ledger.
pub fn authorize_access(
    db: &Database,
    tokens: &TokenService,
    header: &str,
) -> Result<u64, AppError> {
    let user_id = tokens.validate_access_token(header)?;
    let token = extract_bearer(header)?;

    if db.is_token_revoked(token) {
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }
    Ok(user_id)
}
