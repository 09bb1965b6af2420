/// JWT Claims structure
///
/// Registered claims (RFC 7519) shared by access and refresh tokens. The two
/// token classes use the same secret and differ only in the issuer claim.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AuthError};

pub const ACCESS_ISSUER: &str = "chirpy-access";
pub const REFRESH_ISSUER: &str = "chirpy-refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn issuer(self) -> &'static str {
        match self {
            TokenKind::Access => ACCESS_ISSUER,
            TokenKind::Refresh => REFRESH_ISSUER,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (numeric user id as a string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// # Arguments
    /// * `user_id` - Subject of the token
    /// * `kind` - Token class, selects the issuer
    /// * `expiry_seconds` - Lifetime from now
    pub fn new(user_id: u64, kind: TokenKind, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            iss: kind.issuer().to_string(),
            sub: user_id.to_string(),
            iat: now,
            exp: now + expiry_seconds,
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `TokenInvalid` if the subject is not an integer
    pub fn user_id(&self) -> Result<u64, AppError> {
        self.sub
            .parse::<u64>()
            .map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }
}
