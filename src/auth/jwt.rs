/// JWT Token Generation and Validation
///
/// Mints and validates the two token classes. Access and refresh tokens share
/// one HS256 secret; the issuer claim keeps them from being used in place of
/// each other.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ConfigError};

const BEARER_PREFIX: &str = "Bearer ";

/// Strip the literal `Bearer ` prefix from an Authorization header value
///
/// # Errors
/// `MissingToken` if the prefix is absent or nothing follows it
pub fn extract_bearer(header: &str) -> Result<&str, AppError> {
    match header.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AppError::Auth(AuthError::MissingToken)),
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    leeway: u64,
}

impl TokenService {
    /// # Errors
    /// Returns a config error if the signing secret is empty or a lifetime
    /// is not positive
    pub fn new(config: &JwtSettings) -> Result<Self, AppError> {
        if config.secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()).into());
        }
        if config.access_token_expiry <= 0 || config.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue("token expiry must be positive".to_string()).into());
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
            leeway: config.leeway,
        })
    }

    pub fn issue_access_token(&self, user_id: u64) -> Result<String, AppError> {
        self.issue(user_id, TokenKind::Access)
    }

    pub fn issue_refresh_token(&self, user_id: u64) -> Result<String, AppError> {
        self.issue(user_id, TokenKind::Refresh)
    }

    fn issue(&self, user_id: u64, kind: TokenKind) -> Result<String, AppError> {
        let expiry = match kind {
            TokenKind::Access => self.access_token_expiry,
            TokenKind::Refresh => self.refresh_token_expiry,
        };
        let claims = Claims::new(user_id, kind, expiry);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify signature, expiry and issuer of a raw (prefix-free) token
    ///
    /// # Errors
    /// `TokenExpired` past `exp`, `TokenInvalid` for anything else
    pub fn decode(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[kind.issuer()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = self.leeway;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!(kind = ?kind, "JWT validation error: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::Auth(AuthError::TokenExpired),
                    _ => AppError::Auth(AuthError::TokenInvalid),
                }
            })
    }

    /// Validate an `Authorization` header carrying an access token
    ///
    /// # Returns
    /// The numeric user id from the subject claim
    pub fn validate_access_token(&self, header: &str) -> Result<u64, AppError> {
        let token = extract_bearer(header)?;
        self.decode(token, TokenKind::Access)?.user_id()
    }

    /// Validate an `Authorization` header carrying a refresh token
    ///
    /// # Returns
    /// The numeric user id and the raw token string (the revocation ledger key)
    pub fn validate_refresh_token(&self, header: &str) -> Result<(u64, String), AppError> {
        let token = extract_bearer(header)?;
        let user_id = self.decode(token, TokenKind::Refresh)?.user_id()?;
        Ok((user_id, token.to_string()))
    }
}
