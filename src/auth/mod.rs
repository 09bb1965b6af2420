/// Authentication module
///
/// Handles password hashing, JWT access/refresh token issuance and
/// validation, and the refresh/revocation flow.

mod claims;
mod jwt;
mod password;
mod session;

pub use claims::{Claims, TokenKind, ACCESS_ISSUER, REFRESH_ISSUER};
pub use jwt::{extract_bearer, TokenService};
pub use password::PasswordHasher;
pub use session::{authorize_access, refresh_access_token, revoke_bearer};
