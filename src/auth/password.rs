/// Password Hashing and Verification
///
/// Salted bcrypt hashing. The cost factor comes from configuration so tests
/// can run with the minimum cost.

use bcrypt::{hash, verify};

use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt
    ///
    /// # Errors
    /// Returns error if bcrypt rejects the cost or the input
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    ///
    /// A malformed stored hash is an error, a mismatch is `Ok(false)`.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}
