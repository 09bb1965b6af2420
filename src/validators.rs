/// Input validators for registration and chirp bodies
/// Features:
/// 1. Email format validation
/// 2. Chirp length limit
/// 3. Profanity filter

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

pub const MAX_CHIRP_LENGTH: usize = 140;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const PROFANITY_REPLACEMENT: &str = "****";

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref PROFANE_WORDS: HashSet<&'static str> =
        ["kerfuffle", "sharbert", "fornax"].into_iter().collect();
}

/// Validates an email address for registration
///
/// Emails are stored exactly as given apart from surrounding whitespace.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Enforces the chirp length limit, counted in characters
pub fn validate_chirp_body(body: &str) -> Result<(), ValidationError> {
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ValidationError::TooLong("chirp".to_string(), MAX_CHIRP_LENGTH));
    }
    Ok(())
}

/// Replace profane words with `****`
///
/// Words are split on single spaces and compared case-insensitively; words
/// with attached punctuation are left alone.
pub fn clean_chirp_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.contains(word.to_lowercase().as_str()) {
                PROFANITY_REPLACEMENT
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        for email in ["walt@breakingbad.com", "a.b+c@example.co.uk", "  x@y.io  "] {
            assert!(is_valid_email(email).is_ok(), "rejected {}", email);
        }
        assert_eq!(is_valid_email(" x@y.io ").unwrap(), "x@y.io");
    }

    #[test]
    fn test_invalid_emails() {
        for email in ["", "notanemail", "user@", "@example.com", "user@@example.com"] {
            assert!(is_valid_email(email).is_err(), "accepted {}", email);
        }
    }

    #[test]
    fn test_email_case_is_preserved() {
        assert_eq!(is_valid_email("Walt@Example.com").unwrap(), "Walt@Example.com");
    }

    #[test]
    fn test_chirp_length_limit() {
        assert!(validate_chirp_body(&"a".repeat(MAX_CHIRP_LENGTH)).is_ok());
        assert!(matches!(
            validate_chirp_body(&"a".repeat(MAX_CHIRP_LENGTH + 1)),
            Err(ValidationError::TooLong(_, MAX_CHIRP_LENGTH))
        ));
    }

    #[test]
    fn test_chirp_length_counts_characters() {
        assert!(validate_chirp_body(&"é".repeat(MAX_CHIRP_LENGTH)).is_ok());
    }

    #[test]
    fn test_profanity_is_replaced() {
        assert_eq!(
            clean_chirp_body("I had something interesting for breakfast Kerfuffle"),
            "I had something interesting for breakfast ****"
        );
        assert_eq!(
            clean_chirp_body("I hear Mastodon is better than Chirpy. sharbert I need to migrate"),
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
    }

    #[test]
    fn test_punctuated_words_are_kept() {
        assert_eq!(clean_chirp_body("Fornax! fornax"), "Fornax! ****");
    }
}
