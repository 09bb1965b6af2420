//! On-disk document layout.
//!
//! The whole store is one JSON object. Maps are keyed by id (serialized as
//! JSON string keys) or, for the revocation ledger, by the raw token.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(alias = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: u64,
    pub body: String,
    pub author_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokedToken {
    pub revoked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub chirps: BTreeMap<u64, Chirp>,
    #[serde(default)]
    pub users: BTreeMap<u64, User>,
    #[serde(default)]
    pub revoked_tokens: BTreeMap<String, RevokedToken>,
    /// Highest user id ever handed out
    #[serde(default)]
    pub last_user_id: u64,
    /// Highest chirp id ever handed out
    #[serde(default)]
    pub last_chirp_id: u64,
}

impl Document {
    /// Allocate the next user id. Never reuses an id, even after removal, and
    /// stays ahead of ids written by files that predate the counter.
    pub fn next_user_id(&mut self) -> u64 {
        let highest = self.users.keys().next_back().copied().unwrap_or(0);
        self.last_user_id = self.last_user_id.max(highest) + 1;
        self.last_user_id
    }

    pub fn next_chirp_id(&mut self) -> u64 {
        let highest = self.chirps.keys().next_back().copied().unwrap_or(0);
        self.last_chirp_id = self.last_chirp_id.max(highest) + 1;
        self.last_chirp_id
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|user| user.email == email)
    }
}
