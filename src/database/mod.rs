/// Document Store
///
/// The single JSON file that is the system of record for users, chirps and
/// revoked tokens. Every public operation runs a full load -> mutate -> persist
/// cycle while holding the store lock in write mode, reads included, so store
/// operations are fully serialized. Nothing is cached between calls.

mod document;

pub use document::{Chirp, Document, RevokedToken, SortDirection, User};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};

use chrono::Utc;

use crate::auth::PasswordHasher;
use crate::error::{AppError, AuthError, StoreError};

pub struct Database {
    path: PathBuf,
    hasher: PasswordHasher,
    lock: RwLock<()>,
}

impl Database {
    /// Open the store at `path`, creating an empty document if the file is absent
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the file cannot be created or read
    pub fn open(path: impl Into<PathBuf>, hasher: PasswordHasher) -> Result<Self, AppError> {
        let db = Self {
            path: path.into(),
            hasher,
            lock: RwLock::new(()),
        };

        {
            let _guard = db.acquire()?;
            db.ensure_exists()?;
        }

        tracing::info!(path = %db.path.display(), "Document store opened");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------------
    // Whole-document access
    // ------------------------------------------------------------------------

    /// Read and deserialize the whole document
    ///
    /// # Errors
    /// `StoreError::Io` on read/create failure, `StoreError::Format` on corrupt content
    pub fn load(&self) -> Result<Document, AppError> {
        let _guard = self.acquire()?;
        self.read_document()
    }

    /// Replace the backing file with `doc`
    pub fn persist(&self, doc: &Document) -> Result<(), AppError> {
        let _guard = self.acquire()?;
        self.write_document(doc)
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// Register a new user
    ///
    /// # Errors
    /// `StoreError::DuplicateEmail` if any user already has `email`
    pub fn create_user(&self, email: &str, password: &str) -> Result<User, AppError> {
        // bcrypt is slow; keep it outside the lock
        let password_hash = self.hasher.hash(password)?;

        let user = self.mutate(|doc| {
            if doc.find_user_by_email(email).is_some() {
                return Err(StoreError::DuplicateEmail(email.to_string()).into());
            }

            let user = User {
                id: doc.next_user_id(),
                email: email.to_string(),
                password_hash,
                is_chirpy_red: false,
            };
            doc.users.insert(user.id, user.clone());
            Ok(user)
        })?;

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    /// Update email and/or password of an existing user
    ///
    /// Empty `email` or `password` leaves the stored value unchanged. The new
    /// email is not checked for uniqueness.
    pub fn update_user(&self, id: u64, email: &str, password: &str) -> Result<User, AppError> {
        let password_hash = if password.is_empty() {
            None
        } else {
            Some(self.hasher.hash(password)?)
        };

        self.mutate(|doc| {
            let user = doc
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;

            if !email.is_empty() {
                user.email = email.to_string();
            }
            if let Some(hash) = password_hash {
                user.password_hash = hash;
            }
            Ok(user.clone())
        })
    }

    /// Check credentials by email
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` for an unknown email, a wrong password
    /// or a stored hash bcrypt cannot parse
    pub fn verify_password(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self
            .read(|doc| doc.find_user_by_email(email).cloned())?
            .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

        match self.hasher.verify(password, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => Err(AppError::Auth(AuthError::InvalidCredentials)),
            Err(e) => {
                tracing::error!(user_id = user.id, error = %e, "Stored password hash is unusable");
                Err(AppError::Auth(AuthError::InvalidCredentials))
            }
        }
    }

    pub fn get_user_by_id(&self, id: u64) -> Result<Option<User>, AppError> {
        self.read(|doc| doc.users.get(&id).cloned())
    }

    /// Mark a user as a Chirpy Red member
    pub fn upgrade_to_chirpy_red(&self, id: u64) -> Result<User, AppError> {
        let user = self.mutate(|doc| {
            let user = doc
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
            user.is_chirpy_red = true;
            Ok(user.clone())
        })?;

        tracing::info!(user_id = id, "User upgraded to Chirpy Red");
        Ok(user)
    }

    // ------------------------------------------------------------------------
    // Chirps
    // ------------------------------------------------------------------------

    /// Store a chirp verbatim; the body length is the caller's concern
    pub fn create_chirp(&self, body: &str, author_id: u64) -> Result<Chirp, AppError> {
        self.mutate(|doc| {
            let chirp = Chirp {
                id: doc.next_chirp_id(),
                body: body.to_string(),
                author_id,
            };
            doc.chirps.insert(chirp.id, chirp.clone());
            Ok(chirp)
        })
    }

    /// All chirps, optionally for one author, ordered by id
    ///
    /// `None` and `Some(0)` both select every author.
    pub fn get_chirps(
        &self,
        author_id: Option<u64>,
        sort: SortDirection,
    ) -> Result<Vec<Chirp>, AppError> {
        let author_id = author_id.filter(|id| *id != 0);

        self.read(|doc| {
            let matching = doc
                .chirps
                .values()
                .filter(|chirp| author_id.map_or(true, |author| chirp.author_id == author))
                .cloned();

            match sort {
                SortDirection::Asc => matching.collect(),
                SortDirection::Desc => matching.rev().collect(),
            }
        })
    }

    pub fn get_chirp_by_id(&self, id: u64) -> Result<Option<Chirp>, AppError> {
        self.read(|doc| doc.chirps.get(&id).cloned())
    }

    /// Remove a chirp, returning it if it existed
    ///
    /// Authorship is checked by the caller.
    pub fn delete_chirp(&self, id: u64) -> Result<Option<Chirp>, AppError> {
        self.mutate(|doc| Ok(doc.chirps.remove(&id)))
    }

    // ------------------------------------------------------------------------
    // Revocation ledger
    // ------------------------------------------------------------------------

    /// Add `token` to the revocation ledger; revoking twice just restamps it
    pub fn revoke_token(&self, token: &str) -> Result<(), AppError> {
        self.mutate(|doc| {
            doc.revoked_tokens.insert(
                token.to_string(),
                RevokedToken {
                    revoked_at: Utc::now(),
                },
            );
            Ok(())
        })
    }

    /// Whether `token` is in the ledger
    ///
    /// Fails closed: if the store cannot be read the token counts as revoked.
    pub fn is_token_revoked(&self, token: &str) -> bool {
        match self.read(|doc| doc.revoked_tokens.contains_key(token)) {
            Ok(revoked) => revoked,
            Err(e) => {
                tracing::error!(error = %e, "Revocation lookup failed, treating token as revoked");
                true
            }
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn acquire(&self) -> Result<RwLockWriteGuard<'_, ()>, AppError> {
        self.lock
            .write()
            .map_err(|_| AppError::Store(StoreError::LockPoisoned))
    }

    fn read<T>(&self, f: impl FnOnce(&Document) -> T) -> Result<T, AppError> {
        let _guard = self.acquire()?;
        let doc = self.read_document()?;
        Ok(f(&doc))
    }

    /// Load, apply `f`, and persist only if `f` succeeds
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let _guard = self.acquire()?;
        let mut doc = self.read_document()?;
        let result = f(&mut doc)?;
        self.write_document(&doc)?;
        Ok(result)
    }

    /// Caller must hold the lock
    fn ensure_exists(&self) -> Result<(), AppError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "Creating empty document store");
            self.write_document(&Document::default())?;
        }
        Ok(())
    }

    /// Caller must hold the lock
    fn read_document(&self) -> Result<Document, AppError> {
        self.ensure_exists()?;
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write to a sibling temp file, fsync, then rename over the real file.
    /// Caller must hold the lock.
    fn write_document(&self, doc: &Document) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(doc)?;
        let temp_path = self.temp_path();

        let written = fs::File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(&bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&temp_path, &self.path));

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// `<path>.tmp`, never the store path itself
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_test_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = Database::open(dir.path().join("database.json"), PasswordHasher::new(4))
            .expect("Failed to open database");
        (dir, db)
    }

    fn ids(chirps: &[Chirp]) -> Vec<u64> {
        chirps.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_open_creates_file_with_all_mappings() {
        let (_dir, db) = open_test_db();

        let raw = fs::read_to_string(db.path()).expect("Failed to read store file");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("Invalid JSON");
        assert!(json["users"].is_object());
        assert!(json["chirps"].is_object());
        assert!(json["revoked_tokens"].is_object());
    }

    #[test]
    fn test_load_recreates_missing_file() {
        let (_dir, db) = open_test_db();
        fs::remove_file(db.path()).expect("Failed to remove store file");

        let doc = db.load().expect("Failed to load");
        assert_eq!(doc, Document::default());
        assert!(db.path().exists());
    }

    #[test]
    fn test_persist_then_load_round_trips() {
        let (_dir, db) = open_test_db();
        db.create_user("a@example.com", "pw").expect("Failed to create user");
        db.create_chirp("hello", 1).expect("Failed to create chirp");
        db.revoke_token("some.jwt.string").expect("Failed to revoke");

        let doc = db.load().expect("Failed to load");
        db.persist(&doc).expect("Failed to persist");

        assert_eq!(db.load().expect("Failed to reload"), doc);
        assert_eq!(doc.users.len(), 1);
        assert_eq!(doc.chirps.len(), 1);
        assert_eq!(doc.revoked_tokens.len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_a_format_error() {
        let (_dir, db) = open_test_db();
        fs::write(db.path(), "{not json").expect("Failed to corrupt file");

        assert!(matches!(
            db.load(),
            Err(AppError::Store(StoreError::Format(_)))
        ));
    }

    #[test]
    fn test_persist_leaves_no_temp_file_behind() {
        let (dir, db) = open_test_db();
        db.create_user("a@example.com", "pw").expect("Failed to create user");

        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("Failed to list dir")
            .map(|entry| entry.expect("Failed to read entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("database.json")]);
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let (dir, db) = open_test_db();
        fs::remove_file(db.path()).expect("Failed to remove store file");
        fs::create_dir(db.path()).expect("Failed to put a directory in the way");
        fs::write(dir.path().join("database.json").join("child"), "x")
            .expect("Failed to fill directory");

        assert!(db.persist(&Document::default()).is_err());
        assert!(!dir.path().join("database.json.tmp").exists());
    }

    #[test]
    fn test_store_path_ending_in_tmp_is_written_atomically() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("store.tmp");
        let db = Database::open(&path, PasswordHasher::new(4)).expect("Failed to open database");

        db.create_chirp("first", 1).expect("Failed to create chirp");
        db.create_chirp("second", 1).expect("Failed to create chirp");

        assert_eq!(db.load().expect("Failed to load").chirps.len(), 2);
        assert!(!dir.path().join("store.tmp.tmp").exists());
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let (_dir, db) = open_test_db();
        db.create_user("a@example.com", "pw").expect("Failed to create user");

        let result = db.create_user("a@example.com", "other");

        assert!(matches!(
            result,
            Err(AppError::Store(StoreError::DuplicateEmail(_)))
        ));
        assert_eq!(db.load().expect("Failed to load").users.len(), 1);
    }

    #[test]
    fn test_password_is_stored_hashed() {
        let (_dir, db) = open_test_db();
        let user = db.create_user("a@example.com", "pw").expect("Failed to create user");

        assert_eq!(user.id, 1);
        assert_ne!(user.password_hash, "pw");
    }

    #[test]
    fn test_verify_password() {
        let (_dir, db) = open_test_db();
        db.create_user("a@example.com", "pw").expect("Failed to create user");

        let user = db.verify_password("a@example.com", "pw").expect("Failed to verify");
        assert_eq!(user.email, "a@example.com");

        for (email, password) in [("a@example.com", "wrong"), ("b@example.com", "pw")] {
            assert!(matches!(
                db.verify_password(email, password),
                Err(AppError::Auth(AuthError::InvalidCredentials))
            ));
        }
    }

    #[test]
    fn test_unparseable_stored_hash_is_invalid_credentials() {
        let (_dir, db) = open_test_db();
        let user = db.create_user("a@example.com", "pw").expect("Failed to create user");
        let mut doc = db.load().expect("Failed to load");
        if let Some(stored) = doc.users.get_mut(&user.id) {
            stored.password_hash = "not-a-bcrypt-hash".to_string();
        }
        db.persist(&doc).expect("Failed to persist");

        assert!(matches!(
            db.verify_password("a@example.com", "pw"),
            Err(AppError::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[test]
    fn test_update_user_replaces_only_given_fields() {
        let (_dir, db) = open_test_db();
        let original = db.create_user("a@example.com", "pw").expect("Failed to create user");

        let updated = db.update_user(original.id, "new@example.com", "").expect("Failed to update");
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.password_hash, original.password_hash);

        let updated = db.update_user(original.id, "", "pw2").expect("Failed to update");
        assert_eq!(updated.email, "new@example.com");
        assert!(db.verify_password("new@example.com", "pw2").is_ok());
    }

    #[test]
    fn test_update_missing_user_is_not_found() {
        let (_dir, db) = open_test_db();
        assert!(db.update_user(42, "x@example.com", "").unwrap_err().is_not_found());
    }

    #[test]
    fn test_upgrade_to_chirpy_red() {
        let (_dir, db) = open_test_db();
        let user = db.create_user("a@example.com", "pw").expect("Failed to create user");

        db.upgrade_to_chirpy_red(user.id).expect("Failed to upgrade");

        let stored = db.get_user_by_id(user.id).expect("Failed to load").expect("Missing user");
        assert!(stored.is_chirpy_red);
        assert!(db.upgrade_to_chirpy_red(99).unwrap_err().is_not_found());
    }

    #[test]
    fn test_chirp_ids_are_not_reused_after_delete() {
        let (_dir, db) = open_test_db();
        let a = db.create_chirp("a", 1).expect("Failed to create chirp");
        let b = db.create_chirp("b", 1).expect("Failed to create chirp");
        assert_eq!((a.id, b.id), (1, 2));

        db.delete_chirp(a.id).expect("Failed to delete");
        let c = db.create_chirp("c", 1).expect("Failed to create chirp");

        assert_eq!(c.id, 3);
        let stored = db.get_chirps(None, SortDirection::Asc).expect("Failed to list");
        assert_eq!(ids(&stored), vec![2, 3]);
        assert_eq!(db.get_chirp_by_id(2).expect("Failed to get").map(|c| c.body), Some("b".to_string()));
    }

    #[test]
    fn test_get_chirps_sorting_and_filtering() {
        let (_dir, db) = open_test_db();
        db.create_chirp("one", 1).expect("Failed to create chirp");
        db.create_chirp("two", 2).expect("Failed to create chirp");
        db.create_chirp("three", 1).expect("Failed to create chirp");

        let desc = db.get_chirps(Some(0), SortDirection::Desc).expect("Failed to list");
        assert_eq!(ids(&desc), vec![3, 2, 1]);

        let asc = db.get_chirps(None, SortDirection::Asc).expect("Failed to list");
        assert_eq!(ids(&asc), vec![1, 2, 3]);

        let by_author = db.get_chirps(Some(1), SortDirection::Desc).expect("Failed to list");
        assert_eq!(ids(&by_author), vec![3, 1]);

        let nobody = db.get_chirps(Some(77), SortDirection::Asc).expect("Failed to list");
        assert!(nobody.is_empty());
    }

    #[test]
    fn test_missing_chirp_is_none() {
        let (_dir, db) = open_test_db();

        assert_eq!(db.get_chirp_by_id(5).expect("Failed to get"), None);
        assert_eq!(db.delete_chirp(5).expect("Failed to delete"), None);
    }

    #[test]
    fn test_revoke_token_is_idempotent() {
        let (_dir, db) = open_test_db();
        assert!(!db.is_token_revoked("abc"));

        db.revoke_token("abc").expect("Failed to revoke");
        db.revoke_token("abc").expect("Failed to revoke again");

        assert!(db.is_token_revoked("abc"));
        assert!(!db.is_token_revoked("abd"));
        assert_eq!(db.load().expect("Failed to load").revoked_tokens.len(), 1);
    }

    #[test]
    fn test_revocation_check_fails_closed() {
        let (_dir, db) = open_test_db();
        fs::write(db.path(), "garbage").expect("Failed to corrupt file");

        assert!(db.is_token_revoked("never-revoked"));
    }

    #[test]
    fn test_revocation_check_fails_closed_when_unreadable() {
        let (_dir, db) = open_test_db();
        fs::remove_file(db.path()).expect("Failed to remove store file");
        fs::create_dir(db.path()).expect("Failed to put a directory in the way");

        assert!(db.is_token_revoked("never-revoked"));
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let (_dir, db) = open_test_db();
        let db = std::sync::Arc::new(db);

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let db = db.clone();
                std::thread::spawn(move || {
                    for i in 0..5 {
                        db.create_chirp(&format!("{}-{}", n, i), n)
                            .expect("Failed to create chirp");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("Writer thread panicked");
        }

        let chirps = db.get_chirps(None, SortDirection::Asc).expect("Failed to list");
        assert_eq!(ids(&chirps), (1..=40).collect::<Vec<u64>>());
    }
}
