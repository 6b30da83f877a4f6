//! In-memory user accounts, sessions, favorites and watch history.
//!
//! Process-lifetime only: nothing here survives a restart, and one coarse
//! mutex guards the whole store. Usernames are unique case-insensitively;
//! passwords are stored as salted SHA-256 digests; sessions are opaque
//! random tokens handed out on login.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::aggregator::NormalizedVideo;
use crate::constants::MAX_HISTORY_ENTRIES;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_USERNAME_LEN: usize = 2;
const MAX_USERNAME_LEN: usize = 32;

/// A video snapshot saved to a favorites list or watch history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedVideo {
    #[serde(flatten)]
    pub video: NormalizedVideo,
    pub saved_at: DateTime<Utc>,
}

/// Account summary returned by the profile endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub favorite_count: usize,
    pub history_count: usize,
}

#[derive(Debug)]
pub enum StoreError {
    InvalidUsername,
    WeakPassword,
    UsernameTaken,
    BadCredentials,
    Unauthorized,
}

impl StoreError {
    pub fn status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            StoreError::InvalidUsername | StoreError::WeakPassword => StatusCode::BAD_REQUEST,
            StoreError::UsernameTaken => StatusCode::CONFLICT,
            StoreError::BadCredentials | StoreError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::InvalidUsername => write!(
                f,
                "username must be {}-{} characters without whitespace",
                MIN_USERNAME_LEN, MAX_USERNAME_LEN
            ),
            StoreError::WeakPassword => {
                write!(f, "password must be at least {} characters", MIN_PASSWORD_LEN)
            }
            StoreError::UsernameTaken => write!(f, "username already taken"),
            StoreError::BadCredentials => write!(f, "invalid username or password"),
            StoreError::Unauthorized => write!(f, "missing or expired session"),
        }
    }
}

impl std::error::Error for StoreError {}

struct UserAccount {
    /// Username as registered, for display; the map key is lowercased
    username: String,
    salt: [u8; 16],
    password_digest: [u8; 32],
    created_at: DateTime<Utc>,
    favorites: Vec<SavedVideo>,
    history: Vec<SavedVideo>,
}

#[derive(Default)]
struct Inner {
    /// lowercase username -> account
    accounts: HashMap<String, UserAccount>,
    /// session token -> lowercase username
    sessions: HashMap<String, String>,
}

#[derive(Default)]
pub struct UserStore {
    inner: Mutex<Inner>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account. Usernames are trimmed and unique ignoring case.
    pub fn register(&self, username: &str, password: &str) -> Result<(), StoreError> {
        let username = username.trim();
        if username.len() < MIN_USERNAME_LEN
            || username.len() > MAX_USERNAME_LEN
            || username.chars().any(char::is_whitespace)
        {
            return Err(StoreError::InvalidUsername);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(StoreError::WeakPassword);
        }

        let key = username.to_lowercase();
        let mut inner = self.inner.lock().unwrap();
        if inner.accounts.contains_key(&key) {
            return Err(StoreError::UsernameTaken);
        }

        let salt: [u8; 16] = rand::rng().random();
        inner.accounts.insert(
            key,
            UserAccount {
                username: username.to_string(),
                salt,
                password_digest: digest_password(&salt, password),
                created_at: Utc::now(),
                favorites: Vec::new(),
                history: Vec::new(),
            },
        );
        Ok(())
    }

    /// Verify credentials and issue a session token.
    pub fn login(&self, username: &str, password: &str) -> Result<String, StoreError> {
        let key = username.trim().to_lowercase();
        let mut inner = self.inner.lock().unwrap();

        let account = inner.accounts.get(&key).ok_or(StoreError::BadCredentials)?;
        if digest_password(&account.salt, password) != account.password_digest {
            return Err(StoreError::BadCredentials);
        }

        let token = generate_session_token();
        inner.sessions.insert(token.clone(), key);
        Ok(token)
    }

    /// Drop a session. Unknown tokens are a no-op: the caller is logged out
    /// either way.
    pub fn logout(&self, token: &str) {
        self.inner.lock().unwrap().sessions.remove(token);
    }

    /// Display-case username for a live session token.
    pub fn username_for_token(&self, token: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        let key = inner.sessions.get(token)?;
        inner.accounts.get(key).map(|a| a.username.clone())
    }

    pub fn profile(&self, token: &str) -> Result<Profile, StoreError> {
        let inner = self.inner.lock().unwrap();
        let account = session_account(&inner, token)?;
        Ok(Profile {
            username: account.username.clone(),
            created_at: account.created_at,
            favorite_count: account.favorites.len(),
            history_count: account.history.len(),
        })
    }

    /// Add a favorite, deduplicated by video id. Returns false if it was
    /// already on the list.
    pub fn add_favorite(&self, token: &str, video: NormalizedVideo) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let account = session_account_mut(&mut inner, token)?;
        if account.favorites.iter().any(|f| f.video.id == video.id) {
            return Ok(false);
        }
        account.favorites.push(SavedVideo {
            video,
            saved_at: Utc::now(),
        });
        Ok(true)
    }

    /// Remove a favorite by video id. Returns false if it was not there.
    pub fn remove_favorite(&self, token: &str, video_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let account = session_account_mut(&mut inner, token)?;
        let before = account.favorites.len();
        account.favorites.retain(|f| f.video.id != video_id);
        Ok(account.favorites.len() < before)
    }

    pub fn favorites(&self, token: &str) -> Result<Vec<SavedVideo>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(session_account(&inner, token)?.favorites.clone())
    }

    /// Record a watched video, most recent first. Re-watching moves the
    /// entry to the front; the list is bounded and drops the oldest.
    pub fn record_history(&self, token: &str, video: NormalizedVideo) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let account = session_account_mut(&mut inner, token)?;
        account.history.retain(|h| h.video.id != video.id);
        account.history.insert(
            0,
            SavedVideo {
                video,
                saved_at: Utc::now(),
            },
        );
        account.history.truncate(MAX_HISTORY_ENTRIES);
        Ok(())
    }

    pub fn history(&self, token: &str) -> Result<Vec<SavedVideo>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(session_account(&inner, token)?.history.clone())
    }
}

fn session_account<'a>(inner: &'a Inner, token: &str) -> Result<&'a UserAccount, StoreError> {
    let key = inner.sessions.get(token).ok_or(StoreError::Unauthorized)?;
    inner.accounts.get(key).ok_or(StoreError::Unauthorized)
}

fn session_account_mut<'a>(
    inner: &'a mut Inner,
    token: &str,
) -> Result<&'a mut UserAccount, StoreError> {
    let key = inner
        .sessions
        .get(token)
        .ok_or(StoreError::Unauthorized)?
        .clone();
    inner.accounts.get_mut(&key).ok_or(StoreError::Unauthorized)
}

fn digest_password(salt: &[u8; 16], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video(id: &str) -> NormalizedVideo {
        NormalizedVideo {
            id: id.to_string(),
            title: format!("Video {}", id),
            poster: String::new(),
            rating: 4.0,
            categories: vec![],
            duration_minutes: "10".to_string(),
            embed_url: format!("https://www.eporner.com/embed/{}", id),
            views: 0,
            added: String::new(),
            is_vr: false,
        }
    }

    #[test]
    fn test_register_login_roundtrip() {
        let store = UserStore::new();
        store.register("alice", "hunter22").unwrap();

        let token = store.login("alice", "hunter22").unwrap();
        assert_eq!(store.username_for_token(&token).unwrap(), "alice");

        let profile = store.profile(&token).unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.favorite_count, 0);
    }

    #[test]
    fn test_usernames_unique_ignoring_case() {
        let store = UserStore::new();
        store.register("Alice", "hunter22").unwrap();
        assert!(matches!(
            store.register("alice", "password1"),
            Err(StoreError::UsernameTaken)
        ));
        // login is case-insensitive too, display case is preserved
        let token = store.login("ALICE", "hunter22").unwrap();
        assert_eq!(store.username_for_token(&token).unwrap(), "Alice");
    }

    #[test]
    fn test_rejects_bad_registrations() {
        let store = UserStore::new();
        assert!(matches!(store.register("a", "hunter22"), Err(StoreError::InvalidUsername)));
        assert!(matches!(store.register("a b", "hunter22"), Err(StoreError::InvalidUsername)));
        assert!(matches!(store.register("alice", "short"), Err(StoreError::WeakPassword)));
    }

    #[test]
    fn test_bad_credentials() {
        let store = UserStore::new();
        store.register("alice", "hunter22").unwrap();
        assert!(matches!(store.login("alice", "wrong"), Err(StoreError::BadCredentials)));
        assert!(matches!(store.login("nobody", "hunter22"), Err(StoreError::BadCredentials)));
    }

    #[test]
    fn test_logout_invalidates_token() {
        let store = UserStore::new();
        store.register("alice", "hunter22").unwrap();
        let token = store.login("alice", "hunter22").unwrap();

        store.logout(&token);
        assert!(store.username_for_token(&token).is_none());
        assert!(matches!(store.profile(&token), Err(StoreError::Unauthorized)));
    }

    #[test]
    fn test_favorites_dedupe_by_id() {
        let store = UserStore::new();
        store.register("alice", "hunter22").unwrap();
        let token = store.login("alice", "hunter22").unwrap();

        assert!(store.add_favorite(&token, sample_video("1")).unwrap());
        assert!(!store.add_favorite(&token, sample_video("1")).unwrap());
        assert_eq!(store.favorites(&token).unwrap().len(), 1);

        assert!(store.remove_favorite(&token, "1").unwrap());
        assert!(!store.remove_favorite(&token, "1").unwrap());
        assert!(store.favorites(&token).unwrap().is_empty());
    }

    #[test]
    fn test_history_bounded_most_recent_first() {
        let store = UserStore::new();
        store.register("alice", "hunter22").unwrap();
        let token = store.login("alice", "hunter22").unwrap();

        for i in 0..(MAX_HISTORY_ENTRIES + 5) {
            store.record_history(&token, sample_video(&i.to_string())).unwrap();
        }

        let history = store.history(&token).unwrap();
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history[0].video.id, (MAX_HISTORY_ENTRIES + 4).to_string());

        // re-watching moves an entry to the front without growing the list
        let repeat = history[10].video.clone();
        store.record_history(&token, repeat.clone()).unwrap();
        let history = store.history(&token).unwrap();
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history[0].video.id, repeat.id);
    }
}
