//! The session and identity store: registered accounts plus the single
//! active session, written through to the key-value backend on every change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ring::rand::SystemRandom;
use thiserror::Error;

use super::credentials::{generate_token, hash_password, tokens_match, verify_password};
use crate::config::AuthConfig;
use crate::storage::models::{Account, LoginSuccess, Role, SessionUser};
use crate::storage::{
    read_json, write_json, write_raw, KeyValueStore, SESSION_KEY, TOKEN_KEY, USERS_KEY,
};
use crate::validation::{is_non_empty, is_valid_username, normalize_username};

/// Username of the seeded administrator; this account can never be removed.
pub const SEED_ADMIN_USERNAME: &str = "admin";
const SEED_ADMIN_NAME: &str = "Aurora Admin";

pub const MIN_LOGIN_PASSWORD_LENGTH: usize = 4;
pub const MIN_REGISTER_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Enter a valid username (letters, numbers, underscore).")]
    InvalidUsername,
    #[error("Password must be at least {min} characters.")]
    WeakPassword { min: usize },
    #[error("Choose a password.")]
    MissingPassword,
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("That username is already taken.")]
    UsernameTaken,
    #[error("We could not find an account with those credentials.")]
    AccountNotFound,
    #[error("A sign-in attempt is already in progress.")]
    LoginInProgress,
    #[error("Secure random source unavailable")]
    Random,
}

impl From<ring::error::Unspecified> for AuthError {
    fn from(_: ring::error::Unspecified) -> Self {
        AuthError::Random
    }
}

#[derive(Debug, Default)]
struct SessionState {
    accounts: Vec<Account>,
    user: Option<SessionUser>,
    token: Option<String>,
}

/// Clears the in-flight flag however the login attempt ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    rng: SystemRandom,
    state: Mutex<SessionState>,
    authenticating: AtomicBool,
    login_delay: Duration,
    seed_admin_password: String,
}

impl SessionStore {
    /// Load accounts and any persisted session. An empty or unreadable
    /// account list is replaced by the seed administrator.
    pub fn open(kv: Arc<dyn KeyValueStore>, config: &AuthConfig) -> Result<Self, AuthError> {
        let store = Self {
            kv,
            rng: SystemRandom::new(),
            state: Mutex::new(SessionState::default()),
            authenticating: AtomicBool::new(false),
            login_delay: Duration::from_millis(config.login_delay_ms),
            seed_admin_password: config.admin_password.clone(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Re-read accounts, session and token from the backend, discarding the
    /// in-memory copies.
    pub fn reload(&self) -> Result<(), AuthError> {
        let accounts = match read_json::<Vec<Account>>(self.kv.as_ref(), USERS_KEY) {
            Some(accounts) if !accounts.is_empty() => accounts,
            _ => {
                let seeded = vec![self.seed_admin()?];
                write_json(self.kv.as_ref(), USERS_KEY, &seeded);
                tracing::info!(username = SEED_ADMIN_USERNAME, "Seeded default administrator");
                seeded
            }
        };

        let user = read_json::<SessionUser>(self.kv.as_ref(), SESSION_KEY);
        let token = match self.kv.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(key = TOKEN_KEY, error = %e, "Unable to read stored value");
                None
            }
        };

        let mut state = self.lock();
        *state = SessionState {
            accounts,
            user,
            token,
        };
        Ok(())
    }

    fn seed_admin(&self) -> Result<Account, AuthError> {
        let credential = hash_password(&self.rng, &self.seed_admin_password)?;
        Ok(Account {
            username: SEED_ADMIN_USERNAME.to_string(),
            password_hash: credential.hash,
            salt: credential.salt,
            display_name: SEED_ADMIN_NAME.to_string(),
            role: Role::Admin,
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist_accounts(&self, state: &SessionState) {
        write_json(self.kv.as_ref(), USERS_KEY, &state.accounts);
    }

    fn persist_session(&self, state: &SessionState) {
        match &state.user {
            Some(user) => write_json(self.kv.as_ref(), SESSION_KEY, user),
            None => write_raw(self.kv.as_ref(), SESSION_KEY, None),
        }
        write_raw(self.kv.as_ref(), TOKEN_KEY, state.token.as_deref());
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Authenticate after the simulated network delay. Only one attempt may
    /// be in flight at a time; a concurrent call fails with `LoginInProgress`.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        if self
            .authenticating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AuthError::LoginInProgress);
        }
        let _in_flight = InFlight(&self.authenticating);

        tokio::time::sleep(self.login_delay).await;

        let username = normalize_username(username);
        if !is_valid_username(&username) {
            return Err(AuthError::InvalidUsername);
        }
        if password.chars().count() < MIN_LOGIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword {
                min: MIN_LOGIN_PASSWORD_LENGTH,
            });
        }

        let account = self
            .lock()
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned();
        let user = account
            .filter(|a| verify_password(&a.salt, &a.password_hash, password))
            .map(|a| a.sanitize())
            .ok_or(AuthError::AccountNotFound)?;

        let token = generate_token(&self.rng)?;

        let mut state = self.lock();
        state.user = Some(user.clone());
        state.token = Some(token.clone());
        self.persist_session(&state);

        tracing::debug!(username = %user.username, role = ?user.role, "Logged in");
        Ok(LoginSuccess { user, token })
    }

    /// Create a member account. Registration does not sign the caller in.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<SessionUser, AuthError> {
        let username = normalize_username(username);
        if !is_valid_username(&username) {
            return Err(AuthError::InvalidUsername);
        }
        if !is_non_empty(password) {
            return Err(AuthError::MissingPassword);
        }
        if password.chars().count() < MIN_REGISTER_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword {
                min: MIN_REGISTER_PASSWORD_LENGTH,
            });
        }
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let mut state = self.lock();
        if state.accounts.iter().any(|a| a.username == username) {
            return Err(AuthError::UsernameTaken);
        }

        let credential = hash_password(&self.rng, password)?;
        let account = Account {
            username: username.clone(),
            password_hash: credential.hash,
            salt: credential.salt,
            display_name: username,
            role: Role::Member,
        };
        let user = account.sanitize();
        state.accounts.push(account);
        self.persist_accounts(&state);

        tracing::debug!(username = %user.username, "Registered account");
        Ok(user)
    }

    /// End the active session. Safe to call when nobody is signed in.
    pub fn logout(&self) {
        let mut state = self.lock();
        if let Some(user) = state.user.take() {
            tracing::debug!(username = %user.username, "Logged out");
        }
        state.token = None;
        self.persist_session(&state);
    }

    /// Change an account's role; the active session picks the new role up
    /// immediately. Returns false when no such account exists.
    pub fn update_user_role(&self, username: &str, role: Role) -> bool {
        let username = normalize_username(username);
        let mut state = self.lock();

        let Some(account) = state.accounts.iter_mut().find(|a| a.username == username) else {
            return false;
        };
        account.role = role;
        self.persist_accounts(&state);

        if state.user.as_ref().is_some_and(|u| u.username == username) {
            if let Some(user) = state.user.as_mut() {
                user.role = role;
            }
            self.persist_session(&state);
        }

        tracing::debug!(username = %username, role = ?role, "Updated role");
        true
    }

    /// Delete an account, ending its session if it is the active one.
    /// Protected seed accounts are refused.
    pub fn remove_user(&self, username: &str) -> bool {
        let username = normalize_username(username);
        if is_protected(&username) {
            tracing::debug!(username = %username, "Refused to remove protected account");
            return false;
        }

        let mut state = self.lock();
        let before = state.accounts.len();
        state.accounts.retain(|a| a.username != username);
        if state.accounts.len() == before {
            return false;
        }
        self.persist_accounts(&state);

        if state.user.as_ref().is_some_and(|u| u.username == username) {
            state.user = None;
            state.token = None;
            self.persist_session(&state);
        }

        tracing::debug!(username = %username, "Removed account");
        true
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn current_user(&self) -> Option<SessionUser> {
        self.lock().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// A session needs both an identity and a token.
    pub fn is_authenticated(&self) -> bool {
        let state = self.lock();
        state.user.is_some() && state.token.is_some()
    }

    pub fn is_authenticating(&self) -> bool {
        self.authenticating.load(Ordering::SeqCst)
    }

    /// All accounts, without credential material
    pub fn users(&self) -> Vec<SessionUser> {
        self.lock().accounts.iter().map(Account::sanitize).collect()
    }

    /// Resolve a presented token to the active session's identity.
    pub fn authenticate(&self, token: &str) -> Option<SessionUser> {
        let state = self.lock();
        match (&state.user, &state.token) {
            (Some(user), Some(active)) if tokens_match(token, active) => Some(user.clone()),
            _ => None,
        }
    }
}

/// Seed accounts cannot be removed.
pub fn is_protected(username: &str) -> bool {
    normalize_username(username) == SEED_ADMIN_USERNAME
}
