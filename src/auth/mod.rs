pub mod access;
pub mod credentials;
mod session;

pub use session::{
    is_protected, AuthError, SessionStore, MIN_LOGIN_PASSWORD_LENGTH,
    MIN_REGISTER_PASSWORD_LENGTH, SEED_ADMIN_USERNAME,
};
