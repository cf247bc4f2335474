//! Role-gated access decisions for a routing layer.

use crate::storage::models::{Role, SessionUser};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const ADMIN_PATH: &str = "/admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Send the caller to `to`, remembering where they were headed.
    Redirect { to: &'static str, from: String },
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }
}

/// Decide whether `user` may reach `requested`. `user` must only be `Some`
/// when the session is authenticated (identity and token both present).
pub fn check(guard: Guard, user: Option<&SessionUser>, requested: &str) -> Access {
    let redirect = |to| Access::Redirect {
        to,
        from: requested.to_string(),
    };

    match (guard, user) {
        (_, None) => redirect(LOGIN_PATH),
        (Guard::Admin, Some(u)) if !u.role.is_admin() => redirect(DASHBOARD_PATH),
        _ => Access::Granted,
    }
}

/// Where to land after signing in: the originally requested path if there
/// was one, otherwise the role's home view. Only same-site paths are honored.
pub fn post_login_redirect(from: Option<&str>, role: Role) -> String {
    match from.filter(|f| is_site_path(f)) {
        Some(f) => f.to_string(),
        None if role.is_admin() => ADMIN_PATH.to_string(),
        None => DASHBOARD_PATH.to_string(),
    }
}

/// An absolute path on this site: leading `/`, but not a protocol-relative
/// `//host` or its backslash variant.
fn is_site_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(char::is_control)
}
