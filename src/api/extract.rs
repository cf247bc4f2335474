//! Request extractors that resolve the bearer token to the active session
//! and apply the access gate.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::api::response::ApiError;
use crate::auth::access::{self, Access, Guard};
use crate::storage::models::SessionUser;
use crate::AppState;

/// The signed-in caller, if the request carries the active session token.
pub struct MaybeUser(pub Option<SessionUser>);

/// A signed-in caller of any role.
pub struct CurrentUser(pub SessionUser);

/// A signed-in administrator.
pub struct AdminUser(pub SessionUser);

fn bearer_user(parts: &Parts, state: &AppState) -> Option<SessionUser> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    state.sessions.authenticate(token)
}

fn gate(guard: Guard, parts: &Parts, state: &AppState) -> Result<SessionUser, ApiError> {
    let user = bearer_user(parts, state);
    match (access::check(guard, user.as_ref(), parts.uri.path()), user) {
        (Access::Granted, Some(user)) => Ok(user),
        (Access::Redirect { to, from }, _) => Err(ApiError::access_denied(to, from)),
        (Access::Granted, None) => Err(ApiError::access_denied(access::LOGIN_PATH, parts.uri.path())),
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        Ok(MaybeUser(bearer_user(parts, state)))
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        gate(Guard::Authenticated, parts, state).map(CurrentUser)
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        gate(Guard::Admin, parts, state).map(AdminUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;
    use axum::http::{Request, StatusCode};

    fn parts(uri: &str, authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn status(err: ApiError) -> StatusCode {
        match err {
            ApiError::Fail(code, _) | ApiError::Redirect(code, _, _) | ApiError::Error(code, _) => {
                code
            }
        }
    }

    #[tokio::test]
    async fn test_bearer_token_resolves_active_session() {
        let state = test_state();
        let session = state.sessions.login("admin", "admin123").await.unwrap();

        let header = format!("Bearer {}", session.token);
        let user = bearer_user(&parts("/files", Some(&header)), &state);
        assert_eq!(user, Some(session.user));

        assert!(bearer_user(&parts("/files", Some("Bearer ")), &state).is_none());
        assert!(bearer_user(&parts("/files", Some(&session.token)), &state).is_none());
        assert!(bearer_user(&parts("/files", None), &state).is_none());
    }

    #[tokio::test]
    async fn test_gate_statuses() {
        let state = test_state();

        let err = gate(Guard::Authenticated, &parts("/files", None), &state).unwrap_err();
        assert_eq!(status(err), StatusCode::UNAUTHORIZED);

        state.sessions.register("jane", "secret1", "secret1").unwrap();
        let session = state.sessions.login("jane", "secret1").await.unwrap();
        let header = format!("Bearer {}", session.token);

        assert!(gate(Guard::Authenticated, &parts("/files", Some(&header)), &state).is_ok());
        let err = gate(Guard::Admin, &parts("/admin/users", Some(&header)), &state).unwrap_err();
        assert_eq!(status(err), StatusCode::FORBIDDEN);
    }
}
