//! Bearer-token authentication.
//!
//! Session issuance lives outside this service. Here a token only needs to
//! resolve to a [`Principal`]; the [`Authenticator`] trait is the seam where
//! a session store plugs in. [`StaticTokenAuthenticator`] serves tokens
//! configured through `AUTH_TOKENS`.
//!
//! # Usage
//!
//! ```rust,ignore
//! // Require authentication
//! async fn my_orders(AuthUser(principal): AuthUser) -> Result<Json<Vec<OrderResponse>>, AppError> {
//!     ...
//! }
//!
//! // Require admin role
//! async fn all_orders(RequireAdmin(admin): RequireAdmin) -> Result<Json<...>, AppError> {
//!     ...
//! }
//! ```

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use storefront_core::types::Principal;
use storefront_web::{AppError, BearerToken};

/// Future returned by [`Authenticator::authenticate`].
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Option<Principal>> + Send + 'a>>;

/// Resolves bearer tokens to principals.
pub trait Authenticator: Send + Sync {
    /// The principal behind `token`, or `None` if the token is unknown or expired.
    fn authenticate<'a>(&'a self, token: &'a str) -> AuthFuture<'a>;
}

/// Authenticator backed by a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenAuthenticator {
    /// Create an authenticator from a token table.
    #[must_use]
    pub const fn new(tokens: HashMap<String, Principal>) -> Self {
        Self { tokens }
    }

    /// Number of configured tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate<'a>(&'a self, token: &'a str) -> AuthFuture<'a> {
        Box::pin(async move { self.tokens.get(token).cloned() })
    }
}

/// Authenticated caller.
///
/// Rejects with 401 when the bearer token is missing or does not resolve.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<dyn Authenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let authenticator = <Arc<dyn Authenticator>>::from_ref(state);

        let principal = authenticator
            .authenticate(&token)
            .await
            .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;

        tracing::debug!(user_id = %principal.user_id, "Request authenticated");
        Ok(Self(principal))
    }
}

/// Authenticated caller holding the admin role.
///
/// Rejects with 401 when unauthenticated and 403 when not an admin.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    Arc<dyn Authenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;

        if !principal.is_admin {
            tracing::warn!(user_id = %principal.user_id, "Admin access denied");
            return Err(AppError::forbidden("Admin access required"));
        }

        Ok(Self(principal))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    #[derive(Clone)]
    struct TestState(Arc<dyn Authenticator>);

    impl FromRef<TestState> for Arc<dyn Authenticator> {
        fn from_ref(state: &TestState) -> Self {
            Arc::clone(&state.0)
        }
    }

    fn state() -> TestState {
        TestState(Arc::new(StaticTokenAuthenticator::new(HashMap::from([
            ("t-john".to_string(), Principal::user("john")),
            ("t-admin".to_string(), Principal::admin("admin")),
        ]))))
    }

    fn parts(token: Option<&str>) -> Parts {
        let mut builder = Request::builder();
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(()).expect("Valid request").into_parts().0
    }

    #[tokio::test]
    async fn known_token_resolves_principal() {
        let AuthUser(principal) = AuthUser::from_request_parts(&mut parts(Some("t-john")), &state())
            .await
            .unwrap();
        assert_eq!(principal, Principal::user("john"));
    }

    #[tokio::test]
    async fn unknown_or_missing_token_is_unauthorized() {
        for token in [Some("t-nobody"), None] {
            let err = AuthUser::from_request_parts(&mut parts(token), &state())
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn admin_gate() {
        let RequireAdmin(admin) = RequireAdmin::from_request_parts(&mut parts(Some("t-admin")), &state())
            .await
            .unwrap();
        assert!(admin.is_admin);

        let err = RequireAdmin::from_request_parts(&mut parts(Some("t-john")), &state())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
