use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::{debug, error, warn};

use super::{credentials::Credentials, password::verify_password};
use crate::{
    error::{AppError, AuthFailure},
    state::AppState,
    store::User,
    validation::normalize_email,
};

/// The authenticated caller, resolved from HTTP Basic credentials.
///
/// Every rejection renders as 401 `{"message": "Access denied"}`; the
/// specific reason only reaches the log.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(credentials) = Credentials::from_headers(&parts.headers) else {
            return Err(reject(AuthFailure::MissingHeader, None));
        };
        let email = normalize_email(&credentials.name);

        let mut users = state.store.find_users_by_email(&email).await?;
        if users.len() > 1 {
            // Uniqueness is only enforced on insert; legacy rows may collide.
            warn!(%email, matches = users.len(), "duplicate email records; using the oldest");
        }
        if users.is_empty() {
            return Err(reject(AuthFailure::NoUser, Some(&email)));
        }
        let user = users.swap_remove(0);

        let verified = verify_password(&credentials.secret, &user.password_hash).unwrap_or_else(|e| {
            error!(error = %e, user_id = %user.id, "stored password hash is unreadable");
            false
        });
        if !verified {
            return Err(reject(AuthFailure::BadCredentials, Some(&email)));
        }

        debug!(user_id = %user.id, %email, "authentication successful");
        Ok(CurrentUser(user))
    }
}

fn reject(reason: AuthFailure, email: Option<&str>) -> AppError {
    warn!(%reason, email = email.unwrap_or("-"), "access denied");
    AppError::Unauthorized(reason)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{header::AUTHORIZATION, Request};
    use base64::{engine::general_purpose::STANDARD, Engine};

    use super::*;
    use crate::{
        auth::password::hash_password,
        config::AppConfig,
        store::{MemoryStore, NewUser, Store},
    };

    fn parts_with(authorization: Option<&str>) -> Parts {
        let mut req = Request::builder().uri("/api/users");
        if let Some(value) = authorization {
            req = req.header(AUTHORIZATION, value);
        }
        req.body(()).unwrap().into_parts().0
    }

    fn basic(name: &str, secret: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{name}:{secret}")))
    }

    fn user(first: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            first_name: first.into(),
            last_name: "Dup".into(),
            email_address: email.into(),
            password_hash: hash_password(password).unwrap(),
        }
    }

    async fn authenticate(state: &AppState, authorization: Option<&str>) -> Result<User, AppError> {
        let mut parts = parts_with(authorization);
        CurrentUser::from_request_parts(&mut parts, state)
            .await
            .map(|CurrentUser(user)| user)
    }

    fn reason(result: Result<User, AppError>) -> AuthFailure {
        match result {
            Err(AppError::Unauthorized(reason)) => reason,
            other => panic!("expected an authentication failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn each_failure_carries_its_reason() {
        let store = Arc::new(MemoryStore::new());
        store.create_user(user("Jo", "jo@x.com", "pw")).await.unwrap();
        let state = AppState::from_parts(store, Arc::new(AppConfig::default()));

        assert_eq!(reason(authenticate(&state, None).await), AuthFailure::MissingHeader);
        assert_eq!(
            reason(authenticate(&state, Some("Bearer token")).await),
            AuthFailure::MissingHeader
        );
        assert_eq!(
            reason(authenticate(&state, Some(&basic("ghost@x.com", "pw"))).await),
            AuthFailure::NoUser
        );
        assert_eq!(
            reason(authenticate(&state, Some(&basic("jo@x.com", "nope"))).await),
            AuthFailure::BadCredentials
        );

        let user = authenticate(&state, Some(&basic(" JO@x.com", "pw"))).await.unwrap();
        assert_eq!(user.email_address, "jo@x.com");
    }

    #[tokio::test]
    async fn duplicate_legacy_records_authenticate_against_the_oldest() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user_unchecked(user("First", "dup@x.com", "one")).await;
        store.insert_user_unchecked(user("Second", "dup@x.com", "two")).await;
        let state = AppState::from_parts(store, Arc::new(AppConfig::default()));

        let user = authenticate(&state, Some(&basic("dup@x.com", "one"))).await.unwrap();
        assert_eq!(user.first_name, "First");
        assert_eq!(
            reason(authenticate(&state, Some(&basic("dup@x.com", "two"))).await),
            AuthFailure::BadCredentials
        );
    }

    #[tokio::test]
    async fn unreadable_stored_hash_is_a_plain_rejection() {
        let store = Arc::new(MemoryStore::new());
        store
            .create_user(NewUser {
                first_name: "Jo".into(),
                last_name: "Li".into(),
                email_address: "jo@x.com".into(),
                password_hash: "not-a-phc-string".into(),
            })
            .await
            .unwrap();
        let state = AppState::from_parts(store, Arc::new(AppConfig::default()));

        assert_eq!(
            reason(authenticate(&state, Some(&basic("jo@x.com", "pw"))).await),
            AuthFailure::BadCredentials
        );
    }
}
