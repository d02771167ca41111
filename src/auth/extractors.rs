use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::claims::Claims;
use crate::error::AppError;

/// Identity attached by the auth gate; lives for one request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub claims: Claims,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("No token provided".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn reads_identity_left_by_the_gate() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id,
            iat: 1,
            exp: 2,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(AuthUser { user_id, claims });

        let auth = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.claims.sub, user_id);
        assert_eq!(auth.claims.exp, 2);
    }

    #[tokio::test]
    async fn ungated_route_is_unauthorized() {
        let (mut parts, _) = Request::new(()).into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(m) if m == "No token provided"));
    }
}
