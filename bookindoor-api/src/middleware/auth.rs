use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use bookindoor_core::identity::{Identity, Role, TokenVerifier};
use bookindoor_core::{CoreError, CoreResult};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

// ============================================================================
// JWT Claims
// ============================================================================

/// Tokens are issued elsewhere (HS256, shared secret); this service only reads them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

pub struct JwtTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> CoreResult<Identity> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            CoreError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(Identity::new(data.claims.sub, data.claims.role))
    }
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Resolves the bearer token, when present, into an `Identity` request extension.
/// Anonymous requests pass through; a bad token is rejected outright.
pub async fn authenticate(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        let identity = state.tokens.verify(bearer.token()).await?;
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

/// An authenticated caller; 401 otherwise.
pub struct Caller(pub Identity);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(Caller)
            .ok_or_else(|| CoreError::Unauthorized("Bearer token required".to_string()).into())
    }
}

/// The caller if a token was sent.
pub struct MaybeCaller(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeCaller(parts.extensions.get::<Identity>().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, role: Role, expires_in: Duration) -> (Uuid, String) {
        let sub = Uuid::new_v4();
        let claims = Claims {
            sub,
            role,
            exp: (Utc::now() + expires_in).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
        (sub, token)
    }

    #[tokio::test]
    async fn test_verify_roundtrips_identity() {
        let verifier = JwtTokenVerifier::new("secret");
        let (sub, token) = token("secret", Role::SuperAdmin, Duration::hours(1));

        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.id, sub);
        assert_eq!(identity.role, Role::SuperAdmin);
    }

    #[tokio::test]
    async fn test_rejects_foreign_and_expired_tokens() {
        let verifier = JwtTokenVerifier::new("secret");

        let (_, forged) = token("other-secret", Role::Admin, Duration::hours(1));
        assert!(matches!(verifier.verify(&forged).await, Err(CoreError::Unauthorized(_))));

        let (_, expired) = token("secret", Role::Admin, Duration::hours(-2));
        assert!(matches!(verifier.verify(&expired).await, Err(CoreError::Unauthorized(_))));

        assert!(matches!(verifier.verify("not-a-jwt").await, Err(CoreError::Unauthorized(_))));
    }
}
