use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use tracing::debug;

use mingle_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and validate the JWT from the Authorization header, then attach
/// the decoded claims as a request extension.
///
/// The three failure kinds stay distinct so logs and tests can tell a missing
/// header from an expired or forged token; all of them answer 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?;

    let claims = decode_token(token, &state.jwt_secret)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => {
            debug!("rejected expired token");
            ApiError::ExpiredToken
        }
        _ => {
            debug!("rejected token: {}", e);
            ApiError::InvalidToken
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use mingle_types::models::Role;
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    fn token_with_exp(exp: i64) -> String {
        let claims = Claims {
            sub: Uuid::new_v4(),
            name: "Ada".into(),
            surname: "Lovelace".into(),
            email: "ada@example.com".into(),
            role: Role::User,
            exp: exp as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn days_from_now(days: i64) -> i64 {
        (chrono::Utc::now() + chrono::Duration::days(days)).timestamp()
    }

    #[test]
    fn accepts_token_within_expiry() {
        // A token issued 1 day into its 30-day life validates fine
        let token = token_with_exp(days_from_now(29));
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn rejects_expired_token_as_expired() {
        // A 30-day token issued 31 days ago
        let token = token_with_exp(days_from_now(-1));
        match decode_token(&token, SECRET) {
            Err(ApiError::ExpiredToken) => {}
            other => panic!("expected ExpiredToken, got {:?}", other.map(|c| c.email)),
        }
    }

    #[test]
    fn rejects_wrong_secret_as_invalid() {
        let token = token_with_exp(days_from_now(29));
        match decode_token(&token, "another-secret") {
            Err(ApiError::InvalidToken) => {}
            other => panic!("expected InvalidToken, got {:?}", other.map(|c| c.email)),
        }
    }

    #[test]
    fn rejects_garbage_as_invalid() {
        match decode_token("not-a-jwt", SECRET) {
            Err(ApiError::InvalidToken) => {}
            other => panic!("expected InvalidToken, got {:?}", other.map(|c| c.email)),
        }
    }
}
