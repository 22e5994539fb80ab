use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use mingle_db::Database;
use mingle_db::models::UserRow;
use mingle_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest};
use mingle_types::models::{Role, UserProfile};

use crate::error::ApiError;
use crate::relations::RelationDecoration;
use crate::storage::Storage;
use crate::user_profile;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub storage: Storage,
    pub decoration: RelationDecoration,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    for (field, value) in [
        ("name", &req.name),
        ("surname", &req.surname),
        ("nickname", &req.nickname),
        ("email", &req.email),
        ("password", &req.password),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!(
                "missing required field: {field}"
            )));
        }
    }

    // Email uniqueness is case-insensitive; the index on lower(email) backs
    // this check up against concurrent registrations.
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict(
            "a user with that email already exists".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    state.db.create_user(
        &user_id.to_string(),
        &req.name,
        &req.surname,
        &req.nickname,
        &req.email,
        &password_hash,
        Role::User.as_str(),
    )?;

    info!("registered user {} ({})", req.nickname, user_id);

    Ok((
        StatusCode::CREATED,
        Json(UserProfile {
            id: user_id,
            name: req.name,
            surname: req.surname,
            nickname: req.nickname,
            email: req.email,
            role: Role::User,
            image: None,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.email.trim().is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::Validation("email and password are required".into()));
    }

    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::NotFound("user"))?;

    verify_password(&req.password, &user.password)?;

    let token = create_token(&user, &state.jwt_secret)?;

    // Token-only mode skips the profile
    let profile = (!req.gettoken).then(|| user_profile(user));

    Ok(Json(LoginResponse {
        token,
        user: profile,
    }))
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("stored password hash is corrupt: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::InvalidCredentials)
}

/// Token payload carries the identity fields handlers need plus a 30-day
/// absolute expiry. Signed, not encrypted — clients can read it.
pub fn create_token(user: &UserRow, secret: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id.parse()?,
        name: user.name.clone(),
        surname: user.surname.clone(),
        email: user.email.clone(),
        role: Role::parse(&user.role),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::decode_token;

    async fn test_state() -> AppState {
        let dir = std::env::temp_dir().join(format!("mingle-auth-test-{}", Uuid::new_v4()));
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            storage: Storage::new(dir).await.unwrap(),
            decoration: RelationDecoration::Caller,
        })
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".into(),
            surname: "Lovelace".into(),
            nickname: "ada".into(),
            email: email.into(),
            password: "correct horse".into(),
        }
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter3", &hash),
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let state = test_state().await;
        register(State(state.clone()), Json(register_request("ada@example.com")))
            .await
            .unwrap();

        let stored = state
            .db
            .get_user_by_email("ada@example.com")
            .unwrap()
            .unwrap();
        assert_ne!(stored.password, "correct horse");
        assert!(verify_password("correct horse", &stored.password).is_ok());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_case_insensitively() {
        let state = test_state().await;
        register(State(state.clone()), Json(register_request("ada@example.com")))
            .await
            .unwrap();

        let second = register(
            State(state.clone()),
            Json(register_request("ADA@Example.com")),
        )
        .await;
        assert!(matches!(second, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn register_rejects_empty_fields() {
        let state = test_state().await;
        let mut req = register_request("ada@example.com");
        req.nickname = "".into();

        let result = register(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn login_outcomes() {
        let state = test_state().await;
        register(State(state.clone()), Json(register_request("ada@example.com")))
            .await
            .unwrap();

        // Unknown email
        let unknown = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "nobody@example.com".into(),
                password: "whatever".into(),
                gettoken: false,
            }),
        )
        .await;
        assert!(matches!(unknown, Err(ApiError::NotFound(_))));

        // Wrong password
        let wrong = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "ada@example.com".into(),
                password: "wrong".into(),
                gettoken: false,
            }),
        )
        .await;
        assert!(matches!(wrong, Err(ApiError::InvalidCredentials)));

        // Success returns a decodable token plus the profile
        let Json(ok) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "ada@example.com".into(),
                password: "correct horse".into(),
                gettoken: false,
            }),
        )
        .await
        .unwrap();
        let claims = decode_token(&ok.token, "test-secret").unwrap();
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(ok.user.unwrap().nickname, "ada");

        // Token-only mode omits the profile
        let Json(token_only) = login(
            State(state),
            Json(LoginRequest {
                email: "ada@example.com".into(),
                password: "correct horse".into(),
                gettoken: true,
            }),
        )
        .await
        .unwrap();
        assert!(token_only.user.is_none());
    }

    #[test]
    fn token_carries_identity_and_expiry() {
        let user = UserRow {
            id: Uuid::new_v4().to_string(),
            name: "Ada".into(),
            surname: "Lovelace".into(),
            nickname: "ada".into(),
            email: "ada@example.com".into(),
            password: "irrelevant".into(),
            role: "ROLE_ADMIN".into(),
            image: None,
            created_at: "2026-01-01 00:00:00".into(),
        };

        let token = create_token(&user, "test-secret").unwrap();
        let claims = decode_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub.to_string(), user.id);
        assert_eq!(claims.role, Role::Admin);

        let thirty_days = (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize;
        // Issued just now, so exp sits at ~30 days out
        assert!(claims.exp <= thirty_days && claims.exp > thirty_days - 60);
    }
}
