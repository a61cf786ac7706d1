use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use atelier_db::Database;
use atelier_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;
    validate_password(&req.password)?;
    validate_email(&req.email)?;

    let password_hash = hash_password(&req.password)?;
    let uid = Uuid::new_v4();

    let db = state.clone();
    let email = req.email.clone();
    let username = req.username.clone();
    tokio::task::spawn_blocking(move || {
        db.db
            .create_user(&uid.to_string(), &email, &username, &password_hash)
    })
    .await
    .map_err(ApiError::internal)??;

    let token = create_token(&state.jwt_secret, uid, &req.username)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { uid, token })))
}

/// Login never distinguishes "no such user" from "wrong password": both
/// are the same non-specific 401.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_username(&username))
        .await
        .map_err(ApiError::internal)??
        .ok_or(ApiError::AuthFailed)?;

    let parsed_hash = PasswordHash::new(&user.password).map_err(ApiError::internal)?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::AuthFailed)?;

    let uid: Uuid = user.uid.parse().map_err(ApiError::internal)?;
    let token = create_token(&state.jwt_secret, uid, &user.username)?;

    Ok(Json(LoginResponse {
        uid,
        username: user.username,
        token,
    }))
}

pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(ApiError::internal)?
        .to_string();
    Ok(hash)
}

pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::BadRequest(
            "username must be between 3 and 32 characters",
        ));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters",
        ));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    if !email.contains('@') || email.len() > 120 {
        return Err(ApiError::BadRequest("malformed email address"));
    }
    Ok(())
}

fn create_token(secret: &str, uid: Uuid, username: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: uid,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(ApiError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_user(username: &str, password: &str) -> AppState {
        let db = Database::open_in_memory().unwrap();
        let hash = hash_password(password).unwrap();
        db.create_user(
            &Uuid::new_v4().to_string(),
            &format!("{}@test.com", username.to_lowercase()),
            username,
            &hash,
        )
        .unwrap();
        Arc::new(AppStateInner {
            db,
            jwt_secret: "test-secret".into(),
        })
    }

    #[tokio::test]
    async fn login_succeeds_with_correct_credentials() {
        let state = state_with_user("Alice", "correct-horse");
        let result = login(
            State(state),
            Json(LoginRequest {
                username: "Alice".into(),
                password: "correct-horse".into(),
            }),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn login_failure_never_reveals_which_part_was_wrong() {
        let state = state_with_user("Alice", "correct-horse");

        // Wrong password for an existing user...
        let wrong_password = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "Alice".into(),
                password: "wrong-password".into(),
            }),
        )
        .await;

        // ...and a username that does not exist at all.
        let no_such_user = login(
            State(state),
            Json(LoginRequest {
                username: "Nobody".into(),
                password: "correct-horse".into(),
            }),
        )
        .await;

        assert!(matches!(wrong_password, Err(ApiError::AuthFailed)));
        assert!(matches!(no_such_user, Err(ApiError::AuthFailed)));
    }
}
