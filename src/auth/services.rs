use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::{NewUser, ProfileUpdate, User, UserStore, EMAIL_TAKEN},
};
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;
const BAD_CREDENTIALS: &str = "Invalid email or password.";

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates the account and signs a token for it.
pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> AppResult<(String, User)> {
    let first_name = req.first_name.trim().to_string();
    let last_name = req.last_name.trim().to_string();
    let email = normalize_email(&req.email);

    if first_name.is_empty() || last_name.is_empty() || email.is_empty() || req.password.is_empty()
    {
        return Err(AppError::validation("All fields are required."));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "Password must be at least 8 characters.",
        ));
    }

    // The unique index is authoritative; this only spares a hash on the common path.
    if users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::conflict(EMAIL_TAKEN));
    }

    let password_hash = hash_password(&req.password)?;
    let user = users
        .create(NewUser {
            first_name,
            last_name,
            email,
            password_hash,
        })
        .await?;

    let token = keys.sign(user.id)?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((token, user))
}

/// Every failure after input validation collapses to the same 401.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> AppResult<(String, User)> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password required."));
    }

    let user = match users.find_by_email(&email).await? {
        Some(u) if u.is_active => u,
        Some(u) => {
            warn!(user_id = u.id, "login on inactive account");
            return Err(AppError::InvalidCredentials(BAD_CREDENTIALS.into()));
        }
        None => {
            warn!(%email, "login unknown email");
            return Err(AppError::InvalidCredentials(BAD_CREDENTIALS.into()));
        }
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials(BAD_CREDENTIALS.into()));
    }

    let token = keys.sign(user.id)?;
    info!(user_id = user.id, "user logged in");
    Ok((token, user))
}

pub async fn get_profile(users: &dyn UserStore, user_id: i64) -> AppResult<User> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))
}

pub async fn update_profile(
    users: &dyn UserStore,
    user_id: i64,
    update: &ProfileUpdate,
) -> AppResult<User> {
    let user = users
        .update_profile(user_id, update)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;
    info!(user_id, "profile updated");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::JwtConfig, store::memory::MemoryStore};

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
        })
    }

    fn reg(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn creds(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_lowercases_email_and_returns_valid_token() {
        let store = MemoryStore::new();
        let keys = keys();
        let (token, user) = register(&store, &keys, reg("  Ada@Example.COM ", "password123"))
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.plan, "starter");
        assert_ne!(user.password_hash, "password123");
        assert_eq!(keys.verify(&token).unwrap().sub, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_in_any_case_conflicts() {
        let store = MemoryStore::new();
        let keys = keys();
        register(&store, &keys, reg("ada@example.com", "password123"))
            .await
            .unwrap();
        let err = register(&store, &keys, reg("ADA@example.com", "password456"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let store = MemoryStore::new();
        let keys = keys();

        let mut blank = reg("ada@example.com", "password123");
        blank.last_name = "   ".into();
        let err = register(&store, &keys, blank).await.unwrap_err();
        assert_eq!(err.to_string(), "All fields are required.");

        let err = register(&store, &keys, reg("ada@example.com", "short"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters.");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let keys = keys();
        let (_, user) = register(&store, &keys, reg("ada@example.com", "password123"))
            .await
            .unwrap();
        register(&store, &keys, reg("gone@example.com", "password123"))
            .await
            .unwrap();
        store.deactivate_user_by_email("gone@example.com");

        let wrong_password = login(&store, &keys, creds("ada@example.com", "nope-nope"))
            .await
            .unwrap_err();
        let unknown_email = login(&store, &keys, creds("who@example.com", "password123"))
            .await
            .unwrap_err();
        let inactive = login(&store, &keys, creds("gone@example.com", "password123"))
            .await
            .unwrap_err();

        for err in [&wrong_password, &unknown_email, &inactive] {
            assert!(matches!(err, AppError::InvalidCredentials(_)));
            assert_eq!(err.to_string(), "Invalid email or password.");
        }

        let (token, logged_in) = login(&store, &keys, creds(" ADA@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(keys.verify(&token).unwrap().sub, user.id);
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let store = MemoryStore::new();
        let err = login(&store, &keys(), creds("", "password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn profile_update_touches_only_supplied_fields() {
        let store = MemoryStore::new();
        let (_, user) = register(&store, &keys(), reg("ada@example.com", "password123"))
            .await
            .unwrap();

        let update = ProfileUpdate {
            bio: Some("Analyst".into()),
            learning_goal: Some("Career change".into()),
            ..Default::default()
        };
        let updated = update_profile(&store, user.id, &update).await.unwrap();
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.bio.as_deref(), Some("Analyst"));
        assert_eq!(updated.learning_goal.as_deref(), Some("Career change"));
        assert_eq!(updated.avatar_url, None);

        let missing = get_profile(&store, user.id + 100).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }
}
