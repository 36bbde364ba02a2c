use serde_json::{Map, Value};

use crate::auth::hash_password;
use crate::config::SecurityConfig;
use crate::database::models::user::{normalize_email, NewUser};
use crate::database::{DatabaseError, Document, Store};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::types::Role;

pub async fn find_by_email(store: &Store, email: &str) -> Result<Option<Document>, DatabaseError> {
    store.users.find_one(&Filter::eq("email", normalize_email(email))).await
}

/// Validate, hash the password and store a new account
pub async fn create_user(store: &Store, security: &SecurityConfig, input: NewUser) -> Result<Document, ApiError> {
    input.validate()?;

    let (Some(name), Some(email), Some(password)) = (input.name, input.email, input.password) else {
        return Err(ApiError::bad_request("Please add a name, email and password"));
    };
    let email = normalize_email(&email);
    if find_by_email(store, &email).await?.is_some() {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let role = input.role.unwrap_or_default();
    let mut fields = Map::new();
    fields.insert("name".into(), Value::String(name.trim().to_string()));
    fields.insert("email".into(), Value::String(email));
    fields.insert("role".into(), Value::String(role.as_str().to_string()));
    fields.insert("password".into(), Value::String(hash_password(&password, security.bcrypt_cost)?));

    let user = store.users.insert(fields).await?;
    tracing::info!("Created {} account {}", role, user.id);
    Ok(user)
}

/// Store a new password hash and clear any pending reset
pub async fn set_password(store: &Store, security: &SecurityConfig, user: &Document, password: &str) -> Result<Document, ApiError> {
    let mut changes = Map::new();
    changes.insert("password".into(), Value::String(hash_password(password, security.bcrypt_cost)?));
    changes.insert("reset_password_token".into(), Value::Null);
    changes.insert("reset_password_expire".into(), Value::Null);

    store
        .users
        .update(user.id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No user with id {}", user.id)))
}

pub fn role_of(user: &Document) -> Role {
    user.get_str("role").and_then(Role::parse).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::config::AppConfig;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: Some("Ada".into()),
            email: Some(email.into()),
            password: Some("secret123".into()),
            role: None,
        }
    }

    #[tokio::test]
    async fn creates_user_with_hashed_password() {
        let store = Store::memory();
        let config = AppConfig::testing();
        let user = create_user(&store, &config.security, new_user("Ada@Example.com")).await.unwrap();

        assert_eq!(user.get_str("email"), Some("ada@example.com"));
        assert_eq!(role_of(&user), Role::User);
        let hash = user.get_str("password").unwrap();
        assert!(verify_password("secret123", hash));
        assert!(user.to_json().get("password").is_none());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = Store::memory();
        let config = AppConfig::testing();
        create_user(&store, &config.security, new_user("ada@example.com")).await.unwrap();
        let err = create_user(&store, &config.security, new_user("ADA@example.com")).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn set_password_clears_reset_token() {
        let store = Store::memory();
        let config = AppConfig::testing();
        let user = create_user(&store, &config.security, new_user("ada@example.com")).await.unwrap();
        let mut pending = Map::new();
        pending.insert("reset_password_token".into(), Value::String("digest".into()));
        let user = store.users.update(user.id, pending).await.unwrap().unwrap();

        let user = set_password(&store, &config.security, &user, "another1").await.unwrap();
        assert!(verify_password("another1", user.get_str("password").unwrap()));
        assert_eq!(user.field("reset_password_token"), None);
    }
}
