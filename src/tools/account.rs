//! Tools for registering and logging in
//!
//! This module implements the account_register and account_login MCP tools.
//! Both hand back the `Session` the server keeps for later calls.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{hash_pin, validate_pin, Session, User};
use crate::storage::UserStorage;
use crate::tools::ToolError;

/// Parameters for registering a new user
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegisterParams {
    /// Display name, 1-50 characters
    pub name: String,
    /// Numeric PIN, 4-8 digits. Must not already be in use.
    pub pin: String,
}

/// Parameters for logging in
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginParams {
    /// The user's PIN
    pub pin: String,
}

/// Response from register and login
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub session: Session,
    pub message: String,
}

/// Register a user, seed their default categories and log them in
pub fn register_user<S: UserStorage>(
    storage: &S,
    params: RegisterParams,
) -> Result<AccountResponse, ToolError> {
    let user = User::register(&params.name, &params.pin)?;
    storage.create_user(&user)?;
    let seeded = storage.create_default_categories(&user.id)?;

    tracing::info!("Registered user {} with {} default categories", user.id, seeded);

    Ok(AccountResponse {
        message: format!(
            "👋 Welcome, {}! You're registered and logged in. {} starter categories are ready.",
            user.name, seeded
        ),
        session: user.session(),
    })
}

/// Log in by PIN
pub fn login_user<S: UserStorage>(
    storage: &S,
    params: LoginParams,
) -> Result<AccountResponse, ToolError> {
    validate_pin(&params.pin)?;

    let user = storage
        .find_user_by_pin_hash(&hash_pin(&params.pin))?
        .ok_or_else(|| ToolError::InvalidParams("Invalid PIN".to_string()))?;

    Ok(AccountResponse {
        message: format!("👋 Welcome back, {}!", user.name),
        session: user.session(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStorage, StorageError};

    #[test]
    fn test_register_then_login() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert!(!storage.has_any_users().unwrap());

        let registered = register_user(
            &storage,
            RegisterParams { name: "Sam".to_string(), pin: "4821".to_string() },
        )
        .unwrap();
        assert_eq!(storage.list_categories(&registered.session.user_id).unwrap().len(), 5);

        let logged_in = login_user(&storage, LoginParams { pin: "4821".to_string() }).unwrap();
        assert_eq!(logged_in.session, registered.session);

        assert!(login_user(&storage, LoginParams { pin: "0000".to_string() }).is_err());
    }

    #[test]
    fn test_pin_must_be_unique() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        register_user(&storage, RegisterParams { name: "Sam".to_string(), pin: "4821".to_string() })
            .unwrap();

        let clash = register_user(
            &storage,
            RegisterParams { name: "Alex".to_string(), pin: "4821".to_string() },
        );
        assert!(matches!(clash, Err(ToolError::Storage(StorageError::DuplicatePin))));
    }
}
