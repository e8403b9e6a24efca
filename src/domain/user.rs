//! Users, PIN credentials and the per-request session
//!
//! Users log in with a numeric PIN alone, so PIN digests are unique across
//! all users. Only the salted SHA-256 digest is ever stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{DomainError, UserId};

const PIN_SALT: &str = "habit-tracker-salt";

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(skip_serializing)]
    pub pin_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user from a display name and a raw PIN
    pub fn register(name: &str, pin: &str) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > 50 {
            return Err(DomainError::Validation {
                message: "Name must be 1-50 characters".to_string(),
            });
        }
        validate_pin(pin)?;

        Ok(Self {
            id: UserId::new(),
            name: name.to_string(),
            pin_hash: hash_pin(pin),
            created_at: Utc::now(),
        })
    }

    /// The session handed to every call made on this user's behalf
    pub fn session(&self) -> Session {
        Session {
            user_id: self.id.clone(),
            user_name: self.name.clone(),
        }
    }
}

/// Who a request is acting for.
///
/// Passed explicitly into every tool and storage call that reads or writes
/// user-owned rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub user_name: String,
}

/// A PIN is 4 to 8 ASCII digits
pub fn validate_pin(pin: &str) -> Result<(), DomainError> {
    let len = pin.len();
    if !(4..=8).contains(&len) || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::InvalidPin("PIN must be 4-8 digits".to_string()));
    }
    Ok(())
}

/// Salted SHA-256 digest of a PIN, hex encoded
pub fn hash_pin(pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    hasher.update(PIN_SALT.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_hashes_pin() {
        let user = User::register("Sam", "4821").unwrap();
        assert_ne!(user.pin_hash, "4821");
        assert_eq!(user.pin_hash, hash_pin("4821"));
        assert_eq!(user.pin_hash.len(), 64);
    }

    #[test]
    fn test_pin_rules() {
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("123456789").is_err());
        assert!(validate_pin("12a4").is_err());
        assert!(validate_pin("0000").is_ok());
        assert_ne!(hash_pin("1234"), hash_pin("1235"));
    }

    #[test]
    fn test_pin_hash_not_serialized() {
        let user = User::register("Sam", "4821").unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("pin_hash").is_none());
    }
}
