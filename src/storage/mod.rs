//! Storage layer for persisting habit data
//!
//! This module handles all database operations using SQLite. It provides
//! a clean interface for storing and retrieving users, categories, habits,
//! completions and rewards. Every query over user-owned rows takes the owning
//! `UserId` explicitly.

pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use sqlite::*;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::domain::{
    Category, CategoryId, Completion, DomainError, Habit, HabitId, HabitWithCategory,
    PunchcardConfig, Reward, RewardId, User, UserId,
};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Category not found: {category_id}")]
    CategoryNotFound { category_id: String },

    #[error("Reward not found: {reward_id}")]
    RewardNotFound { reward_id: String },

    #[error("Duplicate entry: habit {habit_id} already completed at {completed_at}")]
    DuplicateEntry { habit_id: String, completed_at: String },

    #[error("That PIN is already taken")]
    DuplicatePin,

    #[error("Category '{name}' already exists")]
    DuplicateCategory { name: String },

    #[error("Stored data is invalid: {0}")]
    Domain(#[from] DomainError),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Users and their categories
pub trait UserStorage {
    /// Create a new user. Fails with `DuplicatePin` if the PIN is in use.
    fn create_user(&self, user: &User) -> Result<(), StorageError>;

    /// Look a user up by PIN digest (login)
    fn find_user_by_pin_hash(&self, pin_hash: &str) -> Result<Option<User>, StorageError>;

    /// True once anyone has registered (first-run detection)
    fn has_any_users(&self) -> Result<bool, StorageError>;

    fn create_category(&self, category: &Category) -> Result<(), StorageError>;

    /// Insert the default categories, skipping names the user already has.
    /// Returns how many were added.
    fn create_default_categories(&self, user_id: &UserId) -> Result<usize, StorageError>;

    fn get_category(&self, user_id: &UserId, category_id: &CategoryId) -> Result<Category, StorageError>;

    /// Categories ordered by name
    fn list_categories(&self, user_id: &UserId) -> Result<Vec<Category>, StorageError>;

    fn update_category(&self, category: &Category) -> Result<(), StorageError>;

    /// Delete a category; habits in it become uncategorised
    fn delete_category(&self, user_id: &UserId, category_id: &CategoryId) -> Result<(), StorageError>;
}

/// Habits, their completions and punchcards
pub trait HabitStorage {
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Get one of the user's habits along with its category
    fn get_habit(&self, user_id: &UserId, habit_id: &HabitId) -> Result<HabitWithCategory, StorageError>;

    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Soft delete: mark inactive, keep completions
    fn archive_habit(&self, user_id: &UserId, habit_id: &HabitId) -> Result<(), StorageError>;

    /// The user's habits ordered by creation time
    fn list_habits(&self, user_id: &UserId, active_only: bool) -> Result<Vec<HabitWithCategory>, StorageError>;

    fn insert_completion(&self, completion: &Completion) -> Result<(), StorageError>;

    /// Delete every completion of `habit_id` on `date`; returns how many went
    fn delete_completions_on(&self, habit_id: &HabitId, date: NaiveDate) -> Result<usize, StorageError>;

    fn has_completion_on(&self, habit_id: &HabitId, date: NaiveDate) -> Result<bool, StorageError>;

    /// Completions of all the user's habits on or after `since`
    fn completions_for_user(&self, user_id: &UserId, since: NaiveDate) -> Result<Vec<Completion>, StorageError>;

    /// Completions of one habit on or after `since`
    fn completions_for_habit(&self, habit_id: &HabitId, since: NaiveDate) -> Result<Vec<Completion>, StorageError>;

    /// Number of completions strictly after `after`
    fn count_completions_after(&self, habit_id: &HabitId, after: NaiveDateTime) -> Result<u32, StorageError>;

    /// Persist a habit's punchcard state
    fn save_punchcard(&self, habit_id: &HabitId, punchcard: &PunchcardConfig) -> Result<(), StorageError>;
}

/// The reward pool
pub trait RewardStorage {
    fn create_reward(&self, reward: &Reward) -> Result<(), StorageError>;

    fn get_reward(&self, user_id: &UserId, reward_id: &RewardId) -> Result<Reward, StorageError>;

    /// Rewards ordered by creation time
    fn list_rewards(&self, user_id: &UserId, active_only: bool) -> Result<Vec<Reward>, StorageError>;

    fn update_reward(&self, reward: &Reward) -> Result<(), StorageError>;

    /// Permanently remove a reward
    fn delete_reward(&self, user_id: &UserId, reward_id: &RewardId) -> Result<(), StorageError>;
}
