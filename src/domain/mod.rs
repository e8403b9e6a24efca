//! Domain module containing core business logic and data types
//!
//! This module defines the core entities (users, categories, habits,
//! completions, rewards) and the pure scheduling and progress calculator that
//! decides when a habit is due, whether its quota is met, and how long its
//! streak is. Nothing in here touches the database or the clock: the current
//! date is always passed in by the caller.

pub mod category;
pub mod completion;
pub mod habit;
pub mod progress;
pub mod punchcard;
pub mod reward;
pub mod schedule;
pub mod types;
pub mod user;

// Re-export public types for easy access
pub use category::*;
pub use completion::*;
pub use habit::*;
pub use progress::*;
pub use punchcard::*;
pub use reward::*;
pub use schedule::*;
pub use types::*;
pub use user::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    #[error("Punchcard not ready: {current}/{target} punches")]
    PunchcardIncomplete { current: u32, target: u32 },
}
