//! User-defined habit categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CategoryId, DomainError, UserId};

/// Categories every new user starts with: (name, colour, icon)
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 5] = [
    ("Personal Care", "#ec4899", "✨"),
    ("Fitness", "#84cc16", "💪"),
    ("Learning", "#3b82f6", "📚"),
    ("Health", "#f97316", "❤️"),
    ("Productivity", "#eab308", "⚡"),
];

/// A category owned by one user. Names are unique per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserId,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

/// The slice of a category shown next to a habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl Category {
    pub fn new(user_id: UserId, name: &str, color: &str, icon: &str) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > 50 {
            return Err(DomainError::Validation {
                message: "Category name must be 1-50 characters".to_string(),
            });
        }
        Ok(Self {
            id: CategoryId::new(),
            user_id,
            name: name.to_string(),
            color: color.trim().to_string(),
            icon: icon.trim().to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Fresh copies of the default categories for `user_id`
pub fn default_categories(user_id: &UserId) -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, color, icon)| Category {
            id: CategoryId::new(),
            user_id: user_id.clone(),
            name: name.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
            created_at: Utc::now(),
        })
        .collect()
}
