//! Habit entity and related functionality
//!
//! This module defines the core Habit struct that represents something a user
//! wants to do on a recurring schedule, along with the validated inputs used
//! to create and edit habits.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CategoryId, CategoryRef, DomainError, HabitId, PunchcardConfig, PunchcardSettings, Schedule,
    UserId,
};

/// A habit represents something the user wants to do regularly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Owner of this habit
    pub user_id: UserId,
    /// Optional category for grouping
    pub category_id: Option<CategoryId>,
    /// Display name (e.g., "Morning Run", "Floss")
    pub name: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// When the habit is due and what quota applies
    pub schedule: Schedule,
    /// Hide from today's list once a weekly/monthly quota is met
    pub hide_when_quota_reached: bool,
    /// Reward punchcard driven by completions
    pub punchcard: PunchcardConfig,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
    /// False once the habit has been archived
    pub is_active: bool,
}

/// Input for creating a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitDraft {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub schedule: Schedule,
    pub hide_when_quota_reached: bool,
    /// `None` leaves the punchcard disabled
    pub punchcard: Option<PunchcardSettings>,
}

impl HabitDraft {
    /// Minimal draft with no category, description, or punchcard
    pub fn new(name: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            name: name.into(),
            description: None,
            category_id: None,
            schedule,
            hide_when_quota_reached: false,
            punchcard: None,
        }
    }
}

/// Partial update for an existing habit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Option<CategoryId>>,
    pub schedule: Option<Schedule>,
    pub hide_when_quota_reached: Option<bool>,
    /// `Some(None)` disables the punchcard
    pub punchcard: Option<Option<PunchcardSettings>>,
}

/// A habit joined with its (optional) category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitWithCategory {
    pub habit: Habit,
    pub category: Option<CategoryRef>,
}

impl Habit {
    /// Create a new habit with validation
    pub fn new(user_id: UserId, draft: HabitDraft) -> Result<Self, DomainError> {
        let name = draft.name.trim().to_string();
        Self::validate_name(&name)?;
        Self::validate_description(&draft.description)?;
        draft.schedule.validate()?;

        let now = Local::now().naive_local();
        let punchcard = match draft.punchcard {
            Some(settings) => {
                settings.validate()?;
                PunchcardConfig::enabled(settings, now)
            }
            None => PunchcardConfig::disabled(now),
        };

        Ok(Self {
            id: HabitId::new(),
            user_id,
            category_id: draft.category_id,
            name,
            description: draft.description,
            schedule: draft.schedule,
            hide_when_quota_reached: draft.hide_when_quota_reached,
            punchcard,
            created_at: Utc::now(),
            is_active: true,
        })
    }

    /// Apply a partial update, validating every changed field first
    pub fn update(&mut self, changes: HabitChanges) -> Result<(), DomainError> {
        if let Some(ref new_name) = changes.name {
            Self::validate_name(new_name.trim())?;
        }
        if let Some(ref new_desc) = changes.description {
            Self::validate_description(new_desc)?;
        }
        if let Some(ref new_schedule) = changes.schedule {
            new_schedule.validate()?;
        }
        if let Some(Some(ref settings)) = changes.punchcard {
            settings.validate()?;
        }

        if let Some(new_name) = changes.name {
            self.name = new_name.trim().to_string();
        }
        if let Some(new_description) = changes.description {
            self.description = new_description;
        }
        if let Some(new_category) = changes.category_id {
            self.category_id = new_category;
        }
        if let Some(new_schedule) = changes.schedule {
            self.schedule = new_schedule;
        }
        if let Some(hide) = changes.hide_when_quota_reached {
            self.hide_when_quota_reached = hide;
        }
        match changes.punchcard {
            Some(Some(settings)) => self.punchcard.reconfigure(settings),
            Some(None) => self.punchcard.enabled = false,
            None => {}
        }

        Ok(())
    }

    /// Archive (soft delete) this habit. Completions are kept.
    pub fn archive(&mut self) {
        self.is_active = false;
    }

    // Validation helper methods

    fn validate_name(name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string(),
            ));
        }

        if trimmed.chars().count() > 100 {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be longer than 100 characters".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_description(description: &Option<String>) -> Result<(), DomainError> {
        if let Some(desc) = description {
            if desc.chars().count() > 500 {
                return Err(DomainError::Validation {
                    message: "Description cannot be longer than 500 characters".to_string(),
                });
            }
        }
        Ok(())
    }
}
