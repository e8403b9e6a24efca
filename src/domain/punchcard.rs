//! Per-habit reward punchcards
//!
//! Every completion of a punchcard-enabled habit punches one hole; undoing a
//! completion removes one. The counter always stays within `[0, target]`.
//! A full card can be claimed for its reward, which resets it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, RewardBag};

/// Target used when a habit has never had a punchcard configured
pub const DEFAULT_PUNCHCARD_TARGET: u32 = 10;

/// Largest punchcard a habit can have
pub const MAX_PUNCHCARD_TARGET: u32 = 100;

/// What a full punchcard pays out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardSpec {
    /// A fixed reward described by the user
    Direct { text: String },
    /// A random draw from one of the user's reward bags
    Jackpot { bag: RewardBag },
}

/// User-editable punchcard settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchcardSettings {
    pub target: u32,
    pub reward: Option<RewardSpec>,
}

impl PunchcardSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.target == 0 || self.target > MAX_PUNCHCARD_TARGET {
            return Err(DomainError::InvalidValue {
                message: format!(
                    "Punchcard target must be 1-{}, got {}",
                    MAX_PUNCHCARD_TARGET, self.target
                ),
            });
        }
        if let Some(RewardSpec::Direct { text }) = &self.reward {
            if text.trim().is_empty() {
                return Err(DomainError::InvalidValue {
                    message: "Direct reward text cannot be empty".to_string(),
                });
            }
            if text.chars().count() > 200 {
                return Err(DomainError::InvalidValue {
                    message: "Direct reward text cannot be longer than 200 characters".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Punchcard state stored on each habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchcardConfig {
    pub enabled: bool,
    pub target: u32,
    pub current: u32,
    /// Completions after this instant are "new" on the punchcards page
    pub last_checked: NaiveDateTime,
    pub reward: Option<RewardSpec>,
}

/// Result of looking at a punchcard since it was last viewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatchUp {
    pub new_completions: u32,
    /// Counter to show, capped at the target
    pub display_total: u32,
}

impl PunchcardConfig {
    pub fn disabled(now: NaiveDateTime) -> Self {
        Self {
            enabled: false,
            target: DEFAULT_PUNCHCARD_TARGET,
            current: 0,
            last_checked: now,
            reward: None,
        }
    }

    pub fn enabled(settings: PunchcardSettings, now: NaiveDateTime) -> Self {
        Self {
            enabled: true,
            target: settings.target,
            current: 0,
            last_checked: now,
            reward: settings.reward,
        }
    }

    /// Turn the punchcard on with new settings, keeping earned punches that
    /// still fit under the new target
    pub fn reconfigure(&mut self, settings: PunchcardSettings) {
        self.enabled = true;
        self.target = settings.target;
        self.current = self.current.min(self.target);
        self.reward = settings.reward;
    }

    /// Counter after applying `delta`, clamped to `[0, target]`
    pub fn adjusted(&self, delta: i64) -> u32 {
        let next = (self.current as i64 + delta).clamp(0, self.target as i64);
        next as u32
    }

    pub fn is_full(&self) -> bool {
        self.target > 0 && self.current >= self.target
    }

    /// Progress including completions not yet seen on the punchcards page.
    /// The stored counter is not changed.
    pub fn catch_up(&self, new_completions: u32) -> CatchUp {
        CatchUp {
            new_completions,
            display_total: self.current.saturating_add(new_completions).min(self.target),
        }
    }

    /// Claim a full card: reset the counter and mark it checked
    pub fn claim(&mut self, now: NaiveDateTime) -> Result<(), DomainError> {
        if !self.enabled || !self.is_full() {
            return Err(DomainError::PunchcardIncomplete {
                current: self.current,
                target: self.target,
            });
        }
        self.current = 0;
        self.last_checked = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn card(current: u32, target: u32) -> PunchcardConfig {
        let mut card = PunchcardConfig::enabled(PunchcardSettings { target, reward: None }, now());
        card.current = current;
        card
    }

    #[test]
    fn test_adjust_clamps() {
        assert_eq!(card(0, 5).adjusted(-1), 0);
        assert_eq!(card(2, 5).adjusted(-1), 1);
        assert_eq!(card(4, 5).adjusted(1), 5);
        assert_eq!(card(5, 5).adjusted(1), 5);
    }

    #[test]
    fn test_catch_up_caps_at_target() {
        let c = card(3, 5).catch_up(4);
        assert_eq!(c.new_completions, 4);
        assert_eq!(c.display_total, 5);
    }

    #[test]
    fn test_claim_requires_full_card() {
        let mut partial = card(4, 5);
        assert!(matches!(
            partial.claim(now()),
            Err(DomainError::PunchcardIncomplete { current: 4, target: 5 })
        ));

        let mut full = card(5, 5);
        let later = now() + chrono::Duration::hours(1);
        full.claim(later).unwrap();
        assert_eq!(full.current, 0);
        assert_eq!(full.last_checked, later);
    }

    #[test]
    fn test_reconfigure_keeps_fitting_punches() {
        let mut c = card(8, 10);
        c.reconfigure(PunchcardSettings { target: 5, reward: None });
        assert_eq!(c.current, 5);
    }

    #[test]
    fn test_settings_validation() {
        assert!(PunchcardSettings { target: 0, reward: None }.validate().is_err());
        assert!(PunchcardSettings { target: 101, reward: None }.validate().is_err());
        let blank = PunchcardSettings {
            target: 5,
            reward: Some(RewardSpec::Direct { text: " ".to_string() }),
        };
        assert!(blank.validate().is_err());
    }
}
