//! Reward pool entries
//!
//! Users stock two bags of rewards. A jackpot punchcard draws one active
//! reward at random from its bag when claimed.

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, RewardBag, RewardId, UserId};

/// A reward the user can win
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub bag: RewardBag,
    /// Inactive rewards stay in history but are never drawn
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a reward
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub bag: Option<RewardBag>,
    pub is_active: Option<bool>,
}

impl Reward {
    /// Create an active reward; the bag defaults to `baller`
    pub fn new(
        user_id: UserId,
        name: &str,
        description: Option<String>,
        bag: Option<RewardBag>,
    ) -> Result<Self, DomainError> {
        let name = Self::validate_name(name)?;
        Ok(Self {
            id: RewardId::new(),
            user_id,
            name,
            description: description.filter(|d| !d.trim().is_empty()),
            bag: bag.unwrap_or_default(),
            is_active: true,
            created_at: Utc::now(),
        })
    }

    pub fn update(&mut self, changes: RewardChanges) -> Result<(), DomainError> {
        let name = match changes.name {
            Some(ref n) => Some(Self::validate_name(n)?),
            None => None,
        };

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description.filter(|d| !d.trim().is_empty());
        }
        if let Some(bag) = changes.bag {
            self.bag = bag;
        }
        if let Some(active) = changes.is_active {
            self.is_active = active;
        }
        Ok(())
    }

    fn validate_name(name: &str) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidValue {
                message: "Reward name cannot be empty".to_string(),
            });
        }
        if trimmed.chars().count() > 100 {
            return Err(DomainError::InvalidValue {
                message: "Reward name cannot be longer than 100 characters".to_string(),
            });
        }
        Ok(trimmed.to_string())
    }
}

/// Draw one active reward from `bag`, uniformly at random.
/// Returns `None` when the bag has nothing active in it.
pub fn draw_jackpot<'a, R>(rewards: &'a [Reward], bag: RewardBag, rng: &mut R) -> Option<&'a Reward>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<&Reward> = rewards
        .iter()
        .filter(|r| r.is_active && r.bag == bag)
        .collect();
    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_reward_defaults_to_baller() {
        let reward = Reward::new(UserId::new(), " Movie night ", None, None).unwrap();
        assert_eq!(reward.name, "Movie night");
        assert_eq!(reward.bag, RewardBag::Baller);
        assert!(reward.is_active);
        assert!(Reward::new(UserId::new(), "", None, None).is_err());
    }

    #[test]
    fn test_draw_only_from_active_rewards_in_bag() {
        let user = UserId::new();
        let mut retired = Reward::new(user.clone(), "Old", None, Some(RewardBag::Baby)).unwrap();
        retired.is_active = false;
        let candy = Reward::new(user.clone(), "Candy", None, Some(RewardBag::Baby)).unwrap();
        let trip = Reward::new(user, "Trip", None, Some(RewardBag::Baller)).unwrap();
        let pool = vec![retired, candy.clone(), trip];

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(draw_jackpot(&pool, RewardBag::Baby, &mut rng).map(|r| &r.id), Some(&candy.id));
        }
    }

    #[test]
    fn test_draw_from_empty_bag() {
        let pool = vec![Reward::new(UserId::new(), "Trip", None, Some(RewardBag::Baller)).unwrap()];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(draw_jackpot(&pool, RewardBag::Baby, &mut rng).is_none());
    }
}
