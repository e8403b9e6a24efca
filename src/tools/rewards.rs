//! Tools for managing the reward bags
//!
//! Rewards live in one of two bags, `baby` and `baller`. Jackpot punchcards
//! draw from them when claimed.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Reward, RewardBag, RewardChanges, Session};
use crate::storage::RewardStorage;
use crate::tools::{parse_reward_id, ToolError};

/// Parameters for adding a reward
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateRewardParams {
    pub name: String,
    pub description: Option<String>,
    /// "baby" or "baller" (default "baller")
    pub bag: Option<String>,
}

/// Parameters for listing rewards
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListRewardsParams {
    /// Include rewards that were switched off
    #[serde(default)]
    pub include_inactive: bool,
}

/// Parameters for editing a reward
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UpdateRewardParams {
    pub reward_id: String,
    pub name: Option<String>,
    /// New description; an empty string clears it
    pub description: Option<String>,
    pub bag: Option<String>,
    /// Inactive rewards are never drawn
    pub is_active: Option<bool>,
}

/// Parameters naming a single reward
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RewardIdParams {
    pub reward_id: String,
}

#[derive(Debug, Serialize)]
pub struct RewardResponse {
    pub reward: Reward,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RewardListResponse {
    pub rewards: Vec<Reward>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteRewardResponse {
    pub reward_id: String,
    pub message: String,
}

fn parse_bag(raw: Option<String>) -> Result<Option<RewardBag>, ToolError> {
    raw.map(|b| b.parse::<RewardBag>())
        .transpose()
        .map_err(ToolError::from)
}

pub fn create_reward<S: RewardStorage>(
    storage: &S,
    session: &Session,
    params: CreateRewardParams,
) -> Result<RewardResponse, ToolError> {
    let reward = Reward::new(
        session.user_id.clone(),
        &params.name,
        params.description,
        parse_bag(params.bag)?,
    )?;
    storage.create_reward(&reward)?;

    tracing::debug!("Created reward {} in bag {}", reward.id, reward.bag.as_str());

    Ok(RewardResponse {
        message: format!("🎁 Added '{}' to the {} bag", reward.name, reward.bag.as_str()),
        reward,
    })
}

pub fn list_rewards<S: RewardStorage>(
    storage: &S,
    session: &Session,
    params: ListRewardsParams,
) -> Result<RewardListResponse, ToolError> {
    let rewards = storage.list_rewards(&session.user_id, !params.include_inactive)?;

    let message = if rewards.is_empty() {
        "No rewards yet. Add some with reward_create to use jackpot punchcards.".to_string()
    } else {
        let mut lines = Vec::new();
        for bag in [RewardBag::Baby, RewardBag::Baller] {
            let in_bag: Vec<&Reward> = rewards.iter().filter(|r| r.bag == bag).collect();
            if in_bag.is_empty() {
                continue;
            }
            lines.push(format!("{} bag:", bag.as_str()));
            for r in in_bag {
                lines.push(format!(
                    "  {}{} [{}]",
                    r.name,
                    if r.is_active { "" } else { " (inactive)" },
                    r.id
                ));
            }
        }
        lines.join("\n")
    };

    Ok(RewardListResponse { rewards, message })
}

pub fn update_reward<S: RewardStorage>(
    storage: &S,
    session: &Session,
    params: UpdateRewardParams,
) -> Result<RewardResponse, ToolError> {
    let reward_id = parse_reward_id(&params.reward_id)?;
    let mut reward = storage.get_reward(&session.user_id, &reward_id)?;

    reward.update(RewardChanges {
        name: params.name,
        description: params.description.map(Some),
        bag: parse_bag(params.bag)?,
        is_active: params.is_active,
    })?;
    storage.update_reward(&reward)?;

    Ok(RewardResponse {
        message: format!("✅ Updated reward '{}'", reward.name),
        reward,
    })
}

pub fn delete_reward<S: RewardStorage>(
    storage: &S,
    session: &Session,
    params: RewardIdParams,
) -> Result<DeleteRewardResponse, ToolError> {
    let reward_id = parse_reward_id(&params.reward_id)?;
    let reward = storage.get_reward(&session.user_id, &reward_id)?;
    storage.delete_reward(&session.user_id, &reward_id)?;

    Ok(DeleteRewardResponse {
        reward_id: reward_id.to_string(),
        message: format!("🗑️ Removed reward '{}'", reward.name),
    })
}
