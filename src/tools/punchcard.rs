//! Tools for punchcard progress and reward claims
//!
//! This module implements the punchcard_progress and punchcard_claim MCP
//! tools.

use chrono::NaiveDateTime;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{sequential_holes, PunchHole};
use crate::domain::{
    draw_jackpot, CatchUp, CategoryRef, DomainError, HabitWithCategory, Reward, RewardSpec,
    Session,
};
use crate::storage::{HabitStorage, RewardStorage};
use crate::tools::{parse_habit_id, ToolError};

/// Parameters for viewing punchcards
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct PunchcardProgressParams {
    /// ID of a specific habit (optional - shows every punchcard if omitted)
    pub habit_id: Option<String>,
}

/// Parameters for claiming a full punchcard
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClaimPunchcardParams {
    pub habit_id: String,
}

/// One habit's punchcard as shown on the punchcards page
#[derive(Debug, Serialize)]
pub struct PunchcardProgress {
    pub habit_id: String,
    pub habit_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    pub current: u32,
    pub target: u32,
    #[serde(flatten)]
    pub catch_up: CatchUp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<RewardSpec>,
    pub ready_to_claim: bool,
    pub holes: Vec<PunchHole>,
}

/// Response from viewing punchcards
#[derive(Debug, Serialize)]
pub struct PunchcardProgressResponse {
    pub punchcards: Vec<PunchcardProgress>,
    pub message: String,
}

/// What a claim paid out
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaimedReward {
    Direct { text: String },
    Jackpot { reward: Reward },
    None,
}

/// Response from claiming a punchcard
#[derive(Debug, Serialize)]
pub struct ClaimPunchcardResponse {
    pub habit_id: String,
    pub reward: ClaimedReward,
    pub message: String,
}

/// Show punchcard progress, counting completions made since each card was
/// last viewed, and mark the cards as viewed
pub fn get_punchcard_progress<S: HabitStorage>(
    storage: &S,
    session: &Session,
    now: NaiveDateTime,
    params: PunchcardProgressParams,
) -> Result<PunchcardProgressResponse, ToolError> {
    let habits: Vec<HabitWithCategory> = match params.habit_id.as_deref() {
        Some(raw) => {
            let habit_id = parse_habit_id(raw)?;
            let found = storage.get_habit(&session.user_id, &habit_id)?;
            if !found.habit.punchcard.enabled {
                return Err(ToolError::InvalidParams(format!(
                    "'{}' has no punchcard. Enable one with habit_update",
                    found.habit.name
                )));
            }
            vec![found]
        }
        None => storage
            .list_habits(&session.user_id, true)?
            .into_iter()
            .filter(|h| h.habit.punchcard.enabled)
            .collect(),
    };

    let mut punchcards = Vec::with_capacity(habits.len());
    for HabitWithCategory { mut habit, category } in habits {
        let new = storage.count_completions_after(&habit.id, habit.punchcard.last_checked)?;
        let catch_up = habit.punchcard.catch_up(new);

        habit.punchcard.last_checked = now;
        storage.save_punchcard(&habit.id, &habit.punchcard)?;

        punchcards.push(PunchcardProgress {
            habit_id: habit.id.to_string(),
            habit_name: habit.name,
            category,
            current: habit.punchcard.current,
            target: habit.punchcard.target,
            ready_to_claim: habit.punchcard.is_full(),
            holes: sequential_holes(catch_up.display_total, habit.punchcard.target),
            catch_up,
            reward: habit.punchcard.reward,
        });
    }

    let message = if punchcards.is_empty() {
        "No punchcards yet. Turn one on with habit_update (punchcard_enabled: true).".to_string()
    } else {
        punchcards
            .iter()
            .map(|p| {
                let mut line = format!(
                    "🎟️ {} {}/{}",
                    p.habit_name, p.catch_up.display_total, p.target
                );
                if p.catch_up.new_completions > 0 {
                    line.push_str(&format!(" (+{} new)", p.catch_up.new_completions));
                }
                if p.ready_to_claim {
                    line.push_str(" - ready to claim!");
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(PunchcardProgressResponse { punchcards, message })
}

/// Claim a full punchcard: pay out its reward and reset it
pub fn claim_punchcard<S, R>(
    storage: &S,
    session: &Session,
    now: NaiveDateTime,
    params: ClaimPunchcardParams,
    rng: &mut R,
) -> Result<ClaimPunchcardResponse, ToolError>
where
    S: HabitStorage + RewardStorage,
    R: Rng + ?Sized,
{
    let habit_id = parse_habit_id(&params.habit_id)?;
    let mut habit = storage.get_habit(&session.user_id, &habit_id)?.habit;

    if !habit.punchcard.enabled || !habit.punchcard.is_full() {
        return Err(DomainError::PunchcardIncomplete {
            current: habit.punchcard.current,
            target: habit.punchcard.target,
        }
        .into());
    }

    let reward = match &habit.punchcard.reward {
        Some(RewardSpec::Direct { text }) => ClaimedReward::Direct { text: text.clone() },
        Some(RewardSpec::Jackpot { bag }) => {
            let pool = storage.list_rewards(&session.user_id, true)?;
            let drawn = draw_jackpot(&pool, *bag, rng).cloned().ok_or_else(|| {
                DomainError::Validation {
                    message: format!(
                        "The {} bag has no active rewards. Add one with reward_create first",
                        bag.as_str()
                    ),
                }
            })?;
            ClaimedReward::Jackpot { reward: drawn }
        }
        None => ClaimedReward::None,
    };

    habit.punchcard.claim(now)?;
    storage.save_punchcard(&habit.id, &habit.punchcard)?;

    tracing::info!("Claimed punchcard for habit {}", habit.id);

    let message = match &reward {
        ClaimedReward::Direct { text } => format!("🏆 '{}' card complete! You earned: {}", habit.name, text),
        ClaimedReward::Jackpot { reward } => {
            format!("🎰 Jackpot! '{}' card complete. You won: {}", habit.name, reward.name)
        }
        ClaimedReward::None => format!("🏆 '{}' card complete! Starting a fresh card.", habit.name),
    };

    Ok(ClaimPunchcardResponse {
        habit_id: habit.id.to_string(),
        reward,
        message,
    })
}
