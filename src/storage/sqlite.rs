//! SQLite implementation of the storage traits
//!
//! This module provides the concrete SQLite implementation for storing
//! and retrieving users, categories, habits, completions and rewards. It
//! handles all SQL queries and the conversion between rows and domain types.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::domain::{
    default_categories, weekday_from_index, weekday_index, Category, CategoryId, CategoryRef,
    Completion, CompletionId, FrequencyType, Habit, HabitId, HabitWithCategory, PunchcardConfig,
    Reward, RewardBag, RewardId, RewardSpec, Schedule, User, UserId,
};
use crate::storage::{migrations, HabitStorage, RewardStorage, StorageError, UserStorage};

/// Fixed-width local timestamp format so stored values sort as text
const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

const HABIT_COLUMNS: &str = "h.id, h.user_id, h.category_id, h.name, h.description,
    h.frequency_type, h.frequency_value, h.scheduled_days, h.monthly_day_of_week,
    h.monthly_week_occurrences, h.hide_when_quota_reached, h.punchcard_enabled,
    h.punchcard_target, h.punchcard_current, h.punchcard_last_checked, h.reward_type,
    h.reward_text, h.jackpot_bag, h.created_at, h.is_active,
    c.id, c.name, c.color, c.icon";

/// SQLite-based storage implementation
///
/// This struct holds a connection to the SQLite database and implements
/// every storage trait the tools depend on.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database file and bring its schema up to date
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// A throwaway database, used by tests
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute("PRAGMA foreign_keys = ON", []).map_err(|e| {
            StorageError::Connection(format!("Failed to enable foreign keys: {}", e))
        })?;

        migrations::initialize_database(&conn)?;
        Ok(Self { conn })
    }

    fn habit_query(filter: &str) -> String {
        format!(
            "SELECT {} FROM habits h LEFT JOIN categories c ON c.id = h.category_id WHERE {}",
            HABIT_COLUMNS, filter
        )
    }
}

// Row conversion helpers

fn invalid_column(idx: usize, what: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(idx, what.to_string(), Type::Text)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn local_to_sql(dt: &NaiveDateTime) -> String {
    dt.format(LOCAL_DATETIME_FORMAT).to_string()
}

fn day_start(date: NaiveDate) -> String {
    local_to_sql(&date.and_time(NaiveTime::MIN))
}

fn parse_id<T>(
    row: &Row,
    idx: usize,
    parse: fn(&str) -> Result<T, uuid::Error>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|_| invalid_column(idx, "Invalid UUID"))
}

fn parse_optional_id<T>(
    row: &Row,
    idx: usize,
    parse: fn(&str) -> Result<T, uuid::Error>,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse(&s).map_err(|_| invalid_column(idx, "Invalid UUID")))
        .transpose()
}

fn parse_utc(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid_column(idx, "Invalid datetime"))
}

fn parse_local(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|_| invalid_column(idx, "Invalid local datetime"))
}

fn parse_json<T: serde::de::DeserializeOwned>(
    row: &Row,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|_| invalid_column(idx, "Invalid JSON")))
        .transpose()
}

fn schedule_from_row(row: &Row) -> rusqlite::Result<Schedule> {
    let frequency_type: String = row.get(5)?;
    let frequency_type: FrequencyType = frequency_type
        .parse()
        .map_err(|_| invalid_column(5, "Invalid frequency type"))?;

    let scheduled_days = parse_json::<Vec<u8>>(row, 7)?
        .map(|indices| {
            indices
                .into_iter()
                .map(|i| weekday_from_index(i).ok_or_else(|| invalid_column(7, "Invalid weekday")))
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .transpose()?;

    let monthly_day_of_week = row
        .get::<_, Option<u8>>(8)?
        .map(|i| weekday_from_index(i).ok_or_else(|| invalid_column(8, "Invalid weekday")))
        .transpose()?;

    Ok(Schedule {
        frequency_type,
        frequency_value: row.get(6)?,
        scheduled_days,
        monthly_day_of_week,
        monthly_week_occurrences: parse_json::<Vec<u32>>(row, 9)?.unwrap_or_default(),
    })
}

fn reward_spec_from_row(row: &Row) -> rusqlite::Result<Option<RewardSpec>> {
    let reward_type: Option<String> = row.get(15)?;
    match reward_type.as_deref() {
        None => Ok(None),
        Some("direct") => {
            let text: Option<String> = row.get(16)?;
            Ok(text.map(|text| RewardSpec::Direct { text }))
        }
        Some("jackpot") => {
            let bag: Option<String> = row.get(17)?;
            let bag = match bag {
                Some(b) => b.parse().map_err(|_| invalid_column(17, "Invalid reward bag"))?,
                None => RewardBag::default(),
            };
            Ok(Some(RewardSpec::Jackpot { bag }))
        }
        Some(_) => Err(invalid_column(15, "Invalid reward type")),
    }
}

/// reward_type, reward_text and jackpot_bag columns
type RewardColumns = (Option<&'static str>, Option<String>, Option<&'static str>);

fn reward_spec_to_columns(spec: &Option<RewardSpec>) -> RewardColumns {
    match spec {
        None => (None, None, None),
        Some(RewardSpec::Direct { text }) => (Some("direct"), Some(text.clone()), None),
        Some(RewardSpec::Jackpot { bag }) => (Some("jackpot"), None, Some(bag.as_str())),
    }
}

fn habit_from_row(row: &Row) -> rusqlite::Result<HabitWithCategory> {
    let punchcard = PunchcardConfig {
        enabled: row.get(11)?,
        target: row.get(12)?,
        current: row.get(13)?,
        last_checked: parse_local(row, 14)?,
        reward: reward_spec_from_row(row)?,
    };

    let habit = Habit {
        id: parse_id(row, 0, HabitId::from_string)?,
        user_id: parse_id(row, 1, UserId::from_string)?,
        category_id: parse_optional_id(row, 2, CategoryId::from_string)?,
        name: row.get(3)?,
        description: row.get(4)?,
        schedule: schedule_from_row(row)?,
        hide_when_quota_reached: row.get(10)?,
        punchcard,
        created_at: parse_utc(row, 18)?,
        is_active: row.get(19)?,
    };

    let category = match parse_optional_id(row, 20, CategoryId::from_string)? {
        Some(id) => Some(CategoryRef {
            id,
            name: row.get(21)?,
            color: row.get(22)?,
            icon: row.get(23)?,
        }),
        None => None,
    };

    Ok(HabitWithCategory { habit, category })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_id(row, 0, UserId::from_string)?,
        name: row.get(1)?,
        pin_hash: row.get(2)?,
        created_at: parse_utc(row, 3)?,
    })
}

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: parse_id(row, 0, CategoryId::from_string)?,
        user_id: parse_id(row, 1, UserId::from_string)?,
        name: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
        created_at: parse_utc(row, 5)?,
    })
}

fn completion_from_row(row: &Row) -> rusqlite::Result<Completion> {
    Ok(Completion {
        id: parse_id(row, 0, CompletionId::from_string)?,
        habit_id: parse_id(row, 1, HabitId::from_string)?,
        completed_at: parse_local(row, 2)?,
    })
}

fn reward_from_row(row: &Row) -> rusqlite::Result<Reward> {
    let bag: String = row.get(4)?;
    Ok(Reward {
        id: parse_id(row, 0, RewardId::from_string)?,
        user_id: parse_id(row, 1, UserId::from_string)?,
        name: row.get(2)?,
        description: row.get(3)?,
        bag: bag.parse().map_err(|_| invalid_column(4, "Invalid reward bag"))?,
        is_active: row.get(5)?,
        created_at: parse_utc(row, 6)?,
    })
}

impl UserStorage for SqliteStorage {
    fn create_user(&self, user: &User) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO users (id, name, pin_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.id.to_string(),
                    user.name,
                    user.pin_hash,
                    user.created_at.to_rfc3339()
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::DuplicatePin
                } else {
                    StorageError::Query(e)
                }
            })?;

        tracing::debug!("Created user: {} ({})", user.name, user.id);
        Ok(())
    }

    fn find_user_by_pin_hash(&self, pin_hash: &str) -> Result<Option<User>, StorageError> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, pin_hash, created_at FROM users WHERE pin_hash = ?1",
                params![pin_hash],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn has_any_users(&self) -> Result<bool, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn create_category(&self, category: &Category) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO categories (id, user_id, name, color, icon, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    category.id.to_string(),
                    category.user_id.to_string(),
                    category.name,
                    category.color,
                    category.icon,
                    category.created_at.to_rfc3339()
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::DuplicateCategory {
                        name: category.name.clone(),
                    }
                } else {
                    StorageError::Query(e)
                }
            })?;

        tracing::debug!("Created category: {} ({})", category.name, category.id);
        Ok(())
    }

    fn create_default_categories(&self, user_id: &UserId) -> Result<usize, StorageError> {
        let mut added = 0;
        for category in default_categories(user_id) {
            added += self.conn.execute(
                "INSERT OR IGNORE INTO categories (id, user_id, name, color, icon, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    category.id.to_string(),
                    category.user_id.to_string(),
                    category.name,
                    category.color,
                    category.icon,
                    category.created_at.to_rfc3339()
                ],
            )?;
        }

        tracing::debug!("Seeded {} default categories for user {}", added, user_id);
        Ok(added)
    }

    fn get_category(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
    ) -> Result<Category, StorageError> {
        let result = self.conn.query_row(
            "SELECT id, user_id, name, color, icon, created_at FROM categories
             WHERE id = ?1 AND user_id = ?2",
            params![category_id.to_string(), user_id.to_string()],
            category_from_row,
        );

        match result {
            Ok(category) => Ok(category),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::CategoryNotFound {
                category_id: category_id.to_string(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn list_categories(&self, user_id: &UserId) -> Result<Vec<Category>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, color, icon, created_at FROM categories
             WHERE user_id = ?1 ORDER BY name",
        )?;

        let categories = stmt
            .query_map(params![user_id.to_string()], category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn update_category(&self, category: &Category) -> Result<(), StorageError> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE categories SET name = ?3, color = ?4, icon = ?5
                 WHERE id = ?1 AND user_id = ?2",
                params![
                    category.id.to_string(),
                    category.user_id.to_string(),
                    category.name,
                    category.color,
                    category.icon
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::DuplicateCategory {
                        name: category.name.clone(),
                    }
                } else {
                    StorageError::Query(e)
                }
            })?;

        if rows_affected == 0 {
            return Err(StorageError::CategoryNotFound {
                category_id: category.id.to_string(),
            });
        }

        tracing::debug!("Updated category: {} ({})", category.name, category.id);
        Ok(())
    }

    fn delete_category(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
    ) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
            params![category_id.to_string(), user_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::CategoryNotFound {
                category_id: category_id.to_string(),
            });
        }

        tracing::debug!("Deleted category: {}", category_id);
        Ok(())
    }
}

impl HabitStorage for SqliteStorage {
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let schedule = &habit.schedule;
        let scheduled_days = schedule
            .scheduled_days
            .as_ref()
            .map(|days| serde_json::to_string(&days.iter().map(|d| weekday_index(*d)).collect::<Vec<_>>()))
            .transpose()?;
        let occurrences = serde_json::to_string(&schedule.monthly_week_occurrences)?;
        let (reward_type, reward_text, jackpot_bag) = reward_spec_to_columns(&habit.punchcard.reward);

        self.conn.execute(
            "INSERT INTO habits (
                id, user_id, category_id, name, description, frequency_type, frequency_value,
                scheduled_days, monthly_day_of_week, monthly_week_occurrences,
                hide_when_quota_reached, punchcard_enabled, punchcard_target, punchcard_current,
                punchcard_last_checked, reward_type, reward_text, jackpot_bag, created_at, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.category_id.as_ref().map(|c| c.to_string()),
                habit.name,
                habit.description,
                schedule.frequency_type.as_str(),
                schedule.frequency_value,
                scheduled_days,
                schedule.monthly_day_of_week.map(weekday_index),
                occurrences,
                habit.hide_when_quota_reached,
                habit.punchcard.enabled,
                habit.punchcard.target,
                habit.punchcard.current,
                local_to_sql(&habit.punchcard.last_checked),
                reward_type,
                reward_text,
                jackpot_bag,
                habit.created_at.to_rfc3339(),
                habit.is_active
            ],
        )?;

        tracing::debug!("Created habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn get_habit(
        &self,
        user_id: &UserId,
        habit_id: &HabitId,
    ) -> Result<HabitWithCategory, StorageError> {
        let result = self.conn.query_row(
            &Self::habit_query("h.id = ?1 AND h.user_id = ?2"),
            params![habit_id.to_string(), user_id.to_string()],
            habit_from_row,
        );

        match result {
            Ok(habit) => Ok(habit),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let schedule = &habit.schedule;
        let scheduled_days = schedule
            .scheduled_days
            .as_ref()
            .map(|days| serde_json::to_string(&days.iter().map(|d| weekday_index(*d)).collect::<Vec<_>>()))
            .transpose()?;
        let occurrences = serde_json::to_string(&schedule.monthly_week_occurrences)?;
        let (reward_type, reward_text, jackpot_bag) = reward_spec_to_columns(&habit.punchcard.reward);

        let rows_affected = self.conn.execute(
            "UPDATE habits SET
                category_id = ?3,
                name = ?4,
                description = ?5,
                frequency_type = ?6,
                frequency_value = ?7,
                scheduled_days = ?8,
                monthly_day_of_week = ?9,
                monthly_week_occurrences = ?10,
                hide_when_quota_reached = ?11,
                punchcard_enabled = ?12,
                punchcard_target = ?13,
                punchcard_current = ?14,
                punchcard_last_checked = ?15,
                reward_type = ?16,
                reward_text = ?17,
                jackpot_bag = ?18,
                is_active = ?19
             WHERE id = ?1 AND user_id = ?2",
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.category_id.as_ref().map(|c| c.to_string()),
                habit.name,
                habit.description,
                schedule.frequency_type.as_str(),
                schedule.frequency_value,
                scheduled_days,
                schedule.monthly_day_of_week.map(weekday_index),
                occurrences,
                habit.hide_when_quota_reached,
                habit.punchcard.enabled,
                habit.punchcard.target,
                habit.punchcard.current,
                local_to_sql(&habit.punchcard.last_checked),
                reward_type,
                reward_text,
                jackpot_bag,
                habit.is_active
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit.id.to_string(),
            });
        }

        tracing::debug!("Updated habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn archive_habit(&self, user_id: &UserId, habit_id: &HabitId) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE habits SET is_active = 0 WHERE id = ?1 AND user_id = ?2",
            params![habit_id.to_string(), user_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        tracing::debug!("Archived habit: {}", habit_id);
        Ok(())
    }

    fn list_habits(
        &self,
        user_id: &UserId,
        active_only: bool,
    ) -> Result<Vec<HabitWithCategory>, StorageError> {
        let filter = if active_only {
            "h.user_id = ?1 AND h.is_active = 1 ORDER BY h.created_at"
        } else {
            "h.user_id = ?1 ORDER BY h.created_at"
        };

        let mut stmt = self.conn.prepare(&Self::habit_query(filter))?;
        let habits = stmt
            .query_map(params![user_id.to_string()], habit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(habits)
    }

    fn insert_completion(&self, completion: &Completion) -> Result<(), StorageError> {
        let completed_at = local_to_sql(&completion.completed_at);
        self.conn
            .execute(
                "INSERT INTO habit_completions (id, habit_id, completed_at) VALUES (?1, ?2, ?3)",
                params![
                    completion.id.to_string(),
                    completion.habit_id.to_string(),
                    completed_at
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::DuplicateEntry {
                        habit_id: completion.habit_id.to_string(),
                        completed_at: completed_at.clone(),
                    }
                } else {
                    StorageError::Query(e)
                }
            })?;

        tracing::debug!(
            "Recorded completion for habit {} at {}",
            completion.habit_id,
            completion.completed_at
        );
        Ok(())
    }

    fn delete_completions_on(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
    ) -> Result<usize, StorageError> {
        let next_day = date.succ_opt().unwrap_or(date);
        let removed = self.conn.execute(
            "DELETE FROM habit_completions
             WHERE habit_id = ?1 AND completed_at >= ?2 AND completed_at < ?3",
            params![habit_id.to_string(), day_start(date), day_start(next_day)],
        )?;

        tracing::debug!("Removed {} completion(s) for habit {} on {}", removed, habit_id, date);
        Ok(removed)
    }

    fn has_completion_on(&self, habit_id: &HabitId, date: NaiveDate) -> Result<bool, StorageError> {
        let next_day = date.succ_opt().unwrap_or(date);
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM habit_completions
             WHERE habit_id = ?1 AND completed_at >= ?2 AND completed_at < ?3",
            params![habit_id.to_string(), day_start(date), day_start(next_day)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn completions_for_user(
        &self,
        user_id: &UserId,
        since: NaiveDate,
    ) -> Result<Vec<Completion>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT hc.id, hc.habit_id, hc.completed_at
             FROM habit_completions hc
             JOIN habits h ON h.id = hc.habit_id
             WHERE h.user_id = ?1 AND hc.completed_at >= ?2
             ORDER BY hc.completed_at",
        )?;

        let completions = stmt
            .query_map(params![user_id.to_string(), day_start(since)], completion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }

    fn completions_for_habit(
        &self,
        habit_id: &HabitId,
        since: NaiveDate,
    ) -> Result<Vec<Completion>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, habit_id, completed_at FROM habit_completions
             WHERE habit_id = ?1 AND completed_at >= ?2
             ORDER BY completed_at",
        )?;

        let completions = stmt
            .query_map(params![habit_id.to_string(), day_start(since)], completion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }

    fn count_completions_after(
        &self,
        habit_id: &HabitId,
        after: NaiveDateTime,
    ) -> Result<u32, StorageError> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM habit_completions WHERE habit_id = ?1 AND completed_at > ?2",
            params![habit_id.to_string(), local_to_sql(&after)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn save_punchcard(
        &self,
        habit_id: &HabitId,
        punchcard: &PunchcardConfig,
    ) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE habits SET punchcard_current = ?2, punchcard_last_checked = ?3 WHERE id = ?1",
            params![
                habit_id.to_string(),
                punchcard.current,
                local_to_sql(&punchcard.last_checked)
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        tracing::debug!(
            "Saved punchcard for habit {}: {}/{}",
            habit_id,
            punchcard.current,
            punchcard.target
        );
        Ok(())
    }
}

impl RewardStorage for SqliteStorage {
    fn create_reward(&self, reward: &Reward) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO rewards (id, user_id, name, description, bag, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                reward.id.to_string(),
                reward.user_id.to_string(),
                reward.name,
                reward.description,
                reward.bag.as_str(),
                reward.is_active,
                reward.created_at.to_rfc3339()
            ],
        )?;

        tracing::debug!("Created reward: {} ({})", reward.name, reward.id);
        Ok(())
    }

    fn get_reward(&self, user_id: &UserId, reward_id: &RewardId) -> Result<Reward, StorageError> {
        let result = self.conn.query_row(
            "SELECT id, user_id, name, description, bag, is_active, created_at
             FROM rewards WHERE id = ?1 AND user_id = ?2",
            params![reward_id.to_string(), user_id.to_string()],
            reward_from_row,
        );

        match result {
            Ok(reward) => Ok(reward),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::RewardNotFound {
                reward_id: reward_id.to_string(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn list_rewards(&self, user_id: &UserId, active_only: bool) -> Result<Vec<Reward>, StorageError> {
        let mut sql = "SELECT id, user_id, name, description, bag, is_active, created_at
                       FROM rewards WHERE user_id = ?1"
            .to_string();

        if active_only {
            sql.push_str(" AND is_active = 1");
        }

        sql.push_str(" ORDER BY created_at");

        let mut stmt = self.conn.prepare(&sql)?;
        let rewards = stmt
            .query_map(params![user_id.to_string()], reward_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rewards)
    }

    fn update_reward(&self, reward: &Reward) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE rewards SET name = ?3, description = ?4, bag = ?5, is_active = ?6
             WHERE id = ?1 AND user_id = ?2",
            params![
                reward.id.to_string(),
                reward.user_id.to_string(),
                reward.name,
                reward.description,
                reward.bag.as_str(),
                reward.is_active
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::RewardNotFound {
                reward_id: reward.id.to_string(),
            });
        }

        tracing::debug!("Updated reward: {} ({})", reward.name, reward.id);
        Ok(())
    }

    fn delete_reward(&self, user_id: &UserId, reward_id: &RewardId) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM rewards WHERE id = ?1 AND user_id = ?2",
            params![reward_id.to_string(), user_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::RewardNotFound {
                reward_id: reward_id.to_string(),
            });
        }

        tracing::debug!("Deleted reward: {}", reward_id);
        Ok(())
    }
}
