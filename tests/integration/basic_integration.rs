/// Integration tests driving the tools and the MCP server end to end
use chrono::NaiveDate;
use habit_punchcard_mcp::mcp::McpServer;
use habit_punchcard_mcp::tools::{
    claim_punchcard, create_habit, get_habit_status, get_punchcard_progress, get_week,
    list_categories, login_user, register_user, toggle_habit, ClaimPunchcardParams,
    ClaimedReward, CreateHabitParams, LoginParams, RegisterParams, StatusParams,
    ToggleHabitParams, WeekParams,
};
use habit_punchcard_mcp::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn habit_params(name: &str, category_id: Option<String>) -> CreateHabitParams {
    CreateHabitParams {
        name: name.to_string(),
        description: None,
        category_id,
        frequency_type: None,
        frequency_value: None,
        scheduled_days: None,
        monthly_day_of_week: None,
        monthly_week_occurrences: None,
        hide_when_quota_reached: false,
        punchcard_enabled: true,
        punchcard_target: Some(3),
        reward_type: Some("direct".to_string()),
        reward_text: Some("New book".to_string()),
        jackpot_bag: None,
    }
}

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[test]
    fn test_full_punchcard_workflow() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let storage = SqliteStorage::new(dir.path().join("habits.db")).unwrap();
        let analytics = AnalyticsEngine::new();

        let session = register_user(
            &storage,
            RegisterParams { name: "Sam".to_string(), pin: "4821".to_string() },
        )
        .unwrap()
        .session;

        let categories = list_categories(&storage, &session).unwrap().categories;
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        let fitness = categories.iter().find(|c| c.name == "Fitness").unwrap();

        let created = create_habit(
            &storage,
            &session,
            habit_params("Pushups", Some(fitness.id.to_string())),
        )
        .unwrap();
        assert_eq!(created.habit.category.as_ref().map(|c| c.name.as_str()), Some("Fitness"));

        let today = date(2024, 3, 13);
        for day in ["2024-03-11", "2024-03-12", "2024-03-13"] {
            toggle_habit(
                &storage,
                &session,
                today,
                ToggleHabitParams {
                    habit_id: created.habit_id.clone(),
                    date: Some(day.to_string()),
                    is_currently_completed: None,
                },
            )
            .unwrap();
        }

        let status = get_habit_status(&storage, &analytics, &session, today, StatusParams::default()).unwrap();
        assert_eq!(status.habits[0].current_streak, 3);
        assert!(status.habits[0].is_completed_today);

        let week = get_week(&storage, &analytics, &session, today, WeekParams::default()).unwrap();
        assert_eq!(week.week.stats.completed, 3);
        assert_eq!(week.week.stats.total_scheduled, 7);
        assert_eq!(week.week.holes.len(), 7);
        assert_eq!(week.week.holes[0].category_icon.as_deref(), Some("💪"));

        let noon = today.and_hms_opt(12, 0, 0).unwrap();
        let progress = get_punchcard_progress(&storage, &session, noon, Default::default()).unwrap();
        assert!(progress.punchcards[0].ready_to_claim);

        let claimed = claim_punchcard(
            &storage,
            &session,
            noon,
            ClaimPunchcardParams { habit_id: created.habit_id.clone() },
            &mut StdRng::seed_from_u64(11),
        )
        .unwrap();
        assert!(matches!(claimed.reward, ClaimedReward::Direct { ref text } if text == "New book"));

        let after = get_punchcard_progress(&storage, &session, noon, Default::default()).unwrap();
        assert_eq!(after.punchcards[0].current, 0);
        assert!(!after.punchcards[0].ready_to_claim);
    }

    #[test]
    fn test_data_survives_reopen_and_login() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("habits.db");

        let user_id = {
            let storage = SqliteStorage::new(db_path.clone()).unwrap();
            let session = register_user(
                &storage,
                RegisterParams { name: "Ana".to_string(), pin: "90210".to_string() },
            )
            .unwrap()
            .session;
            create_habit(&storage, &session, habit_params("Journal", None)).unwrap();
            session.user_id
        };

        let storage = SqliteStorage::new(db_path).unwrap();
        let session = login_user(&storage, LoginParams { pin: "90210".to_string() })
            .unwrap()
            .session;
        assert_eq!(session.user_id, user_id);
        assert_eq!(storage.list_habits(&session.user_id, true).unwrap().len(), 1);

        assert!(login_user(&storage, LoginParams { pin: "11111".to_string() }).is_err());
    }

    #[test]
    fn test_users_cannot_see_each_other() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let storage = SqliteStorage::new(dir.path().join("habits.db")).unwrap();

        let ana = register_user(&storage, RegisterParams { name: "Ana".to_string(), pin: "1111".to_string() })
            .unwrap()
            .session;
        let ben = register_user(&storage, RegisterParams { name: "Ben".to_string(), pin: "2222".to_string() })
            .unwrap()
            .session;

        let habit = create_habit(&storage, &ana, habit_params("Walk", None)).unwrap();
        let result = toggle_habit(
            &storage,
            &ben,
            date(2024, 3, 13),
            ToggleHabitParams {
                habit_id: habit.habit_id,
                date: None,
                is_currently_completed: None,
            },
        );
        assert!(matches!(
            result,
            Err(ToolError::Storage(StorageError::HabitNotFound { .. }))
        ));
    }

    #[test]
    fn test_mcp_session_over_json_lines() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("habits.db");

        tokio_test::block_on(async {
            let server = HabitTrackerServer::new(db_path).await.unwrap();
            let mut mcp = McpServer::new(server);

            let lines = [
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0"}}}"#,
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"account_register","arguments":{"name":"Sam","pin":"4821"}}}"#,
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"habit_create","arguments":{"name":"Read","frequency_type":"times_per_week","frequency_value":3}}}"#,
                r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"habit_status","arguments":{}}}"#,
            ];

            let mut responses = Vec::new();
            for line in lines {
                if let Some(response) = mcp.process_line(line).await {
                    responses.push(serde_json::to_value(response).unwrap());
                }
            }

            // the notification gets no reply
            assert_eq!(responses.len(), 4);
            assert!(responses.iter().all(|r| r.get("error").is_none()));

            let status_text = responses[3]["result"]["content"][0]["text"].as_str().unwrap();
            assert!(status_text.contains("Read"));
            assert!(status_text.contains("0/3 this week"));

            let garbage = mcp.process_line("{not json").await.unwrap();
            let garbage: Value = serde_json::to_value(garbage).unwrap();
            assert_eq!(garbage["error"]["code"], -32700);
        });
    }
}
