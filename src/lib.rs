/// Public library interface for the habit punchcard MCP server
///
/// This module exports the server, the storage layer and the tool functions
/// so they can be driven from other applications or tests.

use std::path::PathBuf;
use thiserror::Error;

pub mod analytics;
pub mod config;
pub mod domain;
pub mod mcp;
pub mod storage;
pub mod tools;

pub use analytics::AnalyticsEngine;
pub use domain::*;
pub use storage::{HabitStorage, RewardStorage, SqliteStorage, StorageError, UserStorage};
pub use tools::ToolError;

/// Failures that stop the server itself. Tool failures never reach this;
/// they are answered as JSON-RPC errors.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("stdio error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Habit server state shared by every MCP request
///
/// Owns the SQLite store and the analytics engine. The logged-in session
/// lives on the MCP connection, not here.
pub struct HabitTrackerServer {
    storage: SqliteStorage,
    analytics: AnalyticsEngine,
}

impl HabitTrackerServer {
    /// Open (or create) the database at `db_path` and run migrations
    pub async fn new(db_path: PathBuf) -> Result<Self, ServerError> {
        tracing::info!("Initializing habit server with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;
        Ok(Self::from_parts(storage, AnalyticsEngine::new()))
    }

    pub fn from_parts(storage: SqliteStorage, analytics: AnalyticsEngine) -> Self {
        Self { storage, analytics }
    }

    /// Serve JSON-RPC over stdin/stdout until stdin closes
    pub async fn run(self) -> Result<(), ServerError> {
        if self.storage.has_any_users()? {
            tracing::info!("Server started, existing accounts found");
        } else {
            tracing::info!("Server started on an empty database; register to begin");
        }

        mcp::McpServer::new(self).run().await
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }
}
