/// Main entry point for the habit punchcard MCP server
///
/// Sets up logging, parses command line arguments and starts the server,
/// which listens for JSON-RPC requests over stdin/stdout.

use clap::Parser;
use tracing::info;

use habit_punchcard_mcp::config::Args;
use habit_punchcard_mcp::HabitTrackerServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(args.log_filter())
        .with_writer(std::io::stderr) // stdout is reserved for JSON-RPC
        .init();

    info!("Starting habit punchcard MCP server");

    let db_path = args.database_path()?;
    info!("Using database at: {}", db_path.display());

    let server = HabitTrackerServer::new(db_path).await?;
    server.run().await?;

    info!("Habit punchcard MCP server shutdown complete");
    Ok(())
}
