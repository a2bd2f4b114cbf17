mod cli;
mod config;
mod core;
mod server;
mod tools;
mod utils;

use cli::Cli;
use utils::logging;

/// Weather MCP Server
///
/// Exposes weather lookups (current, hourly ranges, detailed readings) and
/// timezone tools to MCP clients over stdio.
///
/// Usage: npx @modelcontextprotocol/inspector cargo run --bin mcp-server-weather
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments
    let config = Cli::parse_config()?;

    // Initialize logging based on environment
    logging::init_logging()?;

    if let Err(e) = server::run(config).await {
        tracing::error!("Failed to run Weather MCP server: {}", e);
        return Err(e);
    }

    Ok(())
}
