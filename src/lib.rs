use anyhow::Result;
use dotenvy::dotenv;

pub mod api;
pub mod config;
pub mod dashboard;
pub mod interface;
pub mod logger;
pub mod participant;
pub mod provider;
pub mod session;
pub mod utils;

/// Run the application: load `.env`, load config, and start the REPL.
///
/// When `enable_dashboard = true` in `debatbot.toml`, the web interface
/// is spawned as a background task alongside the CLI REPL.
pub async fn run() -> Result<()> {
    // API_KEY usually lives in .env
    dotenv().ok();

    let config = config::AppConfig::load();

    if config.enable_dashboard {
        interface::start_repl_with_dashboard(&config).await
    } else {
        interface::start_repl(&config).await
    }
}

// Re-exports for library consumers
pub use config::AppConfig;
pub use participant::Participant;
pub use provider::{GeminiQuestionProvider, QuestionProvider};
pub use session::{Session, SessionController, SessionState};
