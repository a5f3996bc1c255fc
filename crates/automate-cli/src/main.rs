//! automate binary entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use automate_cli::cli::{Cli, Commands};
use automate_cli::{build_router, commands, repl, resolve_home};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let home = resolve_home(cli.home);
    let (router, config) = build_router(home, cli.config).await.map_err(|e| e as Box<dyn std::error::Error>)?;

    match cli.command {
        None => repl::run(&router, "cli", "local", None).await?,
        Some(Commands::Chat { agent, channel, user }) => {
            repl::run(&router, &channel, &user, agent.as_deref()).await?
        }
        Some(Commands::Agents { action }) => commands::agents(&router, action).await?,
        Some(Commands::Memory { action }) => commands::memory(&router, action).await?,
        Some(Commands::Jobs { action }) => commands::jobs(&router, action).await?,
        Some(Commands::Sessions { agent }) => commands::sessions(&router, agent).await?,
        Some(Commands::Skills { agent }) => commands::skills(&router, agent).await?,
        Some(Commands::Config) => commands::print_config(&config)?,
    }

    router.shutdown().await;
    Ok(())
}
