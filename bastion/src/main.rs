use std::path::PathBuf;

use bastion::{Bastion, BastionBuilder, Settings, SqliteRepositoryProvider};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Command line interface for Bastion
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON settings file
    #[arg(long, default_value = "appsettings.json")]
    settings: PathBuf,

    /// Database connection string
    #[arg(long, default_value = "sqlite://bastion.db?mode=rwc")]
    db_url: String,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load the settings and validate the configured policies
    CheckPolicies,
    /// Show the lockout status of an account
    Status { account: String },
    /// Clear the failure record of an account
    Unlock { account: String },
    /// Print version information
    Version,
}

async fn connect(cli: &Cli) -> Result<Bastion<SqliteRepositoryProvider>, Box<dyn std::error::Error>> {
    let settings = Settings::from_file(&cli.settings)?;
    let bastion = BastionBuilder::new()
        .with_settings(settings)
        .with_sqlite(&cli.db_url)
        .await?
        .apply_migrations(matches!(cli.command, Commands::Migrate))
        .build()
        .await?;
    Ok(bastion)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Migrate => {
            connect(&cli).await?;
            println!("Migrations applied");
        }
        Commands::CheckPolicies => {
            let bastion = connect(&cli).await?;
            for name in bastion.policies().policy_names() {
                if let Some(rule) = bastion.policies().rule(name) {
                    match &rule.required_claim {
                        Some(claim) => println!(
                            "{name}: role {} and claim {} = {}",
                            rule.required_role, claim.claim_type, claim.expected_value
                        ),
                        None => println!("{name}: role {}", rule.required_role),
                    }
                }
            }
        }
        Commands::Status { account } => {
            let status = connect(&cli).await?.lockout_status(account).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Unlock { account } => {
            if connect(&cli).await?.unlock_account(account).await? {
                println!("{account} unlocked");
            } else {
                println!("{account} was not locked");
            }
        }
        Commands::Version => {
            println!("Bastion v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
