use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{EnrollCommand, OfferingCommand, PersonCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "aulanet")]
#[command(version)]
#[command(about = "Academic records dashboard CLI", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage people
    Person(PersonCommand),

    /// Manage offerings
    Offering(OfferingCommand),

    /// Manage enrollments
    Enroll(EnrollCommand),

    /// Force a full resynchronization from the records service
    Reload,

    /// Follow the change feed and report replica changes
    Watch,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Person(cmd)) => cmd.run(&config).await?,
        Some(Commands::Offering(cmd)) => cmd.run(&config).await?,
        Some(Commands::Enroll(cmd)) => cmd.run(&config).await?,
        Some(Commands::Reload) => commands::run_reload(&config).await?,
        Some(Commands::Watch) => commands::run_watch(&config).await?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
