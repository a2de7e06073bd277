use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod prompts;
mod terminal;

#[derive(Parser)]
#[command(name = "yiqu", about = "MMSE cognitive assessment with an AI assistant")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant; type `mmse` to start an assessment
    Chat,
    /// Run one MMSE assessment
    Mmse(commands::mmse::MmseArgs),
    /// Manage Spark API credentials
    Auth(commands::auth::AuthArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run().await,
        Commands::Mmse(args) => commands::mmse::run(args).await,
        Commands::Auth(args) => commands::auth::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_defaults_to_chat() {
        let cli = Cli::try_parse_from(["yiqu"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn mmse_flags_parse() {
        let cli = Cli::try_parse_from(["yiqu", "mmse", "--analyze", "--no-save", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Mmse(args)) => {
                assert!(args.analyze);
                assert!(args.no_save);
                assert!(args.output.is_none());
            }
            _ => panic!("expected mmse subcommand"),
        }
    }

    #[test]
    fn no_save_conflicts_with_output() {
        let result = Cli::try_parse_from(["yiqu", "mmse", "--no-save", "--output", "r.json"]);
        assert!(result.is_err());
    }
}
