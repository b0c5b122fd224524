pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "notebook")]
#[command(about = "Notebook CLI - operator tooling for the notes and chat API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Mint a session token for a user")]
    Token(commands::token::TokenArgs),

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Print the resolved configuration (YAML unless --json)")]
    Config,

    #[command(about = "Check the health endpoint of a running server")]
    Health(commands::health::HealthArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token(args) => commands::token::handle(args, output_format).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Config => commands::config::handle(output_format).await,
        Commands::Health(args) => commands::health::handle(args, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_command() {
        let cli = Cli::parse_from([
            "notebook",
            "--json",
            "token",
            "--user",
            "3f2504e0-4f89-41d3-9a0c-0305e82c3301",
            "--email",
            "a@example.com",
        ]);
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        match cli.command {
            Commands::Token(args) => {
                assert_eq!(args.user.to_string(), "3f2504e0-4f89-41d3-9a0c-0305e82c3301");
                assert_eq!(args.email.as_deref(), Some("a@example.com"));
            }
            _ => panic!("expected token command"),
        }
    }

    #[test]
    fn health_defaults_to_local_server() {
        let cli = Cli::parse_from(["notebook", "health"]);
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Text);
        match cli.command {
            Commands::Health(args) => assert_eq!(args.url, "http://localhost:3000"),
            _ => panic!("expected health command"),
        }
    }

    #[test]
    fn rejects_malformed_user_id() {
        assert!(Cli::try_parse_from(["notebook", "token", "--user", "nope"]).is_err());
    }
}
