//! ContentForge CLI - migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cf-cli migrate
//!
//! # Create a user
//! cf-cli user create -e writer@example.com -p 'correct horse battery'
//!
//! # Crawl a sitemap and print the JSON report
//! cf-cli index-sitemap https://example.com/sitemap.xml --max-urls 100
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(author, version, about = "ContentForge CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Crawl a sitemap (or sitemap index) and print the URLs as JSON
    IndexSitemap {
        /// Sitemap URL
        url: String,

        /// Stop after this many page URLs
        #[arg(long)]
        max_urls: Option<usize>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `index-sitemap` output can be piped
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cf_cli=info,contentforge_api=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create { email, password } => {
                commands::user::create(&email, &password).await?;
            }
        },
        Commands::IndexSitemap { url, max_urls } => {
            let report = commands::crawl::index_sitemap(&url, max_urls).await?;
            #[allow(clippy::print_stdout)]
            {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_index_sitemap() {
        let cli = Cli::try_parse_from([
            "cf-cli",
            "index-sitemap",
            "https://example.com/sitemap.xml",
            "--max-urls",
            "25",
        ])
        .expect("parse");
        match cli.command {
            Commands::IndexSitemap { url, max_urls } => {
                assert_eq!(url, "https://example.com/sitemap.xml");
                assert_eq!(max_urls, Some(25));
            }
            _ => panic!("expected index-sitemap"),
        }
    }

    #[test]
    fn test_parses_user_create() {
        let cli = Cli::try_parse_from(["cf-cli", "user", "create", "-e", "a@b.co", "-p", "secret123"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Commands::User {
                action: UserAction::Create { .. }
            }
        ));
    }
}
