use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracklink::config::Config;
use tracklink::links::{create_with_generated_slug, is_valid_slug, MAX_SLUG_LENGTH};
use tracklink::storage::{self, StorageError};

#[derive(Parser)]
#[command(name = "tracklink-admin")]
#[command(about = "Tracklink link management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a tracking link
    Create {
        /// Display name of the link
        name: String,
        /// Slug to use (random 6-character slug when omitted)
        #[arg(long)]
        slug: Option<String>,
        /// Owner recorded on the link
        #[arg(long)]
        created_by: Option<String>,
    },
    /// List tracking links, newest first
    List {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Delete a tracking link and its visits
    Delete {
        slug: String,
    },
    /// List recorded visits, newest first
    Visits {
        /// Only show visits for this slug
        slug: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let storage = storage::connect(&config.database).await?;

    match cli.command {
        Commands::Create {
            name,
            slug,
            created_by,
        } => {
            if name.trim().is_empty() {
                bail!("name cannot be empty");
            }
            let name = name.trim();
            let result = match slug.as_deref() {
                Some(slug) if !is_valid_slug(slug) => bail!(
                    "slug must be 1-{MAX_SLUG_LENGTH} characters of lowercase letters, digits or '-'"
                ),
                Some(slug) => storage.create_link(name, slug, created_by.as_deref()).await,
                None => {
                    create_with_generated_slug(storage.as_ref(), name, created_by.as_deref()).await
                }
            };

            match result {
                Ok(link) => {
                    println!("✓ Created link '{}' ({})", link.name, link.slug);
                    println!("  {}/{}", config.track_base_url, link.slug);
                }
                Err(StorageError::Conflict) => {
                    bail!("slug '{}' is already in use", slug.unwrap_or_default())
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::List { limit } => {
            let links = storage.list_links(limit, 0).await?;
            if links.is_empty() {
                println!("No tracking links found.");
            } else {
                println!("{:<24} {:<30} {}", "Slug", "Name", "Tracking URL");
                println!("{}", "-".repeat(100));
                for link in links {
                    println!(
                        "{:<24} {:<30} {}/{}",
                        link.slug, link.name, config.track_base_url, link.slug
                    );
                }
            }
        }
        Commands::Delete { slug } => {
            if storage.delete_link(&slug).await? {
                println!("✓ Deleted link '{}'", slug);
            } else {
                println!("⚠ No link with slug '{}'", slug);
            }
        }
        Commands::Visits { slug, limit } => {
            let visits = match slug.as_deref() {
                Some(slug) => storage.list_visits_for_link(slug, limit, 0).await?,
                None => storage.list_visits(limit, 0).await?,
            };
            if visits.is_empty() {
                println!("No visits recorded.");
            } else {
                println!(
                    "{:<20} {:<16} {:<40} {:<8} {}",
                    "Time", "Link", "IP", "Private", "Source"
                );
                println!("{}", "-".repeat(110));
                for entry in visits {
                    let time = chrono::DateTime::from_timestamp(entry.visit.visit_time, 0)
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| entry.visit.visit_time.to_string());
                    println!(
                        "{:<20} {:<16} {:<40} {:<8} {}",
                        time,
                        entry.link_slug,
                        entry.visit.ip_address,
                        entry.visit.is_private_ip,
                        entry.visit.ip_source
                    );
                }
            }
        }
    }

    Ok(())
}
