//! Workplan CLI - command-line access to the catalog pickers
//!
//! Usage: workplan-cli [OPTIONS] <COMMAND>
//!
//! Exercises the same merge/filter/persist pipeline the intake form uses.
//! Supports JSON output for scripting.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use workplan_lib::{
    selector::{Commit, SelectorController},
    settings,
    store::{CacheDb, CustomEntry, CustomEntryStore, HttpRemote},
    taxonomy::{self, Taxonomy},
};

#[derive(Parser)]
#[command(name = "workplan-cli")]
#[command(version, about = "Workforce-planning catalog picker CLI", long_about = None)]
struct Cli {
    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Acting user (custom entries are stored per user; omit for
    /// taxonomy-only mode)
    #[arg(long, short, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Domain {
    Organizations,
    Locations,
}

impl Domain {
    fn taxonomy(self) -> &'static Taxonomy {
        match self {
            Domain::Organizations => taxonomy::organizations(),
            Domain::Locations => taxonomy::locations(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the valid groups for a domain
    Groups {
        #[arg(long, short, value_enum, default_value = "organizations")]
        domain: Domain,
    },
    /// Search the merged catalog (taxonomy + the user's custom entries)
    Search {
        /// Query text; empty shows the full catalog
        #[arg(default_value = "")]
        query: String,
        #[arg(long, short, value_enum, default_value = "organizations")]
        domain: Domain,
    },
    /// Register a custom entry for the acting user
    Add {
        name: String,
        /// Group to file it under (defaults to Custom)
        #[arg(long, short)]
        group: Option<String>,
        #[arg(long, short, value_enum, default_value = "organizations")]
        domain: Domain,
    },
    /// Show the acting user's custom entries
    Custom {
        #[arg(long, short, value_enum, default_value = "organizations")]
        domain: Domain,
        /// Read only the local cache, skipping the remote store
        #[arg(long)]
        cached: bool,
    },
    /// Configure the remote store
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set the remote store API root (empty to clear)
    RemoteUrl { url: String },
    /// Set the remote store API key (empty to clear)
    ApiKey { key: String },
    /// Show the current configuration
    Show,
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("com.workplan.app"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn open_store(domain: Domain) -> Result<CustomEntryStore<HttpRemote>, String> {
    let tax = domain.taxonomy();
    let remote = settings::get_remote_url()
        .map(|url| HttpRemote::new(&url, settings::get_remote_api_key(), tax.domain()));
    let cache_path = settings::get_cache_path(&app_data_dir());
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;
    }
    let cache = CacheDb::new(&cache_path)
        .map_err(|e| format!("Failed to open cache db at {:?}: {}", cache_path, e))?;
    Ok(CustomEntryStore::new(tax.domain(), remote, Arc::new(cache)))
}

/// Group a user's custom entries in taxonomy group order, listed as
/// stored: the output shows every entry even when the merged picker view
/// would drop one for shadowing a static item by name (only by case).
/// A group no longer in the taxonomy files under Custom.
fn group_custom_entries(tax: &Taxonomy, entries: &[CustomEntry]) -> Vec<(String, Vec<String>)> {
    tax.groups()
        .iter()
        .filter_map(|group| {
            let names: Vec<String> = entries
                .iter()
                .filter(|e| {
                    if tax.is_valid_group(&e.group) {
                        e.group == *group
                    } else {
                        *group == taxonomy::CUSTOM_GROUP
                    }
                })
                .map(|e| e.name.clone())
                .collect();
            if names.is_empty() {
                None
            } else {
                Some((group.to_string(), names))
            }
        })
        .collect()
}

#[tokio::main]
async fn main() {
    settings::init(app_data_dir());

    let cli = Cli::parse();
    if let Err(e) = run_cli(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Groups { domain } => {
            let tax = domain.taxonomy();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(tax.groups()).unwrap());
            } else {
                for group in tax.groups() {
                    println!("{}", group);
                }
            }
        }

        Commands::Search { query, domain } => {
            let tax = domain.taxonomy();
            let store = open_store(domain)?;
            let mut ctl =
                SelectorController::new(tax, store, cli.user.clone(), Box::new(|_: Commit| {}));
            ctl.activate().await;
            ctl.set_query(&query);
            let view = ctl.view();

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view).unwrap());
            } else {
                for section in &view.sections {
                    println!("{}", section.group);
                    for item in &section.items {
                        match &item.code {
                            Some(code) => println!("  {} [{}]", item.name, code),
                            None => println!("  {}", item.name),
                        }
                    }
                }
                if view.offer_add_custom {
                    println!("(no exact match - '{}' can be added as custom)", query.trim());
                }
            }
        }

        Commands::Add { name, group, domain } => {
            let tax = domain.taxonomy();
            let group = group.unwrap_or_else(|| taxonomy::CUSTOM_GROUP.to_string());
            if !tax.is_valid_group(&group) {
                return Err(format!(
                    "Unknown group '{}' for {} (see `workplan-cli groups`)",
                    group,
                    tax.domain()
                ));
            }
            let user = cli
                .user
                .clone()
                .ok_or("Adding a custom entry requires --user")?;
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err("Entry name is empty".to_string());
            }

            let store = open_store(domain)?;
            store.save(&user, &name, &group).await;
            // Re-read: the duplicate and offline save paths return nothing.
            let entries = store.list(&user).await;
            let saved = entries
                .iter()
                .find(|e| e.name.to_lowercase() == name.to_lowercase());

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&saved).unwrap());
            } else {
                match saved {
                    Some(e) => println!("Saved '{}' under {}", e.name, e.group),
                    None => println!("Save accepted (pending remote sync)"),
                }
            }
        }

        Commands::Custom { domain, cached } => {
            let user = cli
                .user
                .clone()
                .ok_or("Listing custom entries requires --user")?;
            let store = open_store(domain)?;
            let entries = if cached {
                store.cached(&user)
            } else {
                store.list(&user).await
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries).unwrap());
            } else if entries.is_empty() {
                println!("No custom entries for {}", user);
            } else {
                for (group, names) in group_custom_entries(domain.taxonomy(), &entries) {
                    println!("{}", group);
                    for name in names {
                        println!("  {}", name);
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::RemoteUrl { url } => {
                settings::set_remote_url(url)?;
                println!("Remote URL saved");
            }
            ConfigAction::ApiKey { key } => {
                settings::set_remote_api_key(key)?;
                println!("API key saved");
            }
            ConfigAction::Show => {
                let url = settings::get_remote_url().unwrap_or_else(|| "(not set)".to_string());
                let key = settings::get_remote_api_key()
                    .map(|k| "*".repeat(k.len().min(12)))
                    .unwrap_or_else(|| "(not set)".to_string());
                println!("remote_url: {}", url);
                println!("remote_api_key: {}", key);
                println!("cache_db: {:?}", settings::get_cache_path(&app_data_dir()));
            }
        },
    }

    Ok(())
}
