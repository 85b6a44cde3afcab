//! Command-line front end over the entity command layer.
//!
//! # Responsibility
//! - Wire configuration, logging and SQLite storage into `ThingCommands`.
//! - Print projected resources as JSON; report failures on stderr.

use clap::{Parser, Subcommand};
use entityms_core::db::{open_db, open_db_in_memory};
use entityms_core::{
    init_from_config, Projection, ServiceConfig, SqliteStore, ThingCommands,
    ThingRequest, ThingResource,
};
use futures::TryStreamExt;
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Used when `--config` is not given.
const DEFAULT_CONFIG: &str = r#"{
    "entities": [
        { "type": "item", "properties": ["TAG"] }
    ]
}"#;

#[derive(Parser, Debug)]
#[command(name = "entityms")]
#[command(version)]
#[command(about = "Create, find and list configured entities")]
struct Cli {
    /// JSON service configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file; overrides the configured path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an entity and print it
    Create {
        #[arg(long = "type")]
        entity_type: String,
        #[arg(long)]
        name: String,
        /// Tag value; repeat for several, order is kept
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Attribute value as TYPE=VALUE; repeat for several
        #[arg(long = "detail", value_parser = parse_detail)]
        details: Vec<(String, String)>,
    },
    /// Print one entity by guid
    Find {
        #[arg(long = "type")]
        entity_type: String,
        #[arg(long)]
        guid: String,
        /// NONE, SUMMARY, DETAILS or DEEP (default DETAILS)
        #[arg(long)]
        projection: Option<String>,
    },
    /// Print every entity of one type
    List {
        #[arg(long = "type")]
        entity_type: String,
        /// NONE, SUMMARY, DETAILS or DEEP (default SUMMARY)
        #[arg(long)]
        projection: Option<String>,
    },
    /// Check core linkage
    Ping,
}

fn parse_detail(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((value_type, value)) if !value_type.is_empty() => {
            Ok((value_type.to_string(), value.to_string()))
        }
        _ => Err(format!("expected TYPE=VALUE, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Command::Ping = cli.command {
        println!("entityms_core ping={}", entityms_core::ping());
        println!("entityms_core version={}", entityms_core::core_version());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::from_json_str(DEFAULT_CONFIG)?,
    };
    init_from_config(&config.logging)?;

    let conn = match cli.db.as_ref().or(config.database.path.as_ref()) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let commands = ThingCommands::sqlite(SqliteStore::new(conn), Arc::new(config.entity_service));

    match cli.command {
        Command::Create {
            entity_type,
            name,
            tags,
            details,
        } => {
            let request = tags
                .into_iter()
                .fold(ThingRequest::new(name), ThingRequest::with_tag);
            let request = details
                .into_iter()
                .fold(request, |request, (value_type, value)| {
                    request.with_detail(value_type, value)
                });
            let created = commands.create(&entity_type, &request).await?;
            info!("event=cli_create module=cli status=ok guid={}", created.guid);
            print_json(&created)?;
        }
        Command::Find {
            entity_type,
            guid,
            projection,
        } => {
            let projection = Projection::from_query(projection.as_deref(), Projection::Details)?;
            let found = commands.find(&entity_type, &guid, projection).await?;
            print_json(&found.project(projection))?;
        }
        Command::List {
            entity_type,
            projection,
        } => {
            let projection = Projection::from_query(projection.as_deref(), Projection::Summary)?;
            let listed: Vec<ThingResource> = commands
                .list(&entity_type)
                .map_ok(|thing| thing.project(projection))
                .try_collect()
                .await?;
            print_json(&listed)?;
        }
        Command::Ping => {}
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
