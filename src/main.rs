// src/main.rs

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use forensicstore::Container;

#[derive(Parser)]
#[command(name = "forensicstore", version, about = "Handle forensicstore containers")]
struct Cli {
    #[command(subcommand)]
    command: Option<TopCommand>,
}

#[derive(Subcommand)]
enum TopCommand {
    /// Operate on items within a forensicstore container
    Item {
        #[command(subcommand)]
        command: ItemCommand,
    },
    /// Generate shell completion scripts
    Completions { shell: Shell },
}

#[derive(Subcommand)]
enum ItemCommand {
    /// Create an empty forensicstore container
    Create { store: String },
    /// Print a single item by id
    Get { id: String, store: String },
    /// Print every item of a given type
    Select { r#type: String, store: String },
    /// Print every item in the container
    All { store: String },
    /// Insert a new item from a JSON document
    Insert { json: String, store: String },
    /// Merge a partial JSON document into an existing item
    Update { id: String, json: String, store: String },
    /// Import another container's items and payloads
    Import { url: String, store: String },
    /// Export the container as a JSON interchange envelope
    Export { store: String, url: String },
    /// Validate a container's records and payload files
    Validate {
        store: String,
        #[arg(long)]
        no_fail: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let Some(command) = cli.command else {
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        TopCommand::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        TopCommand::Item { command } => run_item(command),
    }
}

fn run_item(command: ItemCommand) -> anyhow::Result<ExitCode> {
    match command {
        ItemCommand::Create { store } => {
            let container = Container::create(&store)?;
            container.close()?;
            Ok(ExitCode::SUCCESS)
        }
        ItemCommand::Get { id, store } => {
            let container = Container::create(&store)?;
            let item = container.get(&id)?;
            println!("{}", serde_json::to_string(&item)?);
            container.close()?;
            Ok(ExitCode::SUCCESS)
        }
        ItemCommand::Select { r#type, store } => {
            let container = Container::create(&store)?;
            let items = container.select(&r#type, &[])?;
            println!("{}", serde_json::to_string(&items)?);
            container.close()?;
            Ok(ExitCode::SUCCESS)
        }
        ItemCommand::All { store } => {
            let container = Container::create(&store)?;
            let items = container.all()?;
            println!("{}", serde_json::to_string(&items)?);
            container.close()?;
            Ok(ExitCode::SUCCESS)
        }
        ItemCommand::Insert { json, store } => {
            let mut container = Container::create(&store)?;
            let item: Value = serde_json::from_str(&json)?;
            let item = item
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("item must be a JSON object"))?
                .clone();
            let uid = container.insert(item)?;
            println!("{}", serde_json::to_string(&uid)?);
            container.close()?;
            Ok(ExitCode::SUCCESS)
        }
        ItemCommand::Update { id, json, store } => {
            let mut container = Container::create(&store)?;
            let partial: Value = serde_json::from_str(&json)?;
            let partial = partial
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("update must be a JSON object"))?
                .clone();
            let uid = container.update(&id, partial)?;
            println!("{}", serde_json::to_string(&uid)?);
            container.close()?;
            Ok(ExitCode::SUCCESS)
        }
        ItemCommand::Import { url, store } => {
            let mut container = Container::create(&store)?;
            container.import_container(&url)?;
            container.close()?;
            Ok(ExitCode::SUCCESS)
        }
        ItemCommand::Export { store, url } => {
            let container = Container::create(&store)?;
            container.export_interchange(&url)?;
            container.close()?;
            Ok(ExitCode::SUCCESS)
        }
        ItemCommand::Validate { store, no_fail } => {
            let container = Container::create(&store)?;
            let errors = container.validate()?;
            if !errors.is_empty() {
                println!("{}", serde_json::to_string(&errors)?);
            }
            let count = errors.len();
            container.close()?;
            if no_fail {
                return Ok(ExitCode::SUCCESS);
            }
            Ok(ExitCode::from(count.min(255) as u8))
        }
    }
}
