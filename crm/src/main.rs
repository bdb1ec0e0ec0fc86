// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::{fields, TaskStatus};
use crm::config::Settings;
use crm::{Crm, FileStore};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Parser, Debug)]
#[command(name = "crm", version, about = "Manage CRM clients, tasks and billing data")]
struct Cli {
    /// Data directory (overrides CRM_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Do not seed sample data into an empty store
    #[arg(long, global = true)]
    no_auto_init: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed the user profile and sample data where missing
    Init,
    /// Show what the store holds
    Status,
    /// Print summary statistics
    Stats,
    /// List completed tasks waiting too long for payment
    Alerts,
    /// Export everything as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all data with an export file
    Import { file: PathBuf },
    /// Remove all data
    Clear,
    /// Remove all data and seed the samples again
    Reset,
    #[command(subcommand)]
    Clients(ClientCommand),
    #[command(subcommand)]
    Tasks(TaskCommand),
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    List(OrderArgs),
    Search { term: String },
    Show { id: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    List {
        #[command(flatten)]
        order: OrderArgs,
        /// Only tasks of this client
        #[arg(long)]
        client: Option<String>,
        /// Only tasks in this status
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    Search { term: String },
    SetStatus { id: String, status: TaskStatus },
    Delete { id: String },
}

#[derive(Args, Debug)]
struct OrderArgs {
    /// Sort field, prefixed with '-' for descending order
    #[arg(long, allow_hyphen_values = true)]
    order: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if cli.no_auto_init {
        settings.auto_init = false;
    }

    tracing::debug!("Using data directory {}", settings.data_dir.display());
    let crm = Crm::new(FileStore::new(&settings.data_dir));

    if settings.auto_init && !matches!(cli.command, Command::Clear | Command::Import { .. }) {
        crm.auto_initialize().context("Failed to initialise data")?;
    }

    run(&crm, cli.command)
}

fn run(crm: &Crm<FileStore>, command: Command) -> Result<()> {
    match command {
        Command::Init => {
            crm.initialize_all()?;
            print_json(&crm.check_existing_data())
        }
        Command::Status => print_json(&crm.check_existing_data()),
        Command::Stats => print_json(&crm.generate_stats()?),
        Command::Alerts => print_json(&crm.collection_alerts(fields::today())?),
        Command::Export { output } => {
            let envelope = crm.export_all_data()?;
            match output {
                Some(path) => {
                    let data = serde_json::to_string_pretty(&envelope)?;
                    fs::write(&path, data)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Exported data to {}", path.display());
                    Ok(())
                }
                None => print_json(&envelope),
            }
        }
        Command::Import { file } => {
            let data = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let envelope: Value = serde_json::from_str(&data)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            print_json(&crm.import_all_data(&envelope)?)
        }
        Command::Clear => {
            crm.clear_all_data()?;
            Ok(())
        }
        Command::Reset => {
            crm.reset_data()?;
            print_json(&crm.check_existing_data())
        }
        Command::Clients(command) => run_clients(crm, command),
        Command::Tasks(command) => run_tasks(crm, command),
    }
}

fn run_clients(crm: &Crm<FileStore>, command: ClientCommand) -> Result<()> {
    let clients = crm.clients();
    match command {
        ClientCommand::List(args) => match args.order {
            Some(order) => print_json(&clients.list(&order)),
            None => print_json(&crm.client_totals()?),
        },
        ClientCommand::Search { term } => print_json(&clients.search(&term, None)),
        ClientCommand::Show { id } => {
            let client = clients.find_by_id(&id)?;
            let tasks = crm.tasks().by_client(&id);
            print_json(&json!({ "cliente": client, "tareas": tasks }))
        }
        ClientCommand::Delete { id } => print_json(&clients.delete(&id)?),
    }
}

fn run_tasks(crm: &Crm<FileStore>, command: TaskCommand) -> Result<()> {
    let tasks = crm.tasks();
    match command {
        TaskCommand::List { order, client, status } => {
            let criteria = match status {
                Some(status) => json!({ "estado": status.as_str() }),
                None => json!({}),
            };
            let order = order.order.unwrap_or_else(|| "-ultima_actualizacion".to_string());
            let mut listed = tasks.filter(&criteria, &order);
            // Text criteria match substrings; client ids must match exactly.
            if let Some(client) = client {
                listed.retain(|task| task.client_id == client);
            }
            print_json(&listed)
        }
        TaskCommand::Search { term } => print_json(&tasks.search(&term, None)),
        TaskCommand::SetStatus { id, status } => {
            print_json(&tasks.update(&id, json!({ "estado": status.as_str() }))?)
        }
        TaskCommand::Delete { id } => print_json(&tasks.delete(&id)?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
