// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `fleetctl` - operator-facing REST client for the control plane (§6).
//!
//! Thin: no orchestration of its own, only HTTP calls plus local rendering.

mod client;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};

use client::ControlClient;
use commands::{action, node, operation, run, task};
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "fleetctl", version, about = "Operate the fleet control plane")]
struct Cli {
    /// Control-plane base URL
    #[arg(long, env = "FLEET_API_URL", default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// Render output as JSON instead of a table/summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list, and inspect Tasks
    Task(task::TaskArgs),
    /// Inspect Runs and their Event streams
    Run(run::RunArgs),
    /// Create and inspect Operations
    Operation(operation::OperationArgs),
    /// Inspect Actions
    Action(action::ActionArgs),
    /// Inspect registered nodes
    Node(node::NodeArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };
    let client = ControlClient::new(cli.api_url);

    let result = match cli.command {
        Commands::Task(args) => task::run(&client, args.command, format).await,
        Commands::Run(args) => run::run(&client, args.command, format).await,
        Commands::Operation(args) => operation::run(&client, args.command, format).await,
        Commands::Action(args) => action::run(&client, args.command, format).await,
        Commands::Node(args) => node::run(&client, args.command, format).await,
    };

    if let Err(err) = result {
        let exit = err.downcast_ref::<ExitError>().map_or(1, |e| e.code);
        eprintln!("error: {err}");
        std::process::exit(exit);
    }
}
