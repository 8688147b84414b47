// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl run` - Run inspection commands

use clap::{Args, Subcommand};

use crate::client::ControlClient;
use crate::output::{render, render_table, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    #[command(subcommand)]
    pub command: RunCommand,
}

#[derive(Subcommand)]
pub enum RunCommand {
    /// Show a run
    Show { id: String },
    /// List a run's events
    Events {
        id: String,
        /// Only events with seq strictly greater than this
        #[arg(long, default_value_t = 0)]
        from_seq: u64,
    },
}

pub async fn run(client: &ControlClient, cmd: RunCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RunCommand::Show { id } => {
            let run = client.get_run(&id).await?;
            render(&run, format, |r| {
                println!("id:       {}", r.id);
                println!("task:     {}", r.task_id);
                println!("status:   {}", r.status);
                if let Some(node_id) = r.node_id {
                    println!("node:     {node_id}");
                }
                if let Some(error) = &r.error {
                    println!("error:    {error}");
                }
            })?;
        }
        RunCommand::Events { id, from_seq } => {
            let events = client.run_events(&id, from_seq).await?;
            render_table(&events, format, &["SEQ", "TYPE", "TIMESTAMP"], |e| {
                vec![e.seq.to_string(), e.event_type.to_string(), e.timestamp_ms.to_string()]
            })?;
        }
    }
    Ok(())
}
