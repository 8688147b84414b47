// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl node` - Node inspection commands

use clap::{Args, Subcommand};

use crate::client::ControlClient;
use crate::output::{format_time_ago, render_table, OutputFormat};

#[derive(Args)]
pub struct NodeArgs {
    #[command(subcommand)]
    pub command: NodeCommand,
}

#[derive(Subcommand)]
pub enum NodeCommand {
    /// List registered nodes
    List,
}

pub async fn run(client: &ControlClient, cmd: NodeCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        NodeCommand::List => {
            let nodes = client.list_nodes().await?;
            render_table(&nodes, format, &["ID", "HOSTNAME", "STATUS", "LAST HEARTBEAT"], |n| {
                vec![n.id.to_string(), n.hostname.clone(), n.status.to_string(), format_time_ago(n.last_heartbeat_at_ms)]
            })?;
        }
    }
    Ok(())
}
