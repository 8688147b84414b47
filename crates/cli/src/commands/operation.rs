// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl operation` - Operation lifecycle commands

use clap::{Args, Subcommand};
use fleet_core::{NodeId, OperationType};
use fleet_wire::request::CreateOperationRequest;

use crate::client::ControlClient;
use crate::output::{render, render_table, OutputFormat};

#[derive(Args)]
pub struct OperationArgs {
    #[command(subcommand)]
    pub command: OperationCommand,
}

#[derive(Subcommand)]
pub enum OperationCommand {
    /// Create an operation (oauth, device_code, api_key, runtime_create, or a custom type)
    Create {
        /// oauth | device_code | api_key | runtime_create | <custom>
        #[arg(name = "type")]
        operation_type: String,
        /// Target node id
        #[arg(long)]
        node_id: String,
        /// Opaque JSON config, e.g. '{"name":"me@example.com","agent_type":"claude-v1"}'
        #[arg(long, default_value = "{}")]
        config: String,
    },
    /// List operations
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "type")]
        operation_type: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show an operation with its Actions
    Show { id: String },
}

pub async fn run(client: &ControlClient, cmd: OperationCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        OperationCommand::Create { operation_type, node_id, config } => {
            let config: serde_json::Value = serde_json::from_str(&config)?;
            let req = CreateOperationRequest {
                operation_type: OperationType::from(operation_type.as_str()),
                config,
                node_id: NodeId::from_string(node_id),
            };
            let resp = client.create_operation(&req).await?;
            render(&resp, format, |r| {
                println!("operation {} action {} status {}", r.operation_id, r.action_id, r.status);
                if let Some(account_id) = &r.account_id {
                    println!("account:  {account_id}");
                }
            })?;
        }
        OperationCommand::List { status, operation_type, limit } => {
            let mut params = vec![("limit", limit.to_string())];
            if let Some(status) = status {
                params.push(("status", status));
            }
            if let Some(operation_type) = operation_type {
                params.push(("search", operation_type));
            }
            let page = client.list_operations(&params).await?;
            render_table(&page.items, format, &["ID", "TYPE", "NODE", "STATUS"], |o| {
                vec![o.id.to_string(), o.operation_type.as_str().to_string(), o.node_id.to_string(), o.status.to_string()]
            })?;
        }
        OperationCommand::Show { id } => {
            let detail = client.get_operation(&id).await?;
            render(&detail, format, |d| {
                println!("id:       {}", d.operation.id);
                println!("type:     {}", d.operation.operation_type.as_str());
                println!("node:     {}", d.operation.node_id);
                println!("status:   {}", d.operation.status);
                for action in &d.actions {
                    println!("action:   {} [{}] {}", action.id, action.status, action.phase.as_deref().unwrap_or("-"));
                }
            })?;
        }
    }
    Ok(())
}
