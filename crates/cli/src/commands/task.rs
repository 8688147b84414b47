// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl task` - Task management commands

use std::collections::HashMap;

use clap::{Args, Subcommand};
use fleet_wire::request::{CreateTaskRequest, ExecuteTaskRequest};

use crate::client::ControlClient;
use crate::output::{format_time_ago, render, render_table, OutputFormat};

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Create a task
    Create {
        /// Human-readable name
        name: String,
        /// Prompt passed to the agent
        #[arg(long)]
        prompt: String,
        /// Normalised driver name (e.g. claude-v1)
        #[arg(long)]
        agent_type: String,
        /// Parent task id, for a subtask
        #[arg(long)]
        parent_id: Option<String>,
        /// Workspace directory hint
        #[arg(long)]
        workspace: Option<String>,
        /// Label key=value, repeatable
        #[arg(long = "label", value_parser = parse_key_value)]
        label: Vec<(String, String)>,
    },
    /// List tasks
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show a task
    Show { id: String },
    /// Show a task's full recursive subtree
    Tree { id: String },
    /// Delete a task, cascading its Runs/Events
    Delete { id: String },
    /// Derive and queue a Run from a task
    Execute { id: String },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())).ok_or_else(|| format!("expected key=value, got {s:?}"))
}

pub async fn run(client: &ControlClient, cmd: TaskCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TaskCommand::Create { name, prompt, agent_type, parent_id, workspace, label } => {
            let req = CreateTaskRequest {
                name,
                parent_id,
                prompt,
                workspace,
                security: Default::default(),
                labels: label.into_iter().collect::<HashMap<_, _>>(),
                agent_type,
                template_id: None,
            };
            let task = client.create_task(&req).await?;
            render(&task, format, |t| println!("created task {} ({})", t.id, t.name))?;
        }
        TaskCommand::List { status, search, limit } => {
            let mut params = vec![("limit", limit.to_string())];
            if let Some(status) = status {
                params.push(("status", status));
            }
            if let Some(search) = search {
                params.push(("search", search));
            }
            let page = client.list_tasks(&params).await?;
            render_table(&page.items, format, &["ID", "NAME", "STATUS", "AGENT", "CREATED"], |t| {
                vec![t.id.to_string(), t.name.clone(), t.status.to_string(), t.spec.agent_type.clone(), format_time_ago(t.created_at_ms)]
            })?;
        }
        TaskCommand::Show { id } => {
            let task = client.get_task(&id).await?;
            render(&task, format, |t| {
                println!("id:        {}", t.id);
                println!("name:      {}", t.name);
                println!("status:    {}", t.status);
                println!("agent:     {}", t.spec.agent_type);
                println!("prompt:    {}", t.spec.prompt);
                if let Some(parent) = t.parent_id {
                    println!("parent:    {parent}");
                }
                println!("created:   {}", format_time_ago(t.created_at_ms));
            })?;
        }
        TaskCommand::Tree { id } => {
            let tree = client.task_tree(&id).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tree)?),
                OutputFormat::Text => print_tree(&tree, 0),
            }
        }
        TaskCommand::Delete { id } => {
            client.delete_task(&id).await?;
            println!("deleted task {id}");
        }
        TaskCommand::Execute { id } => {
            let resp = client.execute_task(&id, &ExecuteTaskRequest::default()).await?;
            render(&resp, format, |r| println!("queued run {} ({})", r.run_id, r.status))?;
        }
    }
    Ok(())
}

fn print_tree(node: &fleet_wire::response::TaskTreeResponse, depth: usize) {
    println!("{}{} [{}] {}", "  ".repeat(depth), node.task.id, node.task.status, node.task.name);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}
