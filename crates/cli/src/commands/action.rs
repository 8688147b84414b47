// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl action` - Action inspection commands

use clap::{Args, Subcommand};

use crate::client::ControlClient;
use crate::output::{render, OutputFormat};

#[derive(Args)]
pub struct ActionArgs {
    #[command(subcommand)]
    pub command: ActionCommand,
}

#[derive(Subcommand)]
pub enum ActionCommand {
    /// Show an action
    Show { id: String },
}

pub async fn run(client: &ControlClient, cmd: ActionCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ActionCommand::Show { id } => {
            let action = client.get_action(&id).await?;
            render(&action, format, |a| {
                println!("id:        {}", a.id);
                println!("operation: {}", a.operation_id);
                println!("status:    {}", a.status);
                println!("phase:     {}", a.phase.as_deref().unwrap_or("-"));
                println!("progress:  {}%", a.progress);
                if let Some(error) = &a.error {
                    println!("error:     {error}");
                }
            })?;
        }
    }
    Ok(())
}
