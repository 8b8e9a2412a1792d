// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::info;
use tabled::{settings::Style, Table};

use super::Context;
use crate::error::Result;

/// List the collaborators on the selected project.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.login().await?;

        let collaborators = ctx.delegate.collaborators().await?;
        if collaborators.is_empty() {
            info!("Nobody else is working on this project");
        } else {
            println!("{}", Table::new(collaborators).with(Style::rounded()));
        }
        Ok(())
    }
}
