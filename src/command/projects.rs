// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::info;
use tabled::{settings::Style, Table};

use super::Context;
use crate::error::Result;

/// List the projects the signed-in user can upload to.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.login().await?;

        let projects = ctx.delegate.projects().await?;
        if projects.is_empty() {
            info!("This account has no projects");
        } else {
            println!("{}", Table::new(projects).with(Style::rounded()));
        }
        Ok(())
    }
}
