// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;

use super::Context;
use crate::error::{self, Result};

/// Show how an email address would sign in, without signing in.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The email address to look up. Defaults to the configured email.
    #[clap()]
    email: Option<String>,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let Some(email) = self.email.as_deref().or(ctx.email.as_deref()) else {
            error!("No email address given; pass one or set FRAMELINK_EMAIL");
            return Err(error::Error::Command);
        };

        println!("{}", ctx.delegate.classify(email).await?);
        Ok(())
    }
}
