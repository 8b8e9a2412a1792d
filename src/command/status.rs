// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use secrecy::ExposeSecret;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::error::Result;

/// Sign in and show the resulting session.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Also print the session token. Anyone holding it can act as you.
    #[arg(long)]
    show_token: bool,
}

#[derive(Tabled)]
struct Field {
    #[tabled(rename = "Field")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.login().await?;

        let delegate = &ctx.delegate;
        let mut fields = vec![];
        if let Some((email, email_type)) = delegate.signed_in_as().await {
            fields.push(Field {
                name: "Email",
                value: email,
            });
            fields.push(Field {
                name: "Sign-in method",
                value: email_type.to_string(),
            });
        }
        fields.push(Field {
            name: "User ID",
            value: delegate.user_id().await?,
        });
        fields.push(Field {
            name: "Project ID",
            value: delegate.project_id().await?.unwrap_or_default(),
        });
        if self.show_token {
            fields.push(Field {
                name: "Token",
                value: delegate.token().await?.expose_secret().clone(),
            });
        }

        println!("{}", Table::new(fields).with(Style::rounded()));
        Ok(())
    }
}
