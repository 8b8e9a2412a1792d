// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::info;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::{
    error::Result,
    model::{Comment, FileReference, Timestamp},
};

/// Print the review comments left on an uploaded file.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Only show comments left at this position, in seconds.
    #[arg(long)]
    at: Option<f64>,

    /// The ID of the file reference to read comments from.
    #[clap()]
    file_reference_id: String,
}

#[derive(Tabled)]
struct Row<'a> {
    #[tabled(rename = "Time")]
    timestamp: Timestamp,
    #[tabled(rename = "User")]
    username: &'a str,
    #[tabled(rename = "Comment")]
    text: &'a str,
    #[tabled(rename = "Drawing")]
    drawing: &'static str,
}

impl<'a> Row<'a> {
    fn new(timestamp: Timestamp, comment: &'a Comment) -> Self {
        Self {
            timestamp,
            username: &comment.username,
            text: &comment.text,
            drawing: if comment.draw_data.is_some() { "yes" } else { "" },
        }
    }
}

fn rows(file_reference: &FileReference, at: Option<f64>) -> Vec<Row<'_>> {
    match at {
        Some(seconds) => file_reference
            .comments_at(seconds)
            .iter()
            .map(|comment| Row::new(Timestamp::from(seconds), comment))
            .collect(),
        None => file_reference
            .comments
            .iter()
            .flat_map(|(timestamp, comments)| {
                comments.iter().map(|comment| Row::new(*timestamp, comment))
            })
            .collect(),
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.login().await?;

        let file_reference = ctx.delegate.file_reference(&self.file_reference_id).await?;
        info!(
            "File reference {} is {} bytes",
            file_reference.id, file_reference.size
        );

        let rows = rows(&file_reference, self.at);
        if rows.is_empty() {
            info!("No comments found");
        } else {
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        Ok(())
    }
}
