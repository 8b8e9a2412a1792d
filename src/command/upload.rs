// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use async_trait::async_trait;
use clap::Parser;
use log::{error, warn};
use tabled::{settings::Style, Table, Tabled};
use tokio::{select, signal};

use super::Context;
use crate::{
    error::{self, Result},
    upload::{Job, Report, Status},
};

/// Upload media files to the selected project.
///
/// Press Ctrl-C to stop; files that have not started uploading yet are
/// skipped.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// An existing file reference the files are new versions of. A file with
    /// exactly the same size as the file reference is not uploaded again.
    #[arg(long)]
    reference: Option<String>,

    /// Notes to attach to every uploaded file.
    #[arg(long, default_value = "")]
    annotations: String,

    /// The files to upload.
    #[clap(required = true, value_hint = clap::ValueHint::FilePath)]
    files: Vec<PathBuf>,
}

impl Command {
    fn jobs(&self) -> Vec<Job> {
        self.files
            .iter()
            .map(|path| Job {
                remote_file_reference_id: self.reference.clone(),
                annotations: self.annotations.clone(),
                ..Job::new(path)
            })
            .collect()
    }
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "File Reference")]
    file_reference_id: String,
}

impl From<&Report> for Row {
    fn from(report: &Report) -> Self {
        let (result, file_reference_id) = match report.result {
            Ok(Status::Uploaded {
                ref file_reference_id,
            }) => ("Uploaded".to_owned(), file_reference_id.clone()),
            Ok(Status::Skipped {
                ref file_reference_id,
            }) => ("Unchanged".to_owned(), file_reference_id.clone()),
            Err(ref e) => (format!("Failed: {e}"), String::new()),
        };

        Self {
            file: report.job.local_path.display().to_string(),
            result,
            file_reference_id,
        }
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.login().await?;

        let mut batch = ctx.delegate.upload_files(self.jobs()).await?;
        let mut reports = vec![];
        let mut interrupted = false;
        loop {
            let report = select! {
                report = batch.next_report() => report,
                result = signal::ctrl_c(), if !interrupted => {
                    result?;
                    warn!("Interrupted; waiting for uploads in progress to stop");
                    interrupted = true;
                    batch.cancel();
                    continue;
                }
            };

            match report {
                Some(report) => reports.push(report),
                None => break,
            }
        }
        _ = batch.wait().await?;

        let failed = reports.iter().filter(|report| report.result.is_err()).count();
        println!(
            "{}",
            Table::new(reports.iter().map(Row::from)).with(Style::rounded())
        );

        if failed > 0 {
            error!("{} of {} files could not be uploaded", failed, reports.len());
            return Err(error::Error::Command);
        }
        Ok(())
    }
}
