// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures_util::{future, stream, StreamExt as _};
use log::{info, warn};
use tokio::{
    fs, select,
    sync::{mpsc, Semaphore},
    task::JoinHandle,
};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::{
    api::{self, Api},
    error::{self, Error, Result},
    session::Credentials,
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Job {
    pub(crate) local_path: PathBuf,
    pub(crate) remote_file_reference_id: Option<String>,
    pub(crate) annotations: String,
}

impl Job {
    pub(crate) fn new<P: AsRef<Path>>(local_path: P) -> Self {
        Self {
            local_path: local_path.as_ref().to_owned(),
            remote_file_reference_id: None,
            annotations: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Status {
    Uploaded { file_reference_id: String },
    Skipped { file_reference_id: String },
}

#[derive(Debug)]
pub(crate) struct Report {
    pub(crate) job: Job,
    pub(crate) result: Result<Status>,
}

pub(crate) fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "mov" => "video/quicktime",
        "mp4" | "m4v" => "video/mp4",
        "mxf" => "application/mxf",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "aif" | "aiff" => "audio/aiff",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "exr" => "image/x-exr",
        "dpx" => "image/x-dpx",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Runs upload batches on a worker pool shared by every batch it spawns.
#[derive(Clone)]
pub(crate) struct Uploader {
    api: Api,
    permits: Arc<Semaphore>,
    workers: NonZeroUsize,
}

impl Uploader {
    pub(crate) fn new(api: Api, workers: NonZeroUsize) -> Self {
        Self {
            api,
            permits: Arc::new(Semaphore::new(workers.get())),
            workers,
        }
    }

    /// Start uploading `jobs` in the background.
    ///
    /// The credentials are captured now; resetting the session afterwards
    /// does not affect a running batch.
    pub(crate) fn spawn(&self, credentials: Credentials, jobs: Vec<Job>) -> Batch {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let uploader = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            uploader.run(&credentials, jobs, &token, tx).await;
        });

        Batch {
            cancel,
            reports: UnboundedReceiverStream::new(rx),
            handle,
        }
    }

    async fn run(
        &self,
        credentials: &Credentials,
        jobs: Vec<Job>,
        cancel: &CancellationToken,
        tx: mpsc::UnboundedSender<Report>,
    ) {
        stream::iter(jobs)
            .map(|job| async move {
                let result = self.upload_one(credentials, &job, cancel).await;
                Report { job, result }
            })
            .buffer_unordered(self.workers.get())
            .for_each(|report| {
                match report.result {
                    Ok(ref status) => info!("{}: {:?}", report.job.local_path.display(), status),
                    Err(ref e) => warn!("{}: {}", report.job.local_path.display(), e),
                }
                if tx.send(report).is_err() {
                    warn!("Nobody is listening for upload reports anymore");
                }
                future::ready(())
            })
            .await;
    }

    async fn upload_one(
        &self,
        credentials: &Credentials,
        job: &Job,
        cancel: &CancellationToken,
    ) -> Result<Status> {
        let _permit = select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| error::Internal::PoolClosed)?,
        };

        let not_found = || Error::FileNotFound {
            path: job.local_path.clone(),
        };
        let size = match fs::metadata(&job.local_path).await {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        if let Some(id) = job.remote_file_reference_id.as_deref() {
            let remote = api::fetch_file_reference(&self.api, credentials, id).await?;
            // Only the sizes are compared; two different files of the same
            // size count as the same upload.
            if remote.size == size {
                info!(
                    "{} has the same size as file reference {}, so it is not uploaded again",
                    job.local_path.display(),
                    remote.id
                );
                return Ok(Status::Skipped {
                    file_reference_id: remote.id,
                });
            }
        }

        let project_id = credentials.project_id.clone().ok_or(Error::NoProject)?;
        let filetype = content_type(&job.local_path);
        let api::UploadTarget { id, upload_url } = self
            .api
            .execute(
                api::CreateUpload {
                    name: job
                        .local_path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    filetype: filetype.to_owned(),
                    filesize: size,
                    annotations: job.annotations.clone(),
                    project_id,
                    file_reference_id: job.remote_file_reference_id.clone(),
                },
                Some(credentials),
            )
            .await?;

        let file = fs::File::open(&job.local_path).await?;
        select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = self.api.transport().put(upload_url, filetype, file, size) => {
                result.map(|()| Status::Uploaded { file_reference_id: id })
            }
        }
    }
}

/// A running upload batch. Yields one [`Report`] per job as jobs finish.
pub(crate) struct Batch {
    cancel: CancellationToken,
    reports: UnboundedReceiverStream<Report>,
    handle: JoinHandle<()>,
}

impl Batch {
    /// Stop the batch. Jobs that have not started report
    /// [`Error::Cancelled`]; uploads in flight are abandoned.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The next finished job, or `None` once every job has reported.
    pub(crate) async fn next_report(&mut self) -> Option<Report> {
        self.reports.next().await
    }

    pub(crate) async fn wait(mut self) -> Result<Vec<Report>> {
        let reports = self.reports.by_ref().collect().await;
        self.handle.await?;
        Ok(reports)
    }
}
