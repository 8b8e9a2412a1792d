// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{
    header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE},
    Body,
};
use tokio::fs;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::{
    error::{self, Result},
    metadata,
};

const ACL_HEADER: &str = "x-amz-acl";
const ACL_PRIVATE: &str = "private";

/// The HTTP operations the review service client needs.
///
/// JSON endpoints hand back whatever JSON document the server sent, whatever
/// the status code; the service reports failures in an `errors` field and the
/// caller decides what that means. Only transport-level failures and non-JSON
/// bodies are errors here.
#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn get(&self, url: Url) -> Result<serde_json::Value>;
    async fn post(&self, url: Url, body: serde_json::Value) -> Result<serde_json::Value>;

    /// Stream `length` bytes of `file` to a pre-signed storage URL as a
    /// private object, in a single request.
    async fn put(&self, url: Url, content_type: &str, file: fs::File, length: u64) -> Result<()>;
}

pub(crate) struct Http {
    client: reqwest::Client,
}

impl Http {
    pub(crate) fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(metadata::USER_AGENT.as_str())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn into_json(resp: reqwest::Response) -> Result<serde_json::Value> {
        let status = resp.status();
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            debug!("Response with status {} is not JSON: {}", status, e);
            error::Api::NotJson(status.as_u16()).into()
        })
    }
}

#[async_trait]
impl Transport for Http {
    async fn get(&self, url: Url) -> Result<serde_json::Value> {
        debug!("GET {}", url.path());
        Self::into_json(self.client.get(url).send().await?).await
    }

    async fn post(&self, url: Url, body: serde_json::Value) -> Result<serde_json::Value> {
        debug!("POST {}", url.path());
        Self::into_json(self.client.post(url).json(&body).send().await?).await
    }

    async fn put(&self, url: Url, content_type: &str, file: fs::File, length: u64) -> Result<()> {
        debug!("PUT {} ({} bytes)", url.path(), length);
        let resp = self
            .client
            .put(url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_str(content_type)
                    .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
            )
            .header(CONTENT_LENGTH, length)
            .header(ACL_HEADER, ACL_PRIVATE)
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(error::Network::Status(status.as_u16()).into())
        }
    }
}
