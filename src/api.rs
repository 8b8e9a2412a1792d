// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use secrecy::{ExposeSecret as _, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize, Serializer};
use url::Url;

use crate::{
    error::{self, Result},
    model,
    session::Credentials,
    transport::Transport,
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Method {
    Get,
    Post,
}

/// A typed call to one review service endpoint.
///
/// `POST` requests send their serialized form as the JSON body; `GET`
/// requests carry everything they need in their path.
pub(crate) trait Request: Serialize + Send {
    const METHOD: Method;
    type Response: DeserializeOwned;

    /// Path segments below the base URL. Each one is percent-encoded on its
    /// own, so IDs can't reach other endpoints.
    fn segments(&self) -> Vec<&str>;
}

#[derive(Clone)]
pub(crate) struct Api {
    transport: Arc<dyn Transport>,
    base_url: Url,
}

impl Api {
    pub(crate) fn new(transport: Arc<dyn Transport>, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            transport,
            base_url,
        }
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Append `segments` to the base URL. The service authenticates requests
    /// with the `mid` (user), `t` (token) and `aid` (project) query
    /// parameters.
    pub(crate) fn url_for(
        &self,
        segments: &[&str],
        credentials: Option<&Credentials>,
    ) -> Result<Url> {
        if let Some(segment) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(error::Conversion::PathSegment((*segment).to_owned()).into());
        }

        let mut url = self.base_url.clone();
        _ = url
            .path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        if let Some(credentials) = credentials {
            let mut query = url.query_pairs_mut();
            _ = query
                .append_pair("mid", &credentials.user_id)
                .append_pair("t", credentials.token.expose_secret());
            if let Some(project_id) = credentials.project_id.as_deref() {
                _ = query.append_pair("aid", project_id);
            }
        }
        Ok(url)
    }

    pub(crate) async fn execute<R: Request>(
        &self,
        req: R,
        credentials: Option<&Credentials>,
    ) -> Result<R::Response> {
        let url = self.url_for(&req.segments(), credentials)?;
        let value = match R::METHOD {
            Method::Get => self.transport.get(url).await?,
            Method::Post => {
                let body = serde_json::to_value(&req)?;
                self.transport.post(url, body).await?
            }
        };
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    if let Some(errors) = value.get("errors") {
        let messages = match *errors {
            serde_json::Value::Array(ref items) => items
                .iter()
                .map(|item| match *item {
                    serde_json::Value::String(ref s) => s.clone(),
                    ref other => other.to_string(),
                })
                .collect(),
            ref other => vec![other.to_string()],
        };
        return Err(error::Api::ServerError(messages).into());
    }

    serde_json::from_value(value).map_err(|e| error::Api::MalformedResponse(e).into())
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckEligible {
    pub(crate) email: String,
}

#[derive(Debug, Deserialize, PartialEq)]
pub(crate) struct Eligibility {
    pub(crate) action_key: String,
}

impl Request for CheckEligible {
    const METHOD: Method = Method::Post;
    type Response = Eligibility;

    fn segments(&self) -> Vec<&str> {
        vec!["users", "check_elegible"]
    }
}

#[derive(Serialize)]
pub(crate) struct Login {
    pub(crate) email: String,
    #[serde(serialize_with = "expose")]
    pub(crate) password: SecretString,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Authenticated {
    pub(crate) user_id: String,
    pub(crate) token: SecretString,
    #[serde(default)]
    pub(crate) project_id: Option<String>,
}

impl From<Authenticated> for Credentials {
    fn from(value: Authenticated) -> Self {
        Self {
            user_id: value.user_id,
            token: value.token,
            project_id: value.project_id,
        }
    }
}

impl Request for Login {
    const METHOD: Method = Method::Post;
    type Response = Authenticated;

    fn segments(&self) -> Vec<&str> {
        vec!["login"]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateOauthSession {
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OauthSession {
    pub(crate) session_id: String,
    pub(crate) authorize_url: Url,
}

impl Request for CreateOauthSession {
    const METHOD: Method = Method::Post;
    type Response = OauthSession;

    fn segments(&self) -> Vec<&str> {
        vec!["oauth", "sessions"]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GetOauthSession {
    #[serde(skip)]
    pub(crate) session_id: String,
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OauthStatus {
    Pending,
    Complete,
    Denied,
    Expired,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OauthProgress {
    pub(crate) status: OauthStatus,
    #[serde(flatten)]
    pub(crate) credentials: Option<Authenticated>,
}

impl Request for GetOauthSession {
    const METHOD: Method = Method::Get;
    type Response = OauthProgress;

    fn segments(&self) -> Vec<&str> {
        vec!["oauth", "sessions", self.session_id.as_str()]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GetFileReference {
    #[serde(skip)]
    pub(crate) id: String,
}

impl Request for GetFileReference {
    const METHOD: Method = Method::Get;
    type Response = model::Payload;

    fn segments(&self) -> Vec<&str> {
        vec!["file_references", self.id.as_str()]
    }
}

/// Asks the service for a pre-signed URL to upload a file to. When
/// `file_reference_id` is set the upload becomes a new version of that
/// asset.
#[derive(Debug, Serialize)]
pub(crate) struct CreateUpload {
    pub(crate) name: String,
    pub(crate) filetype: String,
    pub(crate) filesize: u64,
    pub(crate) annotations: String,
    pub(crate) project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) file_reference_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadTarget {
    pub(crate) id: String,
    pub(crate) upload_url: Url,
}

impl Request for CreateUpload {
    const METHOD: Method = Method::Post;
    type Response = UploadTarget;

    fn segments(&self) -> Vec<&str> {
        vec!["file_references", "upload"]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ListProjects {
    #[serde(skip)]
    pub(crate) user_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Projects {
    pub(crate) projects: Vec<model::Project>,
}

impl Request for ListProjects {
    const METHOD: Method = Method::Get;
    type Response = Projects;

    fn segments(&self) -> Vec<&str> {
        vec!["users", self.user_id.as_str(), "projects"]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ListCollaborators {
    #[serde(skip)]
    pub(crate) project_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Collaborators {
    pub(crate) collaborators: Vec<model::Collaborator>,
}

impl Request for ListCollaborators {
    const METHOD: Method = Method::Get;
    type Response = Collaborators;

    fn segments(&self) -> Vec<&str> {
        vec!["projects", self.project_id.as_str(), "collaborators"]
    }
}

pub(crate) async fn fetch_file_reference(
    api: &Api,
    credentials: &Credentials,
    id: &str,
) -> Result<model::FileReference> {
    api.execute(GetFileReference { id: id.to_owned() }, Some(credentials))
        .await?
        .try_into()
}
