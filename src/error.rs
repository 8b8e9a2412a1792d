// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, path::PathBuf, result};

use thiserror::Error;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("network error: {0}")]
    Network(#[from] Network),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("data conversion error: {0}")]
    Conversion(#[from] Conversion),
    #[error("authentication error: {0}")]
    Auth(#[from] Auth),
    #[error("API error: {0}")]
    Api(#[from] Api),
    #[error("password retrieval error: {0}")]
    Password(#[from] Password),
    #[error("internal communication error: {0}")]
    Internal(#[from] Internal),
    #[error("this operation requires an authenticated session")]
    NotAuthenticated,
    #[error("no project is selected for this session")]
    NoProject,
    #[error(r#"file "{}" does not exist"#, .path.display())]
    FileNotFound { path: PathBuf },
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl From<pinentry::Error> for Error {
    fn from(value: pinentry::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(
            clippy::wildcard_enum_match_arm,
            clippy::match_wildcard_for_single_variants
        )]
        match value {
            pinentry::Error::Cancelled | pinentry::Error::Timeout => Self::Cancelled,
            pinentry::Error::Io(e) => Self::Io(e),
            pinentry::Error::Encoding(e) => Self::Conversion(Conversion::Encoding(e)),
            _ => Self::Password(Password::Pinentry(value)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_connect() {
            Self::Network(Network::Connection(value.to_string()))
        } else {
            Self::Network(Network::Request(value))
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

#[derive(Error, Debug)]
pub(crate) enum Network {
    #[error("request failed: {0}")]
    Request(reqwest::Error),
    #[error("server responded with HTTP status {0}")]
    Status(u16),
    #[error("connection failed: {0}")]
    Connection(String),
}

#[derive(Error, Debug)]
pub(crate) enum Conversion {
    #[error("unexpected non-UTF-8-encoded bytes in input: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error(r#"could not parse "{}" as a file size: {}"#, .0.escape_default(), .1)]
    FileSize(String, std::num::ParseIntError),
    #[error(r#""{}" is not a usable ID"#, .0.escape_default())]
    PathSegment(String),
}

#[derive(Error, Debug)]
pub(crate) enum Auth {
    #[error(r#"could not determine how "{}" should sign in"#, .0.escape_default())]
    Unclassified(String),
    #[error(r#"no account exists for "{}" yet; sign up on the web first"#, .0.escape_default())]
    SignupRequired(String),
    #[error("the server rejected the login: {0}")]
    Rejected(String),
    #[error("the browser sign-in was denied or expired")]
    OauthDenied,
    #[error("gave up waiting for the browser sign-in to finish after {0} attempts")]
    OauthTimedOut(u32),
    #[error("this login attempt was replaced by a newer one")]
    Superseded,
}

#[derive(Error, Debug)]
pub(crate) enum Api {
    #[error("server error: {}", .0.join("; "))]
    ServerError(Vec<String>),
    #[error("server response did not have the expected format: {0}")]
    MalformedResponse(serde_json::Error),
    #[error("server response (HTTP status {0}) was not JSON")]
    NotJson(u16),
}

#[derive(Error, Debug)]
pub(crate) enum Password {
    #[error("no password prompt available")]
    NoPrompt,
    #[error("Pinentry implementation error: {0}")]
    Pinentry(pinentry::Error),
}

#[derive(Error, Debug)]
pub(crate) enum Internal {
    #[error("login handler has already been used")]
    HandlerReused,
    #[error("upload worker pool is closed")]
    PoolClosed,
}
