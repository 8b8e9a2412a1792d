// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod api;
mod browser;
mod classifier;
mod command;
mod delegate;
mod error;
mod login;
mod metadata;
mod model;
mod password;
mod session;
mod transport;
mod upload;

use std::{num::NonZeroUsize, path::PathBuf, process, sync::Arc, time::Duration};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use error::Result;
use log::error;
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Classify(command::classify::Command),
    Collaborators(command::collaborators::Command),
    Comments(command::comments::Command),
    Projects(command::projects::Command),
    Status(command::status::Command),
    Upload(command::upload::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, ctx: &command::Context) -> Result<()> {
        match self {
            Self::Classify(cmd) => cmd.execute(ctx).await,
            Self::Collaborators(cmd) => cmd.execute(ctx).await,
            Self::Comments(cmd) => cmd.execute(ctx).await,
            Self::Projects(cmd) => cmd.execute(ctx).await,
            Self::Status(cmd) => cmd.execute(ctx).await,
            Self::Upload(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the review service API.
    #[arg(long, env = "FRAMELINK_API_URL", default_value = "https://api.frame.io/", value_parser = Url::parse)]
    api_url: Url,

    /// The email address to sign in with.
    #[arg(long, env = "FRAMELINK_EMAIL")]
    email: Option<String>,

    /// The project to work in, instead of the one the service picks when
    /// signing in.
    #[arg(long, env = "FRAMELINK_PROJECT")]
    project: Option<String>,

    /// How long to wait for any one request to the service, in seconds.
    #[arg(long, env = "FRAMELINK_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// The number of files to upload at the same time.
    #[arg(long, env = "FRAMELINK_WORKERS", default_value = "4")]
    workers: NonZeroUsize,

    /// How often to check whether a browser sign-in has finished, in
    /// seconds.
    #[arg(long, default_value_t = 2)]
    oauth_poll_interval: u64,

    /// How many times to check on a browser sign-in before giving up.
    #[arg(long, default_value_t = 150)]
    oauth_max_polls: u32,

    /// The path to the Pinentry program to use when asking for a password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

async fn run(args: Args) -> Result<()> {
    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(args.pinentry_program.clone().map_or_else(
            password::PinentryPrompt::new,
            password::PinentryPrompt::new_with_executable,
        )),
        Box::new(password::RpasswordPrompt),
    ];

    let transport = transport::Http::new(Duration::from_secs(args.timeout))?;
    let api = api::Api::new(Arc::new(transport), args.api_url);
    let delegate = delegate::Delegate::new(
        api,
        Arc::new(browser::Console),
        delegate::Options {
            oauth_poll_interval: Duration::from_secs(args.oauth_poll_interval),
            oauth_max_polls: args.oauth_max_polls,
            workers: args.workers,
        },
    );

    let ctx = command::Context {
        delegate,
        email: args.email,
        project: args.project,
        prompt: Box::new(prompt),
    };
    command::Command::execute(args.command, &ctx).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("FRAMELINK_LOG", "warn")
        .write_style("FRAMELINK_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
