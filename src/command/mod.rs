// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use log::{error, info};

use crate::{
    delegate::Delegate,
    error::{self, Error, Result},
    login::{LoginState, MIN_PASSWORD_LENGTH},
    password::{self, RequestBuilder},
};

pub(crate) mod classify;
pub(crate) mod collaborators;
pub(crate) mod comments;
pub(crate) mod projects;
pub(crate) mod status;
pub(crate) mod upload;

/// Everything a command needs to talk to the review service.
pub(crate) struct Context {
    pub(crate) delegate: Delegate,
    pub(crate) email: Option<String>,
    pub(crate) project: Option<String>,
    pub(crate) prompt: Box<dyn password::Prompt>,
}

impl Context {
    /// Sign in with the configured email, asking for a password as many
    /// times as the server needs one.
    pub(crate) async fn login(&self) -> Result<()> {
        let Some(email) = self.email.as_deref() else {
            error!("An email address is required; pass --email or set FRAMELINK_EMAIL");
            return Err(Error::Command);
        };

        let mut password = None;
        let mut retry_error: Option<String> = None;
        loop {
            match self.delegate.attempt_login(email, password.take()).await? {
                LoginState::Authenticated => break,
                LoginState::PasswordRequired => {
                    let mut req = RequestBuilder::new(email);
                    if let Some(e) = retry_error.take() {
                        req = req.with_error(&e);
                    }

                    password = Some(
                        self.prompt
                            .prompt(req.into_request())
                            .await?
                            .ok_or(error::Password::NoPrompt)?,
                    );
                    retry_error = Some(format!(
                        "Your password must be at least {MIN_PASSWORD_LENGTH} characters long."
                    ));
                }
                LoginState::Idle | LoginState::Submitted | LoginState::Failed => {
                    error!("The login for {} did not finish", email);
                    return Err(Error::Command);
                }
            }
        }

        if let Some(project) = self.project.as_deref() {
            self.delegate.set_project(project).await?;
        }
        if let Some((email, email_type)) = self.delegate.signed_in_as().await {
            info!("Signed in as {} ({})", email, email_type);
        }
        Ok(())
    }
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, ctx: &Context) -> Result<()>;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::{
        num::NonZeroUsize,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use secrecy::{ExposeSecret as _, SecretString};
    use serde_json::json;

    use super::*;
    use crate::{
        api::tests::api,
        delegate::Options,
        login::tests::RecordingBrowser,
        password::{Prompt, Request},
        transport::stub::{Method, Reply, Stub},
    };

    /// Hands out the given answers in order, then gives up.
    struct Scripted {
        answers: Mutex<Vec<&'static str>>,
        asked: Mutex<Vec<Request>>,
    }

    #[async_trait]
    impl Prompt for Scripted {
        async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
            self.asked.lock().unwrap().push(req);
            let mut answers = self.answers.lock().unwrap();
            Ok((!answers.is_empty()).then(|| SecretString::new(answers.remove(0).to_owned())))
        }
    }

    fn context(stub: &Arc<Stub>, answers: Vec<&'static str>) -> (Context, Arc<Scripted>) {
        let prompt = Arc::new(Scripted {
            answers: Mutex::new(answers),
            asked: Mutex::new(vec![]),
        });
        let ctx = Context {
            delegate: Delegate::new(
                api(stub),
                Arc::new(RecordingBrowser::default()),
                Options {
                    oauth_poll_interval: Duration::ZERO,
                    oauth_max_polls: 3,
                    workers: NonZeroUsize::MIN,
                },
            ),
            email: Some("a@b.com".to_owned()),
            project: Some("p-override".to_owned()),
            prompt: Box::new(Arc::clone(&prompt)),
        };
        (ctx, prompt)
    }

    #[async_trait]
    impl Prompt for Arc<Scripted> {
        async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
            (**self).prompt(req).await
        }
    }

    fn queue_basic_login(stub: &Stub) {
        stub.on(
            Method::Post,
            "/v2/users/check_elegible",
            Reply::Json(json!({"action_key": "user-non-google"})),
        );
        stub.on(
            Method::Post,
            "/v2/login",
            Reply::Json(json!({"user_id": "u-1", "token": "tok", "project_id": "p-1"})),
        );
    }

    #[tokio::test]
    async fn short_passwords_are_asked_for_again() -> Result<()> {
        let stub = Arc::new(Stub::new());
        for _ in 0..2 {
            stub.on(
                Method::Post,
                "/v2/users/check_elegible",
                Reply::Json(json!({"action_key": "user-non-google"})),
            );
        }
        queue_basic_login(&stub);
        let (ctx, prompt) = context(&stub, vec!["short", "long-enough"]);

        ctx.login().await?;

        {
            let asked = prompt.asked.lock().unwrap();
            assert_eq!(asked.len(), 2);
            assert!(asked[0].error().is_none());
            assert!(asked[1].error().is_some());
        }

        let logins = stub.calls_to(Method::Post, "/v2/login");
        assert_eq!(logins.len(), 1);
        assert_eq!(
            logins[0].json.as_ref().unwrap()["password"],
            json!("long-enough")
        );
        assert_eq!(ctx.delegate.token().await?.expose_secret(), "tok");
        assert_eq!(
            ctx.delegate.project_id().await?.as_deref(),
            Some("p-override")
        );
        Ok(())
    }

    #[tokio::test]
    async fn no_prompt_means_no_login() {
        let stub = Arc::new(Stub::new());
        queue_basic_login(&stub);
        let (ctx, _) = context(&stub, vec![]);

        assert!(matches!(
            ctx.login().await,
            Err(Error::Password(error::Password::NoPrompt))
        ));
        assert!(stub.calls_to(Method::Post, "/v2/login").is_empty());
    }

    #[tokio::test]
    async fn email_is_required() {
        let stub = Arc::new(Stub::new());
        let (mut ctx, _) = context(&stub, vec![]);
        ctx.email = None;

        assert!(matches!(ctx.login().await, Err(Error::Command)));
        assert!(stub.calls().is_empty());
    }
}
