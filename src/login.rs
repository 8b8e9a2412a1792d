// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use log::{debug, info};
use secrecy::{ExposeSecret as _, SecretString};
use tokio::time;

use crate::{
    api::{self, Api},
    browser::Browser,
    error::{self, Error, Result},
    session::Credentials,
};

pub(crate) const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum LoginState {
    Idle,
    Submitted,
    Authenticated,
    Failed,
    PasswordRequired,
}

impl LoginState {
    fn submit(&mut self) -> Result<()> {
        if *self != Self::Idle {
            return Err(error::Internal::HandlerReused.into());
        }

        *self = Self::Submitted;
        Ok(())
    }

    fn settle(&mut self, result: &Result<Outcome>) {
        *self = match *result {
            Ok(Outcome::Authenticated(_)) => Self::Authenticated,
            Ok(Outcome::PasswordRequired) => Self::PasswordRequired,
            Err(_) => Self::Failed,
        };
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Kind {
    Basic,
    OAuth,
}

#[derive(Debug)]
pub(crate) enum Outcome {
    Authenticated(Credentials),
    PasswordRequired,
}

/// One login attempt. A handler runs once; make a new one to try again.
#[async_trait]
pub(crate) trait Handler: Send {
    fn kind(&self) -> Kind;
    fn state(&self) -> LoginState;
    async fn login(&mut self, api: &Api) -> Result<Outcome>;
}

pub(crate) struct Basic {
    email: String,
    password: Option<SecretString>,
    state: LoginState,
}

impl Basic {
    pub(crate) fn new(email: &str, password: Option<SecretString>) -> Self {
        Self {
            email: email.to_owned(),
            password,
            state: LoginState::Idle,
        }
    }

    async fn submit(&mut self, api: &Api) -> Result<Outcome> {
        let password = match self.password.take() {
            Some(password) if password.expose_secret().chars().count() >= MIN_PASSWORD_LENGTH => {
                password
            }
            Some(_) | None => return Ok(Outcome::PasswordRequired),
        };

        let req = api::Login {
            email: self.email.clone(),
            password,
        };
        match api.execute(req, None).await {
            Ok(authenticated) => Ok(Outcome::Authenticated(authenticated.into())),
            Err(Error::Api(error::Api::ServerError(messages))) => {
                Err(error::Auth::Rejected(messages.join("; ")).into())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Handler for Basic {
    fn kind(&self) -> Kind {
        Kind::Basic
    }

    fn state(&self) -> LoginState {
        self.state
    }

    async fn login(&mut self, api: &Api) -> Result<Outcome> {
        self.state.submit()?;
        let result = self.submit(api).await;
        self.state.settle(&result);
        result
    }
}

pub(crate) struct OAuth {
    email: String,
    browser: Arc<dyn Browser>,
    poll_interval: Duration,
    max_polls: u32,
    state: LoginState,
}

impl OAuth {
    pub(crate) fn new(
        email: &str,
        browser: Arc<dyn Browser>,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Self {
        Self {
            email: email.to_owned(),
            browser,
            poll_interval,
            max_polls,
            state: LoginState::Idle,
        }
    }

    async fn submit(&mut self, api: &Api) -> Result<Outcome> {
        let session = api
            .execute(
                api::CreateOauthSession {
                    email: self.email.clone(),
                },
                None,
            )
            .await?;
        self.browser.open(&session.authorize_url)?;

        for attempt in 1..=self.max_polls {
            time::sleep(self.poll_interval).await;

            let progress = api
                .execute(
                    api::GetOauthSession {
                        session_id: session.session_id.clone(),
                    },
                    None,
                )
                .await?;
            match (progress.status, progress.credentials) {
                (api::OauthStatus::Pending, _) => {
                    debug!("Browser sign-in still pending after {} polls", attempt);
                }
                (api::OauthStatus::Complete, Some(authenticated)) => {
                    info!("Browser sign-in for {} finished", self.email);
                    return Ok(Outcome::Authenticated(authenticated.into()));
                }
                (api::OauthStatus::Complete, None) => {
                    return Err(error::Auth::Rejected(
                        "sign-in finished without credentials".to_owned(),
                    )
                    .into());
                }
                (api::OauthStatus::Denied | api::OauthStatus::Expired, _) => {
                    return Err(error::Auth::OauthDenied.into());
                }
            }
        }

        Err(error::Auth::OauthTimedOut(self.max_polls).into())
    }
}

#[async_trait]
impl Handler for OAuth {
    fn kind(&self) -> Kind {
        Kind::OAuth
    }

    fn state(&self) -> LoginState {
        self.state
    }

    async fn login(&mut self, api: &Api) -> Result<Outcome> {
        self.state.submit()?;
        let result = self.submit(api).await;
        self.state.settle(&result);
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use secrecy::ExposeSecret as _;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::{
        api::tests::api,
        transport::stub::{Method, Reply, Stub},
    };

    /// Remembers every address it was asked to open.
    #[derive(Default)]
    pub(crate) struct RecordingBrowser {
        pub(crate) opened: Mutex<Vec<Url>>,
    }

    impl Browser for RecordingBrowser {
        fn open(&self, url: &Url) -> Result<()> {
            self.opened.lock().unwrap().push(url.clone());
            Ok(())
        }
    }

    pub(crate) fn queue_oauth(stub: &Stub, statuses: &[&str]) {
        stub.on(
            Method::Post,
            "/v2/oauth/sessions",
            Reply::Json(json!({
                "session_id": "s-1",
                "authorize_url": "https://auth.frame.test/authorize?s=s-1",
            })),
        );
        for status in statuses {
            let reply = if *status == "complete" {
                json!({"status": "complete", "user_id": "u-9", "token": "oauth-tok", "project_id": "p-9"})
            } else {
                json!({ "status": status })
            };
            stub.on(Method::Get, "/v2/oauth/sessions/s-1", Reply::Json(reply));
        }
    }

    fn secret(s: &str) -> Option<SecretString> {
        Some(SecretString::new(s.to_owned()))
    }

    #[tokio::test]
    async fn short_password_is_requested_before_calling_the_server() -> Result<()> {
        let stub = Arc::new(Stub::new());
        let api = api(&stub);

        for password in [None, secret(""), secret("12345")] {
            let mut handler = Basic::new("a@b.com", password);
            assert_eq!(handler.state(), LoginState::Idle);
            assert!(matches!(
                handler.login(&api).await?,
                Outcome::PasswordRequired
            ));
            assert_eq!(handler.state(), LoginState::PasswordRequired);
        }

        assert!(stub.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn basic_login_authenticates() -> Result<()> {
        let stub = Arc::new(Stub::new());
        stub.on(
            Method::Post,
            "/v2/login",
            Reply::Json(json!({"user_id": "u-1", "token": "tok", "project_id": "p-1"})),
        );

        let mut handler = Basic::new("a@b.com", secret("123456"));
        let outcome = handler.login(&api(&stub)).await?;
        match outcome {
            Outcome::Authenticated(credentials) => {
                assert_eq!(credentials.user_id, "u-1");
                assert_eq!(credentials.token.expose_secret(), "tok");
                assert_eq!(credentials.project_id.as_deref(), Some("p-1"));
            }
            Outcome::PasswordRequired => panic!("password should have been accepted"),
        }
        assert_eq!(handler.state(), LoginState::Authenticated);
        assert_eq!(stub.calls_to(Method::Post, "/v2/login").len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_login_fails() {
        let stub = Arc::new(Stub::new());
        stub.on(
            Method::Post,
            "/v2/login",
            Reply::Json(json!({"errors": ["invalid credentials"]})),
        );

        let mut handler = Basic::new("a@b.com", secret("wrong-password"));
        let result = handler.login(&api(&stub)).await;
        assert!(matches!(result, Err(Error::Auth(error::Auth::Rejected(_)))));
        assert_eq!(handler.state(), LoginState::Failed);
    }

    #[tokio::test]
    async fn handlers_are_one_shot() -> Result<()> {
        let stub = Arc::new(Stub::new());
        let api = api(&stub);
        let mut handler = Basic::new("a@b.com", None);
        let _ = handler.login(&api).await?;

        assert!(matches!(
            handler.login(&api).await,
            Err(Error::Internal(error::Internal::HandlerReused))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn oauth_polls_until_complete() -> Result<()> {
        let stub = Arc::new(Stub::new());
        queue_oauth(&stub, &["pending", "pending", "complete"]);
        let browser = Arc::new(RecordingBrowser::default());

        let mut handler = OAuth::new(
            "user@gmail.com",
            Arc::clone(&browser) as Arc<dyn Browser>,
            Duration::ZERO,
            5,
        );
        let outcome = handler.login(&api(&stub)).await?;
        assert!(matches!(
            outcome,
            Outcome::Authenticated(Credentials { ref user_id, .. }) if user_id == "u-9"
        ));
        assert_eq!(handler.state(), LoginState::Authenticated);
        assert_eq!(
            stub.calls_to(Method::Get, "/v2/oauth/sessions/s-1").len(),
            3
        );
        assert_eq!(
            browser.opened.lock().unwrap()[0].as_str(),
            "https://auth.frame.test/authorize?s=s-1"
        );
        assert!(stub.calls_to(Method::Post, "/v2/login").is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn oauth_denied() {
        let stub = Arc::new(Stub::new());
        queue_oauth(&stub, &["pending", "denied"]);

        let mut handler = OAuth::new(
            "user@gmail.com",
            Arc::new(RecordingBrowser::default()),
            Duration::ZERO,
            5,
        );
        let result = handler.login(&api(&stub)).await;
        assert!(matches!(result, Err(Error::Auth(error::Auth::OauthDenied))));
        assert_eq!(handler.state(), LoginState::Failed);
    }

    #[tokio::test]
    async fn oauth_gives_up() {
        let stub = Arc::new(Stub::new());
        queue_oauth(&stub, &["pending", "pending", "pending"]);

        let mut handler = OAuth::new(
            "user@gmail.com",
            Arc::new(RecordingBrowser::default()),
            Duration::ZERO,
            2,
        );
        let result = handler.login(&api(&stub)).await;
        assert!(matches!(
            result,
            Err(Error::Auth(error::Auth::OauthTimedOut(2)))
        ));
    }
}
