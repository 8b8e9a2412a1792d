// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use log::{debug, info, warn};
use secrecy::SecretString;

use crate::{
    api::{self, Api},
    browser::Browser,
    classifier,
    error::{self, Error, Result},
    login::{self, Handler as _, LoginState},
    model::{self, EmailType},
    session::{self, Session},
    upload::{self, Uploader},
};

#[derive(Clone, Debug)]
pub(crate) struct Options {
    pub(crate) oauth_poll_interval: Duration,
    pub(crate) oauth_max_polls: u32,
    pub(crate) workers: NonZeroUsize,
}

/// Sits between the front end and the review service: owns the session and
/// makes sure nothing that needs credentials runs without them.
pub(crate) struct Delegate {
    api: Api,
    browser: Arc<dyn Browser>,
    session: session::Handle,
    uploader: Uploader,
    options: Options,
}

impl Delegate {
    pub(crate) fn new(api: Api, browser: Arc<dyn Browser>, options: Options) -> Self {
        Self {
            uploader: Uploader::new(api.clone(), options.workers),
            api,
            browser,
            session: Session::new_handle(),
            options,
        }
    }

    pub(crate) async fn classify(&self, email: &str) -> Result<EmailType> {
        classifier::classify(&self.api, email).await
    }

    pub(crate) fn handler_for(
        &self,
        email_type: EmailType,
        email: &str,
        password: Option<SecretString>,
    ) -> Result<Box<dyn login::Handler>> {
        match email_type {
            EmailType::Email => Ok(Box::new(login::Basic::new(email, password))),
            EmailType::OAuth => Ok(Box::new(login::OAuth::new(
                email,
                Arc::clone(&self.browser),
                self.options.oauth_poll_interval,
                self.options.oauth_max_polls,
            ))),
            EmailType::Signup => Err(error::Auth::SignupRequired(email.to_owned()).into()),
            EmailType::Unknown => Err(error::Auth::Unclassified(email.to_owned()).into()),
        }
    }

    /// Log in as `email`, replacing whatever session existed before.
    ///
    /// Returns [`LoginState::PasswordRequired`] when the caller needs to ask
    /// for a (longer) password and try again, and
    /// [`LoginState::Authenticated`] once the session is ready. If another
    /// login starts or the session is reset while this one is running, its
    /// result is thrown away and this returns [`error::Auth::Superseded`].
    pub(crate) async fn attempt_login(
        &self,
        email: &str,
        password: Option<SecretString>,
    ) -> Result<LoginState> {
        let generation = self.session.write().await.begin_login(email);

        let email_type = self.classify(email).await?;
        if !self.session.write().await.classified(generation, email_type) {
            warn!("Dropping classification of {} from a superseded login", email);
            return Err(error::Auth::Superseded.into());
        }
        info!("{} signs in with method {}", email, email_type);

        let mut handler = self.handler_for(email_type, email, password)?;
        debug!(
            "Starting {} login for {}",
            match handler.kind() {
                login::Kind::Basic => "password",
                login::Kind::OAuth => "browser",
            },
            email
        );
        match handler.login(&self.api).await? {
            login::Outcome::PasswordRequired => Ok(LoginState::PasswordRequired),
            login::Outcome::Authenticated(credentials) => {
                if self
                    .session
                    .write()
                    .await
                    .complete_login(generation, credentials)
                {
                    Ok(handler.state())
                } else {
                    warn!("Dropping credentials for {} from a superseded login", email);
                    Err(error::Auth::Superseded.into())
                }
            }
        }
    }

    /// The email and sign-in method of the current session, if it is
    /// authenticated.
    pub(crate) async fn signed_in_as(&self) -> Option<(String, EmailType)> {
        let session = self.session.read().await;
        if !session.is_authenticated() {
            return None;
        }

        Some((
            session.email()?.to_owned(),
            session.email_type().unwrap_or(EmailType::Unknown),
        ))
    }

    pub(crate) async fn reset_session(&self) {
        self.session.write().await.reset();
    }

    pub(crate) async fn set_project(&self, id: &str) -> Result<()> {
        self.session.write().await.set_project(id)
    }

    pub(crate) async fn user_id(&self) -> Result<String> {
        self.session.read().await.user_id().map(str::to_owned)
    }

    pub(crate) async fn token(&self) -> Result<SecretString> {
        self.session.read().await.token().cloned()
    }

    pub(crate) async fn project_id(&self) -> Result<Option<String>> {
        Ok(self.session.read().await.project_id()?.map(str::to_owned))
    }

    async fn credentials(&self) -> Result<session::Credentials> {
        self.session.read().await.credentials().cloned()
    }

    pub(crate) async fn projects(&self) -> Result<Vec<model::Project>> {
        let credentials = self.credentials().await?;
        let req = api::ListProjects {
            user_id: credentials.user_id.clone(),
        };
        Ok(self.api.execute(req, Some(&credentials)).await?.projects)
    }

    pub(crate) async fn collaborators(&self) -> Result<Vec<model::Collaborator>> {
        let credentials = self.credentials().await?;
        let req = api::ListCollaborators {
            project_id: credentials.project_id.clone().ok_or(Error::NoProject)?,
        };
        Ok(self
            .api
            .execute(req, Some(&credentials))
            .await?
            .collaborators)
    }

    pub(crate) async fn file_reference(&self, id: &str) -> Result<model::FileReference> {
        let credentials = self.credentials().await?;
        api::fetch_file_reference(&self.api, &credentials, id).await
    }

    /// Start uploading `jobs` without waiting for them.
    pub(crate) async fn upload_files(&self, jobs: Vec<upload::Job>) -> Result<upload::Batch> {
        let credentials = self.credentials().await?;
        if credentials.project_id.is_none() {
            return Err(Error::NoProject);
        }

        Ok(self.uploader.spawn(credentials, jobs))
    }
}
