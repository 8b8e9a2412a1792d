// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::RwLock;

use crate::{
    error::{Error, Result},
    model::EmailType,
};

pub(crate) type Handle = Arc<RwLock<Session>>;

/// What a successful login hands to the session.
#[derive(Clone, Debug)]
pub(crate) struct Credentials {
    pub(crate) user_id: String,
    pub(crate) token: SecretString,
    pub(crate) project_id: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct Session {
    generation: u64,
    email: Option<String>,
    email_type: Option<EmailType>,
    credentials: Option<Credentials>,
}

impl Session {
    pub(crate) fn new_handle() -> Handle {
        Arc::new(RwLock::new(Self::default()))
    }

    /// Discard everything and start a new login attempt for `email`.
    ///
    /// Returns the generation the attempt runs under. Results from any
    /// earlier generation no longer apply to this session.
    pub(crate) fn begin_login(&mut self, email: &str) -> u64 {
        self.reset();
        self.email = Some(email.to_owned());
        self.generation
    }

    pub(crate) fn classified(&mut self, generation: u64, email_type: EmailType) -> bool {
        if generation != self.generation {
            return false;
        }

        self.email_type = Some(email_type);
        true
    }

    /// Apply the result of a login attempt. Returns `false` and leaves the
    /// session alone if the attempt has been superseded.
    pub(crate) fn complete_login(&mut self, generation: u64, credentials: Credentials) -> bool {
        if generation != self.generation {
            return false;
        }

        self.credentials = Some(credentials);
        true
    }

    pub(crate) fn reset(&mut self) {
        *self = Self {
            generation: self.generation.wrapping_add(1),
            ..Self::default()
        };
    }

    pub(crate) const fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub(crate) fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub(crate) const fn email_type(&self) -> Option<EmailType> {
        self.email_type
    }

    pub(crate) fn credentials(&self) -> Result<&Credentials> {
        self.credentials.as_ref().ok_or(Error::NotAuthenticated)
    }

    pub(crate) fn user_id(&self) -> Result<&str> {
        Ok(&self.credentials()?.user_id)
    }

    pub(crate) fn token(&self) -> Result<&SecretString> {
        Ok(&self.credentials()?.token)
    }

    pub(crate) fn project_id(&self) -> Result<Option<&str>> {
        Ok(self.credentials()?.project_id.as_deref())
    }

    pub(crate) fn set_project(&mut self, id: &str) -> Result<()> {
        let credentials = self.credentials.as_mut().ok_or(Error::NotAuthenticated)?;
        credentials.project_id = Some(id.to_owned());
        Ok(())
    }
}
