// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod file_reference;

use clap::ValueEnum;
use inflector::Inflector as _;
use serde::Deserialize;
use tabled::Tabled;

pub(crate) use file_reference::{Comment, FileReference, Payload, Timestamp};

/// How an email address signs in to the review service.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum EmailType {
    Email,
    #[value(name = "oauth")]
    OAuth,
    Signup,
    Unknown,
}

impl EmailType {
    pub(crate) fn from_action_key(action_key: &str) -> Option<Self> {
        match action_key {
            "user-non-google" => Some(Self::Email),
            "user-google" => Some(Self::OAuth),
            "user-eligible" => Some(Self::Signup),
            _ => None,
        }
    }
}

impl std::fmt::Display for EmailType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::OAuth => f.write_str("OAuth"),
            Self::Email | Self::Signup | Self::Unknown => {
                let value = self.to_possible_value().ok_or(std::fmt::Error)?;
                write!(f, "{}", value.get_name().to_title_case())
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Tabled)]
pub(crate) struct Project {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Tabled)]
pub(crate) struct Collaborator {
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Email")]
    pub(crate) email: String,
}
