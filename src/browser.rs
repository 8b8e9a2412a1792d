// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use url::Url;

use crate::error::Result;

/// Somewhere the user can complete a browser sign-in.
pub(crate) trait Browser: Send + Sync {
    fn open(&self, url: &Url) -> Result<()>;
}

pub(crate) struct Console;

impl Browser for Console {
    fn open(&self, url: &Url) -> Result<()> {
        eprintln!("To finish signing in, open this address in your browser:");
        eprintln!("  {url}");
        Ok(())
    }
}
