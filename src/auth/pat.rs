// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Personal Access Token (PAT) authentication.

use super::TokenProvider;
use crate::error::{Error, Result};
use std::fmt;

/// A fixed token generated from the workspace user settings.
///
/// Refreshing is a no-op; the same token is returned every time.
#[derive(Clone)]
pub struct PersonalAccessToken {
    token: String,
}

impl PersonalAccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenProvider for PersonalAccessToken {
    fn get_access_token(&self, _force_refresh: bool) -> Result<String> {
        if self.token.is_empty() {
            return Err(Error::authentication("No valid access token available"));
        }
        Ok(self.token.clone())
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonalAccessToken")
            .field("token", &"<redacted>")
            .finish()
    }
}
