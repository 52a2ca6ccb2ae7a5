// Copyright 2024 The rp-shell authors
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

//! The generated document handed to the shell at startup.
//!
//! It is produced by provisioning from a resolved descriptor and contains
//! endpoints and identifiers only, never credentials.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use url::Url;

/// Version of the runtime configuration format
pub const RUNTIME_CONFIG_VERSION: &str = "1";

#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    #[error("could not parse the runtime configuration")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported runtime configuration version {0:?}")]
    UnsupportedVersion(String),

    #[error("invalid hosted domain {domain:?}")]
    InvalidHostedDomain {
        domain: String,
        #[source]
        source: url::ParseError,
    },
}

/// OAuth 2.0 response type requested at the hosted UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Code,
    Token,
}

impl ResponseType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Token => "token",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub version: String,
    pub auth: AuthRuntimeConfig,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRuntimeConfig {
    /// The environment this document was generated for
    pub environment: String,

    /// Region of the managed identity platform
    pub region: String,

    /// Host name of the hosted login UI
    pub hosted_domain: String,

    /// Identifier of the app client registered at the user directory
    pub app_client_id: Option<String>,

    /// Names of the external identity providers
    pub identity_providers: Vec<String>,

    pub scopes: Vec<String>,

    /// Allowed post-login redirect targets, verbatim
    pub redirect_sign_in: Vec<String>,

    /// Allowed post-logout redirect targets, verbatim
    pub redirect_sign_out: Vec<String>,

    #[serde(default)]
    pub response_type: ResponseType,

    /// Local attributes mapped from the provider claims
    pub user_attributes: Vec<String>,

    #[serde(default)]
    pub login_with_email: bool,
}

impl RuntimeConfig {
    /// Parse a runtime configuration document
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON, has an unknown
    /// version or an invalid hosted domain
    pub fn from_json(document: &str) -> Result<Self, RuntimeConfigError> {
        let config: Self = serde_json::from_str(document)?;

        if config.version != RUNTIME_CONFIG_VERSION {
            return Err(RuntimeConfigError::UnsupportedVersion(config.version));
        }

        config.auth.hosted_ui_base()?;

        Ok(config)
    }

    /// Serialize the document as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl AuthRuntimeConfig {
    /// The base URL of the hosted login UI
    ///
    /// # Errors
    ///
    /// Returns an error if the hosted domain does not form a valid URL
    pub fn hosted_ui_base(&self) -> Result<Url, RuntimeConfigError> {
        Url::parse(&format!("https://{}/", self.hosted_domain)).map_err(|source| {
            RuntimeConfigError::InvalidHostedDomain {
                domain: self.hosted_domain.clone(),
                source,
            }
        })
    }

    /// Find the post-login redirect target matching the given origin exactly
    #[must_use]
    pub fn sign_in_redirect_for(&self, origin: &str) -> Option<&str> {
        self.redirect_sign_in
            .iter()
            .map(String::as_str)
            .find(|url| *url == origin)
    }

    /// Find the post-logout redirect target matching the given origin exactly
    #[must_use]
    pub fn sign_out_redirect_for(&self, origin: &str) -> Option<&str> {
        self.redirect_sign_out
            .iter()
            .map(String::as_str)
            .find(|url| *url == origin)
    }

    /// Whether the given attribute is mapped from the provider
    #[must_use]
    pub fn maps_attribute(&self, name: &str) -> bool {
        self.user_attributes.iter().any(|a| a == name)
    }
}
