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

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::util::{annotate, ConfigurationSection};

fn default_region() -> String {
    "us-west-2".to_owned()
}

fn default_true() -> bool {
    true
}

/// Settings of the managed identity platform hosting the user directory
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlatformConfig {
    /// Region of the platform. The hosted login domain is
    /// `<domain_prefix>.auth.<region>.amazoncognito.com`
    #[serde(default = "default_region")]
    pub region: String,

    /// Identifier of the app client registered at the user directory.
    ///
    /// It is assigned by the platform on first deployment, and is not a
    /// secret.
    #[serde(default)]
    pub app_client_id: Option<String>,

    /// Whether users can also sign in with their email address
    #[serde(default = "default_true")]
    pub login_with_email: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            app_client_id: None,
            login_with_email: true,
        }
    }
}

impl PlatformConfig {
    /// The hosted login domain for the given prefix
    #[must_use]
    pub fn hosted_domain(&self, domain_prefix: &str) -> String {
        format!("{domain_prefix}.auth.{region}.amazoncognito.com", region = self.region)
    }
}

impl ConfigurationSection for PlatformConfig {
    const PATH: Option<&'static str> = Some("platform");

    fn validate(&self, figment: &figment::Figment) -> Result<(), figment::Error> {
        let valid_region = !self.region.is_empty()
            && self
                .region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

        if !valid_region {
            return Err(annotate(
                figment,
                figment::Error::from(format!("invalid region {:?}", self.region)),
                &["platform", "region"],
            ));
        }

        if self.app_client_id.as_deref() == Some("") {
            return Err(annotate(
                figment,
                figment::Error::from("app client ID is empty".to_owned()),
                &["platform", "app_client_id"],
            ));
        }

        Ok(())
    }
}
