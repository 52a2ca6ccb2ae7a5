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

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    ops::Deref,
};

use schemars::{gen::SchemaGenerator, schema::Schema, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{
    schema::{AbsoluteUrl, DnsLabel},
    util::{annotate, ConfigurationSection},
};

/// Error returned when a redirect URL is not an absolute HTTP(S) URL
#[derive(Debug, Error)]
pub enum InvalidRedirectUrlError {
    /// The URL could not be parsed
    #[error("invalid redirect URL {url:?}")]
    Parse {
        /// The rejected value
        url: String,
        /// Why parsing failed
        #[source]
        source: url::ParseError,
    },

    /// The URL is not an `http` or `https` URL with a host
    #[error("redirect URL {0:?} must be an http(s) URL with a host")]
    NotHttp(String),
}

/// An allowed redirect target.
///
/// Matching is exact, so the configured text is kept as written: a trailing
/// slash is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RedirectUrl {
    raw: String,
    url: Url,
}

impl RedirectUrl {
    /// The URL as configured
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed form of the URL
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether this target matches the given origin exactly
    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        self.raw == origin
    }
}

impl TryFrom<String> for RedirectUrl {
    type Error = InvalidRedirectUrlError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let url = match Url::parse(&raw) {
            Ok(url) => url,
            Err(source) => return Err(InvalidRedirectUrlError::Parse { url: raw, source }),
        };

        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(InvalidRedirectUrlError::NotHttp(raw));
        }

        Ok(Self { raw, url })
    }
}

impl std::str::FromStr for RedirectUrl {
    type Err = InvalidRedirectUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.to_owned().try_into()
    }
}

impl From<RedirectUrl> for String {
    fn from(value: RedirectUrl) -> Self {
        value.raw
    }
}

impl fmt::Display for RedirectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl JsonSchema for RedirectUrl {
    fn schema_name() -> String {
        AbsoluteUrl::schema_name()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        AbsoluteUrl::json_schema(gen)
    }
}

/// Deployment-specific part of the descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnvironmentConfig {
    /// Label prepended to the platform's auth domain to form the hosted
    /// login domain. Must be unique within the platform region.
    #[schemars(with = "DnsLabel")]
    pub domain_prefix: String,

    /// Allowed post-login redirect targets
    pub callback_urls: Vec<RedirectUrl>,

    /// Allowed post-logout redirect targets
    pub logout_urls: Vec<RedirectUrl>,
}

impl EnvironmentConfig {
    /// Find the post-login redirect target matching the given origin
    #[must_use]
    pub fn callback_url_for(&self, origin: &str) -> Option<&RedirectUrl> {
        self.callback_urls.iter().find(|url| url.matches(origin))
    }

    /// Find the post-logout redirect target matching the given origin
    #[must_use]
    pub fn logout_url_for(&self, origin: &str) -> Option<&RedirectUrl> {
        self.logout_urls.iter().find(|url| url.matches(origin))
    }
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_environment_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Environment bindings, keyed by environment name
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EnvironmentsConfig(BTreeMap<String, EnvironmentConfig>);

impl Deref for EnvironmentsConfig {
    type Target = BTreeMap<String, EnvironmentConfig>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<(String, EnvironmentConfig)> for EnvironmentsConfig {
    fn from_iter<T: IntoIterator<Item = (String, EnvironmentConfig)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ConfigurationSection for EnvironmentsConfig {
    const PATH: Option<&'static str> = Some("environments");

    fn validate(&self, figment: &figment::Figment) -> Result<(), figment::Error> {
        if self.0.is_empty() {
            return Err(annotate(
                figment,
                figment::Error::from("at least one environment must be configured".to_owned()),
                &["environments"],
            ));
        }

        // Hosted domains are unique within a platform region
        let mut prefixes: HashMap<&str, &str> = HashMap::new();

        for (name, environment) in &self.0 {
            let error_on = |field: &str, message: String| {
                Err(annotate(
                    figment,
                    figment::Error::from(message),
                    &["environments", name.as_str(), field],
                ))
            };

            if !is_environment_name(name) {
                return Err(annotate(
                    figment,
                    figment::Error::from(format!("invalid environment name {name:?}")),
                    &["environments", name.as_str()],
                ));
            }

            if !is_dns_label(&environment.domain_prefix) {
                return error_on(
                    "domain_prefix",
                    format!(
                        "domain prefix {:?} is not a valid DNS label",
                        environment.domain_prefix
                    ),
                );
            }

            if let Some(other) = prefixes.insert(&environment.domain_prefix, name) {
                return error_on(
                    "domain_prefix",
                    format!(
                        "domain prefix {:?} is already used by environment {other:?}",
                        environment.domain_prefix
                    ),
                );
            }

            for (field, urls) in [
                ("callback_urls", &environment.callback_urls),
                ("logout_urls", &environment.logout_urls),
            ] {
                if urls.is_empty() {
                    return error_on(
                        field,
                        "at least one URL is required, no redirect could ever succeed otherwise"
                            .to_owned(),
                    );
                }

                let mut seen = HashSet::new();
                for url in urls {
                    if !seen.insert(url.as_str()) {
                        return error_on(field, format!("{url} is listed twice"));
                    }
                }
            }
        }

        Ok(())
    }
}
