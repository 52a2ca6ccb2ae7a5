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

use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::{
    schema::AbsoluteUrl,
    util::{annotate, ConfigurationSection},
};

/// Local user attributes which can be mapped from provider claims
pub const KNOWN_ATTRIBUTES: &[&str] = &[
    "address",
    "birthdate",
    "email",
    "family_name",
    "gender",
    "given_name",
    "locale",
    "middle_name",
    "name",
    "nickname",
    "phone_number",
    "picture",
    "preferred_username",
    "profile",
    "updated_at",
    "website",
    "zoneinfo",
];

/// Provider names are limited by the user directory
const MAX_PROVIDER_NAME_LENGTH: usize = 32;

/// Reference to a value held by the secret store.
///
/// Credentials are never written in the descriptor itself, only the name
/// under which the secret store knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SecretRef {
    /// Name of the secret
    pub secret: String,
}

impl SecretRef {
    /// Reference the secret with the given name
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

/// Registration of the external OIDC provider
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProviderConfig {
    /// Identifier used by the shell to request this provider at sign-in.
    ///
    /// Must match exactly the name the shell is built with.
    pub name: String,

    /// Client ID obtained when registering with the provider
    pub client_id: SecretRef,

    /// Client secret obtained when registering with the provider
    pub client_secret: SecretRef,

    /// The OIDC issuer URL
    #[schemars(with = "AbsoluteUrl")]
    pub issuer: Url,

    /// Scopes to request, in order. Must include `openid`.
    pub scopes: Vec<String>,

    /// Local attribute name to provider claim name
    pub attribute_mapping: BTreeMap<String, String>,
}

impl ProviderConfig {
    /// Whether the given scope is requested
    #[must_use]
    pub fn requests_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Local attributes mapped from the provider, in name order
    pub fn mapped_attributes(&self) -> impl Iterator<Item = &str> {
        self.attribute_mapping.keys().map(String::as_str)
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain == "localhost",
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

impl ConfigurationSection for ProviderConfig {
    const PATH: Option<&'static str> = Some("provider");

    fn validate(&self, figment: &figment::Figment) -> Result<(), figment::Error> {
        let error_on = |field: &str, message: String| {
            Err(annotate(
                figment,
                figment::Error::from(message),
                &["provider", field],
            ))
        };

        if self.name.is_empty() || self.name.len() > MAX_PROVIDER_NAME_LENGTH {
            return error_on(
                "name",
                format!("provider name must be between 1 and {MAX_PROVIDER_NAME_LENGTH} characters"),
            );
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return error_on(
                "name",
                format!(
                    "provider name {:?} may only contain ASCII letters, digits, '_' and '-'",
                    self.name
                ),
            );
        }

        if self.client_id.secret.is_empty() {
            return error_on("client_id", "secret name is empty".to_owned());
        }

        if self.client_secret.secret.is_empty() {
            return error_on("client_secret", "secret name is empty".to_owned());
        }

        match self.issuer.scheme() {
            "https" => {}
            "http" if is_loopback(&self.issuer) => {}
            scheme => {
                return error_on(
                    "issuer",
                    format!("issuer must use https, got {scheme:?}"),
                );
            }
        }

        if self.issuer.query().is_some() || self.issuer.fragment().is_some() {
            return error_on(
                "issuer",
                "issuer must not have a query or a fragment".to_owned(),
            );
        }

        if !self.requests_scope("openid") {
            return error_on("scopes", "scopes must include \"openid\"".to_owned());
        }

        let mut seen = HashSet::new();
        for scope in &self.scopes {
            if scope.is_empty() || scope.contains(char::is_whitespace) {
                return error_on("scopes", format!("invalid scope {scope:?}"));
            }

            if !seen.insert(scope.as_str()) {
                return error_on("scopes", format!("scope {scope:?} is listed twice"));
            }
        }

        if self.attribute_mapping.is_empty() {
            return error_on(
                "attribute_mapping",
                "at least one attribute must be mapped".to_owned(),
            );
        }

        for (attribute, claim) in &self.attribute_mapping {
            if !KNOWN_ATTRIBUTES.contains(&attribute.as_str()) {
                return error_on(
                    "attribute_mapping",
                    format!("unknown local attribute {attribute:?}"),
                );
            }

            if claim.is_empty() {
                return error_on(
                    "attribute_mapping",
                    format!("attribute {attribute:?} is mapped to an empty claim name"),
                );
            }
        }

        Ok(())
    }
}
