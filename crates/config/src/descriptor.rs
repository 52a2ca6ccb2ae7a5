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

//! A descriptor resolved for one environment, and what is derived from it.

use std::{collections::HashMap, fmt};

use rp_data_model::{AuthRuntimeConfig, ResponseType, RuntimeConfig, RUNTIME_CONFIG_VERSION};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::{ClientCredentials, EnvironmentConfig, PlatformConfig, ProviderConfig, RootConfig};

/// Error returned when resolving an environment which is not configured
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown environment {name:?}, configured environments are: {known}")]
pub struct UnknownEnvironmentError {
    /// The requested environment
    pub name: String,
    /// Comma-separated list of the configured environments
    pub known: String,
}

/// Error returned when descriptors meant to be interchangeable disagree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterchangeabilityError {
    /// Nothing to compare
    #[error("no descriptor to compare")]
    Empty,

    /// The provider name differs, so the shell can't sign in with both
    #[error(
        "environment {environment:?} registers provider {found:?}, \
         but environment {reference:?} registers {expected:?}"
    )]
    ProviderNameMismatch {
        /// The environment the others are compared to
        reference: String,
        /// Its provider name
        expected: String,
        /// The diverging environment
        environment: String,
        /// Its provider name
        found: String,
    },

    /// Two environments would claim the same hosted domain
    #[error("environments {first:?} and {second:?} both use the domain prefix {prefix:?}")]
    DuplicateDomainPrefix {
        /// The shared prefix
        prefix: String,
        /// The first environment using it
        first: String,
        /// The second environment using it
        second: String,
    },
}

/// The descriptor of the relying party, resolved for one environment
#[derive(Debug, Clone, Serialize)]
pub struct Descriptor {
    /// Name of the environment
    pub environment: String,

    /// The external provider registration
    pub provider: ProviderConfig,

    /// Settings of the managed identity platform
    pub platform: PlatformConfig,

    /// Environment-specific binding
    pub binding: EnvironmentConfig,
}

impl RootConfig {
    /// Resolve the descriptor for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is not configured
    pub fn resolve(&self, environment: &str) -> Result<Descriptor, UnknownEnvironmentError> {
        let binding = self
            .environments
            .get(environment)
            .ok_or_else(|| UnknownEnvironmentError {
                name: environment.to_owned(),
                known: self
                    .environments
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;

        Ok(Descriptor {
            environment: environment.to_owned(),
            provider: self.provider.clone(),
            platform: self.platform.clone(),
            binding: binding.clone(),
        })
    }

    /// Resolve the descriptor of every configured environment
    #[must_use]
    pub fn resolve_all(&self) -> Vec<Descriptor> {
        self.environments
            .iter()
            .map(|(environment, binding)| Descriptor {
                environment: environment.clone(),
                provider: self.provider.clone(),
                platform: self.platform.clone(),
                binding: binding.clone(),
            })
            .collect()
    }
}

/// Check that descriptors can be used interchangeably by the same shell: they
/// must register the same provider name, and claim distinct hosted domains.
///
/// # Errors
///
/// Returns the first disagreement found
pub fn check_interchangeable(descriptors: &[Descriptor]) -> Result<(), InterchangeabilityError> {
    let (reference, others) = descriptors
        .split_first()
        .ok_or(InterchangeabilityError::Empty)?;

    for descriptor in others {
        if descriptor.provider.name != reference.provider.name {
            return Err(InterchangeabilityError::ProviderNameMismatch {
                reference: reference.environment.clone(),
                expected: reference.provider.name.clone(),
                environment: descriptor.environment.clone(),
                found: descriptor.provider.name.clone(),
            });
        }
    }

    let mut prefixes: HashMap<String, &str> = HashMap::new();
    for descriptor in descriptors {
        // Compare full hosted domains, two regions may share a prefix
        let domain = descriptor.hosted_domain();
        if let Some(first) = prefixes.insert(domain, &descriptor.environment) {
            return Err(InterchangeabilityError::DuplicateDomainPrefix {
                prefix: descriptor.binding.domain_prefix.clone(),
                first: first.to_owned(),
                second: descriptor.environment.clone(),
            });
        }
    }

    Ok(())
}

impl Descriptor {
    /// The hosted login domain of this environment
    #[must_use]
    pub fn hosted_domain(&self) -> String {
        self.platform.hosted_domain(&self.binding.domain_prefix)
    }

    /// Generate the runtime configuration handed to the shell
    #[must_use]
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            version: RUNTIME_CONFIG_VERSION.to_owned(),
            auth: AuthRuntimeConfig {
                environment: self.environment.clone(),
                region: self.platform.region.clone(),
                hosted_domain: self.hosted_domain(),
                app_client_id: self.platform.app_client_id.clone(),
                identity_providers: vec![self.provider.name.clone()],
                scopes: self.provider.scopes.clone(),
                redirect_sign_in: self
                    .binding
                    .callback_urls
                    .iter()
                    .map(|url| url.as_str().to_owned())
                    .collect(),
                redirect_sign_out: self
                    .binding
                    .logout_urls
                    .iter()
                    .map(|url| url.as_str().to_owned())
                    .collect(),
                response_type: ResponseType::Code,
                user_attributes: self
                    .provider
                    .mapped_attributes()
                    .map(ToOwned::to_owned)
                    .collect(),
                login_with_email: self.platform.login_with_email,
            },
        }
    }

    /// Build the registration consumed by the provisioning backend
    #[must_use]
    pub fn registration<'a>(
        &'a self,
        credentials: &'a ClientCredentials,
    ) -> ProviderRegistration<'a> {
        ProviderRegistration {
            provider_name: &self.provider.name,
            provider_type: "OIDC",
            issuer: &self.provider.issuer,
            client_id: credentials.client_id(),
            client_secret: credentials.client_secret(),
            authorize_scopes: self.provider.scopes.join(" "),
            attribute_mapping: &self.provider.attribute_mapping,
            domain_prefix: &self.binding.domain_prefix,
            callback_urls: self.binding.callback_urls.iter().map(|u| u.as_str()).collect(),
            logout_urls: self.binding.logout_urls.iter().map(|u| u.as_str()).collect(),
        }
    }
}

/// The registration of one OIDC relying party at the user directory.
///
/// It borrows the resolved credentials, so it can't outlive them.
#[derive(Serialize)]
pub struct ProviderRegistration<'a> {
    /// The provider name
    pub provider_name: &'a str,
    /// Always `OIDC`
    pub provider_type: &'static str,
    /// The OIDC issuer
    pub issuer: &'a Url,
    /// Resolved client ID
    pub client_id: &'a str,
    /// Resolved client secret
    pub client_secret: &'a str,
    /// Space-separated scopes
    pub authorize_scopes: String,
    /// Local attribute to provider claim
    pub attribute_mapping: &'a std::collections::BTreeMap<String, String>,
    /// Hosted domain label
    pub domain_prefix: &'a str,
    /// Allowed post-login redirect targets
    pub callback_urls: Vec<&'a str>,
    /// Allowed post-logout redirect targets
    pub logout_urls: Vec<&'a str>,
}

impl fmt::Debug for ProviderRegistration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("provider_name", &self.provider_name)
            .field("provider_type", &self.provider_type)
            .field("issuer", &self.issuer.as_str())
            .field("client_id", &"[redacted]")
            .field("client_secret", &"[redacted]")
            .field("authorize_scopes", &self.authorize_scopes)
            .field("attribute_mapping", &self.attribute_mapping)
            .field("domain_prefix", &self.domain_prefix)
            .field("callback_urls", &self.callback_urls)
            .field("logout_urls", &self.logout_urls)
            .finish()
    }
}
