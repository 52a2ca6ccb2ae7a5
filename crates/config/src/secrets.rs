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

//! Resolution of the secret references of the descriptor.
//!
//! Secret values are only ever acquired for the duration of a closure (see
//! [`ProviderConfig::with_credentials`]) and wiped from memory afterwards.

use std::{collections::BTreeMap, fmt};

use thiserror::Error;
use zeroize::Zeroizing;

use crate::{ProviderConfig, SecretRef};

/// Errors returned when resolving a secret reference
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// The secret store does not know this secret
    #[error("secret {name:?} is not set")]
    Missing {
        /// Name of the secret
        name: String,
    },

    /// The secret is set but has no value
    #[error("secret {name:?} is empty")]
    Empty {
        /// Name of the secret
        name: String,
    },

    /// The secret value is not valid unicode
    #[error("secret {name:?} is not valid unicode")]
    NotUnicode {
        /// Name of the secret
        name: String,
    },
}

/// A store able to resolve secrets by name
pub trait SecretStore {
    /// Fetch the value of the named secret
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is unknown or unusable
    fn fetch(&self, name: &str) -> Result<Zeroizing<String>, SecretError>;
}

/// Resolves secrets from the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    prefix: Option<String>,
}

impl EnvSecretStore {
    /// Read secrets from variables named exactly like the secret
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read secrets from variables named like the secret, with a prefix
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl SecretStore for EnvSecretStore {
    fn fetch(&self, name: &str) -> Result<Zeroizing<String>, SecretError> {
        let variable = match &self.prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_owned(),
        };

        let value = std::env::var_os(&variable).ok_or_else(|| SecretError::Missing {
            name: name.to_owned(),
        })?;

        let value = Zeroizing::new(value.into_string().map_err(|_| SecretError::NotUnicode {
            name: name.to_owned(),
        })?);

        if value.is_empty() {
            return Err(SecretError::Empty {
                name: name.to_owned(),
            });
        }

        Ok(value)
    }
}

/// Holds secrets in memory, for tests and dry runs
#[derive(Default)]
pub struct StaticSecretStore {
    values: BTreeMap<String, Zeroizing<String>>,
}

impl StaticSecretStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret to the store
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(name.into(), Zeroizing::new(value.into()));
        self
    }
}

impl fmt::Debug for StaticSecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSecretStore")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SecretStore for StaticSecretStore {
    fn fetch(&self, name: &str) -> Result<Zeroizing<String>, SecretError> {
        let value = self.values.get(name).ok_or_else(|| SecretError::Missing {
            name: name.to_owned(),
        })?;

        if value.is_empty() {
            return Err(SecretError::Empty {
                name: name.to_owned(),
            });
        }

        Ok(value.clone())
    }
}

/// Credentials of the relying party at the external provider.
///
/// Only handed out by reference for the duration of
/// [`ProviderConfig::with_credentials`].
pub struct ClientCredentials {
    client_id: Zeroizing<String>,
    client_secret: Zeroizing<String>,
}

impl ClientCredentials {
    /// The client ID at the provider
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The client secret at the provider
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &"[redacted]")
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

fn fetch<S: SecretStore + ?Sized>(
    store: &S,
    reference: &SecretRef,
) -> Result<Zeroizing<String>, SecretError> {
    store.fetch(&reference.secret)
}

impl ProviderConfig {
    /// Resolve the credentials and run `f` with them.
    ///
    /// The resolved values are wiped when `f` returns.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the secrets can't be resolved
    #[tracing::instrument(
        name = "secrets.resolve",
        skip_all,
        fields(
            provider.name = %self.name,
            client_id.secret = %self.client_id.secret,
            client_secret.secret = %self.client_secret.secret,
        ),
        err,
    )]
    pub fn with_credentials<S, F, T>(&self, store: &S, f: F) -> Result<T, SecretError>
    where
        S: SecretStore + ?Sized,
        F: FnOnce(&ClientCredentials) -> T,
    {
        let credentials = ClientCredentials {
            client_id: fetch(store, &self.client_id)?,
            client_secret: fetch(store, &self.client_secret)?,
        };

        tracing::debug!("Resolved provider credentials");

        Ok(f(&credentials))
    }
}
