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

//! Builders for the redirect requests handed to the auth client.

use rand::RngCore;
use rp_data_model::{AuthRuntimeConfig, CorrelationToken};
use url::Url;

use self::{
    authorization::{build_authorization_url, AuthorizationRequestData},
    logout::{build_logout_url, LogoutData},
};
use crate::{
    error::{RequestError, ShellError},
    SignInRequest, SignOutRequest,
};

pub mod authorization;
pub mod logout;

/// Pick the allowed redirect target for the given origin.
///
/// Targets are matched exactly, trailing slash included. The browser only
/// comes back to the origin the redirect started from.
fn redirect_target<'a>(
    targets: &'a [String],
    origin: &str,
    kind: &'static str,
) -> Result<&'a str, ShellError> {
    if targets.is_empty() {
        return Err(ShellError::NoRedirectTarget(kind));
    }

    let target = targets
        .iter()
        .find(|target| *target == origin)
        .ok_or_else(|| ShellError::OriginNotAllowed {
            origin: origin.to_owned(),
            kind,
        })?;

    Ok(target.as_str())
}

/// Build the login request for the given provider.
///
/// # Errors
///
/// Returns an error if the provider is unknown, the configuration lacks what
/// the request needs, or the URL could not be built
pub fn build_sign_in_request(
    config: &AuthRuntimeConfig,
    provider: &str,
    origin: &str,
    correlation: CorrelationToken,
    rng: &mut (impl RngCore + ?Sized),
) -> Result<SignInRequest, ShellError> {
    if !config.identity_providers.iter().any(|p| p == provider) {
        return Err(ShellError::UnknownProvider(provider.to_owned()));
    }

    let client_id = config
        .app_client_id
        .clone()
        .ok_or(ShellError::MissingAppClientId)?;

    let redirect_uri = redirect_target(&config.redirect_sign_in, origin, "sign-in")?;

    let (url, validation) = build_authorization_url(
        authorization_endpoint(config)?,
        AuthorizationRequestData {
            client_id,
            identity_provider: provider.to_owned(),
            scopes: config.scopes.clone(),
            redirect_uri: redirect_uri.to_owned(),
            response_type: config.response_type,
        },
        rng,
    )?;

    Ok(SignInRequest {
        correlation,
        provider: provider.to_owned(),
        url,
        validation,
    })
}

/// Build the logout request.
///
/// # Errors
///
/// Returns an error if the configuration lacks what the request needs, or
/// the URL could not be built
pub fn build_sign_out_request(
    config: &AuthRuntimeConfig,
    origin: &str,
    correlation: CorrelationToken,
) -> Result<SignOutRequest, ShellError> {
    let client_id = config
        .app_client_id
        .clone()
        .ok_or(ShellError::MissingAppClientId)?;

    let logout_uri = redirect_target(&config.redirect_sign_out, origin, "sign-out")?;

    let logout_data = LogoutData {
        client_id,
        logout_uri: logout_uri.to_owned(),
    };
    let url = build_logout_url(logout_endpoint(config)?, &logout_data)?;

    Ok(SignOutRequest {
        correlation,
        url,
        logout_uri: logout_data.logout_uri,
    })
}

/// The authorization endpoint of the hosted UI
///
/// # Errors
///
/// Returns an error if the hosted domain does not form a valid URL
pub fn authorization_endpoint(config: &AuthRuntimeConfig) -> Result<Url, RequestError> {
    Ok(config.hosted_ui_base()?.join("oauth2/authorize")?)
}

/// The logout endpoint of the hosted UI
///
/// # Errors
///
/// Returns an error if the hosted domain does not form a valid URL
pub fn logout_endpoint(config: &AuthRuntimeConfig) -> Result<Url, RequestError> {
    Ok(config.hosted_ui_base()?.join("logout")?)
}

// Add our parameters to the query, because the URL might already have one.
fn append_query(url: &mut Url, query: &str) {
    let mut full_query = url.query().map(ToOwned::to_owned).unwrap_or_default();
    if !full_query.is_empty() {
        full_query.push('&');
    }
    full_query.push_str(query);

    url.set_query(Some(&full_query));
}
