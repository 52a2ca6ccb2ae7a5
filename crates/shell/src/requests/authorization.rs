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

//! Requests for a redirect-based login through the hosted UI.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{
    distributions::{Alphanumeric, DistString},
    Rng,
};
use rp_data_model::ResponseType;
use serde::Serialize;
use serde_with::skip_serializing_none;
use sha2::{Digest, Sha256};
use url::Url;

use super::append_query;
use crate::error::RequestError;

/// The data necessary to build an authorization request.
#[derive(Debug, Clone)]
pub struct AuthorizationRequestData {
    /// The ID of the app client at the user directory.
    pub client_id: String,

    /// The external identity provider the hosted UI should forward to.
    pub identity_provider: String,

    /// The scopes to request, in order.
    pub scopes: Vec<String>,

    /// The URI to redirect the end-user to after the authorization.
    ///
    /// It must be one of the allowed post-login redirect targets, verbatim.
    pub redirect_uri: String,

    /// The response type to request.
    pub response_type: ResponseType,
}

/// The data necessary to validate the callback of an authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationValidationData {
    /// A unique identifier for the request.
    pub state: String,

    /// The URI where the end-user will be redirected after authorization.
    pub redirect_uri: String,

    /// The PKCE verifier, only set for the `code` response type.
    pub code_challenge_verifier: Option<String>,
}

#[skip_serializing_none]
#[derive(Serialize)]
struct AuthorizationQuery<'a> {
    identity_provider: &'a str,
    redirect_uri: &'a str,
    response_type: &'static str,
    client_id: &'a str,
    scope: String,
    state: &'a str,
    code_challenge_method: Option<&'static str>,
    code_challenge: Option<String>,
}

fn compute_s256_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    Base64UrlUnpadded::encode_string(&hash)
}

/// Build the URL for authenticating at the authorization endpoint of the
/// hosted UI.
///
/// # Arguments
///
/// * `authorization_endpoint` - The URL of the hosted UI's authorization
///   endpoint.
///
/// * `authorization_data` - The data necessary to build the authorization
///   request.
///
/// * `rng` - A random number generator.
///
/// # Returns
///
/// The URL the browser must be sent to, and the
/// [`AuthorizationValidationData`] to validate the callback.
///
/// # Errors
///
/// Returns an error if the query could not be encoded.
pub fn build_authorization_url(
    mut authorization_endpoint: Url,
    authorization_data: AuthorizationRequestData,
    rng: &mut (impl Rng + ?Sized),
) -> Result<(Url, AuthorizationValidationData), RequestError> {
    let AuthorizationRequestData {
        client_id,
        identity_provider,
        scopes,
        redirect_uri,
        response_type,
    } = authorization_data;

    tracing::debug!(
        %identity_provider,
        scope = ?scopes,
        "Authorizing..."
    );

    // Generate a random CSRF "state" token
    let state = Alphanumeric.sample_string(rng, 16);

    // PKCE is only meaningful when a code gets exchanged
    let code_challenge_verifier = match response_type {
        ResponseType::Code => {
            let mut verifier = [0u8; 32];
            rng.fill(&mut verifier);
            Some(Base64UrlUnpadded::encode_string(&verifier))
        }
        ResponseType::Token => None,
    };

    let query = AuthorizationQuery {
        identity_provider: &identity_provider,
        redirect_uri: &redirect_uri,
        response_type: response_type.as_str(),
        client_id: &client_id,
        scope: scopes.join(" "),
        state: &state,
        code_challenge_method: code_challenge_verifier.as_ref().map(|_| "S256"),
        code_challenge: code_challenge_verifier
            .as_deref()
            .map(compute_s256_challenge),
    };

    let query = serde_urlencoded::to_string(query)?;
    append_query(&mut authorization_endpoint, &query);

    let validation_data = AuthorizationValidationData {
        state,
        redirect_uri,
        code_challenge_verifier,
    };

    Ok((authorization_endpoint, validation_data))
}
