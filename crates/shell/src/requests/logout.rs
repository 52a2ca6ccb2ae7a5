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

//! Requests for terminating the session at the hosted UI.

use serde::Serialize;
use url::Url;

use super::append_query;
use crate::error::RequestError;

/// The data necessary to build a logout request.
#[derive(Debug, Clone)]
pub struct LogoutData {
    /// The ID of the app client at the user directory.
    pub client_id: String,

    /// URI to which the browser is sent back after the logout.
    ///
    /// It must be one of the allowed post-logout redirect targets, verbatim.
    pub logout_uri: String,
}

#[derive(Serialize)]
struct LogoutQuery<'a> {
    client_id: &'a str,
    logout_uri: &'a str,
}

/// Build the URL for initiating logout at the logout endpoint.
///
/// # Errors
///
/// Returns an error if the query could not be encoded.
pub fn build_logout_url(
    mut logout_endpoint: Url,
    logout_data: &LogoutData,
) -> Result<Url, RequestError> {
    let query = serde_urlencoded::to_string(LogoutQuery {
        client_id: &logout_data.client_id,
        logout_uri: &logout_data.logout_uri,
    })?;

    append_query(&mut logout_endpoint, &query);

    Ok(logout_endpoint)
}
