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

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use figment::Figment;
use rp_data_model::{Clock, CorrelationToken, SystemClock};
use rp_shell::requests::{build_sign_in_request, build_sign_out_request};
use tracing::{info, info_span};

#[derive(Parser, Debug)]
pub(super) struct Options {
    /// The app client ID at the user directory. Defaults to the one in the
    /// platform settings
    #[arg(long, global = true, env = "RP_APP_CLIENT_ID")]
    client_id: Option<String>,

    /// The origin the shell is served from. Defaults to the first allowed
    /// redirect target
    #[arg(long, global = true)]
    origin: Option<String>,

    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Print the URL a sign-in would redirect to
    SignInUrl {
        /// The identity provider to sign in with. Defaults to the configured
        /// provider
        #[arg(long)]
        provider: Option<String>,
    },

    /// Print the URL a sign-out would redirect to
    SignOutUrl,
}

impl Options {
    pub async fn run(
        self,
        figment: &Figment,
        environment: Option<&str>,
    ) -> anyhow::Result<ExitCode> {
        use Subcommand as SC;

        let descriptor = super::resolve(figment, environment)?;
        let mut runtime_config = descriptor.runtime_config();
        if let Some(client_id) = self.client_id {
            runtime_config.auth.app_client_id = Some(client_id);
        }
        let auth = &runtime_config.auth;

        let clock = SystemClock;
        let mut rng = rand::thread_rng();
        let correlation = CorrelationToken::generate(clock.now(), &mut rng);

        match self.subcommand {
            SC::SignInUrl { provider } => {
                let _span = info_span!("cli.debug.sign_in_url").entered();

                let provider = provider.unwrap_or_else(|| descriptor.provider.name.clone());
                let origin = self
                    .origin
                    .or_else(|| auth.redirect_sign_in.first().cloned())
                    .context("no callback URL is configured")?;

                let request =
                    build_sign_in_request(auth, &provider, &origin, correlation, &mut rng)?;
                info!(
                    %correlation,
                    redirect_uri = %request.validation.redirect_uri,
                    "Built sign-in request"
                );
                println!("{}", request.url);
            }

            SC::SignOutUrl => {
                let _span = info_span!("cli.debug.sign_out_url").entered();

                let origin = self
                    .origin
                    .or_else(|| auth.redirect_sign_out.first().cloned())
                    .context("no logout URL is configured")?;

                let request = build_sign_out_request(auth, &origin, correlation)?;
                info!(
                    %correlation,
                    logout_uri = %request.logout_uri,
                    "Built sign-out request"
                );
                println!("{}", request.url);
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
