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
use camino::Utf8PathBuf;
use clap::Parser;
use figment::Figment;
use rp_config::{check_interchangeable, ConfigurationSection, EnvSecretStore, RootConfig};
use tracing::{info, info_span};

#[derive(Parser, Debug)]
pub(super) struct Options {
    /// Where to write the runtime configuration. Printed on stdout if absent
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    /// Resolve everything, but do not write the runtime configuration
    #[arg(long)]
    dry_run: bool,
}

impl Options {
    pub async fn run(
        self,
        figment: &Figment,
        environment: Option<&str>,
    ) -> anyhow::Result<ExitCode> {
        let descriptor = super::resolve(figment, environment)?;
        let _span = info_span!(
            "cli.provision",
            environment = %descriptor.environment,
            dry_run = self.dry_run,
        )
        .entered();

        // Every environment must stay usable by the same shell
        let config = RootConfig::extract(figment)?;
        check_interchangeable(&config.resolve_all())
            .context("environments of the descriptor conflict")?;

        let store = EnvSecretStore::new();
        descriptor
            .provider
            .with_credentials(&store, |credentials| {
                let registration = descriptor.registration(credentials);
                info!(
                    provider.name = registration.provider_name,
                    provider.issuer = %registration.issuer,
                    domain_prefix = registration.domain_prefix,
                    scopes = %registration.authorize_scopes,
                    callback_urls = ?registration.callback_urls,
                    logout_urls = ?registration.logout_urls,
                    "Provider registration resolved"
                );
            })
            .context("could not resolve the provider credentials")?;

        let runtime_config = descriptor.runtime_config();
        let json = runtime_config.to_json_pretty()?;

        match (self.output, self.dry_run) {
            (_, true) => {
                info!(
                    hosted_domain = %runtime_config.auth.hosted_domain,
                    "Dry run, not writing the runtime configuration"
                );
            }
            (Some(path), false) => {
                std::fs::write(&path, json + "\n")
                    .with_context(|| format!("could not write {path}"))?;
                info!(%path, "Runtime configuration written");
            }
            (None, false) => println!("{json}"),
        }

        Ok(ExitCode::SUCCESS)
    }
}
