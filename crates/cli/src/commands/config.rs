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
use rp_config::{check_interchangeable, ConfigurationSection, RootConfig};
use tracing::{error, info, info_span};

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Dump the current config as YAML
    Dump,

    /// Check a config file, and that its environments are interchangeable
    Check,

    /// Print the JSON schema of the config file
    Schema,

    /// Check that descriptors from separate files are interchangeable
    Compare {
        /// The descriptor files, each loaded on its own
        #[arg(required = true, num_args = 2..)]
        files: Vec<Utf8PathBuf>,
    },
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as SC;
        match self.subcommand {
            SC::Dump => {
                let _span = info_span!("cli.config.dump").entered();

                let config = RootConfig::extract(figment)?;

                serde_yaml::to_writer(std::io::stdout(), &config)?;
            }

            SC::Check => {
                let _span = info_span!("cli.config.check").entered();

                let config = RootConfig::extract(figment)?;
                let descriptors = config.resolve_all();

                if let Err(e) = check_interchangeable(&descriptors) {
                    error!(error = &e as &dyn std::error::Error, "Environments conflict");
                    return Ok(ExitCode::FAILURE);
                }

                info!(
                    environments = descriptors.len(),
                    "Configuration file looks good"
                );
            }

            SC::Schema => {
                let _span = info_span!("cli.config.schema").entered();

                let schema = rp_config::json_schema();
                serde_json::to_writer_pretty(std::io::stdout(), &schema)?;
                println!();
            }

            SC::Compare { files } => {
                let _span = info_span!("cli.config.compare").entered();

                let mut descriptors = Vec::new();
                for file in &files {
                    let figment = rp_config::layered_figment(std::slice::from_ref(file));
                    let config = RootConfig::extract(&figment)
                        .with_context(|| format!("could not load {file}"))?;
                    descriptors.extend(config.resolve_all());
                }

                if let Err(e) = check_interchangeable(&descriptors) {
                    error!(error = &e as &dyn std::error::Error, "Descriptors conflict");
                    return Ok(ExitCode::FAILURE);
                }

                info!(files = files.len(), "Descriptors are interchangeable");
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
