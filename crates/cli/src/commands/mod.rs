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
use rp_config::{ConfigurationSection, Descriptor, RootConfig};

mod config;
mod debug;
mod provision;

#[derive(Parser, Debug)]
enum Subcommand {
    /// Configuration-related commands
    Config(self::config::Options),

    /// Resolve an environment and generate its runtime configuration
    Provision(self::provision::Options),

    /// Debug utilities
    Debug(self::debug::Options),
}

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Options {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        global = true,
        default_value = "config.yaml",
        action = clap::ArgAction::Append
    )]
    config: Vec<Utf8PathBuf>,

    /// The environment to operate on
    #[arg(short, long, global = true, env = "RP_ENVIRONMENT")]
    environment: Option<String>,

    #[command(subcommand)]
    subcommand: Subcommand,
}

impl Options {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        use Subcommand as S;

        let figment = rp_config::layered_figment(&self.config);
        let environment = self.environment.as_deref();

        match self.subcommand {
            S::Config(c) => c.run(&figment).await,
            S::Provision(c) => c.run(&figment, environment).await,
            S::Debug(c) => c.run(&figment, environment).await,
        }
    }
}

/// Load the descriptor and resolve the selected environment.
///
/// Without an explicit selection, a descriptor with a single environment
/// resolves to it.
fn resolve(figment: &Figment, environment: Option<&str>) -> anyhow::Result<Descriptor> {
    let config = RootConfig::extract(figment).context("could not load configuration")?;

    let environment = match environment {
        Some(environment) => environment.to_owned(),
        None if config.environments.len() == 1 => {
            config.environments.keys().next().cloned().unwrap_or_default()
        }
        None => anyhow::bail!(
            "several environments are configured, select one with --environment or RP_ENVIRONMENT"
        ),
    };

    Ok(config.resolve(&environment)?)
}
