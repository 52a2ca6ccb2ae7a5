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

//! The shipped descriptor against what the shell expects of it.

use figment::{
    providers::{Format, Yaml},
    Figment,
};
use rp_config::{ConfigurationSection, RootConfig};
use rp_shell::{AuthEvent, CallbackOutcome, View, ATTRIBUTES_READ};

use crate::{init_test_with, user, MockClient, APP_CLIENT_ID, PROVIDER};

const SHIPPED: &str = include_str!("../../../../config.yaml");

fn shipped() -> RootConfig {
    let figment = Figment::new().merge(Yaml::string(SHIPPED));
    RootConfig::extract(&figment).unwrap()
}

#[test]
fn attribute_mapping_matches_what_the_shell_reads() {
    for descriptor in shipped().resolve_all() {
        let mapped: Vec<&str> = descriptor.provider.mapped_attributes().collect();

        // The shell never reads an attribute which is not mapped
        for attribute in ATTRIBUTES_READ {
            assert!(
                mapped.contains(attribute),
                "{attribute} is not mapped in {}",
                descriptor.environment
            );
        }

        // Nothing is mapped that the shell does not read
        for attribute in &mapped {
            assert!(ATTRIBUTES_READ.contains(attribute));
        }
    }
}

#[test]
fn shipped_provider_is_the_one_the_shell_signs_in_with() {
    for descriptor in shipped().resolve_all() {
        assert_eq!(descriptor.provider.name, PROVIDER);
    }
}

#[tokio::test]
async fn sign_in_on_every_environment() {
    for descriptor in shipped().resolve_all() {
        let mut config = descriptor.runtime_config();
        config.auth.app_client_id = Some(APP_CLIENT_ID.to_owned());
        let origin = descriptor.binding.callback_urls[0].as_str().to_owned();

        let (client, _recorded) = MockClient::new();
        let mut shell = init_test_with(client, &origin, config).await;

        let correlation = shell.begin_sign_in(PROVIDER).await.unwrap();
        shell.handle_event(AuthEvent::Callback {
            correlation,
            outcome: CallbackOutcome::SignedIn(user("alice")),
        });
        assert_eq!(shell.next_fetch_result().await, Some(true));
        assert_eq!(
            shell.view(),
            View::SignedIn {
                email: "alice@example.com".to_owned()
            }
        );
    }
}
