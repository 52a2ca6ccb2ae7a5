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

//! Useful JSON Schema definitions

use schemars::{
    gen::{SchemaGenerator, SchemaSettings},
    schema::{InstanceType, RootSchema, Schema, SchemaObject, StringValidation},
    JsonSchema,
};

use crate::RootConfig;

/// Generate the JSON schema of the descriptor file
#[must_use]
pub fn json_schema() -> RootSchema {
    let settings = SchemaSettings::draft07().with(|s| {
        s.option_nullable = false;
        s.option_add_null_type = false;
    });
    settings.into_generator().into_root_schema_for::<RootConfig>()
}

/// A single DNS label, used as the hosted-domain prefix
pub struct DnsLabel;

impl JsonSchema for DnsLabel {
    fn schema_name() -> String {
        "DnsLabel".to_owned()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        Schema::Object(SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            string: Some(Box::new(StringValidation {
                max_length: Some(63),
                min_length: Some(1),
                pattern: Some(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$".to_owned()),
            })),
            ..SchemaObject::default()
        })
    }
}

/// An absolute URL kept verbatim
pub struct AbsoluteUrl;

impl JsonSchema for AbsoluteUrl {
    fn schema_name() -> String {
        "AbsoluteUrl".to_owned()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        Schema::Object(SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            format: Some("uri".to_owned()),
            ..SchemaObject::default()
        })
    }
}
