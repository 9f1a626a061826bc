// Copyright 2025 eraflo
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

//! Engine configuration, deserialised from JSON with every field optional.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level filter (e.g. "info", "debug").
    pub filter: String,
    /// Per-module level overrides, keyed by module path.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            modules: BTreeMap::new(),
        }
    }
}

/// An asset store mounted at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStoreConfig {
    /// Mount name, the first component of asset paths in the store.
    pub name: String,
    /// Registered store type (e.g. "fs").
    #[serde(rename = "type")]
    pub store_type: String,
    /// Type-specific location, such as a root directory.
    pub location: String,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application title.
    pub title: String,
    /// GPU backend name.
    pub gpu_backend: String,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Stores mounted at startup, in order.
    pub asset_stores: Vec<AssetStoreConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Orion".to_string(),
            gpu_backend: "headless".to_string(),
            logging: LoggingSettings::default(),
            asset_stores: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialises the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
