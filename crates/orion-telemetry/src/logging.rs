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

//! Log sink initialisation over `env_logger`.

use anyhow::{Context, Result};
use env_logger::{Builder, Env};
use log::LevelFilter;
use orion_core::config::LoggingSettings;
use std::str::FromStr;

/// Filters applied to the log sink.
///
/// `RUST_LOG`, when set, replaces `default_filter`. Module filters are
/// applied on top of either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info"`.
    pub default_filter: String,
    /// Per-module level overrides as `(module path, level name)`.
    pub module_filters: Vec<(String, String)>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from(&LoggingSettings::default())
    }
}

impl From<&LoggingSettings> for LoggingConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            default_filter: settings.filter.clone(),
            module_filters: settings
                .modules
                .iter()
                .map(|(module, level)| (module.clone(), level.clone()))
                .collect(),
        }
    }
}

impl LoggingConfig {
    /// Parses the module overrides.
    pub fn module_levels(&self) -> Result<Vec<(&str, LevelFilter)>> {
        self.module_filters
            .iter()
            .map(|(module, level)| {
                let level = LevelFilter::from_str(level).with_context(|| {
                    format!("invalid log level '{}' for module '{}'", level, module)
                })?;
                Ok((module.as_str(), level))
            })
            .collect()
    }
}

/// Installs the global logger.
///
/// Returns `Ok(false)` when a logger was already installed, which leaves the
/// existing one in place. Invalid module levels are rejected before anything
/// is installed.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let module_levels = config.module_levels()?;

    let env = Env::default().default_filter_or(config.default_filter.as_str());
    let mut builder = Builder::from_env(env);
    for (module, level) in module_levels {
        builder.filter_module(module, level);
    }

    match builder.try_init() {
        Ok(()) => {
            log::debug!("Logging initialised (default filter '{}')", config.default_filter);
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn config_follows_engine_settings() {
        let settings = LoggingSettings {
            filter: "debug".to_string(),
            modules: BTreeMap::from([("orion_io".to_string(), "trace".to_string())]),
        };
        let config = LoggingConfig::from(&settings);
        assert_eq!(config.default_filter, "debug");
        assert_eq!(config.module_levels().unwrap(), vec![("orion_io", LevelFilter::Trace)]);
        assert_eq!(LoggingConfig::default().default_filter, "info");
    }

    #[test]
    fn invalid_module_level_is_rejected() {
        let config = LoggingConfig {
            default_filter: "info".to_string(),
            module_filters: vec![("orion_core".to_string(), "loud".to_string())],
        };
        let err = init_logging(&config).unwrap_err();
        assert_eq!(err.to_string(), "invalid log level 'loud' for module 'orion_core'");
    }

    #[test]
    fn second_initialisation_keeps_the_first_logger() -> Result<()> {
        let config = LoggingConfig::default();
        init_logging(&config)?;
        assert!(!init_logging(&config)?);
        Ok(())
    }
}
