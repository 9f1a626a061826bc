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

//! Loading the engine configuration from disk.

use orion_core::config::EngineConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A failure to read the engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid configuration.
    #[error("failed to parse configuration '{path}': {source}")]
    Parse {
        /// The configuration file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
}

/// Reads an [`EngineConfig`] from a JSON file. Missing fields take their
/// defaults; a missing file is an error.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = EngineConfig::from_json(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_partial_config() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "title": "Viewer", "logging": { "filter": "debug" } }"#)?;

        let config = load_config(&path)?;
        assert_eq!(config.title, "Viewer");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.gpu_backend, "headless");
        assert!(config.asset_stores.is_empty());
        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config("/nonexistent/orion/engine.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("engine.json"));
    }

    #[test]
    fn invalid_json_is_a_parse_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("engine.json");
        std::fs::write(&path, "{ title: ")?;
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
        Ok(())
    }
}
