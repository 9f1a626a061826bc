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

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Loader attributes attached to an asset by its store.
///
/// Attributes tune how a loader builds the asset (sampler settings for a
/// texture, for example) and are stored alongside the data as a JSON
/// object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetAttributes(Map<String, Value>);

impl AssetAttributes {
    /// Creates an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Raw value of an attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether the attribute is set.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String attribute. `None` if absent or not a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Boolean attribute.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Non-negative integer attribute that fits in a `u32`.
    pub fn get_u32(&self, name: &str) -> Option<u32> {
        self.get(name)
            .and_then(Value::as_u64)
            .and_then(|value| u32::try_from(value).ok())
    }

    /// Numeric attribute.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(Value::as_f64).map(|value| value as f32)
    }

    /// Deserializes an attribute into `T`.
    ///
    /// Returns `Ok(None)` if the attribute is absent.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, serde_json::Error> {
        self.get(name).map(|value| T::deserialize(value)).transpose()
    }

    /// Iterates over the attributes.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl From<Map<String, Value>> for AssetAttributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_getters_reject_mismatched_values() {
        let attributes: AssetAttributes = serde_json::from_value(json!({
            "address_mode": "wrap",
            "anisotropy": 16,
            "scale": 0.5,
            "srgb": true,
            "negative": -1,
        }))
        .unwrap();

        assert_eq!(attributes.get_str("address_mode"), Some("wrap"));
        assert_eq!(attributes.get_u32("anisotropy"), Some(16));
        assert_eq!(attributes.get_f32("anisotropy"), Some(16.0));
        assert_eq!(attributes.get_f32("scale"), Some(0.5));
        assert_eq!(attributes.get_bool("srgb"), Some(true));
        assert_eq!(attributes.get_u32("negative"), None);
        assert_eq!(attributes.get_str("anisotropy"), None);
        assert_eq!(attributes.get_str("missing"), None);
    }

    #[test]
    fn get_as_deserializes_structured_values() {
        let attributes = AssetAttributes::new().with("offset", json!([1.0, 2.0]));

        let offset: Option<[f32; 2]> = attributes.get_as("offset").unwrap();
        assert_eq!(offset, Some([1.0, 2.0]));

        let missing: Option<[f32; 2]> = attributes.get_as("missing").unwrap();
        assert_eq!(missing, None);

        assert!(attributes.get_as::<String>("offset").is_err());
    }
}
