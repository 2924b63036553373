use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated plugin identifier such as `org.example.lint`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginId(String);

impl PluginId {
    /// Validate and wrap a plugin id
    pub fn of(value: &str) -> Result<Self> {
        if let Some(reason) = invalid_reason(value) {
            return Err(Error::InvalidArgument(format!(
                "plugin id '{value}' is invalid: {reason}"
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid_reason(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("plugin id cannot be empty".to_string());
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Some(format!(
            "contains invalid char '{c}' (only ASCII alphanumeric characters, '.', '_' and '-' are valid)"
        ));
    }
    if value.starts_with('.') || value.ends_with('.') {
        return Some("plugin id cannot begin or end with '.'".to_string());
    }
    if value.contains("..") {
        return Some("plugin id cannot contain '..'".to_string());
    }
    None
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PluginId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        PluginId::of(&value)
    }
}

impl From<PluginId> for String {
    fn from(id: PluginId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        for id in ["java", "org.example.lint", "my-plugin_2", "a.b-c.d_e"] {
            assert!(PluginId::of(id).is_ok(), "expected '{id}' to be valid");
        }
    }

    #[test]
    fn test_invalid_ids() {
        for id in ["", ".lead", "trail.", "a..b", "has space", "semi;colon", "é"] {
            let err = PluginId::of(id).unwrap_err();
            assert!(
                matches!(err, Error::InvalidArgument(_)),
                "expected InvalidArgument for '{id}', got {err:?}"
            );
        }
    }

    #[test]
    fn test_serde_validates() {
        let id: PluginId = serde_json::from_str("\"org.example\"").unwrap();
        assert_eq!(id.as_str(), "org.example");
        assert!(serde_json::from_str::<PluginId>("\"bad..id\"").is_err());
    }
}
