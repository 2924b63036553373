use crate::{
    error::{Error, Result},
    types::{Location, PluginId},
};
use serde::Serialize;
use std::fmt;

/// A plugin declared by a script, to be resolved and applied before the
/// rest of the script is compiled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginRequest {
    id: PluginId,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    script_display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<Location>,
}

impl PluginRequest {
    pub fn new(
        id: PluginId,
        version: Option<String>,
        script_display_name: impl Into<String>,
    ) -> Result<Self> {
        if version.as_deref().is_some_and(str::is_empty) {
            return Err(Error::InvalidArgument(
                "plugin version cannot be null or empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            version,
            script_display_name: script_display_name.into(),
            location: None,
        })
    }

    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn script_display_name(&self) -> &str {
        &self.script_display_name
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Where the request was declared, e.g. `script 'build.script' (line 3)`
    pub fn declaration_site(&self) -> String {
        match self.location {
            Some(location) => format!("{} (line {})", self.script_display_name, location.line),
            None => self.script_display_name.clone(),
        }
    }
}

impl fmt::Display for PluginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "[id: '{}', version: '{}']", self.id, version),
            None => write!(f, "[id: '{}']", self.id),
        }
    }
}
