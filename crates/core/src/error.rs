use std::io;

use crate::types::Location;

/// Errors that can occur while staging or applying a script
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not compile {script}{}: {message}", at_location(.location))]
    ScriptCompile {
        script: String,
        location: Option<Location>,
        message: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Plugin {plugin} requested in {script} could not be resolved: {message}")]
    PluginResolution {
        script: String,
        plugin: String,
        message: String,
    },

    #[error("Plugin with id '{id}' was already requested in {first} and is requested again in {second}")]
    DuplicatePluginRequest {
        id: String,
        first: String,
        second: String,
    },

    #[error("Scope '{0}' is locked and cannot be modified")]
    ScopeLocked(String),

    #[error("No capability of type {0} is registered")]
    MissingCapability(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a compile error for the given script display name
    pub fn compile(
        script: impl Into<String>,
        location: Option<Location>,
        message: impl Into<String>,
    ) -> Self {
        Error::ScriptCompile {
            script: script.into(),
            location,
            message: message.into(),
        }
    }

    /// Source position carried by location-aware errors
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::ScriptCompile { location, .. } => *location,
            _ => None,
        }
    }
}

fn at_location(location: &Option<Location>) -> String {
    location
        .map(|location| format!(" ({location})"))
        .unwrap_or_default()
}

/// Result type alias for scriptstage operations
pub type Result<T> = std::result::Result<T, Error>;
