use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a script was loaded from, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceLocation {
    File(PathBuf),
    Uri(String),
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLocation::File(path) => write!(f, "{}", path.display()),
            ResourceLocation::Uri(uri) => f.write_str(uri),
        }
    }
}

/// An immutable script: its identity, diagnostics name, origin and text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    id: String,
    display_name: String,
    location: ResourceLocation,
    text: String,
}

impl ScriptSource {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        location: ResourceLocation,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            location,
            text: text.into(),
        }
    }

    /// Load a script from disk. The id is derived from the file name and path
    /// so that two files with the same name in different directories differ.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let stem = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("script");
        let id = stable_id(stem, &path.to_string_lossy());
        Ok(Self {
            id,
            display_name: format!("script '{}'", path.display()),
            location: ResourceLocation::File(path.to_path_buf()),
            text,
        })
    }

    /// A script that does not live on disk
    pub fn inline(name: &str, text: impl Into<String>) -> Self {
        let uri = format!("inline:{name}");
        Self {
            id: stable_id(name, &uri),
            display_name: format!("script '{name}'"),
            location: ResourceLocation::Uri(uri),
            text: text.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn location(&self) -> &ResourceLocation {
        &self.location
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

fn stable_id(name: &str, origin: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let digest = format!("{:x}", md5::compute(origin.as_bytes()));
    format!("{}_{}", sanitized, &digest[..8])
}
