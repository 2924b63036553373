use super::PluginRequest;
use crate::{
    error::{Error, Result},
    scope::{ClasspathEntry, Scope},
    script::ScriptHandler,
    types::PluginId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolves collected plugin requests and makes them visible in a scope
pub trait PluginRequestApplicator: Send + Sync {
    fn apply_plugins(
        &self,
        requests: &[PluginRequest],
        script_handler: &ScriptHandler,
        target_scope: &Scope,
    ) -> Result<()>;
}

/// Known versions of one plugin, each mapped to its classpath entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<String>,
    #[serde(default)]
    pub versions: BTreeMap<String, Vec<String>>,
}

impl CatalogEntry {
    /// Pick the version to use for a request. Without a requested version the
    /// default wins, or the only version if there is exactly one.
    pub fn resolve_version<'a>(
        &'a self,
        requested: Option<&'a str>,
    ) -> std::result::Result<&'a str, String> {
        match requested {
            Some(version) if self.versions.contains_key(version) => Ok(version),
            Some(version) => Err(format!(
                "version '{version}' is not available (available: {})",
                self.available()
            )),
            None => match &self.default_version {
                Some(version) => Ok(version.as_str()),
                None if self.versions.len() == 1 => {
                    Ok(self.versions.keys().next().map(String::as_str).unwrap_or_default())
                }
                None => Err(format!(
                    "no version was requested and no default version is configured (available: {})",
                    self.available()
                )),
            },
        }
    }

    pub fn artifacts(&self, version: &str) -> &[String] {
        self.versions.get(version).map(Vec::as_slice).unwrap_or_default()
    }

    fn available(&self) -> String {
        if self.versions.is_empty() {
            return "none".to_string();
        }
        self.versions.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

pub type PluginCatalog = BTreeMap<PluginId, CatalogEntry>;

/// Applicator resolving requests against a static [`PluginCatalog`]
///
/// The script handler's classpath is exported from the target scope, the
/// resolved plugin artifacts are added locally, and the scope is locked.
/// Every request is resolved before the scope is touched.
#[derive(Debug, Clone, Default)]
pub struct CatalogPluginApplicator {
    catalog: PluginCatalog,
}

impl CatalogPluginApplicator {
    pub fn new(catalog: PluginCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    fn resolve(&self, request: &PluginRequest) -> Result<Vec<ClasspathEntry>> {
        let failure = |message: String| Error::PluginResolution {
            script: request.script_display_name().to_string(),
            plugin: request.to_string(),
            message,
        };

        let entry = self
            .catalog
            .get(request.id())
            .ok_or_else(|| failure("plugin was not found in the plugin catalog".to_string()))?;
        let version = entry.resolve_version(request.version()).map_err(failure)?;

        tracing::debug!("Resolved plugin {} to version {}", request.id(), version);
        Ok(entry
            .artifacts(version)
            .iter()
            .map(ClasspathEntry::new)
            .collect())
    }
}

impl PluginRequestApplicator for CatalogPluginApplicator {
    fn apply_plugins(
        &self,
        requests: &[PluginRequest],
        script_handler: &ScriptHandler,
        target_scope: &Scope,
    ) -> Result<()> {
        let mut plugin_classpath = Vec::new();
        for request in requests {
            plugin_classpath.extend(self.resolve(request)?);
        }

        let script_classpath: Vec<ClasspathEntry> = script_handler
            .classpath_dependencies()
            .into_iter()
            .map(ClasspathEntry::new)
            .collect();

        tracing::debug!(
            "Applying {} plugin requests to scope {} ({} script classpath entries)",
            requests.len(),
            target_scope.id(),
            script_classpath.len()
        );

        target_scope.export(script_classpath)?;
        target_scope.add_local(plugin_classpath)?;
        target_scope.lock();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PluginCatalog {
        let mut catalog = PluginCatalog::new();
        catalog.insert(
            PluginId::of("org.example.lint").unwrap(),
            CatalogEntry {
                default_version: Some("2.0".into()),
                versions: BTreeMap::from([
                    ("1.0".to_string(), vec!["lint-1.0.jar".to_string()]),
                    ("2.0".to_string(), vec!["lint-2.0.jar".to_string(), "lint-rt.jar".to_string()]),
                ]),
            },
        );
        catalog.insert(
            PluginId::of("single").unwrap(),
            CatalogEntry {
                default_version: None,
                versions: BTreeMap::from([("0.1".to_string(), vec!["single.jar".to_string()])]),
            },
        );
        catalog
    }

    fn request(id: &str, version: Option<&str>) -> PluginRequest {
        PluginRequest::new(
            PluginId::of(id).unwrap(),
            version.map(str::to_string),
            "script 'build.script'",
        )
        .unwrap()
    }

    fn entries(entries: Vec<ClasspathEntry>) -> Vec<String> {
        entries.iter().map(|e| e.as_str().to_string()).collect()
    }

    #[test]
    fn test_applies_requests_and_script_classpath() {
        let applicator = CatalogPluginApplicator::new(catalog());
        let handler = ScriptHandler::new();
        handler.add_classpath_dependency("tool.jar");
        let scope = Scope::root("target");

        applicator
            .apply_plugins(
                &[request("org.example.lint", Some("1.0")), request("single", None)],
                &handler,
                &scope,
            )
            .unwrap();

        assert_eq!(entries(scope.export_classpath()), vec!["tool.jar"]);
        assert_eq!(
            entries(scope.local_classpath()),
            vec!["tool.jar", "lint-1.0.jar", "single.jar"]
        );
        assert!(scope.is_locked());
    }

    #[test]
    fn test_default_version() {
        let applicator = CatalogPluginApplicator::new(catalog());
        let scope = Scope::root("target");
        applicator
            .apply_plugins(&[request("org.example.lint", None)], &ScriptHandler::new(), &scope)
            .unwrap();
        assert_eq!(entries(scope.local_classpath()), vec!["lint-2.0.jar", "lint-rt.jar"]);
    }

    #[test]
    fn test_unknown_plugin_leaves_scope_untouched() {
        let applicator = CatalogPluginApplicator::new(catalog());
        let scope = Scope::root("target");
        let err = applicator
            .apply_plugins(
                &[request("single", None), request("missing", None)],
                &ScriptHandler::new(),
                &scope,
            )
            .unwrap_err();

        match err {
            Error::PluginResolution { plugin, message, .. } => {
                assert_eq!(plugin, "[id: 'missing']");
                assert!(message.contains("not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(scope.local_classpath().is_empty());
        assert!(!scope.is_locked());
    }

    #[test]
    fn test_unknown_version() {
        let catalog = catalog();
        let entry = &catalog[&PluginId::of("org.example.lint").unwrap()];
        let message = entry.resolve_version(Some("3.0")).unwrap_err();
        assert_eq!(message, "version '3.0' is not available (available: 1.0, 2.0)");
    }

    #[test]
    fn test_no_default_version() {
        let entry = CatalogEntry {
            default_version: None,
            versions: BTreeMap::from([
                ("1".to_string(), Vec::new()),
                ("2".to_string(), Vec::new()),
            ]),
        };
        assert!(entry.resolve_version(None).is_err());
        assert_eq!(entry.resolve_version(Some("2")), Ok("2"));
    }
}
