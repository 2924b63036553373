use super::outline::Statement;
use serde::Serialize;

/// Classification of a top-level statement, shared by both passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// `buildscript { }` (or `initscript { }` for init scripts)
    ClasspathBlock,
    /// `plugins { }`
    PluginsBlock,
    /// `pluginRepositories { }`
    PluginRepositoriesBlock,
    /// `model { }`, the only purely declarative statement
    ModelBlock,
    /// `def name(...) { }`
    MethodDeclaration,
    Other,
}

impl StatementKind {
    /// Classify a statement. `classpath_block` is the name the current
    /// target uses for its classpath block.
    pub fn classify(statement: &Statement, classpath_block: &str) -> Self {
        if statement.method_name().is_some() {
            return StatementKind::MethodDeclaration;
        }
        if !statement.is_block() {
            return StatementKind::Other;
        }
        match statement.head() {
            head if head == classpath_block => StatementKind::ClasspathBlock,
            "plugins" => StatementKind::PluginsBlock,
            "pluginRepositories" => StatementKind::PluginRepositoriesBlock,
            "model" => StatementKind::ModelBlock,
            _ => StatementKind::Other,
        }
    }

    /// Whether running a statement of this kind has side effects that must
    /// happen at a specific point in configuration order
    pub fn is_imperative(&self) -> bool {
        !matches!(
            self,
            StatementKind::ModelBlock | StatementKind::MethodDeclaration
        )
    }
}
