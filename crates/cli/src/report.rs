use scriptstage_core::{
    ApplyOutcome, TargetType, cache::CacheStats, scope::ClasspathEntry, script::PluginRepository,
};
use serde::Serialize;
use std::path::PathBuf;

/// An ordinary statement run by a script's final pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluatedStatement {
    pub line: u32,
    pub head: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub path: PathBuf,
    pub target: String,
    pub target_type: TargetType,
    #[serde(flatten)]
    pub outcome: ApplyOutcome,
    pub script_repositories: Vec<String>,
    pub script_classpath: Vec<String>,
    /// Classpath the final pass was compiled against
    pub scope_classpath: Vec<ClasspathEntry>,
    pub methods: Vec<String>,
    pub evaluated: Vec<EvaluatedStatement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub scripts: Vec<ScriptReport>,
    pub plugin_repositories: Vec<PluginRepository>,
    pub cache: CacheStats,
}
