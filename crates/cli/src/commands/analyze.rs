use anyhow::{Context, Result};
use scriptstage_core::{
    Scope, ScriptPluginFactory, ServiceRegistry, StageConfig, StatementEvaluator, TargetObject,
    TargetType,
    cache::CachingScriptCompiler,
    compiler::{OutlineScriptCompiler, ScriptInstance},
    plugin::CatalogPluginApplicator,
    script::{PluginRepositories, ScriptHandler, Statement},
    target::{ConfigurationAction, DeferredConfiguration},
    types::ScriptSource,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;
use walkdir::WalkDir;

use crate::display::print_report;
use crate::report::{AnalysisReport, EvaluatedStatement, ScriptReport};

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub path: PathBuf,
    /// Overrides the target inferred from each script's file name
    pub target: Option<TargetType>,
    pub top_level: bool,
    pub config: Option<PathBuf>,
    pub json: bool,
}

pub fn analyze_command(options: &AnalyzeOptions) -> Result<()> {
    let report = analyze(options)?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Apply every selected script through the two-pass pipeline
pub fn analyze(options: &AnalyzeOptions) -> Result<AnalysisReport> {
    debug!("Analyzing: {}", options.path.display());

    if !options.path.exists() {
        return Err(anyhow::anyhow!("Path not found: {}", options.path.display()));
    }

    let (config, config_file) = load_config(options)?;
    let scripts = select_scripts(&options.path, &config, options.target)?;
    debug!("Selected {} scripts", scripts.len());

    let compiler = Arc::new(CachingScriptCompiler::with_capacity(
        OutlineScriptCompiler::new(),
        config.compile_cache_capacity()?,
    ));
    let evaluator = Arc::new(RecordingEvaluator::default());
    let repositories = Arc::new(PluginRepositories::new());
    let services = ServiceRegistry::builder()
        .with::<dyn StatementEvaluator>(evaluator.clone())
        .with(repositories.clone())
        .build();
    let factory = ScriptPluginFactory::new(
        compiler.clone(),
        Arc::new(CatalogPluginApplicator::new(config.plugins.clone())),
        services,
    )
    .with_duplicate_policy(config.duplicate_plugin_requests);

    let base_scope = Scope::root("base");
    let mut reports = Vec::with_capacity(scripts.len());
    for (path, target_type) in scripts {
        let report = apply_script(
            &factory,
            &evaluator,
            &base_scope,
            &path,
            target_type,
            options.top_level,
        )
        .with_context(|| format!("Failed to apply {}", path.display()))?;
        reports.push(report);
    }

    Ok(AnalysisReport {
        config_file,
        scripts: reports,
        plugin_repositories: repositories.list(),
        cache: compiler.stats(),
    })
}

fn load_config(options: &AnalyzeOptions) -> Result<(StageConfig, Option<PathBuf>)> {
    let config_file = match &options.config {
        Some(path) => Some(path.clone()),
        None => {
            let start = if options.path.is_dir() {
                options.path.as_path()
            } else {
                options.path.parent().unwrap_or(Path::new("."))
            };
            StageConfig::find_config_file(start)
        }
    };

    match config_file {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            let config = StageConfig::load_from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            Ok((config, Some(path)))
        }
        None => Ok((StageConfig::default(), None)),
    }
}

/// Scripts to apply with the target type each is applied to
fn select_scripts(
    path: &Path,
    config: &StageConfig,
    target: Option<TargetType>,
) -> Result<Vec<(PathBuf, TargetType)>> {
    let infer = |file: &Path| {
        let name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        target.or_else(|| config.script_names.target_type_for(name))
    };

    if path.is_file() {
        return Ok(vec![(
            path.to_path_buf(),
            infer(path).unwrap_or(TargetType::Other),
        )]);
    }

    let mut scripts = Vec::new();
    for entry in WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // Skip hidden directories
            e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
        })
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if config.script_names.target_type_for(&name).is_none() {
            continue;
        }
        if let Some(target_type) = infer(entry.path()) {
            scripts.push((entry.into_path(), target_type));
        }
    }
    Ok(scripts)
}

fn apply_script(
    factory: &ScriptPluginFactory,
    evaluator: &RecordingEvaluator,
    base_scope: &Arc<Scope>,
    path: &Path,
    target_type: TargetType,
    top_level: bool,
) -> Result<ScriptReport> {
    let source = Arc::new(ScriptSource::from_file(path)?);
    let handler = Arc::new(ScriptHandler::new());
    let target_scope = base_scope.child(format!("target:{}", path.display()));
    let target = ReportTarget::new(target_type, target_name(target_type, path));

    let outcome = factory
        .create(
            source.clone(),
            handler.clone(),
            target_scope.clone(),
            base_scope.clone(),
            top_level,
        )
        .apply(&target)?;
    target.configure()?;

    Ok(ScriptReport {
        path: path.to_path_buf(),
        target: target.display_name(),
        target_type,
        outcome,
        script_repositories: handler.repositories(),
        script_classpath: handler.classpath_dependencies(),
        scope_classpath: target_scope.local_classpath(),
        methods: target.methods(),
        evaluated: evaluator.take(),
    })
}

fn target_name(target_type: TargetType, path: &Path) -> String {
    let dir = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    match target_type {
        TargetType::Project => format!("project '{dir}'"),
        TargetType::Settings => format!("settings '{dir}'"),
        TargetType::Build => "build".to_string(),
        TargetType::Other => {
            let stem = path
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("object '{stem}'")
        }
    }
}

/// Target that queues deferrable configuration until [`ReportTarget::configure`]
struct ReportTarget {
    target_type: TargetType,
    name: String,
    configuration: DeferredConfiguration,
    methods: Mutex<Vec<String>>,
}

impl ReportTarget {
    fn new(target_type: TargetType, name: String) -> Self {
        Self {
            target_type,
            name,
            configuration: DeferredConfiguration::new(),
            methods: Mutex::new(Vec::new()),
        }
    }

    fn configure(&self) -> scriptstage_core::Result<()> {
        self.configuration.realize(self)
    }

    fn methods(&self) -> Vec<String> {
        self.methods
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TargetObject for ReportTarget {
    fn target_type(&self) -> TargetType {
        self.target_type
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn attach_script(&self, script: Arc<dyn ScriptInstance>) {
        self.methods
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(script.method_names().iter().cloned());
    }

    fn add_configuration(
        &self,
        action: ConfigurationAction,
        may_defer: bool,
    ) -> scriptstage_core::Result<()> {
        self.configuration.add(self, action, may_defer)
    }
}

/// Records the ordinary statements a final pass runs
#[derive(Default)]
struct RecordingEvaluator {
    statements: Mutex<Vec<EvaluatedStatement>>,
}

impl RecordingEvaluator {
    fn take(&self) -> Vec<EvaluatedStatement> {
        std::mem::take(
            &mut *self
                .statements
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl StatementEvaluator for RecordingEvaluator {
    fn evaluate(
        &self,
        target: &dyn TargetObject,
        statement: &Statement,
        _services: &ServiceRegistry,
    ) -> scriptstage_core::Result<()> {
        debug!(
            "Evaluating '{}' at {} on {}",
            statement.head(),
            statement.location(),
            target.display_name()
        );
        self.statements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(EvaluatedStatement {
                line: statement.location().line,
                head: statement.head().to_string(),
            });
        Ok(())
    }
}
