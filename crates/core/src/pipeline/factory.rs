use super::{ApplyOutcome, Configuration};
use crate::{
    cache::StringInterner,
    compiler::{CompileRequest, ScriptCompiler, ScriptRunner, StatementFilter, Verifier},
    error::Result,
    plugin::{
        DuplicatePluginPolicy, PluginRequestApplicator, PluginRequestCollector, collector_for,
    },
    scope::Scope,
    script::{PluginRepositories, ScriptHandler},
    services::ServiceRegistry,
    target::{ConfigurationAction, Pass, ScriptTarget, ScriptTargetKind, TargetObject},
    types::ScriptSource,
};
use std::sync::Arc;

/// Creates [`ScriptPlugin`]s sharing one compiler, applicator and set of
/// caller-provided capabilities
pub struct ScriptPluginFactory {
    compiler: Arc<dyn ScriptCompiler>,
    applicator: Arc<dyn PluginRequestApplicator>,
    services: ServiceRegistry,
    interner: StringInterner,
    duplicate_policy: DuplicatePluginPolicy,
}

impl ScriptPluginFactory {
    /// `services` holds the singletons every script may use. A
    /// [`PluginRepositories`] is added when the caller does not provide one.
    pub fn new(
        compiler: Arc<dyn ScriptCompiler>,
        applicator: Arc<dyn PluginRequestApplicator>,
        services: ServiceRegistry,
    ) -> Self {
        let services = ServiceRegistry::builder()
            .with(Arc::new(PluginRepositories::new()))
            .with_all(&services)
            .build();
        Self {
            compiler,
            applicator,
            services,
            interner: StringInterner::new(),
            duplicate_policy: DuplicatePluginPolicy::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePluginPolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn create(
        &self,
        source: Arc<ScriptSource>,
        script_handler: Arc<ScriptHandler>,
        target_scope: Arc<Scope>,
        base_scope: Arc<Scope>,
        top_level: bool,
    ) -> ScriptPlugin<'_> {
        ScriptPlugin {
            factory: self,
            source,
            script_handler,
            target_scope,
            base_scope,
            top_level,
        }
    }
}

/// One script, ready to be applied to a target
pub struct ScriptPlugin<'f> {
    factory: &'f ScriptPluginFactory,
    source: Arc<ScriptSource>,
    script_handler: Arc<ScriptHandler>,
    target_scope: Arc<Scope>,
    base_scope: Arc<Scope>,
    top_level: bool,
}

impl ScriptPlugin<'_> {
    pub fn source(&self) -> &ScriptSource {
        &self.source
    }

    /// Run both passes of the script against `target`
    ///
    /// The first pass runs the target kind's special blocks against the base
    /// scope. Its plugin requests are applied to the target scope before the
    /// rest of the script is compiled against it. The compiled script is then
    /// handed to the target's configuration sink, deferrable unless it holds
    /// imperative statements.
    pub fn apply(&self, target: &dyn TargetObject) -> Result<ApplyOutcome> {
        let factory = self.factory;
        let target_type = target.target_type();
        let script = self.source.display_name();

        let collector = collector_for(&self.source, target, factory.duplicate_policy);

        let initial_kind = ScriptTargetKind::resolve(target_type, self.top_level, Pass::Initial);
        tracing::debug!(
            "Applying {} to {} (initial pass {})",
            script,
            target.display_name(),
            initial_kind
        );

        let initial_registry = self.registry(&collector, &self.base_scope);
        let initial_filter = StatementFilter::initial_pass(initial_kind);
        let initial_operation = factory.interner.intern(&initial_operation_id(initial_kind));
        let initial_runner = factory.compiler.compile(&CompileRequest {
            source: &self.source,
            script_class: initial_kind.script_class(),
            operation_id: &initial_operation,
            filter: &initial_filter,
            scope: &self.base_scope,
            verifier: Verifier::None,
            extract_data: false,
        })?;
        initial_runner.run(target, &initial_registry)?;

        let plugin_requests = collector.collect()?;
        tracing::debug!(
            "Applying {} plugin requests from {} to scope {}",
            plugin_requests.len(),
            script,
            self.target_scope.id()
        );
        factory.applicator.apply_plugins(
            &plugin_requests,
            &self.script_handler,
            &self.target_scope,
        )?;

        let final_kind = ScriptTargetKind::resolve(target_type, self.top_level, Pass::Final);
        let final_filter = StatementFilter::final_pass(final_kind);
        let final_operation = factory.interner.intern(final_kind.id());
        let runner = factory.compiler.compile(&CompileRequest {
            source: &self.source,
            script_class: final_kind.script_class(),
            operation_id: &final_operation,
            filter: &final_filter,
            scope: &self.target_scope,
            verifier: Verifier::ModelRuleClosures,
            extract_data: true,
        })?;

        let script_target = ScriptTarget::new(final_kind, target);
        let script_attached = runner.has_methods() && script_target.attach_script(runner.script());
        if script_attached {
            tracing::debug!("Attached {} to {}", script, target.display_name());
        }

        let mut outcome = ApplyOutcome {
            initial_kind,
            final_kind,
            plugin_requests,
            script_attached,
            configuration: Configuration::Skipped,
        };

        if !runner.run_does_something() {
            tracing::debug!("{} has nothing to run for {}", script, target.display_name());
            return Ok(outcome);
        }

        let may_defer = !runner.data().has_imperative_statements;
        let final_registry = self.registry(&collector, &self.target_scope);
        let action = configuration_action(script, runner, final_registry);
        tracing::debug!(
            "Submitting {} to {} (may_defer: {})",
            action.label(),
            target.display_name(),
            may_defer
        );
        script_target.add_configuration(action, may_defer)?;
        outcome.configuration = Configuration::Submitted { may_defer };
        Ok(outcome)
    }

    fn registry(
        &self,
        collector: &Arc<dyn PluginRequestCollector>,
        scope: &Arc<Scope>,
    ) -> ServiceRegistry {
        ServiceRegistry::builder()
            .with_all(&self.factory.services)
            .with(collector.clone().as_dependencies_spec())
            .with(scope.clone())
            .with(self.script_handler.clone())
            .with(self.source.clone())
            .build()
    }
}

fn initial_operation_id(kind: ScriptTargetKind) -> String {
    match kind.pass() {
        Some(Pass::Initial) => kind.id().to_string(),
        _ => format!("cp_{}", kind.id()),
    }
}

fn configuration_action(
    script: &str,
    runner: Arc<dyn ScriptRunner>,
    services: ServiceRegistry,
) -> ConfigurationAction {
    ConfigurationAction::new(script, move |target: &dyn TargetObject| {
        runner.run(target, &services)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiler::{OutlineScriptCompiler, ScriptInstance, StatementEvaluator},
        error::Error,
        plugin::{PluginDependenciesSpec, PluginRequest},
        scope::ClasspathEntry,
        script::Statement,
        target::TargetType,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct SpyCompiler {
        inner: OutlineScriptCompiler,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl SpyCompiler {
        fn operations(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(op, _)| op.clone()).collect()
        }

        fn scopes(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(_, scope)| scope.clone()).collect()
        }
    }

    impl ScriptCompiler for SpyCompiler {
        fn compile(&self, request: &CompileRequest<'_>) -> Result<Arc<dyn ScriptRunner>> {
            self.calls.lock().unwrap().push((
                request.operation_id.to_string(),
                request.scope.id().to_string(),
            ));
            self.inner.compile(request)
        }
    }

    struct SpyApplicator {
        compiler: Arc<SpyCompiler>,
        calls: Mutex<Vec<(Vec<PluginRequest>, usize)>>,
        fail: bool,
    }

    impl PluginRequestApplicator for SpyApplicator {
        fn apply_plugins(
            &self,
            requests: &[PluginRequest],
            _script_handler: &ScriptHandler,
            target_scope: &Scope,
        ) -> Result<()> {
            let compiles = self.compiler.calls.lock().unwrap().len();
            self.calls.lock().unwrap().push((requests.to_vec(), compiles));
            if self.fail {
                return Err(Error::Other("resolution failed".to_string()));
            }
            target_scope.add_local(
                requests
                    .iter()
                    .map(|r| ClasspathEntry::new(format!("{}.jar", r.id()))),
            )
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl StatementEvaluator for Recorder {
        fn evaluate(
            &self,
            target: &dyn TargetObject,
            statement: &Statement,
            _services: &ServiceRegistry,
        ) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .push(format!("{} on {}", statement.head(), target.display_name()));
            Ok(())
        }
    }

    struct Target {
        target_type: TargetType,
        sink: Mutex<Vec<bool>>,
        attached: Mutex<Vec<Arc<dyn ScriptInstance>>>,
    }

    impl Target {
        fn new(target_type: TargetType) -> Self {
            Self {
                target_type,
                sink: Mutex::new(Vec::new()),
                attached: Mutex::new(Vec::new()),
            }
        }
    }

    impl TargetObject for Target {
        fn target_type(&self) -> TargetType {
            self.target_type
        }

        fn display_name(&self) -> String {
            "target".to_string()
        }

        fn attach_script(&self, script: Arc<dyn ScriptInstance>) {
            self.attached.lock().unwrap().push(script);
        }

        fn add_configuration(&self, action: ConfigurationAction, may_defer: bool) -> Result<()> {
            self.sink.lock().unwrap().push(may_defer);
            action.run(self)
        }
    }

    struct Fixture {
        compiler: Arc<SpyCompiler>,
        applicator: Arc<SpyApplicator>,
        evaluator: Arc<Recorder>,
        factory: ScriptPluginFactory,
        target_scope: Arc<Scope>,
        base_scope: Arc<Scope>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_failing_applicator(false)
        }

        fn with_failing_applicator(fail: bool) -> Self {
            let compiler = Arc::new(SpyCompiler::default());
            let applicator = Arc::new(SpyApplicator {
                compiler: compiler.clone(),
                calls: Mutex::new(Vec::new()),
                fail,
            });
            let evaluator = Arc::new(Recorder::default());
            let services = ServiceRegistry::builder()
                .with::<dyn StatementEvaluator>(evaluator.clone())
                .build();
            let factory = ScriptPluginFactory::new(compiler.clone(), applicator.clone(), services);
            let base_scope = Scope::root("base");
            let target_scope = base_scope.child("target");
            Self {
                compiler,
                applicator,
                evaluator,
                factory,
                target_scope,
                base_scope,
            }
        }

        fn apply(&self, text: &str, target: &Target, top_level: bool) -> Result<ApplyOutcome> {
            self.factory
                .create(
                    Arc::new(ScriptSource::inline("build.script", text)),
                    Arc::new(ScriptHandler::new()),
                    self.target_scope.clone(),
                    self.base_scope.clone(),
                    top_level,
                )
                .apply(target)
        }

        fn applicator_calls(&self) -> Vec<(Vec<PluginRequest>, usize)> {
            self.applicator.calls.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_no_special_blocks() {
        let fixture = Fixture::new();
        let target = Target::new(TargetType::Project);
        let outcome = fixture.apply("println 'hi'\n", &target, true).unwrap();

        let calls = fixture.applicator_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.is_empty());
        assert!(fixture.target_scope.local_classpath().is_empty());
        assert_eq!(*target.sink.lock().unwrap(), vec![false]);
        assert_eq!(outcome.configuration, Configuration::Submitted { may_defer: false });
        assert_eq!(*fixture.evaluator.0.lock().unwrap(), vec!["println on target"]);
    }

    #[test]
    fn test_requests_applied_in_order_before_final_compile() {
        let fixture = Fixture::new();
        let target = Target::new(TargetType::Project);
        let script = "plugins {\n    id('x').version('1.0')\n    id 'y'\n}\nprintln 'hi'\n";
        fixture.apply(script, &target, true).unwrap();

        let calls = fixture.applicator_calls();
        assert_eq!(calls.len(), 1);
        let (requests, compiles_before) = &calls[0];
        let requests: Vec<_> = requests
            .iter()
            .map(|r| (r.id().to_string(), r.version().map(str::to_string)))
            .collect();
        assert_eq!(
            requests,
            vec![("x".to_string(), Some("1.0".to_string())), ("y".to_string(), None)]
        );
        assert_eq!(*compiles_before, 1);
        assert_eq!(fixture.compiler.operations(), vec!["cp_proj", "proj"]);
        assert_eq!(fixture.compiler.scopes(), vec!["base", "target"]);
    }

    #[test]
    fn test_methods_only_skips_sink() {
        let fixture = Fixture::new();
        let target = Target::new(TargetType::Project);
        let outcome = fixture.apply("def helper() {\n}\n", &target, true).unwrap();

        assert!(target.sink.lock().unwrap().is_empty());
        assert_eq!(outcome.configuration, Configuration::Skipped);
        assert!(outcome.script_attached);
        let attached = target.attached.lock().unwrap();
        assert!(attached[0].declares_method("helper"));
    }

    #[test]
    fn test_declarative_script_may_defer() {
        let fixture = Fixture::new();
        let target = Target::new(TargetType::Project);
        let outcome = fixture.apply("model {\n}\n", &target, true).unwrap();
        assert_eq!(*target.sink.lock().unwrap(), vec![true]);
        assert_eq!(outcome.configuration, Configuration::Submitted { may_defer: true });
    }

    #[test]
    fn test_pass_one_failure_stops_everything() {
        let fixture = Fixture::new();
        let target = Target::new(TargetType::Project);
        let err = fixture
            .apply("plugins {\n    apply 'x'\n}\nprintln 'hi'\n", &target, true)
            .unwrap_err();

        assert!(matches!(err, Error::ScriptCompile { .. }));
        assert!(fixture.applicator_calls().is_empty());
        assert_eq!(fixture.compiler.operations(), vec!["cp_proj"]);
        assert!(target.sink.lock().unwrap().is_empty());
    }

    #[test]
    fn test_applicator_failure_aborts_before_final_compile() {
        let fixture = Fixture::with_failing_applicator(true);
        let target = Target::new(TargetType::Project);
        let err = fixture.apply("plugins {\n    id 'x'\n}\n", &target, true).unwrap_err();

        assert_eq!(err.to_string(), "resolution failed");
        assert_eq!(fixture.compiler.operations(), vec!["cp_proj"]);
    }

    #[test]
    fn test_operation_ids_per_target() {
        for (target_type, top_level, expected) in [
            (TargetType::Settings, true, ["cp_settings", "settings"]),
            (TargetType::Build, true, ["cp_init", "init"]),
            (TargetType::Other, true, ["cp_dsl", "dsl"]),
            (TargetType::Project, false, ["cp_dsl", "dsl"]),
        ] {
            let fixture = Fixture::new();
            let target = Target::new(target_type);
            fixture.apply("println 'hi'\n", &target, top_level).unwrap();
            assert_eq!(fixture.compiler.operations(), expected, "{target_type:?}");
        }
    }

    #[test]
    fn test_nested_script_runs_special_blocks_as_statements() {
        let fixture = Fixture::new();
        let target = Target::new(TargetType::Project);
        let outcome = fixture
            .apply("buildscript {\n}\nplugins {\n}\n", &target, false)
            .unwrap();

        assert_eq!(outcome.initial_kind, ScriptTargetKind::Generic);
        assert_eq!(outcome.final_kind, ScriptTargetKind::Generic);
        assert!(outcome.plugin_requests.is_empty());
        assert_eq!(
            *fixture.evaluator.0.lock().unwrap(),
            vec!["buildscript on target"]
        );
    }

    #[test]
    fn test_nested_project_script_cannot_request_plugins() {
        let fixture = Fixture::new();
        let target = Target::new(TargetType::Project);
        let err = fixture
            .apply("plugins {\n    id 'x'\n}\n", &target, false)
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedOperation(_)));
        assert!(fixture.applicator_calls()[0].0.is_empty());
    }

    #[test]
    fn test_settings_script_populates_plugin_repositories() {
        let fixture = Fixture::new();
        let target = Target::new(TargetType::Settings);
        fixture
            .apply(
                "pluginRepositories {\n    maven 'https://plugins.example.org'\n}\n",
                &target,
                true,
            )
            .unwrap();

        let repositories = fixture.factory.services().require::<PluginRepositories>().unwrap();
        assert_eq!(repositories.list()[0].url, "https://plugins.example.org");
        assert!(target.sink.lock().unwrap().is_empty());
    }

    #[test]
    fn test_plugins_block_rejected_outside_projects() {
        for target_type in [TargetType::Settings, TargetType::Build, TargetType::Other] {
            let fixture = Fixture::new();
            let target = Target::new(target_type);
            let err = fixture
                .apply("plugins {\n    id 'x'\n}\nprintln 'after'\n", &target, true)
                .unwrap_err();

            assert!(matches!(err, Error::UnsupportedOperation(_)), "{target_type:?}");
            assert!(fixture.evaluator.0.lock().unwrap().is_empty());
            // the sink accepted the action before it failed
            assert_eq!(*target.sink.lock().unwrap(), vec![false]);
        }
    }

    #[test]
    fn test_duplicate_policy() {
        let script = "plugins {\n    id 'x'\n    id 'x'\n}\n";
        let target = Target::new(TargetType::Project);

        let fixture = Fixture::new();
        let outcome = fixture.apply(script, &target, true).unwrap();
        assert_eq!(outcome.plugin_requests.len(), 2);

        let mut fixture = Fixture::new();
        fixture.factory = fixture.factory.with_duplicate_policy(DuplicatePluginPolicy::Reject);
        let err = fixture.apply(script, &target, true).unwrap_err();
        assert!(matches!(err, Error::DuplicatePluginRequest { .. }));
        assert!(fixture.applicator_calls().is_empty());
    }

    #[test]
    fn test_registry_contents() {
        let fixture = Fixture::new();
        let plugin = fixture.factory.create(
            Arc::new(ScriptSource::inline("build.script", "println 'x'\n")),
            Arc::new(ScriptHandler::new()),
            fixture.target_scope.clone(),
            fixture.base_scope.clone(),
            true,
        );
        let collector = collector_for(
            plugin.source(),
            &Target::new(TargetType::Project),
            DuplicatePluginPolicy::Allow,
        );
        let registry = plugin.registry(&collector, &fixture.base_scope);

        assert!(registry.contains::<dyn PluginDependenciesSpec>());
        assert!(registry.contains::<dyn StatementEvaluator>());
        assert!(registry.contains::<PluginRepositories>());
        assert!(registry.contains::<ScriptHandler>());
        assert!(registry.contains::<ScriptSource>());
        assert_eq!(registry.require::<Scope>().unwrap().id(), "base");
    }
}
