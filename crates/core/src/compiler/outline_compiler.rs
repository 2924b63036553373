//! Compiler backed by the script outline
//!
//! Special blocks are read at compile time into typed directives, so a
//! malformed `plugins {}` block fails the compile rather than the run. All
//! other statements are handed to the registered [`StatementEvaluator`].

use super::{
    CompileRequest, ScriptCompiler, ScriptData, ScriptInstance, ScriptRunner, StatementEvaluator,
    Verifier,
};
use crate::{
    error::{Error, Result},
    plugin::PluginDependenciesSpec,
    script::{
        Body, PluginRepositories, PluginRepository, ScriptHandler, Statement, StatementKind,
        blocks::{self, ClasspathDirective, PluginDeclaration},
        outline,
    },
    services::ServiceRegistry,
    target::{ScriptClass, TargetObject},
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineScriptCompiler;

impl OutlineScriptCompiler {
    pub fn new() -> Self {
        Self
    }
}

/// The compiled script class
#[derive(Debug)]
pub struct OutlineScript {
    script_class: ScriptClass,
    display_name: String,
    methods: Vec<String>,
}

impl ScriptInstance for OutlineScript {
    fn script_class(&self) -> ScriptClass {
        self.script_class
    }

    fn source_display_name(&self) -> &str {
        &self.display_name
    }

    fn method_names(&self) -> &[String] {
        &self.methods
    }
}

#[derive(Debug)]
enum Operation {
    DeclarePlugins(Vec<PluginDeclaration>),
    Classpath(Vec<ClasspathDirective>),
    PluginRepositories(Vec<PluginRepository>),
    Evaluate,
}

#[derive(Debug)]
struct CompiledStatement {
    kind: StatementKind,
    statement: Statement,
    operation: Operation,
}

struct OutlineScriptRunner {
    script: Arc<OutlineScript>,
    statements: Vec<CompiledStatement>,
    data: ScriptData,
}

impl ScriptCompiler for OutlineScriptCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Arc<dyn ScriptRunner>> {
        let script = request.source.display_name();
        let filter = request.filter;
        let mut statements = Vec::new();
        let mut methods = Vec::new();

        for statement in outline::parse(request.source)? {
            let kind = filter.classify(&statement);
            if !filter.accepts(kind) {
                tracing::trace!(
                    "{}: skipping {:?} at {} in {}",
                    request.operation_id,
                    kind,
                    statement.location(),
                    script
                );
                continue;
            }

            if request.verifier == Verifier::ModelRuleClosures
                && statement.head() == "model"
                && !statement.is_block()
            {
                return Err(Error::compile(
                    script,
                    Some(statement.location()),
                    "model rules must be declared in a model {} block",
                ));
            }

            let operation = match kind {
                StatementKind::MethodDeclaration => {
                    if let Some(name) = statement.method_name() {
                        methods.push(name.to_string());
                    }
                    continue;
                }
                // A plugins block always declares into the registered collector,
                // which rejects it when this target takes no plugin requests
                StatementKind::PluginsBlock => Operation::DeclarePlugins(
                    blocks::plugin_declarations(script, block_body(script, &statement)?)?,
                ),
                // Other blocks this pass does not extract are ordinary statements
                _ if !filter.kinds().contains(&kind) => Operation::Evaluate,
                StatementKind::ClasspathBlock => {
                    Operation::Classpath(blocks::classpath_directives(
                        script,
                        filter.classpath_block(),
                        block_body(script, &statement)?,
                    )?)
                }
                StatementKind::PluginRepositoriesBlock => Operation::PluginRepositories(
                    blocks::plugin_repositories(script, block_body(script, &statement)?)?,
                ),
                StatementKind::ModelBlock | StatementKind::Other => Operation::Evaluate,
            };

            statements.push(CompiledStatement {
                kind,
                statement,
                operation,
            });
        }

        let data = if request.extract_data {
            ScriptData {
                has_imperative_statements: statements.iter().any(|s| s.kind.is_imperative()),
            }
        } else {
            ScriptData::default()
        };

        tracing::debug!(
            "Compiled {} for {}: {} statements, {} methods, scope {}",
            request.operation_id,
            script,
            statements.len(),
            methods.len(),
            request.scope.id()
        );

        Ok(Arc::new(OutlineScriptRunner {
            script: Arc::new(OutlineScript {
                script_class: request.script_class,
                display_name: script.to_string(),
                methods,
            }),
            statements,
            data,
        }))
    }
}

fn block_body<'s>(script: &str, statement: &'s Statement) -> Result<&'s Body> {
    statement.body().ok_or_else(|| {
        Error::compile(
            script,
            Some(statement.location()),
            format!("expected a {} {{}} block", statement.head()),
        )
    })
}

impl ScriptRunner for OutlineScriptRunner {
    fn script(&self) -> Arc<dyn ScriptInstance> {
        self.script.clone()
    }

    fn has_methods(&self) -> bool {
        !self.script.methods.is_empty()
    }

    fn run_does_something(&self) -> bool {
        !self.statements.is_empty()
    }

    fn data(&self) -> ScriptData {
        self.data
    }

    fn run(&self, target: &dyn TargetObject, services: &ServiceRegistry) -> Result<()> {
        let evaluator = services.get::<dyn StatementEvaluator>();

        for compiled in &self.statements {
            match &compiled.operation {
                Operation::DeclarePlugins(declarations) => {
                    let spec = services.require::<dyn PluginDependenciesSpec>()?;
                    for declaration in declarations {
                        let plugin = spec.declare_at(&declaration.id, Some(declaration.location))?;
                        if let Some(version) = &declaration.version {
                            plugin.set_version(version)?;
                        }
                    }
                }
                Operation::Classpath(directives) => {
                    let handler = services.require::<ScriptHandler>()?;
                    for directive in directives {
                        match directive {
                            ClasspathDirective::Repository(url) => handler.add_repository(url),
                            ClasspathDirective::Classpath(notation) => {
                                handler.add_classpath_dependency(notation)
                            }
                        }
                    }
                }
                Operation::PluginRepositories(repositories) => {
                    let registry = services.require::<PluginRepositories>()?;
                    for repository in repositories {
                        registry.add(repository.clone());
                    }
                }
                Operation::Evaluate => match &evaluator {
                    Some(evaluator) => evaluator.evaluate(target, &compiled.statement, services)?,
                    None => tracing::trace!(
                        "No statement evaluator registered, skipping '{}' for {}",
                        compiled.statement.head(),
                        target.display_name()
                    ),
                },
            }
        }
        Ok(())
    }
}
