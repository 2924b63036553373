use crate::script::{Statement, StatementKind};
use crate::target::ScriptTargetKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Only,
    Excluding,
}

/// Selects which top-level statements a compile pass keeps
///
/// The initial pass keeps only the target's special kinds and the final pass
/// keeps their complement, so no statement is evaluated twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StatementFilter {
    mode: FilterMode,
    kinds: &'static [StatementKind],
    classpath_block: &'static str,
}

impl StatementFilter {
    pub fn initial_pass(kind: ScriptTargetKind) -> Self {
        Self {
            mode: FilterMode::Only,
            kinds: kind.special_kinds(),
            classpath_block: kind.classpath_block_name(),
        }
    }

    pub fn final_pass(kind: ScriptTargetKind) -> Self {
        Self {
            mode: FilterMode::Excluding,
            kinds: kind.special_kinds(),
            classpath_block: kind.classpath_block_name(),
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn kinds(&self) -> &'static [StatementKind] {
        self.kinds
    }

    pub fn classpath_block(&self) -> &'static str {
        self.classpath_block
    }

    pub fn classify(&self, statement: &Statement) -> StatementKind {
        StatementKind::classify(statement, self.classpath_block)
    }

    pub fn accepts(&self, kind: StatementKind) -> bool {
        let listed = self.kinds.contains(&kind);
        match self.mode {
            FilterMode::Only => listed,
            FilterMode::Excluding => !listed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [StatementKind; 6] = [
        StatementKind::ClasspathBlock,
        StatementKind::PluginsBlock,
        StatementKind::PluginRepositoriesBlock,
        StatementKind::ModelBlock,
        StatementKind::MethodDeclaration,
        StatementKind::Other,
    ];

    #[test]
    fn test_passes_are_mutually_exclusive_and_complete() {
        for kind in [
            ScriptTargetKind::InitialProject,
            ScriptTargetKind::InitialSettings,
            ScriptTargetKind::InitScript,
            ScriptTargetKind::Generic,
        ] {
            let initial = StatementFilter::initial_pass(kind);
            let last = StatementFilter::final_pass(kind.counterpart());
            for statement_kind in ALL_KINDS {
                assert_ne!(
                    initial.accepts(statement_kind),
                    last.accepts(statement_kind),
                    "{kind:?} {statement_kind:?}"
                );
            }
        }
    }

    #[test]
    fn test_project_initial_pass() {
        let filter = StatementFilter::initial_pass(ScriptTargetKind::InitialProject);
        assert_eq!(filter.mode(), FilterMode::Only);
        assert!(filter.accepts(StatementKind::PluginsBlock));
        assert!(filter.accepts(StatementKind::ClasspathBlock));
        assert!(!filter.accepts(StatementKind::Other));
        assert!(!filter.accepts(StatementKind::MethodDeclaration));
    }

    #[test]
    fn test_generic_keeps_everything_for_final_pass() {
        let filter = StatementFilter::final_pass(ScriptTargetKind::Generic);
        assert!(ALL_KINDS.iter().all(|kind| filter.accepts(*kind)));
        assert!(
            !ALL_KINDS
                .iter()
                .any(|kind| StatementFilter::initial_pass(ScriptTargetKind::Generic).accepts(*kind))
        );
    }
}
