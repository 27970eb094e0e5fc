//! Rule: no-duplicate-imports (L1001)
//!
//! Flags when the same module is imported more than once. Multiple import
//! statements from the same source should be merged into one.

use std::collections::HashMap;

use crate::linter::rule::*;
use crate::parser::ast;

pub struct NoDuplicateImports;

static META: RuleMeta = RuleMeta {
    name: "no-duplicate-imports",
    code: "L1001",
    description: "Disallow duplicate imports from the same module",
    category: Category::Correctness,
    default_severity: Severity::Warn,
    fixable: false,
};

impl LintRule for NoDuplicateImports {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_module(
        &self,
        module: &ast::Module,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut diagnostics = Vec::new();

        for stmt in &module.statements {
            // Also check inside export declarations
            let import = match stmt {
                ast::Statement::ImportDecl(i) => i,
                _ => continue,
            };

            let source_str = ctx.interner.resolve(import.source.value);

            if let Some(&first_line) = seen.get(source_str) {
                diagnostics.push(LintDiagnostic {
                    rule: META.name,
                    code: META.code,
                    message: format!("'{}' is imported multiple times", source_str),
                    span: import.span,
                    severity: META.default_severity,
                    fix: None,
                    notes: vec![format!(
                        "First imported at line {}. Merge the imports into a single statement.",
                        first_line
                    )],
                });
            } else {
                seen.insert(source_str, import.span.line as usize);
            }
        }

        diagnostics
    }
}
