//! Declaration classification and suppression filters.
//!
//! Walks one file's top-level declarations in source order and emits a
//! finding for every surviving match. All filters are additive
//! suppressions: a name whose type could not be resolved is still
//! reported, since silently hiding unanalyzable globals would defeat the
//! tool's purpose.

use crate::options::Options;
use crate::parse::{Decl, SourceFile};
use crate::typecheck::{is_regexp_handle, TypeEnv};
use crate::types::Finding;

/// Classifies one file against its unit's type environment.
///
/// Findings come back in declaration order within the file; callers must
/// not re-sort them.
#[must_use]
pub fn classify(file: &SourceFile, env: &TypeEnv, options: &Options) -> Vec<Finding> {
    let mut findings = Vec::new();

    for decl in &file.decls {
        match decl {
            Decl::Func(func) => {
                // A method named init is an ordinary method; only the
                // receiver-less form is the reserved initializer.
                if options.inits && !func.is_method && func.name == "init" {
                    findings.push(Finding::init(file.path.clone(), func.line));
                }
            }
            Decl::Var(var) if options.vars => {
                for spec in &var.specs {
                    // Build-time injected bindings are not mutable global
                    // state in the risky sense.
                    if spec.embed {
                        continue;
                    }
                    for ident in &spec.names {
                        // The discard identifier suppresses only its own
                        // position, never its siblings.
                        if ident.name == "_" {
                            continue;
                        }
                        if let Some(ty) = env.var_type(&ident.name) {
                            if !options.include_errors && env.satisfies_error(ty) {
                                continue;
                            }
                            if !options.include_regexp && is_regexp_handle(ty) {
                                continue;
                            }
                        }
                        findings.push(Finding::var(
                            file.path.clone(),
                            ident.line,
                            ident.name.clone(),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;
    use crate::types::FindingKind;
    use std::path::Path;

    fn findings(source: &str, options: &Options) -> Vec<Finding> {
        let file = parse_source(Path::new("test.go"), source).expect("fixture should parse");
        let env = TypeEnv::build(&[file.clone()]);
        classify(&file, &env, options)
    }

    fn names(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn empty_file_yields_nothing() {
        let found = findings("package p\n\nfunc Work() {}\n", &Options::default());
        assert!(found.is_empty());
    }

    #[test]
    fn vars_and_init_with_defaults() {
        let found = findings(
            "package p\n\nvar Exported string\n\nvar unexported string\n\nconst C = 1\n\nfunc init() {}\n",
            &Options::default(),
        );
        assert_eq!(names(&found), vec!["Exported", "unexported", "init"]);
        assert_eq!(found[0].line, 3);
        assert_eq!(found[2].kind, FindingKind::Init);
        assert_eq!(found[2].line, 9);
    }

    #[test]
    fn method_named_init_is_not_reported() {
        let found = findings(
            "package p\n\ntype T struct{}\n\nfunc (t T) init() {}\n\nfunc init() {}\n",
            &Options::default(),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, FindingKind::Init);
    }

    #[test]
    fn toggles_disable_each_category() {
        let source = "package p\n\nvar V int\n\nfunc init() {}\n";
        let only_inits = findings(source, &Options::default().vars(false));
        assert_eq!(names(&only_inits), vec!["init"]);
        let only_vars = findings(source, &Options::default().inits(false));
        assert_eq!(names(&only_vars), vec!["V"]);
    }

    #[test]
    fn blank_identifier_skips_only_its_position() {
        let found = findings(
            "package p\n\nfunc f() int { return 1 }\nfunc g() int { return 2 }\n\nvar a, _ = f(), g()\n",
            &Options::default(),
        );
        assert_eq!(names(&found), vec!["a"]);
    }

    #[test]
    fn blank_identifier_alone_yields_nothing() {
        let found = findings("package p\n\nvar _ int8\n", &Options::default());
        assert!(found.is_empty());
    }

    #[test]
    fn error_typed_globals_follow_the_flag() {
        let source = "package p\n\nimport \"errors\"\n\nvar ErrFoo = errors.New(\"foo\")\nvar Plain = 1\n";
        let suppressed = findings(source, &Options::default());
        assert_eq!(names(&suppressed), vec!["Plain"]);

        let included = findings(source, &Options::default().include_errors(true));
        assert_eq!(names(&included), vec!["ErrFoo", "Plain"]);
    }

    #[test]
    fn include_errors_is_monotone() {
        let source = "package p\n\nimport \"errors\"\n\ntype Fool struct{}\n\nfunc (Fool) Error() string { return \"\" }\n\nvar (\n\tErrA = errors.New(\"a\")\n\tErrB error\n\tErrC = Fool{}\n\tD = 1\n)\n\nfunc init() {}\n";
        let without = findings(source, &Options::default());
        let with = findings(source, &Options::default().include_errors(true));
        for f in &without {
            assert!(with.contains(f), "missing {f} when errors included");
        }
        assert!(with.len() > without.len());
    }

    #[test]
    fn regexp_handles_follow_the_flag() {
        let source = "package p\n\nimport \"regexp\"\n\nvar Hex = regexp.MustCompile(`x`)\nvar Re *regexp.Regexp\n";
        let suppressed = findings(source, &Options::default());
        assert!(suppressed.is_empty());

        let included = findings(source, &Options::default().include_regexp(true));
        assert_eq!(names(&included), vec!["Hex", "Re"]);
    }

    #[test]
    fn unknown_type_is_reported() {
        // mystery.Make is not resolvable; the filters must not suppress it.
        let found = findings(
            "package p\n\nimport \"mystery\"\n\nvar X = mystery.Make()\n",
            &Options::default(),
        );
        assert_eq!(names(&found), vec!["X"]);
    }

    #[test]
    fn embedded_group_is_never_reported() {
        let found = findings(
            "package p\n\nimport _ \"embed\"\n\n//go:embed logo.png\nvar Logo []byte\n\nvar Plain int\n",
            &Options::default(),
        );
        assert_eq!(names(&found), vec!["Plain"]);
    }

    #[test]
    fn function_scoped_declarations_are_ignored() {
        let found = findings(
            "package p\n\nfunc Work() {\n\tvar local = 1\n\tinit := func() {}\n\tinit()\n\t_ = local\n}\n",
            &Options::default(),
        );
        assert!(found.is_empty());
    }
}
