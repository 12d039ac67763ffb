//! Go declaration parsing.
//!
//! Wraps tree-sitter-go and extracts an owned model of one file's top-level
//! declarations: `var` specification groups, function and method
//! declarations, and type declarations. Only the shape the classifier and
//! the type resolver consume is kept; bodies and expressions are reduced to
//! a shallow [`ValueExpr`] classification.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tree_sitter::{Node, Parser};

use crate::generated::is_generated;

/// Errors from parsing a single Go source file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The Go grammar could not be loaded (version mismatch).
    #[error("loading Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// The parser produced no tree at all.
    #[error("{path}: parser produced no tree")]
    Unparsable {
        /// File that failed.
        path: PathBuf,
    },

    /// The file contains a syntax error.
    #[error("{path}:{line}: syntax error")]
    Syntax {
        /// File that failed.
        path: PathBuf,
        /// 1-indexed line of the first error node.
        line: usize,
    },
}

/// One parsed Go source file, reduced to its top-level declarations.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path the file was read from.
    pub path: PathBuf,
    /// Declared package name.
    pub package: String,
    /// Whether the declared package name carries the `_test` suffix.
    pub is_external_test: bool,
    /// Whether the file carries the generated-file marker.
    pub is_generated: bool,
    /// Top-level declarations in source order.
    pub decls: Vec<Decl>,
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub enum Decl {
    /// A `var` declaration (one or more specification groups).
    Var(VarDecl),
    /// A function or method declaration.
    Func(FuncDecl),
    /// A type declaration entry.
    Type(TypeSpec),
}

/// One `var` declaration.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Specification groups, in source order.
    pub specs: Vec<VarSpec>,
}

/// One `var` specification group: `name[, name...] [type] [= values]`.
#[derive(Debug, Clone)]
pub struct VarSpec {
    /// Bound names, in source order.
    pub names: Vec<Ident>,
    /// Declared type text, whitespace-normalized (e.g. `*regexp.Regexp`).
    pub declared_type: Option<String>,
    /// Shallow classification of each initializer expression.
    pub values: Vec<ValueExpr>,
    /// Whether a `//go:embed` directive precedes this group or its
    /// enclosing declaration.
    pub embed: bool,
}

/// A bound identifier with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    /// Identifier text.
    pub name: String,
    /// 1-indexed source line.
    pub line: usize,
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// Function name.
    pub name: String,
    /// 1-indexed line of the name.
    pub line: usize,
    /// True for method declarations (a receiver is present).
    pub is_method: bool,
    /// Receiver base type name with any pointer stripped, for methods.
    pub receiver: Option<String>,
    /// True when the parameter list is empty.
    pub no_params: bool,
    /// Single unambiguous result type, when there is exactly one.
    pub result: Option<String>,
}

/// A type declaration entry.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    /// Declared type name.
    pub name: String,
    /// Method signatures for interface types, `None` otherwise.
    pub interface_methods: Option<Vec<MethodSig>>,
}

/// A method signature, as much of it as the error-capability query needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    /// Method name.
    pub name: String,
    /// True when the parameter list is empty.
    pub no_params: bool,
    /// Single result type, when there is exactly one.
    pub result: Option<String>,
}

/// Returns true for paths with the `.go` extension.
#[must_use]
pub fn is_go_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}

/// Returns true for file names ending in `_test.go`.
#[must_use]
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_test.go"))
}

/// Best-effort package clause scan on raw text.
///
/// Used to attribute errors for files that fail to parse; successful parses
/// read the package name from the tree instead.
#[must_use]
pub fn quick_package_name(source: &str) -> Option<&str> {
    source.lines().find_map(|line| {
        line.trim_start()
            .strip_prefix("package ")
            .and_then(|rest| rest.split_whitespace().next())
    })
}

/// Parses one Go source file into its declaration model.
///
/// # Errors
///
/// Returns [`ParseError::Syntax`] when the file contains malformed Go, with
/// the line of the first error node.
pub fn parse_source(path: &Path, source: &str) -> Result<SourceFile, ParseError> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
    parser.set_language(&language)?;

    let Some(tree) = parser.parse(source, None) else {
        return Err(ParseError::Unparsable {
            path: path.to_path_buf(),
        });
    };
    let root = tree.root_node();
    let src = source.as_bytes();

    if root.has_error() {
        return Err(ParseError::Syntax {
            path: path.to_path_buf(),
            line: first_error_line(root),
        });
    }

    let mut cursor = root.walk();
    let top: Vec<Node> = root.named_children(&mut cursor).collect();
    drop(cursor);

    let package = top
        .iter()
        .find(|n| n.kind() == "package_clause")
        .and_then(|n| n.named_child(0))
        .map(|n| text(n, src).to_string())
        .unwrap_or_default();

    let mut decls = Vec::new();
    for (idx, node) in top.iter().enumerate() {
        match node.kind() {
            "var_declaration" => decls.push(Decl::Var(parse_var_decl(*node, &top[..idx], src))),
            "function_declaration" | "method_declaration" => {
                if let Some(func) = parse_func(*node, src) {
                    decls.push(Decl::Func(func));
                }
            }
            "type_declaration" => parse_type_decl(*node, src, &mut decls),
            _ => {}
        }
    }

    Ok(SourceFile {
        path: path.to_path_buf(),
        is_external_test: package.ends_with("_test"),
        is_generated: is_generated(source),
        package,
        decls,
    })
}

/// Shallow classification of an initializer expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExpr {
    /// A call with a plain or selector callee, e.g. `errors.New(..)`.
    Call {
        /// Callee path text, e.g. `errors.New` or `newThing`.
        callee: String,
    },
    /// A composite literal `T{..}`.
    Composite {
        /// Literal type text.
        type_name: String,
    },
    /// An address-of composite literal `&T{..}`.
    AddrComposite {
        /// Literal type text.
        type_name: String,
    },
    /// A reference to another identifier.
    Ref {
        /// Referenced name.
        name: String,
    },
    /// A function literal.
    FuncLit,
    /// A basic literal with a known default type.
    Lit {
        /// Default type of the literal.
        type_name: &'static str,
    },
    /// Anything the resolver has no inference rule for.
    Other,
}

fn text<'s>(node: Node, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or("")
}

/// Node text with all interior whitespace removed, for stable type
/// signatures like `map[string]int` or `*regexp.Regexp`.
fn type_text(node: Node, src: &[u8]) -> String {
    text(node, src).split_whitespace().collect()
}

fn first_error_line(root: Node) -> usize {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return node.start_position().row + 1;
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let kids: Vec<Node> = node.children(&mut cursor).collect();
            for kid in kids.into_iter().rev() {
                stack.push(kid);
            }
        }
    }
    1
}

/// Scans the comment run immediately above `start_row` for a `//go:embed`
/// directive. `preceding` are the older siblings in source order.
fn doc_has_embed(preceding: &[Node], start_row: usize, src: &[u8]) -> bool {
    let mut row = start_row;
    for node in preceding.iter().rev() {
        if node.kind() != "comment" || node.end_position().row + 1 != row {
            break;
        }
        if text(*node, src).trim_start().starts_with("//go:embed") {
            return true;
        }
        row = node.start_position().row;
    }
    false
}

fn parse_var_decl(node: Node, preceding: &[Node], src: &[u8]) -> VarDecl {
    let group_embed = doc_has_embed(preceding, node.start_position().row, src);
    let mut specs = Vec::new();

    let mut cursor = node.walk();
    let kids: Vec<Node> = node.named_children(&mut cursor).collect();
    drop(cursor);

    for kid in &kids {
        match kid.kind() {
            "var_spec" => specs.push(parse_var_spec(*kid, group_embed, src)),
            "var_spec_list" => {
                let mut list_cursor = kid.walk();
                let items: Vec<Node> = kid.named_children(&mut list_cursor).collect();
                drop(list_cursor);
                for (j, item) in items.iter().enumerate() {
                    if item.kind() == "var_spec" {
                        let embed = group_embed
                            || doc_has_embed(&items[..j], item.start_position().row, src);
                        specs.push(parse_var_spec(*item, embed, src));
                    }
                }
            }
            _ => {}
        }
    }

    VarDecl { specs }
}

fn parse_var_spec(node: Node, embed: bool, src: &[u8]) -> VarSpec {
    let mut cursor = node.walk();
    let names: Vec<Ident> = node
        .children_by_field_name("name", &mut cursor)
        .map(|n| Ident {
            name: text(n, src).to_string(),
            line: n.start_position().row + 1,
        })
        .collect();
    drop(cursor);

    let declared_type = node
        .child_by_field_name("type")
        .map(|t| type_text(t, src));

    let values = node
        .child_by_field_name("value")
        .map(|list| {
            let mut cursor = list.walk();
            list.named_children(&mut cursor)
                .map(|expr| classify_expr(expr, src))
                .collect()
        })
        .unwrap_or_default();

    VarSpec {
        names,
        declared_type,
        values,
        embed,
    }
}

fn classify_expr(node: Node, src: &[u8]) -> ValueExpr {
    match node.kind() {
        "call_expression" => match node.child_by_field_name("function") {
            Some(f) if f.kind() == "identifier" || f.kind() == "selector_expression" => {
                ValueExpr::Call {
                    callee: type_text(f, src),
                }
            }
            _ => ValueExpr::Other,
        },
        "composite_literal" => node
            .child_by_field_name("type")
            .map_or(ValueExpr::Other, |t| ValueExpr::Composite {
                type_name: type_text(t, src),
            }),
        "unary_expression" => {
            let operator = node.child_by_field_name("operator");
            let operand = node.child_by_field_name("operand");
            match (operator, operand) {
                (Some(op), Some(inner))
                    if text(op, src) == "&" && inner.kind() == "composite_literal" =>
                {
                    inner
                        .child_by_field_name("type")
                        .map_or(ValueExpr::Other, |t| ValueExpr::AddrComposite {
                            type_name: type_text(t, src),
                        })
                }
                _ => ValueExpr::Other,
            }
        }
        "identifier" => ValueExpr::Ref {
            name: text(node, src).to_string(),
        },
        "func_literal" => ValueExpr::FuncLit,
        "int_literal" => ValueExpr::Lit { type_name: "int" },
        "float_literal" => ValueExpr::Lit {
            type_name: "float64",
        },
        "interpreted_string_literal" | "raw_string_literal" => ValueExpr::Lit {
            type_name: "string",
        },
        "rune_literal" => ValueExpr::Lit { type_name: "rune" },
        "true" | "false" => ValueExpr::Lit { type_name: "bool" },
        _ => ValueExpr::Other,
    }
}

fn parse_func(node: Node, src: &[u8]) -> Option<FuncDecl> {
    let name = node.child_by_field_name("name")?;
    let is_method = node.kind() == "method_declaration";
    let receiver = node
        .child_by_field_name("receiver")
        .and_then(|r| receiver_base(r, src));
    let no_params = node
        .child_by_field_name("parameters")
        .map_or(true, |p| p.named_child_count() == 0);
    let result = node
        .child_by_field_name("result")
        .and_then(|r| single_result_type(r, src));

    Some(FuncDecl {
        name: text(name, src).to_string(),
        line: name.start_position().row + 1,
        is_method,
        receiver,
        no_params,
        result,
    })
}

/// Extracts the receiver's base type name, stripping a pointer if present.
fn receiver_base(receiver: Node, src: &[u8]) -> Option<String> {
    let mut cursor = receiver.walk();
    let param = receiver
        .named_children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;
    drop(cursor);
    let ty = param.child_by_field_name("type")?;
    let base = if ty.kind() == "pointer_type" {
        ty.named_child(0)?
    } else {
        ty
    };
    Some(type_text(base, src))
}

fn single_result_type(node: Node, src: &[u8]) -> Option<String> {
    if node.kind() == "parameter_list" {
        let mut cursor = node.walk();
        let params: Vec<Node> = node.named_children(&mut cursor).collect();
        drop(cursor);
        if params.len() == 1 && params[0].kind() == "parameter_declaration" {
            return params[0]
                .child_by_field_name("type")
                .map(|t| type_text(t, src));
        }
        None
    } else {
        Some(type_text(node, src))
    }
}

fn parse_type_decl(node: Node, src: &[u8], decls: &mut Vec<Decl>) {
    let mut cursor = node.walk();
    let specs: Vec<Node> = node.named_children(&mut cursor).collect();
    drop(cursor);
    for spec in specs {
        if spec.kind() != "type_spec" && spec.kind() != "type_alias" {
            continue;
        }
        let Some(name) = spec.child_by_field_name("name") else {
            continue;
        };
        let interface_methods = spec
            .child_by_field_name("type")
            .filter(|t| t.kind() == "interface_type")
            .map(|t| interface_methods(t, src));
        decls.push(Decl::Type(TypeSpec {
            name: text(name, src).to_string(),
            interface_methods,
        }));
    }
}

fn interface_methods(node: Node, src: &[u8]) -> Vec<MethodSig> {
    let mut sigs = Vec::new();
    let mut cursor = node.walk();
    let elems: Vec<Node> = node.named_children(&mut cursor).collect();
    drop(cursor);
    for elem in elems {
        // Grammar versions name interface methods method_spec or method_elem.
        if elem.kind() != "method_spec" && elem.kind() != "method_elem" {
            continue;
        }
        let Some(name) = elem.child_by_field_name("name") else {
            continue;
        };
        let no_params = elem
            .child_by_field_name("parameters")
            .map_or(true, |p| p.named_child_count() == 0);
        let result = elem
            .child_by_field_name("result")
            .and_then(|r| single_result_type(r, src));
        sigs.push(MethodSig {
            name: text(name, src).to_string(),
            no_params,
            result,
        });
    }
    sigs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SourceFile {
        parse_source(Path::new("test.go"), source).expect("fixture should parse")
    }

    #[test]
    fn package_clause_and_test_marker() {
        let file = parse("package example\n");
        assert_eq!(file.package, "example");
        assert!(!file.is_external_test);

        let file = parse("package example_test\n");
        assert!(file.is_external_test);
    }

    #[test]
    fn var_group_names_and_lines() {
        let file = parse("package p\n\nvar (\n\tA = 1\n\tb, c string\n)\n");
        let Decl::Var(var) = &file.decls[0] else {
            panic!("expected var declaration");
        };
        assert_eq!(var.specs.len(), 2);
        assert_eq!(var.specs[0].names, vec![Ident { name: "A".into(), line: 4 }]);
        assert_eq!(var.specs[1].names.len(), 2);
        assert_eq!(var.specs[1].names[1].name, "c");
        assert_eq!(var.specs[1].names[1].line, 5);
        assert_eq!(var.specs[1].declared_type.as_deref(), Some("string"));
    }

    #[test]
    fn const_declarations_are_not_modeled() {
        let file = parse("package p\n\nconst C = 1\n");
        assert!(file.decls.is_empty());
    }

    #[test]
    fn initializer_classification() {
        let file = parse(
            "package p\n\nimport (\n\t\"errors\"\n\t\"regexp\"\n)\n\nvar (\n\tE = errors.New(\"x\")\n\tR = regexp.MustCompile(`a`)\n\tS = Thing{}\n\tP = &Thing{}\n\tF = other\n\tL = func() {}\n\tN = 1\n)\n",
        );
        let Decl::Var(var) = &file.decls[0] else {
            panic!("expected var declaration");
        };
        let vals: Vec<&ValueExpr> = var.specs.iter().map(|s| &s.values[0]).collect();
        assert_eq!(
            vals[0],
            &ValueExpr::Call {
                callee: "errors.New".into()
            }
        );
        assert_eq!(
            vals[1],
            &ValueExpr::Call {
                callee: "regexp.MustCompile".into()
            }
        );
        assert_eq!(
            vals[2],
            &ValueExpr::Composite {
                type_name: "Thing".into()
            }
        );
        assert_eq!(
            vals[3],
            &ValueExpr::AddrComposite {
                type_name: "Thing".into()
            }
        );
        assert_eq!(vals[4], &ValueExpr::Ref { name: "other".into() });
        assert_eq!(vals[5], &ValueExpr::FuncLit);
        assert_eq!(vals[6], &ValueExpr::Lit { type_name: "int" });
    }

    #[test]
    fn method_vs_function() {
        let file = parse(
            "package p\n\ntype T struct{}\n\nfunc (t *T) Error() string { return \"\" }\n\nfunc init() {}\n",
        );
        let funcs: Vec<&FuncDecl> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Func(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(funcs.len(), 2);
        assert!(funcs[0].is_method);
        assert_eq!(funcs[0].receiver.as_deref(), Some("T"));
        assert_eq!(funcs[0].name, "Error");
        assert_eq!(funcs[0].result.as_deref(), Some("string"));
        assert!(funcs[0].no_params);
        assert!(!funcs[1].is_method);
        assert_eq!(funcs[1].name, "init");
    }

    #[test]
    fn interface_method_signatures() {
        let file = parse("package p\n\ntype MyError interface {\n\tError() string\n}\n");
        let Decl::Type(spec) = &file.decls[0] else {
            panic!("expected type declaration");
        };
        assert_eq!(spec.name, "MyError");
        let methods = spec.interface_methods.as_ref().expect("interface");
        assert_eq!(
            methods[0],
            MethodSig {
                name: "Error".into(),
                no_params: true,
                result: Some("string".into()),
            }
        );
    }

    #[test]
    fn embed_directive_marks_group() {
        let file = parse(
            "package p\n\nimport _ \"embed\"\n\n//go:embed assets/logo.png\nvar Logo []byte\n\nvar Plain string\n",
        );
        let specs: Vec<&VarSpec> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Var(v) => Some(&v.specs[0]),
                _ => None,
            })
            .collect();
        assert!(specs[0].embed);
        assert!(!specs[1].embed);
    }

    #[test]
    fn embed_directive_inside_group() {
        let file = parse(
            "package p\n\nimport _ \"embed\"\n\nvar (\n\t//go:embed version.txt\n\tVersion string\n\tOther string\n)\n",
        );
        let Decl::Var(var) = &file.decls[0] else {
            panic!("expected var declaration");
        };
        assert!(var.specs[0].embed);
        assert!(!var.specs[1].embed);
    }

    #[test]
    fn syntax_error_reports_line() {
        let err = parse_source(Path::new("bad.go"), "package p\n\nvar x = (\n")
            .expect_err("should fail");
        match err {
            ParseError::Syntax { path, line } => {
                assert_eq!(path, Path::new("bad.go"));
                assert!(line >= 3, "error attributed to line {line}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn quick_package_scan() {
        assert_eq!(quick_package_name("// doc\npackage foo_test\n"), Some("foo_test"));
        assert_eq!(quick_package_name("var x = 1\n"), None);
    }

    #[test]
    fn go_file_and_test_file_predicates() {
        assert!(is_go_file(Path::new("a/b.go")));
        assert!(!is_go_file(Path::new("a/b.rs")));
        assert!(is_test_file(Path::new("a/b_test.go")));
        assert!(!is_test_file(Path::new("a/b.go")));
    }
}
