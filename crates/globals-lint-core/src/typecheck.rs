//! Per-unit type environment.
//!
//! Resolves a printable type signature for every package-level `var` name in
//! a semantic unit and answers the two type questions the classifier asks:
//! does a type satisfy the `error` interface, and is a type the compiled
//! regular-expression handle.
//!
//! Resolution is deliberately shallow: it covers declared types plus the
//! initializer shapes that occur for package-level state. A name it cannot
//! resolve stays unknown, and unknown names are always reported by the
//! classifier, so depth here only ever adds suppressions.

use std::collections::{HashMap, HashSet};

use crate::parse::{Decl, MethodSig, SourceFile, ValueExpr};

/// The printable signature of the compiled regular-expression handle type.
const REGEXP_HANDLE: &str = "*regexp.Regexp";

/// Returns true when a type signature is exactly the regular-expression
/// handle type. A literal comparison, not a capability check.
#[must_use]
pub fn is_regexp_handle(ty: &str) -> bool {
    ty == REGEXP_HANDLE
}

/// Raw material for resolving one var name.
#[derive(Debug, Clone)]
struct PendingVar {
    declared: Option<String>,
    value: Option<ValueExpr>,
}

/// Type information for one semantic unit, built once from all of the
/// unit's files together and then only read.
#[derive(Debug, Default)]
pub struct TypeEnv {
    /// Resolved signature per package-level var name.
    vars: HashMap<String, String>,
    /// Method signatures keyed by receiver base type name.
    methods: HashMap<String, Vec<MethodSig>>,
    /// Interface definitions keyed by type name.
    interfaces: HashMap<String, Vec<MethodSig>>,
}

impl TypeEnv {
    /// Builds the environment for one set of files that belong to the same
    /// package.
    #[must_use]
    pub fn build(files: &[SourceFile]) -> Self {
        let mut funcs: HashMap<String, Option<String>> = HashMap::new();
        let mut methods: HashMap<String, Vec<MethodSig>> = HashMap::new();
        let mut interfaces: HashMap<String, Vec<MethodSig>> = HashMap::new();
        let mut pending: HashMap<String, PendingVar> = HashMap::new();

        for file in files {
            for decl in &file.decls {
                match decl {
                    Decl::Func(f) if f.is_method => {
                        if let Some(base) = &f.receiver {
                            methods.entry(base.clone()).or_default().push(MethodSig {
                                name: f.name.clone(),
                                no_params: f.no_params,
                                result: f.result.clone(),
                            });
                        }
                    }
                    Decl::Func(f) => {
                        funcs.insert(f.name.clone(), f.result.clone());
                    }
                    Decl::Type(spec) => {
                        if let Some(sigs) = &spec.interface_methods {
                            interfaces.insert(spec.name.clone(), sigs.clone());
                        }
                    }
                    Decl::Var(var) => {
                        for spec in &var.specs {
                            // Positional pairing only holds when the value
                            // list matches the name list one to one.
                            let paired = spec.values.len() == spec.names.len();
                            for (i, ident) in spec.names.iter().enumerate() {
                                if ident.name == "_" {
                                    continue;
                                }
                                pending.insert(
                                    ident.name.clone(),
                                    PendingVar {
                                        declared: spec.declared_type.clone(),
                                        value: paired.then(|| spec.values[i].clone()),
                                    },
                                );
                            }
                        }
                    }
                }
            }
        }

        let mut vars = HashMap::new();
        for name in pending.keys() {
            let mut visited = HashSet::new();
            if let Some(ty) = resolve_name(name, &pending, &funcs, &mut visited) {
                vars.insert(name.clone(), ty);
            }
        }

        Self {
            vars,
            methods,
            interfaces,
        }
    }

    /// Resolved type signature of a package-level var, if known.
    #[must_use]
    pub fn var_type(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Capability query: does `ty`, or a pointer to it, expose
    /// `Error() string`?
    ///
    /// The base type's method set is checked with receiver pointer-ness
    /// ignored, so both value- and pointer-receiver forms satisfy, matching
    /// how the interface is satisfiable from either the concrete type or
    /// its pointer.
    #[must_use]
    pub fn satisfies_error(&self, ty: &str) -> bool {
        if ty == "error" {
            return true;
        }
        let base = ty.trim_start_matches('*');
        let describes = |sigs: &Vec<MethodSig>| {
            sigs.iter().any(|m| {
                m.name == "Error" && m.no_params && m.result.as_deref() == Some("string")
            })
        };
        self.methods.get(base).is_some_and(describes)
            || self.interfaces.get(base).is_some_and(describes)
    }
}

fn resolve_name(
    name: &str,
    pending: &HashMap<String, PendingVar>,
    funcs: &HashMap<String, Option<String>>,
    visited: &mut HashSet<String>,
) -> Option<String> {
    if !visited.insert(name.to_string()) {
        return None;
    }
    let var = pending.get(name)?;
    if let Some(declared) = &var.declared {
        return Some(declared.clone());
    }
    match var.value.as_ref()? {
        ValueExpr::Call { callee } => match callee.as_str() {
            "errors.New" | "fmt.Errorf" => Some("error".to_string()),
            "regexp.MustCompile" | "regexp.MustCompilePOSIX" => {
                Some(REGEXP_HANDLE.to_string())
            }
            other if !other.contains('.') => funcs.get(other)?.clone(),
            _ => None,
        },
        ValueExpr::Composite { type_name } => Some(type_name.clone()),
        ValueExpr::AddrComposite { type_name } => Some(format!("*{type_name}")),
        ValueExpr::Ref { name: target } => resolve_name(target, pending, funcs, visited),
        ValueExpr::FuncLit => Some("func()".to_string()),
        ValueExpr::Lit { type_name } => Some((*type_name).to_string()),
        ValueExpr::Other => None,
    }
}
