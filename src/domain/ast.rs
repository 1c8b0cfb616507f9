// Go syntax data structures.
// These types describe the top-level shape of a parsed Go file in a form suitable for
// structural matching and localized rewriting. All offsets are byte offsets into the
// source text the file was parsed from.

use std::ops::Range;

/// Top-level view of one Go source file.
#[derive(Debug, Clone, Default)]
pub struct GoFile {
    /// Span of `package <name>`.
    pub package_clause: Option<Range<usize>>,
    pub import_decls: Vec<ImportDecl>,
    pub funcs: Vec<FuncDecl>,
}

impl GoFile {
    /// Every import spec in declaration order.
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.import_decls.iter().flat_map(|d| d.specs.iter())
    }

    pub fn imports_path(&self, path: &str) -> bool {
        self.imports().any(|spec| spec.path == path)
    }
}

/// An `import` declaration, either `import "x"` or `import ( ... )`.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub span: Range<usize>,
    pub group: Option<ImportGroup>,
    pub specs: Vec<ImportSpec>,
}

/// Parenthesis offsets of a grouped import declaration.
#[derive(Debug, Clone, Copy)]
pub struct ImportGroup {
    pub lparen: usize,
    pub rparen: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// `_`, `.` or an alias.
    pub name: Option<String>,
    /// Import path without quotes.
    pub path: String,
    pub span: Range<usize>,
    pub start_row: usize,
    pub end_row: usize,
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    /// `None` for plain functions.
    pub receiver: Option<Vec<Param>>,
    pub params: Vec<Param>,
    /// Result list exactly as written, e.g. `(Conn, error)`.
    pub result: Option<String>,
    pub body: Option<Range<usize>>,
    pub span: Range<usize>,
}

impl FuncDecl {
    /// Parameter names in order, `None` for an unnamed parameter.
    pub fn param_names(&self) -> Vec<Option<&str>> {
        let mut names = Vec::new();
        for param in &self.params {
            if param.names.is_empty() {
                names.push(None);
            } else {
                names.extend(param.names.iter().map(|n| Some(n.as_str())));
            }
        }
        names
    }

    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }
}

/// One parameter declaration; names share the type, as in `network, address string`.
#[derive(Debug, Clone)]
pub struct Param {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub variadic: bool,
}

/// The subset of Go type syntax the predicates care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Ident(String),
    Pointer(Box<TypeExpr>),
    /// Anything else, kept as written.
    Other(String),
}

impl TypeExpr {
    pub fn is_pointer_to(&self, ident: &str) -> bool {
        matches!(self, TypeExpr::Pointer(inner) if **inner == TypeExpr::Ident(ident.to_string()))
    }

    /// Source text of the type.
    pub fn text(&self) -> String {
        match self {
            TypeExpr::Ident(name) => name.clone(),
            TypeExpr::Pointer(inner) => format!("*{}", inner.text()),
            TypeExpr::Other(text) => text.clone(),
        }
    }
}
