//! Source rewriter.
//!
//! Redirects the target declarations to `go:linkname` placeholders by splicing text
//! into the original source. Everything outside the replaced bodies, the marker import
//! and the appended stubs is carried over byte for byte.

use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::ast::{FuncDecl, GoFile, ImportDecl, ImportGroup};
use crate::domain::source::RewrittenSource;
use crate::domain::target::TargetKind;
use crate::error::{PatchError, Result};
use crate::ports::GoParser;

pub const DEFAULT_REPLACEMENT_MODULE: &str = "github.com/goccy/wasi-go-net/wasip1";
pub const DEFAULT_MARKER_PACKAGE: &str = "unsafe";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Package path the placeholders are linked against.
    pub replacement_module: String,
    /// Imported for side effects; `go:linkname` requires `unsafe`.
    pub marker_package: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            replacement_module: DEFAULT_REPLACEMENT_MODULE.to_string(),
            marker_package: DEFAULT_MARKER_PACKAGE.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Edits
// ─────────────────────────────────────────────────────────────────────

/// Replace `range` of the source with `text`. An empty range is an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

impl Edit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            text: text.into(),
        }
    }

    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// Apply non-overlapping edits to `src`. Insertions at the same offset keep their
/// relative order. With no edits the output is `src` unchanged.
pub fn render(src: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.range.start);

    let extra: usize = edits.iter().map(|e| e.text.len()).sum();
    let mut out = String::with_capacity(src.len() + extra);
    let mut cursor = 0;
    for edit in edits {
        debug_assert!(edit.range.start >= cursor, "overlapping edits at {}", edit.range.start);
        let start = edit.range.start.max(cursor);
        out.push_str(&src[cursor..start]);
        out.push_str(&edit.text);
        cursor = edit.range.end.max(start);
    }
    out.push_str(&src[cursor..]);
    out
}

// ─────────────────────────────────────────────────────────────────────
// Rewriter
// ─────────────────────────────────────────────────────────────────────

pub struct SourceRewriter<'a> {
    parser: &'a dyn GoParser,
    options: RewriteOptions,
}

impl<'a> SourceRewriter<'a> {
    pub fn new(parser: &'a dyn GoParser, options: RewriteOptions) -> Self {
        Self { parser, options }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Read `path` from disk and rewrite it.
    pub fn rewrite_file(&self, path: &Path) -> Result<RewrittenSource> {
        let src = fs::read_to_string(path).map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let content = self.rewrite_source(path, &src)?;
        Ok(RewrittenSource::new(path, content))
    }

    /// Rewrite `src`; `path` is only used for error reporting.
    pub fn rewrite_source(&self, path: &Path, src: &str) -> Result<String> {
        let file = self.parser.parse(src).map_err(|reason| PatchError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;

        let mut edits = Vec::new();
        if let Some(edit) = marker_import_edit(src, &file, &self.options.marker_package) {
            edits.push(edit);
        }

        let mut replaced: BTreeMap<TargetKind, &FuncDecl> = BTreeMap::new();
        for decl in &file.funcs {
            for kind in TargetKind::ALL {
                if !kind.matches(decl) {
                    continue;
                }
                let args = forwarded_args(path, decl)?;
                let body = format!("{{\n\treturn {}({})\n}}", kind.placeholder(), args.join(", "));
                match &decl.body {
                    Some(range) => edits.push(Edit::replace(range.clone(), body)),
                    None => edits.push(Edit::insert(decl.span.end, format!(" {}", body))),
                }
                if replaced.insert(kind, decl).is_some() {
                    warn!(
                        "{}: more than one declaration matches {}, all are redirected",
                        path.display(),
                        kind
                    );
                }
            }
        }

        if replaced.is_empty() {
            return Err(PatchError::NoTargetFunctions {
                path: path.to_path_buf(),
            });
        }

        let mut tail = String::new();
        if !src.is_empty() && !src.ends_with('\n') {
            tail.push('\n');
        }
        for (kind, decl) in &replaced {
            tail.push('\n');
            tail.push_str(&stub_decl(*kind, decl, &self.options.replacement_module));
        }
        edits.push(Edit::insert(src.len(), tail));

        debug!(
            "Rewrote {} ({} edits, targets {:?})",
            path.display(),
            edits.len(),
            replaced.keys().collect::<Vec<_>>()
        );
        Ok(render(src, edits))
    }
}

/// Parameter names forwarded by the replacement body, in declaration order.
fn forwarded_args(path: &Path, decl: &FuncDecl) -> Result<Vec<String>> {
    let mut args = Vec::new();
    for name in decl.param_names() {
        match name {
            Some("_") => return Err(signature_error(path, decl, "blank parameter name")),
            Some(name) => args.push(name.to_string()),
            None => return Err(signature_error(path, decl, "unnamed parameter")),
        }
    }
    if decl.is_variadic() {
        if let Some(last) = args.last_mut() {
            last.push_str("...");
        }
    }
    Ok(args)
}

fn signature_error(path: &Path, decl: &FuncDecl, reason: &str) -> PatchError {
    PatchError::Signature {
        path: path.to_path_buf(),
        function: decl.name.clone(),
        reason: reason.to_string(),
    }
}

/// `//go:linkname` directive plus a body-less declaration mirroring `decl`.
fn stub_decl(kind: TargetKind, decl: &FuncDecl, module: &str) -> String {
    let mut params = Vec::new();
    for param in &decl.params {
        let ty = if param.variadic {
            format!("...{}", param.ty.text())
        } else {
            param.ty.text()
        };
        if param.names.is_empty() {
            params.push(ty);
        } else {
            params.extend(param.names.iter().map(|name| format!("{} {}", name, ty)));
        }
    }
    let result = decl
        .result
        .as_deref()
        .map(|r| format!(" {}", r))
        .unwrap_or_default();

    format!(
        "{}\nfunc {}({}){}\n",
        kind.linkname_directive(module),
        kind.placeholder(),
        params.join(", "),
        result
    )
}

// ─────────────────────────────────────────────────────────────────────
// Import hygiene
// ─────────────────────────────────────────────────────────────────────

/// Edit adding `_ "<marker>"`, or `None` if the file already imports it.
fn marker_import_edit(src: &str, file: &GoFile, marker: &str) -> Option<Edit> {
    if file.imports_path(marker) {
        return None;
    }
    let spec = format!("_ \"{}\"", marker);

    let Some(decl) = file.import_decls.last() else {
        return Some(match &file.package_clause {
            Some(clause) => Edit::insert(clause.end, format!("\n\nimport {}", spec)),
            None => Edit::insert(0, format!("import {}\n\n", spec)),
        });
    };

    match decl.group {
        Some(group) => Some(grouped_import_edit(src, decl, group, marker, &spec)),
        None => {
            let existing = decl.specs.first()?;
            let current = &src[existing.span.clone()];
            let (first, second) = if marker < existing.path.as_str() {
                (spec.as_str(), current)
            } else {
                (current, spec.as_str())
            };
            Some(Edit::replace(
                existing.span.clone(),
                format!("(\n\t{}\n\t{}\n)", first, second),
            ))
        }
    }
}

/// Insert into the last run of consecutive specs, at its sorted position.
fn grouped_import_edit(
    src: &str,
    decl: &ImportDecl,
    group: ImportGroup,
    marker: &str,
    spec: &str,
) -> Edit {
    let specs = &decl.specs;
    if specs.is_empty() {
        return Edit::replace(group.lparen + 1..group.rparen, format!("\n\t{}\n", spec));
    }

    let mut run_start = 0;
    for i in 1..specs.len() {
        if specs[i].start_row > specs[i - 1].end_row + 1 {
            run_start = i;
        }
    }
    let run = &specs[run_start..];
    let indent = indentation(src, run[0].span.start);

    if let Some(next) = run.iter().find(|s| s.path.as_str() > marker) {
        let mut at = line_start(src, next.span.start);
        if src[at..next.span.start].trim().is_empty() {
            // Comment lines directly above `next` stay attached to it
            while at > group.lparen + 1 {
                let above = line_start(src, at - 1);
                if above <= group.lparen || !src[above..at].trim_start().starts_with("//") {
                    break;
                }
                at = above;
            }
            return Edit::insert(at, format!("{}{}\n", indent, spec));
        }
        return Edit::insert(next.span.start, format!("{}; ", spec));
    }

    // `run` is non-empty
    let last_end = run[run.len() - 1].span.end;
    let at = line_end(src, last_end);
    let rest = src[last_end..at].trim_start();
    if rest.is_empty() || rest.starts_with("//") {
        Edit::insert(at, format!("\n{}{}", indent, spec))
    } else {
        Edit::insert(last_end, format!("; {}", spec))
    }
}

fn line_start(src: &str, pos: usize) -> usize {
    src[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(src: &str, pos: usize) -> usize {
    src[pos..].find('\n').map(|i| pos + i).unwrap_or(src.len())
}

fn indentation(src: &str, pos: usize) -> &str {
    let leading = &src[line_start(src, pos)..pos];
    if leading.chars().all(char::is_whitespace) {
        leading
    } else {
        "\t"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::go_syntax::TreeSitterGoParser;

    fn rewrite(src: &str) -> Result<String> {
        SourceRewriter::new(&TreeSitterGoParser, RewriteOptions::default())
            .rewrite_source(Path::new("net.go"), src)
    }

    const LISTEN_BODY: &str = "func Listen(network, address string) (Listener, error) {\n\treturn nil, nil\n}\n";

    #[test]
    fn test_render_without_edits_is_identity() {
        let src = "package net\n\n// keep me\nfunc f() {}\n";
        assert_eq!(render(src, vec![]), src);
    }

    #[test]
    fn test_render_orders_edits() {
        let src = "abcdef";
        let out = render(
            src,
            vec![
                Edit::insert(6, "!"),
                Edit::replace(1..3, "XY"),
                Edit::insert(0, ">"),
                Edit::insert(6, "?"),
            ],
        );
        assert_eq!(out, ">aXYdef!?");
    }

    #[test]
    fn test_import_added_to_single_import() {
        let src = format!("package net\n\nimport \"syscall\"\n\n{}", LISTEN_BODY);
        let out = rewrite(&src).unwrap();
        assert!(out.starts_with("package net\n\nimport (\n\t\"syscall\"\n\t_ \"unsafe\"\n)\n\nfunc Listen"));
    }

    #[test]
    fn test_import_sorted_into_last_run() {
        let src = format!(
            "package net\n\nimport (\n\t\"context\"\n\n\t\"internal/poll\"\n\t\"vendor/golang.org/x/net/route\"\n)\n\n{}",
            LISTEN_BODY
        );
        let out = rewrite(&src).unwrap();
        assert!(out.contains(
            "import (\n\t\"context\"\n\n\t\"internal/poll\"\n\t_ \"unsafe\"\n\t\"vendor/golang.org/x/net/route\"\n)"
        ));
    }

    #[test]
    fn test_import_keeps_leading_comment_with_its_spec() {
        let src = format!(
            "package net\n\nimport (\n\t\"context\"\n\t// route is vendored\n\t\"vendor/x/route\"\n)\n\n{}",
            LISTEN_BODY
        );
        let out = rewrite(&src).unwrap();
        assert!(out.contains(
            "import (\n\t\"context\"\n\t_ \"unsafe\"\n\t// route is vendored\n\t\"vendor/x/route\"\n)"
        ));
    }

    #[test]
    fn test_import_after_trailing_comment() {
        let src = format!(
            "package net\n\nimport (\n\t\"context\" // for Dialer\n)\n\n{}",
            LISTEN_BODY
        );
        let out = rewrite(&src).unwrap();
        assert!(out.contains("import (\n\t\"context\" // for Dialer\n\t_ \"unsafe\"\n)"));
    }

    #[test]
    fn test_import_created_after_package_clause() {
        let src = format!("package net\n\n{}", LISTEN_BODY);
        let out = rewrite(&src).unwrap();
        assert!(out.starts_with("package net\n\nimport _ \"unsafe\"\n\nfunc Listen"));
    }

    #[test]
    fn test_named_unsafe_import_counts() {
        let src = format!("package net\n\nimport \"unsafe\"\n\n{}", LISTEN_BODY);
        let out = rewrite(&src).unwrap();
        assert_eq!(out.matches("\"unsafe\"").count(), 1);
    }

    #[test]
    fn test_variadic_forwarding() {
        let src = "package net\n\nfunc Listen(network string, opts ...Option) (Listener, error) {\n\treturn nil, nil\n}\n";
        let out = rewrite(src).unwrap();
        assert!(out.contains("\treturn _listen(network, opts...)\n"));
        assert!(out.contains("func _listen(network string, opts ...Option) (Listener, error)\n"));
    }

    #[test]
    fn test_blank_parameter_is_rejected() {
        let src = "package net\n\nfunc Listen(_, address string) (Listener, error) {\n\treturn nil, nil\n}\n";
        match rewrite(src).unwrap_err() {
            PatchError::Signature { function, .. } => assert_eq!(function, "Listen"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_trailing_newline() {
        let src = "package net\n\nfunc Listen(network, address string) (Listener, error) {\n\treturn nil, nil\n}";
        let out = rewrite(src).unwrap();
        assert!(out.ends_with("}\n\n//go:linkname _listen github.com/goccy/wasi-go-net/wasip1.Listen\nfunc _listen(network string, address string) (Listener, error)\n"));
    }

    #[test]
    fn test_custom_options() {
        let options = RewriteOptions {
            replacement_module: "example.com/wasi/net".to_string(),
            marker_package: "unsafe".to_string(),
        };
        let rewriter = SourceRewriter::new(&TreeSitterGoParser, options);
        let out = rewriter
            .rewrite_source(Path::new("net.go"), &format!("package net\n\n{}", LISTEN_BODY))
            .unwrap();
        assert!(out.contains("//go:linkname _listen example.com/wasi/net.Listen\n"));
    }
}
