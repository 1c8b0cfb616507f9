//! Go parser backed by tree-sitter.
//!
//! Converts the concrete syntax tree into the owned [`GoFile`] view. Only top-level
//! declarations are converted; bodies are kept as spans.

use tree_sitter::{Node, Parser};

use crate::domain::ast::{FuncDecl, GoFile, ImportDecl, ImportGroup, ImportSpec, Param, TypeExpr};
use crate::ports::GoParser;

pub struct TreeSitterGoParser;

impl GoParser for TreeSitterGoParser {
    fn parse(&self, src: &str) -> Result<GoFile, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| format!("failed to load Go grammar: {}", e))?;
        let tree = parser
            .parse(src, None)
            .ok_or_else(|| "parser returned no tree".to_string())?;

        let root = tree.root_node();
        if root.has_error() {
            let pos = first_error(root)
                .map(|n| n.start_position())
                .unwrap_or_else(|| root.start_position());
            return Err(format!("syntax error at {}:{}", pos.row + 1, pos.column + 1));
        }

        let mut file = GoFile::default();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_clause" => file.package_clause = Some(child.byte_range()),
                "import_declaration" => file.import_decls.push(import_decl(child, src)),
                "function_declaration" | "method_declaration" => {
                    if let Some(decl) = func_decl(child, src) {
                        file.funcs.push(decl);
                    }
                }
                _ => {}
            }
        }
        Ok(file)
    }
}

fn text<'s>(node: Node<'_>, src: &'s str) -> &'s str {
    &src[node.byte_range()]
}

fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn import_decl(node: Node<'_>, src: &str) -> ImportDecl {
    let mut specs = Vec::new();
    let mut group = None;

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    for child in children {
        match child.kind() {
            "import_spec" => specs.push(import_spec(child, src)),
            "import_spec_list" => {
                let mut lparen = child.start_byte();
                let mut rparen = child.end_byte().saturating_sub(1);
                let mut inner = child.walk();
                for n in child.children(&mut inner) {
                    match n.kind() {
                        "(" => lparen = n.start_byte(),
                        ")" => rparen = n.start_byte(),
                        "import_spec" => specs.push(import_spec(n, src)),
                        _ => {}
                    }
                }
                group = Some(ImportGroup { lparen, rparen });
            }
            _ => {}
        }
    }

    ImportDecl {
        span: node.byte_range(),
        group,
        specs,
    }
}

fn import_spec(node: Node<'_>, src: &str) -> ImportSpec {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, src).to_string());
    let path = node
        .child_by_field_name("path")
        .map(|n| text(n, src).trim_matches(|c| c == '"' || c == '`').to_string())
        .unwrap_or_default();
    ImportSpec {
        name,
        path,
        span: node.byte_range(),
        start_row: node.start_position().row,
        end_row: node.end_position().row,
    }
}

fn func_decl(node: Node<'_>, src: &str) -> Option<FuncDecl> {
    let name = text(node.child_by_field_name("name")?, src).to_string();
    let receiver = node
        .child_by_field_name("receiver")
        .map(|list| params(list, src));
    let params = node
        .child_by_field_name("parameters")
        .map(|list| params(list, src))
        .unwrap_or_default();
    let result = node
        .child_by_field_name("result")
        .map(|n| text(n, src).to_string());
    let body = node.child_by_field_name("body").map(|n| n.byte_range());

    Some(FuncDecl {
        name,
        receiver,
        params,
        result,
        body,
        span: node.byte_range(),
    })
}

fn params(list: Node<'_>, src: &str) -> Vec<Param> {
    let mut cursor = list.walk();
    let decls: Vec<Node<'_>> = list.named_children(&mut cursor).collect();

    decls
        .into_iter()
        .filter_map(|decl| {
            let variadic = match decl.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => return None, // comments
            };
            let mut names_cursor = decl.walk();
            let names = decl
                .children_by_field_name("name", &mut names_cursor)
                .map(|n| text(n, src).to_string())
                .collect();
            let ty = decl
                .child_by_field_name("type")
                .map(|n| type_expr(n, src))
                .unwrap_or_else(|| TypeExpr::Other(String::new()));
            Some(Param { names, ty, variadic })
        })
        .collect()
}

fn type_expr(node: Node<'_>, src: &str) -> TypeExpr {
    match node.kind() {
        "type_identifier" => TypeExpr::Ident(text(node, src).to_string()),
        "pointer_type" => match node.named_child(0) {
            Some(inner) => TypeExpr::Pointer(Box::new(type_expr(inner, src))),
            None => TypeExpr::Other(text(node, src).to_string()),
        },
        _ => TypeExpr::Other(text(node, src).to_string()),
    }
}
