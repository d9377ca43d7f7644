//! Go fingerprinting on top of the tree-sitter Go grammar.

use super::{CanonicalWriter, LanguageFingerprinter};
use crate::error::ParseError;
use tree_sitter::{Node, Parser};

const LANGUAGE: &str = "go";

#[derive(Debug, Default, Clone, Copy)]
pub struct GoFingerprinter;

impl LanguageFingerprinter for GoFingerprinter {
    fn language(&self) -> &'static str {
        LANGUAGE
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn canonical_signature(&self, source: &str) -> Result<String, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| ParseError::Parser {
                language: LANGUAGE,
                message: e.to_string(),
            })?;
        let tree = parser.parse(source, None).ok_or_else(|| ParseError::Parser {
            language: LANGUAGE,
            message: "parser returned no tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error(root) {
                Some(node) => format!("syntax error at line {}", node.start_position().row + 1),
                None => "syntax error".to_string(),
            };
            return Err(ParseError::Syntax {
                language: LANGUAGE,
                message,
            });
        }

        let src = source.as_bytes();
        let mut w = CanonicalWriter::new();

        let mut package = String::new();
        let mut imports = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = child.named_child(0) {
                        package = text(name, src).to_string();
                    }
                }
                "import_declaration" => collect_imports(child, src, &mut imports),
                _ => {}
            }
        }
        w.entry("pkg", &package);
        w.imports(imports);

        let mut cursor = root.walk();
        for decl in root.named_children(&mut cursor) {
            match decl.kind() {
                "package_clause" | "import_declaration" | "comment" => {}
                "function_declaration" => write_function(decl, src, &mut w),
                "method_declaration" => write_function(decl, src, &mut w),
                "type_declaration" => write_type_declaration(decl, src, &mut w),
                "var_declaration" => write_value_declaration(decl, "var", src, &mut w),
                "const_declaration" => write_value_declaration(decl, "const", src, &mut w),
                other => w.entry("stmt", other),
            }
        }

        Ok(w.finish())
    }
}

fn text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or_default()
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn collect_imports(decl: Node<'_>, src: &[u8], out: &mut Vec<String>) {
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => {
                if let Some(path) = child.child_by_field_name("path") {
                    out.push(text(path, src).trim_matches(|c| c == '"' || c == '`').to_string());
                }
            }
            "import_spec_list" => collect_imports(child, src, out),
            _ => {}
        }
    }
}

fn write_function(decl: Node<'_>, src: &[u8], w: &mut CanonicalWriter) {
    if let Some(receiver) = decl.child_by_field_name("receiver") {
        w.types("recv", parameter_types(receiver, src));
    }
    let name = decl
        .child_by_field_name("name")
        .map(|n| text(n, src))
        .unwrap_or_default();
    w.entry("func", name);

    if let Some(tparams) = decl.child_by_field_name("type_parameters") {
        w.types("tparams", parameter_types(tparams, src));
    }

    match decl.child_by_field_name("parameters") {
        Some(params) => w.types("params", parameter_types(params, src)),
        None => w.types("params", std::iter::empty::<String>()),
    }

    let results = match decl.child_by_field_name("result") {
        Some(result) if result.kind() == "parameter_list" => parameter_types(result, src),
        Some(result) => vec![render_type(result, src)],
        None => Vec::new(),
    };
    w.types("results", results);

    if let Some(body) = decl.child_by_field_name("body") {
        w.open_body();
        write_body(body, src, w);
        w.close_body();
    }
}

/// Types of a parameter, receiver or type-parameter list. One entry per
/// declaration group, names dropped.
fn parameter_types(list: Node<'_>, src: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = list.walk();
    for param in list.named_children(&mut cursor) {
        match param.kind() {
            "parameter_declaration" | "type_parameter_declaration" => {
                if let Some(ty) = param.child_by_field_name("type") {
                    out.push(render_type(ty, src));
                }
            }
            "variadic_parameter_declaration" => {
                if let Some(ty) = param.child_by_field_name("type") {
                    out.push(format!("...{}", render_type(ty, src)));
                }
            }
            _ => {}
        }
    }
    out
}

fn write_type_declaration(decl: Node<'_>, src: &[u8], w: &mut CanonicalWriter) {
    let mut cursor = decl.walk();
    for spec in decl.named_children(&mut cursor) {
        let tag = match spec.kind() {
            "type_spec" => "type",
            "type_alias" => "alias",
            _ => continue,
        };
        let name = spec
            .child_by_field_name("name")
            .map(|n| text(n, src))
            .unwrap_or_default();
        w.entry(tag, name);
        if let Some(tparams) = spec.child_by_field_name("type_parameters") {
            w.types("tparams", parameter_types(tparams, src));
        }
        if let Some(ty) = spec.child_by_field_name("type") {
            w.entry("def", &render_type(ty, src));
        }
    }
}

fn write_value_declaration(decl: Node<'_>, tag: &str, src: &[u8], w: &mut CanonicalWriter) {
    let mut specs = Vec::new();
    collect_specs(decl, &mut specs);
    for spec in specs {
        let mut cursor = spec.walk();
        for name in spec.children_by_field_name("name", &mut cursor) {
            w.entry(tag, text(name, src));
        }
        if let Some(ty) = spec.child_by_field_name("type") {
            w.entry("of", &render_type(ty, src));
        }
    }
}

fn collect_specs<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "var_spec" | "const_spec" => out.push(child),
            "var_spec_list" | "const_spec_list" => collect_specs(child, out),
            _ => {}
        }
    }
}

/// Structural rendering of a type expression: names only, recursive through
/// pointer, slice, array, map, channel, qualified and generic types.
fn render_type(node: Node<'_>, src: &[u8]) -> String {
    let field = |name: &str| {
        node.child_by_field_name(name)
            .map(|n| render_type(n, src))
            .unwrap_or_default()
    };
    match node.kind() {
        "type_identifier" | "identifier" | "package_identifier" | "field_identifier" => {
            text(node, src).to_string()
        }
        "pointer_type" => match node.named_child(0) {
            Some(inner) => format!("*{}", render_type(inner, src)),
            None => "*".to_string(),
        },
        "parenthesized_type" => node
            .named_child(0)
            .map(|inner| render_type(inner, src))
            .unwrap_or_default(),
        "slice_type" => format!("[]{}", field("element")),
        // array length is a literal and stays out of the signature
        "array_type" | "implicit_length_array_type" => format!("[_]{}", field("element")),
        "map_type" => format!("map[{}]{}", field("key"), field("value")),
        "channel_type" => format!("chan {}", field("value")),
        "qualified_type" => format!("{}.{}", field("package"), field("name")),
        "generic_type" => {
            let args = node
                .child_by_field_name("type_arguments")
                .map(|args| {
                    let mut cursor = args.walk();
                    args.named_children(&mut cursor)
                        .map(|a| render_type(a, src))
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .unwrap_or_default();
            format!("{}[{}]", field("type"), args)
        }
        "type_elem" | "type_constraint" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .map(|n| render_type(n, src))
                .collect::<Vec<_>>()
                .join("|")
        }
        "negated_type" => node
            .named_child(0)
            .map(|inner| format!("~{}", render_type(inner, src)))
            .unwrap_or_default(),
        "function_type" => {
            let params = node
                .child_by_field_name("parameters")
                .map(|p| parameter_types(p, src).join(","))
                .unwrap_or_default();
            let results = match node.child_by_field_name("result") {
                Some(r) if r.kind() == "parameter_list" => parameter_types(r, src).join(","),
                Some(r) => render_type(r, src),
                None => String::new(),
            };
            format!("func({})({})", params, results)
        }
        "struct_type" => {
            let mut fields = Vec::new();
            collect_struct_fields(node, src, &mut fields);
            format!("struct{{{}}}", fields.join(","))
        }
        "interface_type" => {
            let mut cursor = node.walk();
            let methods: Vec<String> = node
                .named_children(&mut cursor)
                .map(|elem| match elem.kind() {
                    "method_elem" | "method_spec" => elem
                        .child_by_field_name("name")
                        .map(|n| text(n, src).to_string())
                        .unwrap_or_default(),
                    _ => render_type(elem, src),
                })
                .collect();
            format!("interface{{{}}}", methods.join(","))
        }
        _ => "T".to_string(),
    }
}

fn collect_struct_fields(node: Node<'_>, src: &[u8], out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "field_declaration_list" => collect_struct_fields(child, src, out),
            "field_declaration" => {
                if let Some(ty) = child.child_by_field_name("type") {
                    out.push(render_type(ty, src));
                }
            }
            _ => {}
        }
    }
}

/// Flattened pre-order token stream over a function body: branch, loop,
/// return, assignment and call nodes, plus call targets.
fn write_body(node: Node<'_>, src: &[u8], w: &mut CanonicalWriter) {
    match node.kind() {
        "if_statement" => w.token("if"),
        "expression_switch_statement" | "type_switch_statement" | "select_statement" => {
            w.token("switch")
        }
        "for_statement" => w.token("for"),
        "return_statement" => w.token("return"),
        "assignment_statement" | "short_var_declaration" => w.token("assign"),
        "call_expression" => {
            w.token("call");
            if let Some(target) = node.child_by_field_name("function").and_then(|f| call_target(f, src)) {
                w.token(&target);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    for child in children {
        write_body(child, src, w);
    }
}

/// Literal name of a call target: `f`, or `pkg.F` / `recv.Method` for selectors.
fn call_target(node: Node<'_>, src: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "field_identifier" => Some(text(node, src).to_string()),
        "selector_expression" => {
            let field = text(node.child_by_field_name("field")?, src);
            match node.child_by_field_name("operand").and_then(|o| call_target(o, src)) {
                Some(operand) => Some(format!("{}.{}", operand, field)),
                None => Some(field.to_string()),
            }
        }
        _ => None,
    }
}
