//! Rust fingerprinting on top of `syn`.
//!
//! Rust files carry no package clause; the module identity is the asset path
//! itself, so the `pkg` entry is left empty. Attributes (including doc
//! comments, which `syn` surfaces as `#[doc]`) are never rendered.

use super::{CanonicalWriter, LanguageFingerprinter};
use crate::error::ParseError;
use syn::visit::{self, Visit};
use syn::{
    BinOp, Fields, FnArg, GenericArgument, ImplItem, Item, PathArguments, ReturnType, Signature,
    TraitItem, Type, TypeParamBound, UseTree,
};

const LANGUAGE: &str = "rust";

#[derive(Debug, Default, Clone, Copy)]
pub struct RustFingerprinter;

impl LanguageFingerprinter for RustFingerprinter {
    fn language(&self) -> &'static str {
        LANGUAGE
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn canonical_signature(&self, source: &str) -> Result<String, ParseError> {
        let file = syn::parse_file(source).map_err(|e| ParseError::Syntax {
            language: LANGUAGE,
            message: e.to_string(),
        })?;

        let mut w = CanonicalWriter::new();
        w.entry("pkg", "");

        let mut imports = Vec::new();
        collect_imports(&file.items, &mut imports);
        w.imports(imports);

        write_items(&file.items, &mut w);
        Ok(w.finish())
    }
}

fn collect_imports(items: &[Item], out: &mut Vec<String>) {
    for item in items {
        match item {
            Item::Use(u) => flatten_use(&u.tree, String::new(), out),
            Item::ExternCrate(c) => out.push(c.ident.to_string()),
            _ => {}
        }
    }
}

fn flatten_use(tree: &UseTree, prefix: String, out: &mut Vec<String>) {
    let join = |s: &str| {
        if prefix.is_empty() {
            s.to_string()
        } else {
            format!("{}::{}", prefix, s)
        }
    };
    match tree {
        UseTree::Path(p) => flatten_use(&p.tree, join(&p.ident.to_string()), out),
        UseTree::Name(n) => out.push(join(&n.ident.to_string())),
        UseTree::Rename(r) => out.push(format!("{} as {}", join(&r.ident.to_string()), r.rename)),
        UseTree::Glob(_) => out.push(join("*")),
        UseTree::Group(g) => {
            for t in &g.items {
                flatten_use(t, prefix.clone(), out);
            }
        }
    }
}

fn write_items(items: &[Item], w: &mut CanonicalWriter) {
    for item in items {
        match item {
            Item::Use(_) | Item::ExternCrate(_) => {}
            Item::Fn(f) => {
                write_signature("fn", &f.sig, w);
                write_body(|v| v.visit_block(&f.block), w);
            }
            Item::Struct(s) => {
                w.entry("struct", &s.ident.to_string());
                w.types("fields", field_types(&s.fields));
            }
            Item::Enum(e) => {
                w.entry("enum", &e.ident.to_string());
                for variant in &e.variants {
                    w.entry("variant", &variant.ident.to_string());
                    w.types("fields", field_types(&variant.fields));
                }
            }
            Item::Union(u) => {
                w.entry("union", &u.ident.to_string());
                w.types("fields", u.fields.named.iter().map(|f| render_type(&f.ty)));
            }
            Item::Impl(i) => {
                let self_ty = render_type(&i.self_ty);
                let header = match &i.trait_ {
                    Some((_, path, _)) => format!("{} for {}", render_path(path), self_ty),
                    None => self_ty.clone(),
                };
                w.entry("impl", &header);
                for impl_item in &i.items {
                    match impl_item {
                        ImplItem::Fn(m) => {
                            w.entry("recv", &self_ty);
                            write_signature("fn", &m.sig, w);
                            write_body(|v| v.visit_block(&m.block), w);
                        }
                        ImplItem::Const(c) => {
                            w.entry("const", &c.ident.to_string());
                            w.entry("of", &render_type(&c.ty));
                        }
                        ImplItem::Type(t) => {
                            w.entry("type", &t.ident.to_string());
                            w.entry("def", &render_type(&t.ty));
                        }
                        _ => w.entry("item", "other"),
                    }
                }
            }
            Item::Trait(t) => {
                w.entry("trait", &t.ident.to_string());
                for trait_item in &t.items {
                    match trait_item {
                        TraitItem::Fn(m) => {
                            write_signature("fn", &m.sig, w);
                            if let Some(block) = &m.default {
                                write_body(|v| v.visit_block(block), w);
                            }
                        }
                        TraitItem::Const(c) => {
                            w.entry("const", &c.ident.to_string());
                            w.entry("of", &render_type(&c.ty));
                        }
                        TraitItem::Type(ty) => w.entry("type", &ty.ident.to_string()),
                        _ => w.entry("item", "other"),
                    }
                }
            }
            Item::Const(c) => {
                w.entry("const", &c.ident.to_string());
                w.entry("of", &render_type(&c.ty));
            }
            Item::Static(s) => {
                w.entry("static", &s.ident.to_string());
                w.entry("of", &render_type(&s.ty));
            }
            Item::Type(t) => {
                w.entry("type", &t.ident.to_string());
                w.entry("def", &render_type(&t.ty));
            }
            Item::Mod(m) => {
                w.entry("mod", &m.ident.to_string());
                if let Some((_, inner)) = &m.content {
                    let mut nested = Vec::new();
                    collect_imports(inner, &mut nested);
                    w.imports(nested);
                    w.open_body();
                    write_items(inner, w);
                    w.close_body();
                }
            }
            Item::Macro(m) => {
                let name = m
                    .ident
                    .as_ref()
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| render_path(&m.mac.path));
                w.entry("macro", &name);
            }
            _ => w.entry("item", "other"),
        }
    }
}

fn write_signature(tag: &str, sig: &Signature, w: &mut CanonicalWriter) {
    w.entry(tag, &sig.ident.to_string());
    let params = sig.inputs.iter().map(|arg| match arg {
        FnArg::Receiver(r) => match (&r.reference, r.mutability) {
            (Some(_), Some(_)) => "&mut self".to_string(),
            (Some(_), None) => "&self".to_string(),
            (None, _) => "self".to_string(),
        },
        FnArg::Typed(pat) => render_type(&pat.ty),
    });
    w.types("params", params);
    match &sig.output {
        ReturnType::Default => w.types("results", std::iter::empty::<String>()),
        ReturnType::Type(_, ty) => w.types("results", [render_type(ty)]),
    }
}

fn field_types(fields: &Fields) -> Vec<String> {
    fields.iter().map(|f| render_type(&f.ty)).collect()
}

fn render_path(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|seg| {
            let args = match &seg.arguments {
                PathArguments::None => String::new(),
                PathArguments::AngleBracketed(a) => {
                    let rendered: Vec<String> = a
                        .args
                        .iter()
                        .filter_map(|arg| match arg {
                            GenericArgument::Type(t) => Some(render_type(t)),
                            GenericArgument::Const(_) => Some("_".to_string()),
                            GenericArgument::AssocType(a) => {
                                Some(format!("{}={}", a.ident, render_type(&a.ty)))
                            }
                            _ => None,
                        })
                        .collect();
                    if rendered.is_empty() {
                        String::new()
                    } else {
                        format!("<{}>", rendered.join(","))
                    }
                }
                PathArguments::Parenthesized(p) => {
                    let inputs: Vec<String> = p.inputs.iter().map(render_type).collect();
                    let output = match &p.output {
                        ReturnType::Default => String::new(),
                        ReturnType::Type(_, ty) => format!("->{}", render_type(ty)),
                    };
                    format!("({}){}", inputs.join(","), output)
                }
            };
            format!("{}{}", seg.ident, args)
        })
        .collect::<Vec<_>>()
        .join("::")
}

fn render_bounds<'a>(bounds: impl Iterator<Item = &'a TypeParamBound>) -> String {
    bounds
        .filter_map(|b| match b {
            TypeParamBound::Trait(t) => Some(render_path(&t.path)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Structural rendering of a type: names only, lifetimes and array lengths dropped.
fn render_type(ty: &Type) -> String {
    match ty {
        Type::Path(p) => render_path(&p.path),
        Type::Reference(r) => {
            let m = if r.mutability.is_some() { "mut " } else { "" };
            format!("&{}{}", m, render_type(&r.elem))
        }
        Type::Ptr(p) => {
            let m = if p.mutability.is_some() { "mut" } else { "const" };
            format!("*{} {}", m, render_type(&p.elem))
        }
        Type::Slice(s) => format!("[{}]", render_type(&s.elem)),
        Type::Array(a) => format!("[{};_]", render_type(&a.elem)),
        Type::Tuple(t) => format!(
            "({})",
            t.elems.iter().map(render_type).collect::<Vec<_>>().join(",")
        ),
        Type::Paren(p) => render_type(&p.elem),
        Type::Group(g) => render_type(&g.elem),
        Type::ImplTrait(i) => format!("impl {}", render_bounds(i.bounds.iter())),
        Type::TraitObject(t) => format!("dyn {}", render_bounds(t.bounds.iter())),
        Type::Never(_) => "!".to_string(),
        Type::Infer(_) => "_".to_string(),
        Type::BareFn(f) => {
            let inputs: Vec<String> = f.inputs.iter().map(|a| render_type(&a.ty)).collect();
            let output = match &f.output {
                ReturnType::Default => String::new(),
                ReturnType::Type(_, ty) => format!("->{}", render_type(ty)),
            };
            format!("fn({}){}", inputs.join(","), output)
        }
        _ => "T".to_string(),
    }
}

fn write_body(visit_fn: impl FnOnce(&mut BodyTokens), w: &mut CanonicalWriter) {
    let mut tokens = BodyTokens::default();
    visit_fn(&mut tokens);
    w.open_body();
    for token in &tokens.tokens {
        w.token(token);
    }
    w.close_body();
}

/// Collects control-flow tokens and call targets in pre-order.
#[derive(Default)]
struct BodyTokens {
    tokens: Vec<String>,
}

impl BodyTokens {
    fn push(&mut self, token: &str) {
        self.tokens.push(token.to_string());
    }
}

impl<'ast> Visit<'ast> for BodyTokens {
    fn visit_expr_if(&mut self, i: &'ast syn::ExprIf) {
        self.push("if");
        visit::visit_expr_if(self, i);
    }

    fn visit_expr_match(&mut self, i: &'ast syn::ExprMatch) {
        self.push("match");
        visit::visit_expr_match(self, i);
    }

    fn visit_expr_try(&mut self, i: &'ast syn::ExprTry) {
        self.push("try");
        visit::visit_expr_try(self, i);
    }

    fn visit_expr_for_loop(&mut self, i: &'ast syn::ExprForLoop) {
        self.push("for");
        visit::visit_expr_for_loop(self, i);
    }

    fn visit_expr_while(&mut self, i: &'ast syn::ExprWhile) {
        self.push("while");
        visit::visit_expr_while(self, i);
    }

    fn visit_expr_loop(&mut self, i: &'ast syn::ExprLoop) {
        self.push("loop");
        visit::visit_expr_loop(self, i);
    }

    fn visit_expr_return(&mut self, i: &'ast syn::ExprReturn) {
        self.push("return");
        visit::visit_expr_return(self, i);
    }

    fn visit_expr_assign(&mut self, i: &'ast syn::ExprAssign) {
        self.push("assign");
        visit::visit_expr_assign(self, i);
    }

    fn visit_expr_binary(&mut self, i: &'ast syn::ExprBinary) {
        let compound = matches!(
            i.op,
            BinOp::AddAssign(_)
                | BinOp::SubAssign(_)
                | BinOp::MulAssign(_)
                | BinOp::DivAssign(_)
                | BinOp::RemAssign(_)
                | BinOp::BitXorAssign(_)
                | BinOp::BitAndAssign(_)
                | BinOp::BitOrAssign(_)
                | BinOp::ShlAssign(_)
                | BinOp::ShrAssign(_)
        );
        if compound {
            self.push("assign");
        }
        visit::visit_expr_binary(self, i);
    }

    fn visit_local(&mut self, i: &'ast syn::Local) {
        if i.init.is_some() {
            self.push("assign");
        }
        visit::visit_local(self, i);
    }

    fn visit_expr_call(&mut self, i: &'ast syn::ExprCall) {
        self.push("call");
        if let syn::Expr::Path(p) = &*i.func {
            let name = p
                .path
                .segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect::<Vec<_>>()
                .join("::");
            self.push(&name);
        }
        visit::visit_expr_call(self, i);
    }

    fn visit_expr_method_call(&mut self, i: &'ast syn::ExprMethodCall) {
        self.push("call");
        self.push(&format!(".{}", i.method));
        visit::visit_expr_method_call(self, i);
    }

    fn visit_macro(&mut self, i: &'ast syn::Macro) {
        self.push("call");
        self.push(&format!("{}!", render_path(&i.path)));
        visit::visit_macro(self, i);
    }
}
