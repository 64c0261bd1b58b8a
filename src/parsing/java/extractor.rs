//! Java structural extractor
//!
//! Walks tree-sitter-java trees by hand (no queries) and turns declarations
//! into owned facts.

use super::constants::{
    CONFIG_ANNOTATIONS, CONFIG_SUPERTYPES, TYPE_DECLARATION_KINDS, is_builtin_package,
    is_builtin_type,
};
use super::endpoints;
use crate::parsing::facts::{
    AnnotationFact, CallFact, ClassFacts, DeclarationFacts, FieldFact, FileHeader, ImportDecl,
    MemberDecl, MethodFacts, ParamFact, RestEndpoint, TypeRef,
};
use crate::parsing::text::normalize_whitespace;
use crate::parsing::{Language, LanguageExtractor, SyntaxTree};
use crate::types::{Diagnostic, MethodType, Range, TypeKind};
use tracing::debug;
use tree_sitter::Node;

/// Stateless Java implementation of [`LanguageExtractor`]
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaExtractor;

/// A type declaration found while walking, with its resolved name
struct TypeSite<'t> {
    node: Node<'t>,
    name: Option<String>,
    fqn: Option<String>,
    parent_fqn: Option<String>,
    /// Contains a syntax error; reported and skipped with its members
    malformed: bool,
}

/// Scratch collected while walking a method body
#[derive(Default)]
struct BodyScan {
    calls: Vec<CallFact>,
    type_refs: Vec<TypeRef>,
    locals: Vec<(String, String)>,
    field_accesses: Vec<String>,
}

impl JavaExtractor {
    pub fn new() -> Self {
        Self
    }

    fn node_to_range(&self, node: Node) -> Range {
        let start = node.start_position();
        let end = node.end_position();
        Range::new(
            start.row as u32,
            start.column as u32,
            end.row as u32,
            end.column as u32,
        )
    }

    fn child_of_kind<'t>(&self, node: Node<'t>, kind: &str) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        node.children(&mut cursor).find(|child| child.kind() == kind)
    }

    fn type_kind(&self, node: Node) -> Option<TypeKind> {
        match node.kind() {
            "class_declaration" => Some(TypeKind::Class),
            "interface_declaration" => Some(TypeKind::Interface),
            "enum_declaration" => Some(TypeKind::Enum),
            "record_declaration" => Some(TypeKind::Record),
            "annotation_type_declaration" => Some(TypeKind::Annotation),
            _ => None,
        }
    }

    /// Node whose named children are the members of a type declaration
    fn member_container<'t>(&self, class_node: Node<'t>) -> Option<Node<'t>> {
        let body = class_node.child_by_field_name("body")?;
        if body.kind() == "enum_body" {
            self.child_of_kind(body, "enum_body_declarations")
        } else {
            Some(body)
        }
    }

    /// Declared name of a node, `None` when missing or malformed
    fn declared_name(&self, tree: &SyntaxTree, node: Node) -> Option<String> {
        let name_node = node.child_by_field_name("name")?;
        if name_node.is_missing() || name_node.is_error() {
            return None;
        }
        let name = tree.text(name_node).trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Pre-order walk over type declarations in `container`, nested ones included
    fn visit_types<'t>(
        &self,
        tree: &'t SyntaxTree,
        container: Node<'t>,
        parent_fqn: Option<&str>,
        header: &FileHeader,
        visit: &mut dyn FnMut(TypeSite<'t>),
    ) {
        let mut cursor = container.walk();
        let children: Vec<Node<'t>> = container.named_children(&mut cursor).collect();

        for child in children {
            let is_declaration = TYPE_DECLARATION_KINDS.contains(&child.kind());
            if !is_declaration && !child.is_error() {
                continue;
            }

            let name = is_declaration
                .then(|| self.declared_name(tree, child))
                .flatten();
            let fqn = name.as_ref().map(|name| match parent_fqn {
                Some(parent) => format!("{parent}.{name}"),
                None => header.qualify(name),
            });
            let malformed = child.has_error();

            visit(TypeSite {
                node: child,
                name: name.clone(),
                fqn: fqn.clone(),
                parent_fqn: parent_fqn.map(str::to_string),
                malformed,
            });
            if malformed {
                continue;
            }

            // Members of an unnamed declaration cannot be qualified
            if let (Some(fqn), Some(members)) = (fqn, self.member_container(child)) {
                self.visit_types(tree, members, Some(&fqn), header, visit);
            }
        }
    }

    /// Keyword modifiers (`public`, `static`, ...) excluding annotations
    fn modifiers_of(&self, tree: &SyntaxTree, node: Node) -> Vec<String> {
        let Some(modifiers) = self.child_of_kind(node, "modifiers") else {
            return Vec::new();
        };
        let mut cursor = modifiers.walk();
        modifiers
            .children(&mut cursor)
            .filter(|child| !matches!(child.kind(), "annotation" | "marker_annotation"))
            .map(|child| tree.text(child).to_string())
            .collect()
    }

    fn superclass(&self, tree: &SyntaxTree, class_node: Node) -> Option<TypeRef> {
        let superclass = self.child_of_kind(class_node, "superclass")?;
        let type_node = superclass.named_child(0)?;
        Some(self.type_ref(tree, type_node))
    }

    /// `implements` list, or `extends` list for an interface
    fn interface_list(&self, tree: &SyntaxTree, class_node: Node) -> Vec<TypeRef> {
        let holder = self
            .child_of_kind(class_node, "super_interfaces")
            .or_else(|| self.child_of_kind(class_node, "extends_interfaces"));
        let Some(type_list) = holder.and_then(|h| self.child_of_kind(h, "type_list")) else {
            return Vec::new();
        };
        let mut cursor = type_list.walk();
        type_list
            .named_children(&mut cursor)
            .map(|type_node| self.type_ref(tree, type_node))
            .collect()
    }

    fn type_ref(&self, tree: &SyntaxTree, type_node: Node) -> TypeRef {
        TypeRef {
            name: self.resolve_supertype_heuristics(tree.text(type_node)),
            range: self.node_to_range(type_node),
        }
    }

    /// Every named type inside a type expression, generic arguments and
    /// array elements included. Primitive types are skipped.
    fn collect_type_refs(&self, tree: &SyntaxTree, node: Node, out: &mut Vec<TypeRef>) {
        match node.kind() {
            "type_identifier" | "scoped_type_identifier" => out.push(TypeRef {
                name: normalize_whitespace(tree.text(node)),
                range: self.node_to_range(node),
            }),
            "integral_type" | "floating_point_type" | "boolean_type" | "void_type" => {}
            "annotation" | "marker_annotation" => {}
            _ => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.collect_type_refs(tree, child, out);
                }
            }
        }
    }

    fn field_facts(
        &self,
        tree: &SyntaxTree,
        class_node: Node,
        owner_is_interface: bool,
        type_refs: &mut Vec<TypeRef>,
    ) -> Vec<FieldFact> {
        let mut fields = Vec::new();

        // Record components behave like private final fields
        if let Some(components) = class_node
            .child_by_field_name("parameters")
            .filter(|_| class_node.kind() == "record_declaration")
        {
            for param in self.param_facts(tree, components) {
                fields.push(FieldFact {
                    name: param.name,
                    type_name: param.type_name,
                    is_public: false,
                    is_static: false,
                    line: components.start_position().row as u32,
                });
            }
            self.collect_type_refs(tree, components, type_refs);
        }

        let Some(container) = self.member_container(class_node) else {
            return fields;
        };
        let mut cursor = container.walk();
        for member in container.named_children(&mut cursor) {
            if !matches!(member.kind(), "field_declaration" | "constant_declaration") {
                continue;
            }
            let Some(type_node) = member.child_by_field_name("type") else {
                continue;
            };
            let modifiers = self.modifiers_of(tree, member);
            let is_public = owner_is_interface || modifiers.iter().any(|m| m == "public");
            let is_static = owner_is_interface || modifiers.iter().any(|m| m == "static");
            let type_name = normalize_whitespace(tree.text(type_node));
            self.collect_type_refs(tree, type_node, type_refs);

            let mut decl_cursor = member.walk();
            for declarator in member.children_by_field_name("declarator", &mut decl_cursor) {
                if let Some(name) = self.declared_name(tree, declarator) {
                    fields.push(FieldFact {
                        name,
                        type_name: type_name.clone(),
                        is_public,
                        is_static,
                        line: declarator.start_position().row as u32,
                    });
                }
            }
        }
        fields
    }

    fn param_facts(&self, tree: &SyntaxTree, params_node: Node) -> Vec<ParamFact> {
        let mut params = Vec::new();
        let mut cursor = params_node.walk();
        for param in params_node.named_children(&mut cursor) {
            match param.kind() {
                "formal_parameter" => {
                    let name = self.declared_name(tree, param);
                    let ty = param.child_by_field_name("type");
                    if let (Some(name), Some(ty)) = (name, ty) {
                        params.push(ParamFact {
                            name,
                            type_name: normalize_whitespace(tree.text(ty)),
                        });
                    }
                }
                "spread_parameter" => {
                    let mut inner = param.walk();
                    let children: Vec<Node> = param.named_children(&mut inner).collect();
                    let ty = children
                        .iter()
                        .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator"));
                    let name = children
                        .iter()
                        .find(|c| c.kind() == "variable_declarator")
                        .and_then(|d| self.declared_name(tree, *d));
                    if let (Some(ty), Some(name)) = (ty, name) {
                        params.push(ParamFact {
                            name,
                            type_name: format!("{}[]", normalize_whitespace(tree.text(*ty))),
                        });
                    }
                }
                _ => {}
            }
        }
        params
    }

    fn method_signature(&self, tree: &SyntaxTree, name: &str, method_node: Node) -> String {
        let params = method_node
            .child_by_field_name("parameters")
            .map(|p| tree.text(p))
            .unwrap_or("()");
        normalize_whitespace(&format!("{name}{params}"))
    }

    /// Iterative walk so deeply nested expressions cannot exhaust the stack
    fn scan_body(&self, tree: &SyntaxTree, body: Node) -> BodyScan {
        let mut scan = BodyScan::default();
        let mut stack = vec![body];

        while let Some(node) = stack.pop() {
            match node.kind() {
                "method_invocation" => {
                    if let Some(name_node) = node.child_by_field_name("name") {
                        scan.calls.push(CallFact {
                            name: tree.text(name_node).to_string(),
                            receiver: node
                                .child_by_field_name("object")
                                .map(|o| normalize_whitespace(tree.text(o))),
                            name_range: self.node_to_range(name_node),
                            arg_count: node
                                .child_by_field_name("arguments")
                                .map_or(0, |a| a.named_child_count()),
                        });
                    }
                }
                "object_creation_expression" | "cast_expression" | "instanceof_expression" => {
                    if let Some(ty) = node.child_by_field_name("type") {
                        self.collect_type_refs(tree, ty, &mut scan.type_refs);
                    }
                }
                "local_variable_declaration" => {
                    if let Some(ty) = node.child_by_field_name("type") {
                        let type_name = normalize_whitespace(tree.text(ty));
                        self.collect_type_refs(tree, ty, &mut scan.type_refs);
                        let mut cursor = node.walk();
                        for declarator in node.children_by_field_name("declarator", &mut cursor) {
                            if let Some(name) = self.declared_name(tree, declarator) {
                                scan.locals.push((name, type_name.clone()));
                            }
                        }
                    }
                }
                "enhanced_for_statement" => {
                    if let (Some(ty), Some(name)) = (
                        node.child_by_field_name("type"),
                        self.declared_name(tree, node),
                    ) {
                        self.collect_type_refs(tree, ty, &mut scan.type_refs);
                        scan.locals.push((name, normalize_whitespace(tree.text(ty))));
                    }
                }
                "catch_formal_parameter" => {
                    if let Some(catch_type) = self.child_of_kind(node, "catch_type") {
                        self.collect_type_refs(tree, catch_type, &mut scan.type_refs);
                    }
                }
                "field_access" => {
                    if let Some(field) = node.child_by_field_name("field") {
                        let name = tree.text(field).to_string();
                        if !scan.field_accesses.contains(&name) {
                            scan.field_accesses.push(name);
                        }
                    }
                }
                _ => {}
            }

            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        scan
    }

    fn method_facts(
        &self,
        tree: &SyntaxTree,
        node: Node,
        owner_is_interface: bool,
        class_annotations: &[AnnotationFact],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<MethodFacts> {
        let Some(name) = self.declared_name(tree, node) else {
            diagnostics.push(
                Diagnostic::warning("MALFORMED_METHOD", "method declaration without a name")
                    .at_line(node.start_position().row as u32),
            );
            return None;
        };

        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.param_facts(tree, p))
            .unwrap_or_default();
        let return_type = node
            .child_by_field_name("type")
            .map(|t| normalize_whitespace(tree.text(t)));
        let modifiers = self.modifiers_of(tree, node);
        let is_private = modifiers.iter().any(|m| m == "private");
        let is_public =
            modifiers.iter().any(|m| m == "public") || (owner_is_interface && !is_private);
        let annotations = self.extract_annotations(tree, node);
        let body = node.child_by_field_name("body");

        // Signature types come first so the order follows the source
        let mut type_refs = Vec::new();
        if let Some(ty) = node.child_by_field_name("type") {
            self.collect_type_refs(tree, ty, &mut type_refs);
        }
        if let Some(p) = node.child_by_field_name("parameters") {
            self.collect_type_refs(tree, p, &mut type_refs);
        }
        let signature_types = if is_public {
            type_refs.iter().map(|t| t.name.clone()).collect()
        } else {
            Vec::new()
        };

        let scan = body
            .map(|b| self.scan_body(tree, b))
            .unwrap_or_default();
        type_refs.extend(scan.type_refs);

        let endpoints = self.extract_endpoints(&annotations, class_annotations, &params);

        let mut facts = MethodFacts {
            signature: self.method_signature(tree, &name, node),
            name,
            params,
            return_type,
            is_constructor: node.kind() == "constructor_declaration",
            is_abstract: body.is_none(),
            is_static: modifiers.iter().any(|m| m == "static"),
            is_public,
            annotations,
            text: tree.text(node).to_string(),
            range: self.node_to_range(node),
            name_range: node
                .child_by_field_name("name")
                .map(|n| self.node_to_range(n))
                .unwrap_or_default(),
            calls: scan.calls,
            type_refs,
            signature_types,
            locals: scan.locals,
            field_accesses: scan.field_accesses,
            endpoints,
            method_type: MethodType::Regular,
        };
        facts.method_type = self.classify_method(&facts);
        Some(facts)
    }

    fn class_facts(
        &self,
        tree: &SyntaxTree,
        site: &TypeSite,
        header: &FileHeader,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<ClassFacts> {
        let node = site.node;
        if site.malformed {
            let line = first_error_line(node);
            let what = site.fqn.as_deref().unwrap_or("unparseable region");
            debug!("skipping {what}: syntax error at line {line}");
            diagnostics.push(
                Diagnostic::warning(
                    "MALFORMED_DECLARATION",
                    format!("{what} skipped: syntax error at line {}", line + 1),
                )
                .at_line(line),
            );
            return None;
        }
        let (Some(name), Some(fqn), Some(kind)) =
            (site.name.clone(), site.fqn.clone(), self.type_kind(node))
        else {
            diagnostics.push(
                Diagnostic::warning("MALFORMED_DECLARATION", "type declaration without a name")
                    .at_line(node.start_position().row as u32),
            );
            return None;
        };

        let owner_is_interface = matches!(kind, TypeKind::Interface | TypeKind::Annotation);
        let annotations = self.extract_annotations(tree, node);
        let (extends, implements) = if kind == TypeKind::Interface {
            (None, self.interface_list(tree, node))
        } else {
            (self.superclass(tree, node), self.interface_list(tree, node))
        };

        let mut field_type_refs = Vec::new();
        let fields = self.field_facts(tree, node, owner_is_interface, &mut field_type_refs);
        let methods = self.extract_methods(tree, node, &annotations, diagnostics);

        let mut nested_types = Vec::new();
        if let Some(members) = self.member_container(node) {
            let mut cursor = members.walk();
            for member in members.named_children(&mut cursor) {
                if TYPE_DECLARATION_KINDS.contains(&member.kind()) {
                    if let Some(nested) = self.declared_name(tree, member) {
                        nested_types.push(nested);
                    }
                }
            }
        }

        let is_configuration = annotations
            .iter()
            .any(|a| CONFIG_ANNOTATIONS.contains(&a.simple_name()))
            || extends
                .iter()
                .chain(implements.iter())
                .any(|t| CONFIG_SUPERTYPES.contains(&simple_name(&t.name)));

        debug!(
            "extracted {fqn}: {} methods, {} fields",
            methods.len(),
            fields.len()
        );

        Some(ClassFacts {
            name,
            fqn,
            package: header.package.clone(),
            kind,
            modifiers: self.modifiers_of(tree, node),
            annotations,
            extends,
            implements,
            fields,
            methods,
            field_type_refs,
            text: tree.text(node).to_string(),
            range: self.node_to_range(node),
            name_range: node
                .child_by_field_name("name")
                .map(|n| self.node_to_range(n))
                .unwrap_or_default(),
            parent_fqn: site.parent_fqn.clone(),
            nested_types,
            is_configuration,
        })
    }

    fn member_decls(&self, tree: &SyntaxTree, class_node: Node) -> (Vec<MemberDecl>, Vec<MemberDecl>) {
        let mut methods = Vec::new();
        let mut fields = Vec::new();
        let owner_is_interface = matches!(
            class_node.kind(),
            "interface_declaration" | "annotation_type_declaration"
        );
        let Some(container) = self.member_container(class_node) else {
            return (methods, fields);
        };

        let mut cursor = container.walk();
        for member in container.named_children(&mut cursor) {
            let modifiers = self.modifiers_of(tree, member);
            let is_public = modifiers.iter().any(|m| m == "public")
                || (owner_is_interface && !modifiers.iter().any(|m| m == "private"));
            match member.kind() {
                "method_declaration" | "constructor_declaration" => {
                    if let Some(name) = self.declared_name(tree, member) {
                        methods.push(MemberDecl {
                            signature: self.method_signature(tree, &name, member),
                            name,
                            is_public,
                            range: self.node_to_range(member),
                        });
                    }
                }
                "field_declaration" | "constant_declaration" => {
                    let mut decl_cursor = member.walk();
                    for declarator in member.children_by_field_name("declarator", &mut decl_cursor)
                    {
                        if let Some(name) = self.declared_name(tree, declarator) {
                            fields.push(MemberDecl {
                                signature: name.clone(),
                                name,
                                is_public,
                                range: self.node_to_range(declarator),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
        (methods, fields)
    }
}

/// Zero-based line of the first ERROR or MISSING node under `node`
fn first_error_line(node: Node) -> u32 {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.is_error() || current.is_missing() {
            return current.start_position().row as u32;
        }
        let mut cursor = current.walk();
        let children: Vec<Node> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    node.start_position().row as u32
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

impl LanguageExtractor for JavaExtractor {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extract_header(&self, tree: &SyntaxTree) -> FileHeader {
        let mut header = FileHeader::default();
        let root = tree.root();
        let mut cursor = root.walk();

        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    let mut inner = child.walk();
                    if let Some(name) = child
                        .named_children(&mut inner)
                        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
                    {
                        header.package = tree.text(name).to_string();
                    }
                }
                "import_declaration" => {
                    let mut inner = child.walk();
                    let mut import = ImportDecl {
                        path: String::new(),
                        is_static: false,
                        is_wildcard: false,
                    };
                    for part in child.children(&mut inner) {
                        match part.kind() {
                            "static" => import.is_static = true,
                            "asterisk" => import.is_wildcard = true,
                            "scoped_identifier" | "identifier" => {
                                import.path = tree.text(part).to_string()
                            }
                            _ => {}
                        }
                    }
                    if !import.path.is_empty() {
                        header.imports.push(import);
                    }
                }
                _ => {}
            }
        }

        header
    }

    fn extract_declarations(
        &self,
        tree: &SyntaxTree,
        header: &FileHeader,
    ) -> Vec<DeclarationFacts> {
        let mut declarations = Vec::new();
        self.visit_types(tree, tree.root(), None, header, &mut |site| {
            if site.malformed {
                return;
            }
            let (Some(name), Some(fqn), Some(kind)) =
                (site.name, site.fqn, self.type_kind(site.node))
            else {
                return;
            };
            let extends = if kind == TypeKind::Interface {
                Vec::new()
            } else {
                self.superclass(tree, site.node)
                    .map(|t| vec![t.name])
                    .unwrap_or_default()
            };
            let interfaces = self
                .interface_list(tree, site.node)
                .into_iter()
                .map(|t| t.name)
                .collect();
            let (methods, fields) = self.member_decls(tree, site.node);

            declarations.push(DeclarationFacts {
                name,
                fqn,
                kind,
                extends,
                implements: interfaces,
                methods,
                fields,
                range: self.node_to_range(site.node),
                parent_fqn: site.parent_fqn,
            });
        });
        declarations
    }

    fn extract_classes(
        &self,
        tree: &SyntaxTree,
        header: &FileHeader,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ClassFacts> {
        let mut classes = Vec::new();
        self.visit_types(tree, tree.root(), None, header, &mut |site| {
            if let Some(class) = self.class_facts(tree, &site, header, diagnostics) {
                classes.push(class);
            }
        });
        classes
    }

    fn extract_methods(
        &self,
        tree: &SyntaxTree,
        class_node: Node<'_>,
        class_annotations: &[AnnotationFact],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<MethodFacts> {
        let owner_is_interface = matches!(
            class_node.kind(),
            "interface_declaration" | "annotation_type_declaration"
        );
        let Some(container) = self.member_container(class_node) else {
            return Vec::new();
        };

        let mut methods = Vec::new();
        let mut cursor = container.walk();
        for member in container.named_children(&mut cursor) {
            if matches!(
                member.kind(),
                "method_declaration" | "constructor_declaration"
            ) {
                if let Some(method) = self.method_facts(
                    tree,
                    member,
                    owner_is_interface,
                    class_annotations,
                    diagnostics,
                ) {
                    methods.push(method);
                }
            }
        }
        methods
    }

    fn extract_annotations(&self, tree: &SyntaxTree, node: Node<'_>) -> Vec<AnnotationFact> {
        let Some(modifiers) = self.child_of_kind(node, "modifiers") else {
            return Vec::new();
        };
        let mut cursor = modifiers.walk();
        modifiers
            .named_children(&mut cursor)
            .filter(|child| matches!(child.kind(), "annotation" | "marker_annotation"))
            .filter_map(|child| {
                let name = child.child_by_field_name("name")?;
                Some(AnnotationFact {
                    name: tree.text(name).to_string(),
                    text: normalize_whitespace(tree.text(child)),
                })
            })
            .collect()
    }

    fn extract_endpoints(
        &self,
        method_annotations: &[AnnotationFact],
        class_annotations: &[AnnotationFact],
        params: &[ParamFact],
    ) -> Vec<RestEndpoint> {
        endpoints::extract_endpoints(method_annotations, class_annotations, params)
    }

    fn resolve_supertype_heuristics(&self, written: &str) -> String {
        // Drop type annotations (`@NonNull Base`)
        let mut rest = written.trim();
        while let Some(stripped) = rest.strip_prefix('@') {
            let end = stripped
                .find(char::is_whitespace)
                .unwrap_or(stripped.len());
            rest = stripped[end..].trim_start();
        }
        let base = rest.split('<').next().unwrap_or(rest);
        let base = base.trim_end_matches("[]");
        base.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn is_builtin_type(&self, simple_name: &str) -> bool {
        is_builtin_type(simple_name)
    }

    fn is_builtin_package(&self, qualified_name: &str) -> bool {
        is_builtin_package(qualified_name)
    }

    fn classify_method(&self, method: &MethodFacts) -> MethodType {
        if method.is_constructor {
            return MethodType::Constructor;
        }
        if !method.endpoints.is_empty() {
            return MethodType::Endpoint;
        }
        if method
            .annotations
            .iter()
            .any(|a| CONFIG_ANNOTATIONS.contains(&a.simple_name()))
        {
            return MethodType::Configuration;
        }
        if method.has_annotation("Override") {
            return MethodType::Override;
        }

        let name = method.name.as_str();
        let returns = method.return_type.as_deref().unwrap_or("void");
        let upper_after = |prefix: &str| {
            name.strip_prefix(prefix)
                .and_then(|rest| rest.chars().next())
                .is_some_and(char::is_uppercase)
        };
        if upper_after("get") && method.params.is_empty() && returns != "void" {
            return MethodType::Getter;
        }
        if upper_after("is") && method.params.is_empty() && matches!(returns, "boolean" | "Boolean")
        {
            return MethodType::Getter;
        }
        if upper_after("set") && method.params.len() == 1 {
            return MethodType::Setter;
        }
        if method.is_static {
            return MethodType::Static;
        }
        MethodType::Regular
    }
}
