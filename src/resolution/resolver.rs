//! Relationship resolution over extracted facts.
//!
//! Combines the source index, the per-class context and (when a session is
//! open) semantic answers. Semantic answers win over syntactic lookups.
//! Nothing is ever dropped: a name that cannot be tied to a declaration is
//! kept as written and marked unresolved or incomplete.

use super::context::ClassParsingContext;
use crate::indexing::{SourceIndex, SourceIndexEntry};
use crate::parsing::{CallFact, ClassFacts, FileHeader, LanguageExtractor, MethodFacts, TypeRef};
use crate::semantic::{FileSession, Location, TypeHierarchy};
use crate::types::{Diagnostic, InheritanceStatus, Position, Range, ResolvedKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use tracing::debug;

/// Supertype chains deeper than this are not followed
const MAX_ANCESTOR_DEPTH: usize = 8;

/// Outcome of resolving a type name written in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeResolution {
    /// Primitive or platform type; never produces an edge
    Builtin,
    Local(String),
    External(String),
    /// Several project types could supply the name, in discovery order
    Ambiguous(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCallRecord {
    pub name: String,
    pub resolved_kind: ResolvedKind,
    /// Syntactic answer when a semantic answer replaced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl MethodCallRecord {
    fn new(name: impl Into<String>, resolved_kind: ResolvedKind) -> Self {
        Self {
            name: name.into(),
            resolved_kind,
            display_name: None,
        }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Self::new(name, ResolvedKind::Local)
    }

    pub fn external(name: impl Into<String>) -> Self {
        Self::new(name, ResolvedKind::External)
    }

    pub fn unresolved(literal: impl Into<String>) -> Self {
        Self::new(literal, ResolvedKind::Unresolved)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMethod {
    pub calls: Vec<MethodCallRecord>,
    pub used_types: Vec<String>,
    pub field_access: Vec<String>,
    /// Supertype methods this method overrides
    pub inheritance_info: Vec<String>,
    /// Known implementations of an abstract method
    pub implemented_by: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedClass {
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub used_types: Vec<String>,
    /// Same order as the class's methods
    pub methods: Vec<ResolvedMethod>,
    pub inheritance_status: InheritanceStatus,
    pub diagnostics: Vec<Diagnostic>,
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && !text.starts_with(|c: char| c.is_ascii_digit())
}

fn starts_uppercase(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Resolves the classes of one file
pub struct RelationshipResolver<'a> {
    index: &'a SourceIndex,
    extractor: &'a dyn LanguageExtractor,
    path: &'a Path,
    /// On-disk text, for protocol positions
    original: &'a str,
    header: &'a FileHeader,
    session: Option<&'a mut FileSession>,
    /// Semantic answers were expected but are unavailable
    degraded: bool,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(
        index: &'a SourceIndex,
        extractor: &'a dyn LanguageExtractor,
        path: &'a Path,
        original: &'a str,
        header: &'a FileHeader,
    ) -> Self {
        Self {
            index,
            extractor,
            path,
            original,
            header,
            session: None,
            degraded: false,
        }
    }

    /// Use an open session for semantic queries
    pub fn with_session(mut self, session: &'a mut FileSession) -> Self {
        self.session = Some(session);
        self
    }

    /// The session could not be opened; classes with supertypes are
    /// flagged incomplete
    pub fn degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn session_open(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_open())
    }

    fn position(&self, range: Range) -> Position {
        Position::from_byte_column(self.original, range.start_line, range.start_column)
    }

    fn query_failed(
        &mut self,
        operation: &str,
        error: &dyn std::fmt::Display,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        self.degraded = true;
        diagnostics.push(
            Diagnostic::warning(
                "SEMANTIC_QUERY_FAILED",
                format!("{operation} failed: {error}; continuing without semantic answers"),
            )
            .with_path(self.path),
        );
    }

    /// Resolve a type name as written inside the class described by `ctx`
    pub fn resolve_type_name(&self, ctx: &ClassParsingContext, written: &str) -> TypeResolution {
        let name = self.extractor.resolve_supertype_heuristics(written);
        if name.is_empty() {
            return TypeResolution::Builtin;
        }

        if let Some((head, rest)) = name.split_once('.') {
            if self.index.contains(&name) {
                return TypeResolution::Local(name);
            }
            // `Outer.Inner` through a resolvable outer type
            if starts_uppercase(head) {
                match self.resolve_simple(ctx, head) {
                    TypeResolution::Local(outer) => {
                        let candidate = format!("{outer}.{rest}");
                        if self.index.contains(&candidate) {
                            return TypeResolution::Local(candidate);
                        }
                        return TypeResolution::External(candidate);
                    }
                    TypeResolution::External(outer) => {
                        return TypeResolution::External(format!("{outer}.{rest}"));
                    }
                    _ => {}
                }
            }
            return TypeResolution::External(name);
        }

        self.resolve_simple(ctx, &name)
    }

    fn resolve_simple(&self, ctx: &ClassParsingContext, simple: &str) -> TypeResolution {
        // The class itself, its nested types and enclosing scopes
        for scope in &ctx.scopes {
            if simple_name(scope) == simple {
                return TypeResolution::Local(scope.clone());
            }
            let nested = format!("{scope}.{simple}");
            if self.index.contains(&nested) {
                return TypeResolution::Local(nested);
            }
        }

        if let Some(qualified) = ctx.import_for(simple) {
            return if self.index.contains(qualified) {
                TypeResolution::Local(qualified.to_string())
            } else {
                TypeResolution::External(qualified.to_string())
            };
        }

        let same_package = ctx.in_package(simple);
        if self.index.contains(&same_package) {
            return TypeResolution::Local(same_package);
        }

        let from_wildcards: Vec<String> = ctx
            .wildcard_imports
            .iter()
            .map(|pkg| format!("{pkg}.{simple}"))
            .filter(|candidate| self.index.contains(candidate))
            .collect();
        match from_wildcards.len() {
            0 => {}
            1 => return TypeResolution::Local(from_wildcards[0].clone()),
            _ => return TypeResolution::Ambiguous(from_wildcards),
        }

        // Same-package and imported project types shadow platform names.
        // A platform name is never supplied by an unimported project class.
        if self.extractor.is_builtin_type(simple) {
            return TypeResolution::Builtin;
        }

        let candidates = self.index.by_simple_name(simple);
        match candidates.len() {
            0 => TypeResolution::External(simple.to_string()),
            // An unmatched wildcard import could still supply the name
            1 if ctx.wildcard_imports.is_empty() => TypeResolution::Local(candidates[0].clone()),
            _ => TypeResolution::Ambiguous(candidates.to_vec()),
        }
    }

    /// Resolve a supertype written in an indexed declaration, using that
    /// declaration's own file context
    fn resolve_in_entry(&self, entry: &SourceIndexEntry, written: &str) -> Option<String> {
        let name = self.extractor.resolve_supertype_heuristics(written);
        if self.index.contains(&name) {
            return Some(name);
        }
        let simple = simple_name(&name);

        let mut scope = Some(entry.fqn.as_str());
        while let Some(current) = scope {
            let nested = format!("{current}.{simple}");
            if self.index.contains(&nested) {
                return Some(nested);
            }
            scope = self
                .index
                .get(current)
                .and_then(|e| e.parent_fqn.as_deref());
        }

        if let Some(file) = self.index.file(&entry.path) {
            for import in file.imports.iter().filter(|i| !i.is_static) {
                let candidate = if import.is_wildcard {
                    format!("{}.{simple}", import.path)
                } else if import.simple_name() == simple {
                    import.path.clone()
                } else {
                    continue;
                };
                if self.index.contains(&candidate) {
                    return Some(candidate);
                }
            }
        }

        if !entry.package.is_empty() {
            let same_package = format!("{}.{simple}", entry.package);
            if self.index.contains(&same_package) {
                return Some(same_package);
            }
        }

        match self.index.by_simple_name(simple) {
            [only] => Some(only.clone()),
            _ => None,
        }
    }

    /// Breadth-first walk of local supertypes, starting types included
    fn ancestors_from(&self, start: Vec<String>) -> Vec<&'a SourceIndexEntry> {
        let index: &'a SourceIndex = self.index;
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = start.into_iter().map(|f| (f, 0)).collect();

        while let Some((fqn, depth)) = queue.pop_front() {
            if !seen.insert(fqn.clone()) {
                continue;
            }
            let Some(entry) = index.get(&fqn) else {
                continue;
            };
            out.push(entry);
            if depth >= MAX_ANCESTOR_DEPTH {
                continue;
            }
            for written in entry.supertypes() {
                if let Some(parent) = self.resolve_in_entry(entry, written) {
                    queue.push_back((parent, depth + 1));
                }
            }
        }
        out
    }

    fn local_ancestors(&self, ctx: &ClassParsingContext, class: &ClassFacts) -> Vec<&'a SourceIndexEntry> {
        let start = class
            .supertypes()
            .filter_map(|r| match self.resolve_type_name(ctx, &r.name) {
                TypeResolution::Local(fqn) => Some(fqn),
                TypeResolution::Ambiguous(candidates) => candidates.into_iter().next(),
                _ => None,
            })
            .collect();
        self.ancestors_from(start)
    }

    /// Type (starting at `fqn`, then its local supertypes) declaring `method`
    fn declaring_type(&self, fqn: &str, method: &str) -> Option<&'a SourceIndexEntry> {
        self.ancestors_from(vec![fqn.to_string()])
            .into_iter()
            .find(|entry| entry.declares_method(method))
    }

    /// First supertype in the chain of `fqn` that is not in the index
    fn external_supertype_of(&self, fqn: &str) -> Option<String> {
        for entry in self.ancestors_from(vec![fqn.to_string()]) {
            for written in entry.supertypes() {
                if self.resolve_in_entry(entry, written).is_some() {
                    continue;
                }
                let name = self.extractor.resolve_supertype_heuristics(written);
                let qualified = self
                    .index
                    .file(&entry.path)
                    .and_then(|file| {
                        file.imports
                            .iter()
                            .find(|i| !i.is_static && !i.is_wildcard && i.simple_name() == name)
                    })
                    .map(|i| i.path.clone());
                return Some(qualified.unwrap_or(name));
            }
        }
        None
    }

    /// Method declaration containing a semantic location, as `<fqn>.<name>`
    fn location_target(&self, location: &Location, fallback_name: &str) -> Option<String> {
        let (entry, member) = self.index.member_at(&location.path, location.start.line)?;
        let name = member.map_or(fallback_name, |m| m.name.as_str());
        Some(format!("{}.{name}", entry.fqn))
    }

    /// Match a supertype against the class's semantic hierarchy, querying it
    /// at most once per class
    async fn hierarchy_match(
        &mut self,
        class: &ClassFacts,
        written: &str,
        cache: &mut Option<Option<TypeHierarchy>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<String> {
        if cache.is_none() {
            if !self.session_open() {
                return None;
            }
            let position = self.position(class.name_range);
            let answer = match self.session.as_deref_mut() {
                Some(session) => session.type_hierarchy(&class.name, position).await,
                None => Ok(None),
            };
            let hierarchy = match answer {
                Ok(hierarchy) => hierarchy,
                Err(e) => {
                    self.query_failed("type hierarchy", &e, diagnostics);
                    None
                }
            };
            *cache = Some(hierarchy);
        }

        let wanted = simple_name(written);
        cache
            .as_ref()
            .and_then(Option::as_ref)
            .and_then(|h| h.all().find(|q| simple_name(q) == wanted))
            .map(str::to_string)
    }

    async fn resolve_supertype(
        &mut self,
        ctx: &ClassParsingContext,
        class: &ClassFacts,
        supertype: &TypeRef,
        cache: &mut Option<Option<TypeHierarchy>>,
        incomplete: &mut bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let outside = match self.resolve_type_name(ctx, &supertype.name) {
            TypeResolution::Local(fqn) => return fqn,
            TypeResolution::Builtin => supertype.name.clone(),
            TypeResolution::External(qualified) => qualified,
            TypeResolution::Ambiguous(candidates) => {
                return self
                    .ambiguous_supertype(class, supertype, candidates, cache, incomplete, diagnostics)
                    .await;
            }
        };

        // Anything outside the index is kept and its inheritance left unknown
        let target = self
            .hierarchy_match(class, &supertype.name, cache, diagnostics)
            .await
            .unwrap_or(outside);
        if self.index.contains(&target) {
            return target;
        }
        debug!("{}: supertype {target} not in index", class.fqn);
        *incomplete = true;
        target
    }

    async fn ambiguous_supertype(
        &mut self,
        class: &ClassFacts,
        supertype: &TypeRef,
        candidates: Vec<String>,
        cache: &mut Option<Option<TypeHierarchy>>,
        incomplete: &mut bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        if let Some(found) = self
            .hierarchy_match(class, &supertype.name, cache, diagnostics)
            .await
            .filter(|found| self.index.contains(found))
        {
            return found;
        }
        *incomplete = true;
        let chosen = candidates[0].clone();
        diagnostics.push(
            Diagnostic::info(
                "AMBIGUOUS_SUPERTYPE",
                format!(
                    "{} in {} matches {}; using {chosen}",
                    supertype.name,
                    class.fqn,
                    candidates.join(", ")
                ),
            )
            .with_path(self.path)
            .at_line(supertype.range.start_line),
        );
        chosen
    }

    /// Best static type for a receiver expression
    fn receiver_type(&self, ctx: &ClassParsingContext, method: &MethodFacts, receiver: &str) -> Option<String> {
        if is_identifier(receiver) {
            if let Some(declared) = method.variable_type(receiver) {
                return Some(declared.to_string());
            }
            if let Some(declared) = ctx.field_type(receiver) {
                return Some(declared.to_string());
            }
            return starts_uppercase(receiver).then(|| receiver.to_string());
        }

        if let Some(created) = receiver.strip_prefix("new ") {
            let end = created.find(['(', '<', '{']).unwrap_or(created.len());
            let type_name = created[..end].trim();
            return (!type_name.is_empty()).then(|| type_name.to_string());
        }

        // Qualified type name such as `Outer.Inner` or `com.acme.Util`
        let segments: Vec<&str> = receiver.split('.').collect();
        if segments.len() > 1
            && segments.iter().all(|s| is_identifier(s))
            && segments.last().is_some_and(|s| starts_uppercase(s))
        {
            return Some(receiver.to_string());
        }
        None
    }

    /// Syntactic answer for a call, plus whether it targets the class itself
    fn resolve_call_syntactic(
        &self,
        ctx: &ClassParsingContext,
        ancestors: &[&SourceIndexEntry],
        extends: Option<&str>,
        method: &MethodFacts,
        call: &CallFact,
    ) -> (MethodCallRecord, bool) {
        let name = call.name.as_str();

        if call.targets_self() {
            let via_super = call.receiver.as_deref() == Some("super");
            if !via_super && ctx.declares_method(name) {
                return (MethodCallRecord::local(format!("{}.{name}", ctx.fqn)), true);
            }
            if let Some(owner) = ancestors.iter().find(|e| e.declares_method(name)) {
                return (MethodCallRecord::local(format!("{}.{name}", owner.fqn)), false);
            }
            if !via_super {
                for scope in ctx.scopes.iter().skip(1) {
                    if self.index.get(scope).is_some_and(|e| e.declares_method(name)) {
                        return (MethodCallRecord::local(format!("{scope}.{name}")), false);
                    }
                }
                let owners = ctx.static_import_owners(name);
                if let Some(owner) = owners
                    .iter()
                    .find(|o| self.index.get(o).is_some_and(|e| e.declares_method(name)))
                {
                    return (MethodCallRecord::local(format!("{owner}.{name}")), false);
                }
                if let Some(import) = ctx
                    .static_imports
                    .iter()
                    .find(|i| !i.is_wildcard && i.simple_name() == name)
                {
                    return (MethodCallRecord::external(import.path.clone()), false);
                }
            }
            // Inherited from a supertype outside the project
            let external = extends
                .filter(|sup| !self.index.contains(sup))
                .map(str::to_string)
                .or_else(|| {
                    ancestors
                        .iter()
                        .find_map(|anc| self.external_supertype_of(&anc.fqn))
                });
            if let Some(owner) = external {
                return (MethodCallRecord::external(format!("{owner}.{name}")), false);
            }
            return (MethodCallRecord::unresolved(call.literal()), false);
        }

        let receiver = call.receiver.as_deref().unwrap_or_default();
        let receiver = receiver.strip_prefix("this.").unwrap_or(receiver);
        let Some(type_name) = self.receiver_type(ctx, method, receiver) else {
            return (MethodCallRecord::unresolved(call.literal()), false);
        };

        let record = match self.resolve_type_name(ctx, &type_name) {
            TypeResolution::Local(fqn) => match self.declaring_type(&fqn, name) {
                Some(owner) => MethodCallRecord::local(format!("{}.{name}", owner.fqn)),
                None => match self.external_supertype_of(&fqn) {
                    Some(owner) => MethodCallRecord::external(format!("{owner}.{name}")),
                    None => MethodCallRecord::unresolved(call.literal()),
                },
            },
            TypeResolution::External(qualified) => {
                MethodCallRecord::external(format!("{qualified}.{name}"))
            }
            TypeResolution::Builtin => {
                let base = self.extractor.resolve_supertype_heuristics(&type_name);
                MethodCallRecord::external(format!("{base}.{name}"))
            }
            TypeResolution::Ambiguous(candidates) => candidates
                .iter()
                .find_map(|fqn| self.declaring_type(fqn, name))
                .map(|owner| MethodCallRecord::local(format!("{}.{name}", owner.fqn)))
                .unwrap_or_else(|| MethodCallRecord::unresolved(call.literal())),
        };
        (record, false)
    }

    async fn resolve_call(
        &mut self,
        ctx: &ClassParsingContext,
        ancestors: &[&SourceIndexEntry],
        extends: Option<&str>,
        method: &MethodFacts,
        call: &CallFact,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> MethodCallRecord {
        let (syntactic, same_class) =
            self.resolve_call_syntactic(ctx, ancestors, extends, method, call);
        if same_class || !self.session_open() {
            return syntactic;
        }

        let position = self.position(call.name_range);
        let answer = match self.session.as_deref_mut() {
            Some(session) => session.definition(position).await,
            None => Ok(None),
        };
        match answer {
            Ok(Some(location)) => match self.location_target(&location, &call.name) {
                Some(target) if target != syntactic.name => MethodCallRecord {
                    name: target,
                    resolved_kind: ResolvedKind::Local,
                    display_name: Some(syntactic.name),
                },
                Some(_) => syntactic,
                None => syntactic,
            },
            Ok(None) => syntactic,
            Err(e) => {
                self.query_failed("definition", &e, diagnostics);
                syntactic
            }
        }
    }

    fn method_used_types(&self, ctx: &ClassParsingContext, method: &MethodFacts) -> Vec<String> {
        let mut used = Vec::new();
        for type_ref in &method.type_refs {
            match self.resolve_type_name(ctx, &type_ref.name) {
                TypeResolution::Local(fqn) => {
                    if fqn != ctx.fqn {
                        push_unique(&mut used, fqn);
                    }
                }
                TypeResolution::Ambiguous(candidates) => {
                    if let Some(first) = candidates.into_iter().next() {
                        push_unique(&mut used, first);
                    }
                }
                TypeResolution::External(qualified) => {
                    let in_public_signature =
                        method.is_public && method.signature_types.contains(&type_ref.name);
                    if in_public_signature && !self.extractor.is_builtin_package(&qualified) {
                        push_unique(&mut used, qualified);
                    }
                }
                TypeResolution::Builtin => {}
            }
        }
        used
    }

    async fn resolve_method(
        &mut self,
        ctx: &ClassParsingContext,
        ancestors: &[&SourceIndexEntry],
        supertypes: &[String],
        method: &MethodFacts,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ResolvedMethod {
        let extends = supertypes.first().map(String::as_str);
        let mut calls = Vec::with_capacity(method.calls.len());
        for call in &method.calls {
            calls.push(
                self.resolve_call(ctx, ancestors, extends, method, call, diagnostics)
                    .await,
            );
        }

        let mut inheritance_info = Vec::new();
        if !method.is_constructor && !method.is_static {
            for ancestor in ancestors {
                if ancestor.declares_method(&method.name) {
                    push_unique(&mut inheritance_info, format!("{}.{}", ancestor.fqn, method.name));
                }
            }
            if inheritance_info.is_empty() && method.has_annotation("Override") {
                for supertype in supertypes.iter().filter(|s| !self.index.contains(s)) {
                    push_unique(&mut inheritance_info, format!("{supertype}.{}", method.name));
                }
            }
        }

        let mut implemented_by = Vec::new();
        if method.is_abstract && self.session_open() {
            let position = self.position(method.name_range);
            let answer = match self.session.as_deref_mut() {
                Some(session) => session.implementations(position).await,
                None => Ok(Vec::new()),
            };
            match answer {
                Ok(locations) => {
                    let own = format!("{}.{}", ctx.fqn, method.name);
                    for location in &locations {
                        if let Some(target) = self.location_target(location, &method.name) {
                            if target != own {
                                push_unique(&mut implemented_by, target);
                            }
                        }
                    }
                }
                Err(e) => self.query_failed("implementations", &e, diagnostics),
            }
        }

        ResolvedMethod {
            calls,
            used_types: self.method_used_types(ctx, method),
            field_access: method.field_accesses.clone(),
            inheritance_info,
            implemented_by,
        }
    }

    /// Resolve one class of the file
    pub async fn resolve_class(&mut self, class: &ClassFacts) -> ResolvedClass {
        let ctx = ClassParsingContext::new(self.header, class);
        let mut diagnostics = Vec::new();
        let mut incomplete = false;
        let mut hierarchy = None;

        let extends = match &class.extends {
            Some(supertype) => Some(
                self.resolve_supertype(
                    &ctx,
                    class,
                    supertype,
                    &mut hierarchy,
                    &mut incomplete,
                    &mut diagnostics,
                )
                .await,
            ),
            None => None,
        };
        let mut implements = Vec::with_capacity(class.implements.len());
        for supertype in &class.implements {
            let resolved = self
                .resolve_supertype(
                    &ctx,
                    class,
                    supertype,
                    &mut hierarchy,
                    &mut incomplete,
                    &mut diagnostics,
                )
                .await;
            implements.push(resolved);
        }

        let ancestors = self.local_ancestors(&ctx, class);
        let supertypes: Vec<String> = extends.iter().chain(implements.iter()).cloned().collect();

        let mut methods = Vec::with_capacity(class.methods.len());
        for method in &class.methods {
            methods.push(
                self.resolve_method(&ctx, &ancestors, &supertypes, method, &mut diagnostics)
                    .await,
            );
        }

        let mut used_types = Vec::new();
        for supertype in &supertypes {
            let interesting = self.index.contains(supertype)
                || !(self.extractor.is_builtin_package(supertype)
                    || self.extractor.is_builtin_type(supertype));
            if interesting {
                push_unique(&mut used_types, supertype.clone());
            }
        }
        for type_ref in &class.field_type_refs {
            match self.resolve_type_name(&ctx, &type_ref.name) {
                TypeResolution::Local(fqn) if fqn != ctx.fqn => push_unique(&mut used_types, fqn),
                TypeResolution::Ambiguous(candidates) => {
                    if let Some(first) = candidates.into_iter().next() {
                        push_unique(&mut used_types, first);
                    }
                }
                TypeResolution::External(qualified) => {
                    let public_field = class
                        .fields
                        .iter()
                        .any(|f| f.is_public && f.type_name.contains(type_ref.name.as_str()));
                    if public_field && !self.extractor.is_builtin_package(&qualified) {
                        push_unique(&mut used_types, qualified);
                    }
                }
                _ => {}
            }
        }
        for method in &methods {
            for used in &method.used_types {
                push_unique(&mut used_types, used.clone());
            }
        }

        if self.degraded && class.supertypes().next().is_some() {
            incomplete = true;
        }

        ResolvedClass {
            extends,
            implements,
            used_types,
            methods,
            inheritance_status: if incomplete {
                InheritanceStatus::Incomplete
            } else {
                InheritanceStatus::Complete
            },
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::indexing::SourceIndexBuilder;
    use crate::parsing::{JavaExtractor, Language, SyntaxParser};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Project {
        dir: TempDir,
        index: SourceIndex,
    }

    fn project(files: &[(&str, &str)]) -> Project {
        let dir = TempDir::new().unwrap();
        for (rel, src) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, src).unwrap();
        }
        let index = SourceIndexBuilder::new(Arc::new(Settings::default()))
            .build(dir.path())
            .unwrap();
        Project { dir, index }
    }

    async fn resolve_with(
        project: &Project,
        rel: &str,
        fqn: &str,
        degraded: bool,
    ) -> ResolvedClass {
        let path = project.dir.path().join(rel);
        let src = fs::read_to_string(&path).unwrap();
        let tree = SyntaxParser::new(Language::Java)
            .unwrap()
            .parse_str(&src)
            .unwrap();
        let facts = JavaExtractor.extract_file(&tree);
        let class = facts.classes.iter().find(|c| c.fqn == fqn).unwrap();
        let mut resolver =
            RelationshipResolver::new(&project.index, &JavaExtractor, &path, &src, &facts.header);
        if degraded {
            resolver = resolver.degraded();
        }
        resolver.resolve_class(class).await
    }

    async fn resolve(project: &Project, rel: &str, fqn: &str) -> ResolvedClass {
        resolve_with(project, rel, fqn, false).await
    }

    fn call<'r>(method: &'r ResolvedMethod, name: &str) -> &'r MethodCallRecord {
        method
            .calls
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("no call {name} in {:?}", method.calls))
    }

    const SHAPE: &str = "package p;\npublic interface Shape { double area(); }\n";
    const CIRCLE: &str = "package p;\n\
        public class Circle implements Shape {\n\
            @Override public double area() { return helper(); }\n\
            private double helper() { return 1; }\n\
        }\n";

    #[tokio::test]
    async fn local_supertype_resolves_from_index() {
        let project = project(&[("Shape.java", SHAPE), ("Circle.java", CIRCLE)]);
        let resolved = resolve(&project, "Circle.java", "p.Circle").await;

        assert_eq!(resolved.implements, vec!["p.Shape"]);
        assert_eq!(resolved.extends, None);
        assert!(resolved.inheritance_status.is_complete());
        assert!(resolved.used_types.contains(&"p.Shape".to_string()));

        let area = &resolved.methods[0];
        assert_eq!(call(area, "p.Circle.helper").resolved_kind, ResolvedKind::Local);
        assert_eq!(area.inheritance_info, vec!["p.Shape.area"]);
        assert!(resolved.methods[1].inheritance_info.is_empty());
    }

    #[tokio::test]
    async fn missing_supertype_is_kept_and_flagged() {
        let project = project(&[(
            "Circle.java",
            "package p;\nimport com.vendor.Base;\npublic class Circle extends Base implements Runnable {\n\
             public void run() {}\n}\n",
        )]);
        let resolved = resolve(&project, "Circle.java", "p.Circle").await;

        assert_eq!(resolved.extends.as_deref(), Some("com.vendor.Base"));
        assert_eq!(resolved.implements, vec!["Runnable"]);
        assert_eq!(resolved.inheritance_status, InheritanceStatus::Incomplete);
        assert!(resolved.used_types.contains(&"com.vendor.Base".to_string()));
        assert!(!resolved.used_types.contains(&"Runnable".to_string()));
    }

    #[tokio::test]
    async fn platform_supertypes_are_flagged_incomplete() {
        let project = project(&[(
            "Names.java",
            "package p;\nimport java.util.AbstractList;\n\
             public class Names extends AbstractList<String> {\n\
             public String get(int i) { return null; }\n\
             public int size() { return 0; }\n}\n",
        )]);
        let resolved = resolve(&project, "Names.java", "p.Names").await;

        assert_eq!(resolved.extends.as_deref(), Some("java.util.AbstractList"));
        assert_eq!(resolved.inheritance_status, InheritanceStatus::Incomplete);
        assert!(resolved.used_types.is_empty());
    }

    #[tokio::test]
    async fn unimported_platform_name_is_flagged_incomplete() {
        let project = project(&[(
            "Worker.java",
            "package p;\npublic class Worker extends Thread {}\n",
        )]);
        let resolved = resolve(&project, "Worker.java", "p.Worker").await;

        assert_eq!(resolved.extends.as_deref(), Some("Thread"));
        assert_eq!(resolved.inheritance_status, InheritanceStatus::Incomplete);
    }

    #[tokio::test]
    async fn project_types_shadow_platform_names() {
        let project = project(&[
            ("p/Path.java", "package p;\npublic class Path { void go() {} }\n"),
            (
                "p/Router.java",
                "package p;\n\
                 public class Router extends Path {\n\
                     Path next;\n\
                     void route(Path p) { next.go(); }\n\
                 }\n",
            ),
            (
                "q/Stream.java",
                "package q;\npublic class Stream {}\n",
            ),
            (
                "r/Reader.java",
                "package r;\nimport q.*;\npublic class Reader { void read(Stream s) {} }\n",
            ),
        ]);

        let router = resolve(&project, "p/Router.java", "p.Router").await;
        assert_eq!(router.extends.as_deref(), Some("p.Path"));
        assert!(router.inheritance_status.is_complete());
        assert!(router.used_types.contains(&"p.Path".to_string()));
        let route = &router.methods[0];
        assert_eq!(call(route, "p.Path.go").resolved_kind, ResolvedKind::Local);
        assert!(route.used_types.contains(&"p.Path".to_string()));

        let reader = resolve(&project, "r/Reader.java", "r.Reader").await;
        assert!(reader.methods[0].used_types.contains(&"q.Stream".to_string()));
    }

    #[tokio::test]
    async fn ambiguous_supertype_uses_first_candidate() {
        let project = project(&[
            ("a/Base.java", "package a;\npublic class Base {}\n"),
            ("b/Base.java", "package b;\npublic class Base {}\n"),
            (
                "c/Child.java",
                "package c;\nimport a.*;\nimport b.*;\npublic class Child extends Base {}\n",
            ),
        ]);
        let resolved = resolve(&project, "c/Child.java", "c.Child").await;

        assert_eq!(resolved.extends.as_deref(), Some("a.Base"));
        assert_eq!(resolved.inheritance_status, InheritanceStatus::Incomplete);
        assert!(
            resolved
                .diagnostics
                .iter()
                .any(|d| d.code == "AMBIGUOUS_SUPERTYPE")
        );
    }

    #[tokio::test]
    async fn calls_resolve_through_receivers_and_ancestors() {
        let project = project(&[
            (
                "app/BaseService.java",
                "package app;\npublic abstract class BaseService { protected void audit() {} }\n",
            ),
            (
                "app/Order.java",
                "package app;\npublic class Order { public java.util.List<String> getItems() { return null; } }\n",
            ),
            (
                "app/OrderRepo.java",
                "package app;\npublic class OrderRepo { public void save(Order o) {} public void flush() {} }\n",
            ),
            (
                "app/Util.java",
                "package app;\npublic class Util { public static String format(Object o) { return \"\"; } }\n",
            ),
            (
                "app/OrderService.java",
                "package app;\n\
                 import java.util.List;\n\
                 import com.vendor.Mailer;\n\
                 public class OrderService extends BaseService {\n\
                     private OrderRepo repo;\n\
                     private Mailer mailer;\n\
                     public void place(Order order) {\n\
                         repo.save(order);\n\
                         this.repo.flush();\n\
                         mailer.send(order);\n\
                         audit();\n\
                         Util.format(order);\n\
                         OrderRepo other = new OrderRepo();\n\
                         other.save(order);\n\
                         order.getItems().size();\n\
                         List<String> names = List.of();\n\
                         names.add(\"x\");\n\
                     }\n\
                 }\n",
            ),
        ]);
        let resolved = resolve(&project, "app/OrderService.java", "app.OrderService").await;
        let place = &resolved.methods[0];

        assert_eq!(call(place, "app.OrderRepo.save").resolved_kind, ResolvedKind::Local);
        assert_eq!(call(place, "app.OrderRepo.flush").resolved_kind, ResolvedKind::Local);
        assert_eq!(call(place, "com.vendor.Mailer.send").resolved_kind, ResolvedKind::External);
        assert_eq!(call(place, "app.BaseService.audit").resolved_kind, ResolvedKind::Local);
        assert_eq!(call(place, "app.Util.format").resolved_kind, ResolvedKind::Local);
        assert_eq!(call(place, "app.Order.getItems").resolved_kind, ResolvedKind::Local);
        assert_eq!(call(place, "java.util.List.of").resolved_kind, ResolvedKind::External);
        assert_eq!(call(place, "java.util.List.add").resolved_kind, ResolvedKind::External);
        assert_eq!(
            call(place, "order.getItems().size").resolved_kind,
            ResolvedKind::Unresolved
        );
        assert_eq!(
            place
                .calls
                .iter()
                .filter(|c| c.name == "app.OrderRepo.save")
                .count(),
            2
        );

        assert!(place.used_types.contains(&"app.Order".to_string()));
        assert!(place.used_types.contains(&"app.OrderRepo".to_string()));
        assert!(!place.used_types.contains(&"java.util.List".to_string()));
        assert!(resolved.used_types.contains(&"app.BaseService".to_string()));
        assert!(!resolved.used_types.contains(&"com.vendor.Mailer".to_string()));
        assert!(!resolved.used_types.contains(&"app.OrderService".to_string()));
    }

    #[tokio::test]
    async fn unknown_callee_keeps_literal_text() {
        let project = project(&[(
            "Job.java",
            "package p;\npublic class Job { void run() { helper(); lookup().execute(); } }\n",
        )]);
        let resolved = resolve(&project, "Job.java", "p.Job").await;
        let run = &resolved.methods[0];

        assert_eq!(call(run, "helper").resolved_kind, ResolvedKind::Unresolved);
        assert_eq!(call(run, "lookup().execute").resolved_kind, ResolvedKind::Unresolved);
        assert_eq!(call(run, "lookup").resolved_kind, ResolvedKind::Unresolved);
    }

    #[tokio::test]
    async fn static_imports_supply_bare_calls() {
        let project = project(&[
            (
                "util/Checks.java",
                "package util;\npublic class Checks { public static void notNull(Object o) {} }\n",
            ),
            (
                "app/Job.java",
                "package app;\n\
                 import static util.Checks.notNull;\n\
                 import static org.junit.Assert.assertTrue;\n\
                 public class Job { void run(Object o) { notNull(o); assertTrue(true); } }\n",
            ),
        ]);
        let resolved = resolve(&project, "app/Job.java", "app.Job").await;
        let run = &resolved.methods[0];

        assert_eq!(call(run, "util.Checks.notNull").resolved_kind, ResolvedKind::Local);
        assert_eq!(
            call(run, "org.junit.Assert.assertTrue").resolved_kind,
            ResolvedKind::External
        );
    }

    #[tokio::test]
    async fn nested_types_resolve_inside_their_outer_type() {
        let project = project(&[(
            "Outer.java",
            "package p;\npublic class Outer {\n\
                 static class Node { void visit() {} }\n\
                 class Walker extends Node { void go(Node next) { next.visit(); outerHelp(); } }\n\
                 void outerHelp() {}\n\
             }\n",
        )]);
        let resolved = resolve(&project, "Outer.java", "p.Outer.Walker").await;

        assert_eq!(resolved.extends.as_deref(), Some("p.Outer.Node"));
        assert!(resolved.inheritance_status.is_complete());
        let go = &resolved.methods[0];
        assert_eq!(call(go, "p.Outer.Node.visit").resolved_kind, ResolvedKind::Local);
        assert_eq!(call(go, "p.Outer.outerHelp").resolved_kind, ResolvedKind::Local);
    }

    #[tokio::test]
    async fn degraded_files_flag_classes_with_supertypes() {
        let project = project(&[
            ("Shape.java", SHAPE),
            ("Circle.java", CIRCLE),
            ("Plain.java", "package p;\npublic class Plain { void f() {} }\n"),
        ]);

        let circle = resolve_with(&project, "Circle.java", "p.Circle", true).await;
        assert_eq!(circle.implements, vec!["p.Shape"]);
        assert_eq!(circle.inheritance_status, InheritanceStatus::Incomplete);

        let plain = resolve_with(&project, "Plain.java", "p.Plain", true).await;
        assert!(plain.inheritance_status.is_complete());
    }

    #[test]
    fn receiver_helpers() {
        assert!(is_identifier("repo"));
        assert!(!is_identifier("repo()"));
        assert!(!is_identifier("1abc"));
        assert!(starts_uppercase("Util"));
        assert_eq!(simple_name("a.b.C"), "C");
    }
}
