//! Per-class resolution scratch state

use crate::parsing::{ClassFacts, FileHeader, ImportDecl};
use std::collections::{HashMap, HashSet};

/// Everything needed to resolve names written inside one type declaration.
///
/// Built fresh for each class and never shared across files.
#[derive(Debug, Clone, Default)]
pub struct ClassParsingContext {
    pub package: String,
    pub class_name: String,
    pub fqn: String,
    /// Simple name -> qualified name from `import a.b.C;`
    pub single_imports: HashMap<String, String>,
    /// Packages (or outer types) from `import a.b.*;`
    pub wildcard_imports: Vec<String>,
    pub static_imports: Vec<ImportDecl>,
    /// Names of methods declared directly in the class
    pub method_names: HashSet<String>,
    /// Field name -> declared type as written
    pub field_types: HashMap<String, String>,
    /// Simple names of directly nested types
    pub nested_types: Vec<String>,
    /// Qualified names of this type and its enclosing types, innermost first
    pub scopes: Vec<String>,
}

impl ClassParsingContext {
    pub fn new(header: &FileHeader, class: &ClassFacts) -> Self {
        let mut single_imports = HashMap::new();
        let mut wildcard_imports = Vec::new();
        let mut static_imports = Vec::new();

        for import in &header.imports {
            match (import.is_static, import.is_wildcard) {
                (true, _) => static_imports.push(import.clone()),
                (false, true) => wildcard_imports.push(import.path.clone()),
                (false, false) => {
                    // First import of a simple name wins, like javac's duplicate check
                    single_imports
                        .entry(import.simple_name().to_string())
                        .or_insert_with(|| import.path.clone());
                }
            }
        }

        let mut scopes = vec![class.fqn.clone()];
        if class.is_nested() {
            let mut current = class.fqn.as_str();
            while let Some((outer, _)) = current.rsplit_once('.') {
                if outer.is_empty() || outer == header.package {
                    break;
                }
                scopes.push(outer.to_string());
                current = outer;
            }
        }

        Self {
            package: header.package.clone(),
            class_name: class.name.clone(),
            fqn: class.fqn.clone(),
            single_imports,
            wildcard_imports,
            static_imports,
            method_names: class.methods.iter().map(|m| m.name.clone()).collect(),
            field_types: class
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.type_name.clone()))
                .collect(),
            nested_types: class.nested_types.clone(),
            scopes,
        }
    }

    pub fn declares_method(&self, name: &str) -> bool {
        self.method_names.contains(name)
    }

    pub fn field_type(&self, name: &str) -> Option<&str> {
        self.field_types.get(name).map(String::as_str)
    }

    pub fn import_for(&self, simple_name: &str) -> Option<&str> {
        self.single_imports.get(simple_name).map(String::as_str)
    }

    /// Qualify `simple_name` in the current package
    pub fn in_package(&self, simple_name: &str) -> String {
        if self.package.is_empty() {
            simple_name.to_string()
        } else {
            format!("{}.{simple_name}", self.package)
        }
    }

    /// Owning types that may supply a statically imported member.
    ///
    /// `import static a.B.m;` yields `a.B` for `m`; `import static a.B.*;`
    /// yields `a.B` for any name.
    pub fn static_import_owners(&self, member: &str) -> Vec<&str> {
        self.static_imports
            .iter()
            .filter_map(|import| {
                if import.is_wildcard {
                    Some(import.path.as_str())
                } else if import.simple_name() == member {
                    import.path.rsplit_once('.').map(|(owner, _)| owner)
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{JavaExtractor, Language, LanguageExtractor, SyntaxParser};

    fn context_for(src: &str, fqn: &str) -> ClassParsingContext {
        let tree = SyntaxParser::new(Language::Java)
            .unwrap()
            .parse_str(src)
            .unwrap();
        let facts = JavaExtractor.extract_file(&tree);
        let class = facts.classes.iter().find(|c| c.fqn == fqn).unwrap();
        ClassParsingContext::new(&facts.header, class)
    }

    #[test]
    fn imports_are_split_by_kind() {
        let ctx = context_for(
            "package app;\n\
             import java.util.List;\n\
             import com.acme.model.*;\n\
             import static com.acme.util.Checks.notNull;\n\
             import static com.acme.util.Strings.*;\n\
             class Service { private Repo repo; void run() {} }\n",
            "app.Service",
        );
        assert_eq!(ctx.import_for("List"), Some("java.util.List"));
        assert_eq!(ctx.wildcard_imports, vec!["com.acme.model"]);
        assert_eq!(
            ctx.static_import_owners("notNull"),
            vec!["com.acme.util.Checks", "com.acme.util.Strings"]
        );
        assert_eq!(ctx.static_import_owners("other"), vec!["com.acme.util.Strings"]);
        assert!(ctx.declares_method("run"));
        assert_eq!(ctx.field_type("repo"), Some("Repo"));
        assert_eq!(ctx.in_package("Repo"), "app.Repo");
    }

    #[test]
    fn nested_scopes_run_innermost_first() {
        let ctx = context_for(
            "package p;\nclass Outer { static class Mid { class Inner {} } }\n",
            "p.Outer.Mid.Inner",
        );
        assert_eq!(ctx.scopes, vec!["p.Outer.Mid.Inner", "p.Outer.Mid", "p.Outer"]);

        let top = context_for("package p;\nclass Outer {}\n", "p.Outer");
        assert_eq!(top.scopes, vec!["p.Outer"]);
    }
}
