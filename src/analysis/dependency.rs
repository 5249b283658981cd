//! Static dependency fan-out.
//!
//! References are extracted from import/include/use declarations and resolved
//! against the scanned tree. Nothing is executed or dynamically imported.

use super::grammar::tree_sitter_language;
use crate::domain::{DependencyFanout, Language, SourceFile};
use crate::utils::{join_relative, parent_dir};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;
use tree_sitter::{Node, Parser};

const PYTHON_SUFFIXES: &[&str] = &[".py", "/__init__.py"];
const SCRIPT_SUFFIXES: &[&str] = &[
    "", ".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", "/index.ts", "/index.tsx", "/index.js",
    "/index.jsx",
];
const RUST_SUFFIXES: &[&str] = &[".rs", "/mod.rs"];
const JVM_SUFFIXES: &[&str] = &[".java", ".kt"];

/// Where a reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A file or package directory inside the scanned tree.
    InTree(String),
    /// A library reference outside the tree, keyed by package.
    External(String),
    /// A relative reference that matched nothing.
    Unresolved(String),
}

/// Lookup structure over every path in a scan.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl TreeIndex {
    pub fn new<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = Self::default();
        for path in paths {
            let mut dir = parent_dir(path);
            while !dir.is_empty() && index.dirs.insert(dir.to_string()) {
                dir = parent_dir(dir);
            }
            index.files.insert(path.to_string());
        }
        index
    }

    pub fn from_files(files: &[SourceFile]) -> Self {
        Self::new(files.iter().map(|f| f.path.as_str()))
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.contains(path)
    }

    /// Resolve `module` (slash-separated, no extension) to a file.
    ///
    /// Tries the root, then the importer's directory, then any file whose path
    /// ends with the module at a segment boundary.
    fn resolve_module(&self, importer_dir: &str, module: &str, suffixes: &[&str]) -> Option<String> {
        for suffix in suffixes {
            let candidate = format!("{}{}", module, suffix);
            if self.has_file(&candidate) {
                return Some(candidate);
            }
        }
        if !importer_dir.is_empty() {
            if let Some(base) = join_relative(importer_dir, module) {
                if let Some(found) = self.resolve_exact(&base, suffixes) {
                    return Some(found);
                }
            }
        }
        for suffix in suffixes {
            let tail = format!("/{}{}", module, suffix);
            if let Some(found) = self.files.iter().find(|f| f.ends_with(&tail)) {
                return Some(found.clone());
            }
        }
        None
    }

    fn resolve_exact(&self, base: &str, suffixes: &[&str]) -> Option<String> {
        suffixes
            .iter()
            .map(|suffix| format!("{}{}", base, suffix))
            .find(|candidate| !candidate.is_empty() && self.has_file(candidate))
    }

    /// Longest in-tree directory the import path ends with.
    fn resolve_dir_suffix(&self, import_path: &str) -> Option<String> {
        self.dirs
            .iter()
            .filter(|dir| import_path == dir.as_str() || import_path.ends_with(&format!("/{}", dir)))
            .max_by_key(|dir| dir.len())
            .cloned()
    }

    /// Shortest in-tree directory ending with `package_path`.
    fn resolve_package_dir(&self, package_path: &str) -> Option<String> {
        let tail = format!("/{}", package_path);
        self.dirs
            .iter()
            .filter(|dir| dir.as_str() == package_path || dir.ends_with(&tail))
            .min_by_key(|dir| dir.len())
            .cloned()
    }
}

/// Counts distinct in-tree and external references of a file.
pub struct FanoutAnalyzer<'a> {
    index: &'a TreeIndex,
}

impl<'a> FanoutAnalyzer<'a> {
    pub fn new(index: &'a TreeIndex) -> Self {
        Self { index }
    }

    pub fn analyze(&self, file: &SourceFile) -> DependencyFanout {
        let resolutions = match file.language {
            Language::Python => with_tree(file, |root, src| python_refs(self.index, file, root, src)),
            Language::JavaScript | Language::TypeScript | Language::Tsx => {
                with_tree(file, |root, src| script_refs(self.index, file, root, src))
            }
            Language::Rust => with_tree(file, |root, src| rust_refs(self.index, file, root, src)),
            Language::Go => with_tree(file, |root, src| go_refs(self.index, file, root, src)),
            Language::C | Language::Cpp => include_refs(self.index, file),
            Language::Java | Language::Kotlin => jvm_refs(self.index, file),
            Language::Ruby => ruby_refs(self.index, file),
            Language::Php => php_refs(self.index, file),
            Language::CSharp => external_only(&CSHARP_USING_RE, &file.content),
            Language::Swift => external_only(&SWIFT_IMPORT_RE, &file.content),
            _ => Vec::new(),
        };

        let own_dir = parent_dir(&file.path);
        let mut fanout = DependencyFanout::default();
        for resolution in resolutions {
            match resolution {
                Resolution::InTree(target) => {
                    if target != file.path && target != own_dir {
                        fanout.resolved.insert(target);
                    }
                }
                Resolution::External(name) => {
                    fanout.external.insert(name);
                }
                Resolution::Unresolved(reference) => {
                    debug!(path = %file.path, reference = %reference, "unresolved import ignored");
                    if !fanout.unresolved.contains(&reference) {
                        fanout.unresolved.push(reference);
                    }
                }
            }
        }
        fanout
    }
}

fn with_tree<F>(file: &SourceFile, extract: F) -> Vec<Resolution>
where
    F: FnOnce(Node, &[u8]) -> Vec<Resolution>,
{
    let Some(grammar) = tree_sitter_language(file.language) else {
        return Vec::new();
    };
    let mut parser = Parser::new();
    if parser.set_language(&grammar).is_err() {
        return Vec::new();
    }
    match parser.parse(&file.content, None) {
        Some(tree) => extract(tree.root_node(), file.content.as_bytes()),
        None => Vec::new(),
    }
}

fn descendants<'t>(root: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if kinds.contains(&node.kind()) {
            found.push(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    found
}

fn text<'s>(node: Node, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or("")
}

fn unquote(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

fn top_level(name: &str, separator: char) -> String {
    name.split(separator).find(|s| !s.is_empty()).unwrap_or(name).to_string()
}

// --- python ---

fn python_refs(index: &TreeIndex, file: &SourceFile, root: Node, src: &[u8]) -> Vec<Resolution> {
    let dir = parent_dir(&file.path);
    let mut out = Vec::new();
    for node in descendants(root, &["import_statement", "import_from_statement"]) {
        let names = imported_names(node, src);
        if node.kind() == "import_statement" {
            for module in names {
                out.push(resolve_python_absolute(index, dir, &module, &[]));
            }
            continue;
        }

        let Some(module_node) = node.child_by_field_name("module_name") else {
            continue;
        };
        if module_node.kind() == "relative_import" {
            out.push(resolve_python_relative(index, dir, module_node, src, &names));
        } else {
            out.push(resolve_python_absolute(index, dir, text(module_node, src), &names));
        }
    }
    out
}

fn imported_names(node: Node, src: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .map(|name| match name.kind() {
            "aliased_import" => name.child_by_field_name("name").map(|n| text(n, src)).unwrap_or(""),
            _ => text(name, src),
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn resolve_python_absolute(index: &TreeIndex, dir: &str, module: &str, names: &[String]) -> Resolution {
    let module_path = module.replace('.', "/");
    for name in names {
        let submodule = format!("{}/{}", module_path, name.replace('.', "/"));
        if let Some(found) = index.resolve_module(dir, &submodule, PYTHON_SUFFIXES) {
            return Resolution::InTree(found);
        }
    }
    match index.resolve_module(dir, &module_path, PYTHON_SUFFIXES) {
        Some(found) => Resolution::InTree(found),
        None => Resolution::External(top_level(module, '.')),
    }
}

fn resolve_python_relative(
    index: &TreeIndex,
    dir: &str,
    node: Node,
    src: &[u8],
    names: &[String],
) -> Resolution {
    let raw = text(node, src);
    let level = raw.chars().take_while(|&c| c == '.').count();
    let module = raw[level..].trim().replace('.', "/");

    let mut base = dir.to_string();
    for _ in 1..level {
        if base.is_empty() {
            return Resolution::Unresolved(raw.to_string());
        }
        base = parent_dir(&base).to_string();
    }
    let package = match (base.is_empty(), module.is_empty()) {
        (_, true) => base.clone(),
        (true, false) => module.clone(),
        (false, false) => format!("{}/{}", base, module),
    };

    for name in names {
        let candidate = if package.is_empty() { name.clone() } else { format!("{}/{}", package, name) };
        if let Some(found) = index.resolve_exact(&candidate, PYTHON_SUFFIXES) {
            return Resolution::InTree(found);
        }
    }
    let package_file = if package.is_empty() {
        index.resolve_exact("__init__", &[".py"])
    } else {
        index.resolve_exact(&package, PYTHON_SUFFIXES)
    };
    match package_file {
        Some(found) => Resolution::InTree(found),
        None => Resolution::Unresolved(raw.to_string()),
    }
}

// --- javascript / typescript ---

fn script_refs(index: &TreeIndex, file: &SourceFile, root: Node, src: &[u8]) -> Vec<Resolution> {
    let dir = parent_dir(&file.path);
    let mut specifiers = Vec::new();
    for node in descendants(root, &["import_statement", "export_statement", "call_expression"]) {
        if node.kind() == "call_expression" {
            let is_loader = node
                .child_by_field_name("function")
                .map(|f| f.kind() == "import" || text(f, src) == "require")
                .unwrap_or(false);
            let first_arg = node
                .child_by_field_name("arguments")
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "string");
            if let (true, Some(arg)) = (is_loader, first_arg) {
                specifiers.push(unquote(text(arg, src)).to_string());
            }
        } else if let Some(source) = node.child_by_field_name("source") {
            specifiers.push(unquote(text(source, src)).to_string());
        }
    }
    specifiers.into_iter().filter(|s| !s.is_empty()).map(|s| resolve_script(index, dir, s)).collect()
}

fn resolve_script(index: &TreeIndex, dir: &str, specifier: String) -> Resolution {
    if specifier.starts_with('.') || specifier.starts_with('/') {
        return match join_relative(dir, &specifier).and_then(|base| index.resolve_exact(&base, SCRIPT_SUFFIXES)) {
            Some(found) => Resolution::InTree(found),
            None => Resolution::Unresolved(specifier),
        };
    }
    let mut parts = specifier.split('/');
    let package = match (parts.next(), parts.next()) {
        (Some(scope), Some(name)) if scope.starts_with('@') => format!("{}/{}", scope, name),
        (Some(name), _) => name.to_string(),
        _ => specifier.clone(),
    };
    Resolution::External(package)
}

// --- rust ---

fn rust_refs(index: &TreeIndex, file: &SourceFile, root: Node, src: &[u8]) -> Vec<Resolution> {
    let module_dir = rust_module_dir(&file.path);
    let crate_root = rust_crate_root(&file.path);
    let mut out = Vec::new();
    for node in descendants(root, &["use_declaration", "mod_item", "extern_crate_declaration"]) {
        match node.kind() {
            "use_declaration" => {
                let Some(argument) = node.child_by_field_name("argument") else {
                    continue;
                };
                let mut paths = Vec::new();
                collect_use_paths(argument, src, &[], &mut paths);
                for path in paths {
                    out.push(resolve_rust_path(index, &module_dir, &crate_root, &path));
                }
            }
            "mod_item" if node.child_by_field_name("body").is_none() => {
                if let Some(name) = node.child_by_field_name("name") {
                    let module = join_module(&module_dir, text(name, src));
                    out.push(match index.resolve_exact(&module, RUST_SUFFIXES) {
                        Some(found) => Resolution::InTree(found),
                        None => Resolution::Unresolved(format!("mod {}", text(name, src))),
                    });
                }
            }
            "extern_crate_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    out.push(Resolution::External(text(name, src).to_string()));
                }
            }
            _ => {}
        }
    }
    out
}

fn path_segments(node: Node, src: &[u8]) -> Vec<String> {
    text(node, src)
        .split("::")
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "*")
        .map(str::to_string)
        .collect()
}

/// Expand a `use` tree into flat paths, e.g. `a::{b, c::d}` into `a::b`, `a::c::d`.
fn collect_use_paths(node: Node, src: &[u8], prefix: &[String], out: &mut Vec<Vec<String>>) {
    let mut push = |tail: Vec<String>| {
        let mut path = prefix.to_vec();
        path.extend(tail);
        if path.len() > 1 && path.last().map(String::as_str) == Some("self") {
            path.pop();
        }
        if !path.is_empty() {
            out.push(path);
        }
    };
    match node.kind() {
        "use_as_clause" => {
            if let Some(path) = node.child_by_field_name("path") {
                push(path_segments(path, src));
            }
        }
        "scoped_use_list" => {
            let mut nested = prefix.to_vec();
            if let Some(path) = node.child_by_field_name("path") {
                nested.extend(path_segments(path, src));
            }
            if let Some(list) = node.child_by_field_name("list") {
                collect_use_paths(list, src, &nested, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            let items: Vec<Node> = node.named_children(&mut cursor).collect();
            for item in items {
                collect_use_paths(item, src, prefix, out);
            }
        }
        _ => push(path_segments(node, src)),
    }
}

fn resolve_rust_path(index: &TreeIndex, module_dir: &str, crate_root: &str, path: &[String]) -> Resolution {
    let display = path.join("::");
    let (base, rest): (String, &[String]) = match path[0].as_str() {
        "crate" => (crate_root.to_string(), &path[1..]),
        "self" => (module_dir.to_string(), &path[1..]),
        "super" => {
            let supers = path.iter().take_while(|s| s.as_str() == "super").count();
            let mut base = module_dir.to_string();
            for _ in 0..supers {
                if base.is_empty() || base == crate_root {
                    return Resolution::Unresolved(display);
                }
                base = parent_dir(&base).to_string();
            }
            (base, &path[supers..])
        }
        first => {
            let child = join_module(module_dir, first);
            if index.resolve_exact(&child, RUST_SUFFIXES).is_none() {
                return Resolution::External(first.to_string());
            }
            (module_dir.to_string(), path)
        }
    };

    for len in (1..=rest.len()).rev() {
        let module = join_module(&base, &rest[..len].join("/"));
        if let Some(found) = index.resolve_exact(&module, RUST_SUFFIXES) {
            return Resolution::InTree(found);
        }
    }
    let root_files = ["lib.rs", "main.rs", "mod.rs"];
    match root_files.iter().map(|f| join_module(&base, f)).find(|f| index.has_file(f)) {
        Some(found) => Resolution::InTree(found),
        None => Resolution::Unresolved(display),
    }
}

/// Directory holding the children of the module defined by `path`.
fn rust_module_dir(path: &str) -> String {
    let dir = parent_dir(path);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file {
        "mod.rs" | "lib.rs" | "main.rs" => dir.to_string(),
        other => join_module(dir, other.trim_end_matches(".rs")),
    }
}

fn rust_crate_root(path: &str) -> String {
    let mut dir = parent_dir(path);
    while !dir.is_empty() {
        if dir == "src" || dir.ends_with("/src") {
            return dir.to_string();
        }
        dir = parent_dir(dir);
    }
    parent_dir(path).to_string()
}

fn join_module(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

// --- go ---

fn go_refs(index: &TreeIndex, file: &SourceFile, root: Node, src: &[u8]) -> Vec<Resolution> {
    let dir = parent_dir(&file.path);
    descendants(root, &["import_spec"])
        .into_iter()
        .filter_map(|spec| spec.child_by_field_name("path"))
        .map(|path| unquote(text(path, src)).to_string())
        .filter(|path| !path.is_empty())
        .map(|path| {
            if path.starts_with('.') {
                match join_relative(dir, &path).filter(|d| index.has_dir(d)) {
                    Some(found) => Resolution::InTree(found),
                    None => Resolution::Unresolved(path),
                }
            } else {
                match index.resolve_dir_suffix(&path) {
                    Some(found) => Resolution::InTree(found),
                    None => Resolution::External(path),
                }
            }
        })
        .collect()
}

// --- line-scanned languages ---

static INCLUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*#\s*include\s*([<"])([^>"]+)[>"]"#).expect("valid include regex")
});
static JVM_IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([A-Za-z_][\w.]*?)(\.\*)?\s*;?\s*$")
        .expect("valid jvm import regex")
});
static RUBY_REQUIRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*(require_relative|require)\s*\(?\s*['"]([^'"]+)['"]"#)
        .expect("valid ruby require regex")
});
static PHP_INCLUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*(?:require|include)(?:_once)?\s*\(?\s*['"]([^'"]+)['"]"#)
        .expect("valid php include regex")
});
static PHP_USE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*use\s+([A-Za-z_][\w\\]*)").expect("valid php use regex")
});
static CSHARP_USING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:global\s+)?using\s+(?:static\s+)?([A-Za-z_][\w.]*)\s*;")
        .expect("valid csharp using regex")
});
static SWIFT_IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:@\w+\s+)?import\s+(?:(?:class|struct|enum|protocol|func|var|typealias)\s+)?([A-Za-z_][\w.]*)")
        .expect("valid swift import regex")
});

fn include_refs(index: &TreeIndex, file: &SourceFile) -> Vec<Resolution> {
    let dir = parent_dir(&file.path);
    INCLUDE_RE
        .captures_iter(&file.content)
        .map(|caps| {
            let quoted = &caps[1] == "\"";
            let target = caps[2].trim().to_string();
            if quoted {
                if let Some(found) = join_relative(dir, &target).filter(|p| index.has_file(p)) {
                    return Resolution::InTree(found);
                }
            }
            match index.resolve_module(dir, &target, &[""]) {
                Some(found) => Resolution::InTree(found),
                None if quoted => Resolution::Unresolved(target),
                None => Resolution::External(target),
            }
        })
        .collect()
}

fn jvm_refs(index: &TreeIndex, file: &SourceFile) -> Vec<Resolution> {
    let dir = parent_dir(&file.path);
    JVM_IMPORT_RE
        .captures_iter(&file.content)
        .map(|caps| {
            let name = caps[1].to_string();
            let as_path = name.replace('.', "/");
            let found = if caps.get(2).is_some() {
                index.resolve_package_dir(&as_path)
            } else {
                index.resolve_module(dir, &as_path, JVM_SUFFIXES)
            };
            match found {
                Some(found) => Resolution::InTree(found),
                None => Resolution::External(name),
            }
        })
        .collect()
}

fn ruby_refs(index: &TreeIndex, file: &SourceFile) -> Vec<Resolution> {
    let dir = parent_dir(&file.path);
    RUBY_REQUIRE_RE
        .captures_iter(&file.content)
        .map(|caps| {
            let target = caps[2].trim_end_matches(".rb").to_string();
            if &caps[1] == "require_relative" {
                match join_relative(dir, &target).and_then(|p| index.resolve_exact(&p, &[".rb"])) {
                    Some(found) => Resolution::InTree(found),
                    None => Resolution::Unresolved(target),
                }
            } else {
                match index.resolve_module(dir, &target, &[".rb"]) {
                    Some(found) => Resolution::InTree(found),
                    None => Resolution::External(top_level(&target, '/')),
                }
            }
        })
        .collect()
}

fn php_refs(index: &TreeIndex, file: &SourceFile) -> Vec<Resolution> {
    let dir = parent_dir(&file.path);
    let includes = PHP_INCLUDE_RE.captures_iter(&file.content).map(|caps| {
        let target = caps[1].to_string();
        match join_relative(dir, &target).filter(|p| index.has_file(p)) {
            Some(found) => Resolution::InTree(found),
            None => Resolution::Unresolved(target),
        }
    });
    let uses = PHP_USE_RE
        .captures_iter(&file.content)
        .map(|caps| Resolution::External(top_level(&caps[1], '\\')));
    includes.chain(uses).collect()
}

fn external_only(pattern: &Regex, content: &str) -> Vec<Resolution> {
    pattern.captures_iter(content).map(|caps| Resolution::External(caps[1].to_string())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fanout(files: &[SourceFile], target: &str) -> DependencyFanout {
        let index = TreeIndex::from_files(files);
        let file = files.iter().find(|f| f.path == target).expect("target present");
        FanoutAnalyzer::new(&index).analyze(file)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn python_imports_resolve_in_tree_and_external() {
        let files = vec![
            SourceFile::new(
                "pkg/app.py",
                "import os\nimport os.path\nimport numpy as np\nfrom pkg import util\nfrom .models import User\nfrom . import missing\nfrom .. import nothing\n",
            ),
            SourceFile::new("pkg/util.py", ""),
            SourceFile::new("pkg/models.py", ""),
            SourceFile::new("pkg/__init__.py", ""),
        ];
        let result = fanout(&files, "pkg/app.py");
        assert_eq!(result.external, set(&["numpy", "os"]));
        assert_eq!(result.resolved, set(&["pkg/__init__.py", "pkg/models.py", "pkg/util.py"]));
        assert_eq!(result.unresolved, vec!["..".to_string()]);
        assert_eq!(result.count(), 5);
    }

    #[test]
    fn javascript_specifiers() {
        let files = vec![
            SourceFile::new(
                "src/index.ts",
                "import React from 'react';\nimport { a } from './a';\nimport x from '@scope/pkg/deep';\nexport * from './lib';\nconst fs = require('fs');\nconst gone = require('./gone');\nconst lazy = import('./a');\n",
            ),
            SourceFile::new("src/a.ts", ""),
            SourceFile::new("src/lib/index.js", ""),
        ];
        let result = fanout(&files, "src/index.ts");
        assert_eq!(result.resolved, set(&["src/a.ts", "src/lib/index.js"]));
        assert_eq!(result.external, set(&["@scope/pkg", "fs", "react"]));
        assert_eq!(result.unresolved, vec!["./gone".to_string()]);
    }

    #[test]
    fn rust_use_trees_and_mods() {
        let files = vec![
            SourceFile::new(
                "src/lib.rs",
                "mod config;\nmod scan;\nmod ghost;\nuse std::collections::{HashMap, BTreeSet};\nuse serde::Deserialize;\nuse crate::scan::{walker::Walker, self};\nextern crate rayon;\n",
            ),
            SourceFile::new("src/config.rs", ""),
            SourceFile::new("src/scan/mod.rs", ""),
            SourceFile::new("src/scan/walker.rs", ""),
        ];
        let result = fanout(&files, "src/lib.rs");
        assert_eq!(
            result.resolved,
            set(&["src/config.rs", "src/scan/mod.rs", "src/scan/walker.rs"])
        );
        assert_eq!(result.external, set(&["rayon", "serde", "std"]));
        assert_eq!(result.unresolved, vec!["mod ghost".to_string()]);
    }

    #[test]
    fn rust_super_and_child_modules() {
        let files = vec![
            SourceFile::new("src/scan/walker.rs", "use super::filter::Rule;\nuse crate::Config;\n"),
            SourceFile::new("src/scan/filter.rs", ""),
            SourceFile::new("src/lib.rs", ""),
        ];
        let result = fanout(&files, "src/scan/walker.rs");
        assert_eq!(result.resolved, set(&["src/lib.rs", "src/scan/filter.rs"]));
        assert!(result.external.is_empty());
    }

    #[test]
    fn go_imports_match_tree_directories() {
        let files = vec![
            SourceFile::new(
                "cmd/main.go",
                "package main\n\nimport (\n\t\"fmt\"\n\t\"github.com/acme/tool/internal/store\"\n)\n",
            ),
            SourceFile::new("internal/store/store.go", "package store\n"),
        ];
        let result = fanout(&files, "cmd/main.go");
        assert_eq!(result.resolved, set(&["internal/store"]));
        assert_eq!(result.external, set(&["fmt"]));
    }

    #[test]
    fn c_includes_split_local_and_system() {
        let files = vec![
            SourceFile::new("src/main.c", "#include <stdio.h>\n#include \"util.h\"\n#include \"missing.h\"\n"),
            SourceFile::new("src/util.h", ""),
        ];
        let result = fanout(&files, "src/main.c");
        assert_eq!(result.resolved, set(&["src/util.h"]));
        assert_eq!(result.external, set(&["stdio.h"]));
        assert_eq!(result.unresolved, vec!["missing.h".to_string()]);
    }

    #[test]
    fn jvm_ruby_csharp_swift_imports() {
        let files = vec![
            SourceFile::new(
                "src/main/java/com/acme/App.java",
                "import java.util.List;\nimport com.acme.model.User;\nimport com.acme.util.*;\n",
            ),
            SourceFile::new("src/main/java/com/acme/model/User.java", ""),
            SourceFile::new("src/main/java/com/acme/util/Strings.java", ""),
            SourceFile::new("lib/tool.rb", "require 'json'\nrequire_relative 'helpers'\n"),
            SourceFile::new("lib/helpers.rb", ""),
            SourceFile::new("App.cs", "using System;\nusing System.Linq;\n"),
            SourceFile::new("App.swift", "import Foundation\nimport UIKit\n"),
        ];
        let java = fanout(&files, "src/main/java/com/acme/App.java");
        assert_eq!(
            java.resolved,
            set(&["src/main/java/com/acme/model/User.java", "src/main/java/com/acme/util"])
        );
        assert_eq!(java.external, set(&["java.util.List"]));

        let ruby = fanout(&files, "lib/tool.rb");
        assert_eq!(ruby.resolved, set(&["lib/helpers.rb"]));
        assert_eq!(ruby.external, set(&["json"]));

        assert_eq!(fanout(&files, "App.cs").count(), 2);
        assert_eq!(fanout(&files, "App.swift").external, set(&["Foundation", "UIKit"]));
    }

    #[test]
    fn self_references_are_dropped() {
        let files = vec![SourceFile::new("pkg/a.py", "from pkg import a\n")];
        assert_eq!(fanout(&files, "pkg/a.py").count(), 0);
    }
}
