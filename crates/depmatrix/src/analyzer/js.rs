// Copyright 2025 DepMatrix Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use crate::analyzer::common::{join_relative, parent_dir, usage_weight, word_counts};
use crate::analyzer::{AnalyzeContext, LanguageAnalyzer, LanguageResult};
use crate::filter::Lang;
use crate::source::SourceSet;

static IMPORT_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s+([^'";]*?)\s*from\s*['"]([^'"]+)['"]"#).unwrap());
static EXPORT_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bexport\s+([^'";]*?)\s*from\s*['"]([^'"]+)['"]"#).unwrap());
static IMPORT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s*['"]([^'"]+)['"]"#).unwrap());
static IMPORT_DYNAMIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());
static REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

static EXPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bexport\s+(?:declare\s+)?(?:abstract\s+)?(?:default\s+)?(?:async\s+)?(?:function\*?|class|const|let|var|interface|type|enum|namespace)\s+([A-Za-z_$][\w$]*)",
    )
    .unwrap()
});
static EXPORT_BRACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bexport\s*\{([^}]*)\}").unwrap());

static VUE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<script([^>]*)>(.*?)</script>").unwrap());

/// Fallback order after an exact path miss, per the resolution contract.
const RESOLVE_EXTS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

/// Weight category of one import clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseKind {
    /// Names `n` specific symbols (default import counts as one).
    Named(u32),
    /// Namespace / star import; weighted by symbol usage.
    Wildcard,
    /// No symbols named; weight 1.
    SideEffect,
}

/// Categorise the text between `import`/`export` and `from`. Returns `None`
/// when the clause is type-only and type-only imports are disabled.
fn classify_clause(clause: &str, include_type_only: bool) -> Option<ClauseKind> {
    let trimmed = clause.trim();
    let type_only =
        trimmed == "type" || trimmed.starts_with("type ") || trimmed.starts_with("type{");
    if type_only && !include_type_only {
        return None;
    }
    let body = if type_only {
        trimmed[4..].trim_start()
    } else {
        trimmed
    };
    if body.starts_with('*') {
        return Some(ClauseKind::Wildcard);
    }
    let mut count = 0u32;
    match body.find('{') {
        Some(open) => {
            let close = body[open..].find('}').map(|i| open + i).unwrap_or(body.len());
            for part in body[open + 1..close].split(',') {
                let p = part.trim();
                if p.is_empty() {
                    continue;
                }
                if p.starts_with("type ") && !include_type_only {
                    continue;
                }
                count += 1;
            }
            // A default import rides in front of the brace list.
            if !body[..open].trim().trim_end_matches(',').trim().is_empty() {
                count += 1;
            }
        }
        None => {
            if !body.is_empty() {
                count += 1;
            }
        }
    }
    if count == 0 {
        Some(ClauseKind::SideEffect)
    } else {
        Some(ClauseKind::Named(count))
    }
}

/// Names a module makes visible to importers.
fn exported_symbols(source: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for cap in EXPORT_DECL.captures_iter(source) {
        out.insert(cap[1].to_string());
    }
    for cap in EXPORT_BRACE.captures_iter(source) {
        for part in cap[1].split(',') {
            let p = part.trim();
            if p.is_empty() {
                continue;
            }
            let name = match p.rsplit_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => p.trim_start_matches("type ").trim(),
            };
            if !name.is_empty() && name != "default" {
                out.insert(name.to_string());
            }
        }
    }
    out
}

/// Remove `//` and `/* */` comments outside string literals so tsconfig
/// files with comments still parse as JSON.
fn strip_json_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut in_string = false;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1] as char);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
        } else if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
        } else if c == '/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if c == '/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

/// Path-alias table from `compilerOptions.paths`, longest prefix first.
/// Each entry is (alias prefix, replacement, is_wildcard).
fn load_aliases(root: &Path) -> Vec<(String, String, bool)> {
    let mut entries: Vec<(String, String, bool)> = Vec::new();
    for name in ["tsconfig.json", "jsconfig.json"] {
        let Ok(text) = std::fs::read_to_string(root.join(name)) else {
            continue;
        };
        let clean = strip_json_comments(&text);
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&clean) else {
            log::warn!("unparseable {}; path aliases ignored", name);
            break;
        };
        let compiler = &value["compilerOptions"];
        let base_url = compiler["baseUrl"].as_str().unwrap_or(".");
        if let Some(paths) = compiler["paths"].as_object() {
            for (alias, targets) in paths {
                let Some(first) = targets
                    .as_array()
                    .and_then(|a| a.first())
                    .and_then(|t| t.as_str())
                else {
                    continue;
                };
                let is_wildcard = alias.ends_with('*');
                let prefix = alias.trim_end_matches('*').to_string();
                let replacement = join_relative(base_url, first.trim_end_matches('*'));
                entries.push((prefix, replacement, is_wildcard));
            }
        }
        break;
    }
    entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
    entries
}

/// Repo-relative base path a module specifier points at, before extension
/// fallback. `None` for third-party specifiers.
fn module_base(
    importer: &str,
    module: &str,
    aliases: &[(String, String, bool)],
) -> Option<String> {
    if module.starts_with("./") || module.starts_with("../") {
        return Some(join_relative(parent_dir(importer), module));
    }
    for (prefix, replacement, is_wildcard) in aliases {
        if *is_wildcard {
            if let Some(rest) = module.strip_prefix(prefix.as_str()) {
                return Some(if rest.is_empty() {
                    replacement.clone()
                } else {
                    join_relative(replacement, rest)
                });
            }
        } else if module == prefix {
            return Some(replacement.clone());
        }
    }
    None
}

fn resolve(file_set: &HashSet<&str>, base: &str) -> Option<String> {
    if file_set.contains(base) {
        return Some(base.to_string());
    }
    for ext in RESOLVE_EXTS {
        let candidate = format!("{}{}", base, ext);
        if file_set.contains(candidate.as_str()) {
            return Some(candidate);
        }
    }
    for ext in RESOLVE_EXTS {
        let candidate = format!("{}/index{}", base, ext);
        if file_set.contains(candidate.as_str()) {
            return Some(candidate);
        }
    }
    None
}

fn extension(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .and_then(|b| b.rsplit_once('.'))
        .map(|(_, e)| e)
        .unwrap_or("")
}

/// For `.vue` single-file components, analysis covers the `<script>` block
/// only. Returns the effective source and whether it is TypeScript.
fn effective_source<'a>(path: &str, source: &'a str) -> (&'a str, bool) {
    let ext = extension(path);
    if ext == "vue" {
        if let Some(cap) = VUE_SCRIPT.captures(source) {
            let attrs = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let is_ts = attrs.contains("lang=\"ts\"") || attrs.contains("lang='ts'");
            return (cap.get(2).map(|m| m.as_str()).unwrap_or(""), is_ts);
        }
        return ("", false);
    }
    (source, matches!(ext, "ts" | "tsx"))
}

fn ts_language(path: &str, is_ts: bool) -> tree_sitter::Language {
    match extension(path) {
        "tsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
        _ if is_ts => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        _ => tree_sitter_javascript::LANGUAGE.into(),
    }
}

/// AST cyclomatic score: every function body starts at 1, decision points
/// add 1 each, file score is the sum clamped to >= 1. Parse failure is 0.
fn ast_complexity(path: &str, source: &str, is_ts: bool) -> u32 {
    let language = ts_language(path, is_ts);
    let mut parser = tree_sitter::Parser::new();
    if parser.set_language(&language).is_err() {
        return 0;
    }
    let Some(tree) = parser.parse(source, None) else {
        return 0;
    };
    let mut functions = 0u32;
    let mut decisions = 0u32;
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "generator_function_declaration"
            | "arrow_function"
            | "method_definition" => functions += 1,
            "if_statement"
            | "ternary_expression"
            | "conditional_expression"
            | "for_statement"
            | "for_in_statement"
            | "for_of_statement"
            | "while_statement"
            | "do_statement"
            | "catch_clause"
            | "switch_case" => decisions += 1,
            "binary_expression" => {
                if let Some(op) = node.child_by_field_name("operator") {
                    let text = source.get(op.byte_range()).unwrap_or("");
                    if text == "&&" || text == "||" {
                        decisions += 1;
                    }
                }
            }
            _ => {}
        }
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    (functions + decisions).max(1)
}

fn collect_clauses(source: &str, include_type_only: bool) -> Vec<(ClauseKind, String)> {
    let mut out = Vec::new();
    for cap in IMPORT_FROM.captures_iter(source) {
        if let Some(kind) = classify_clause(&cap[1], include_type_only) {
            out.push((kind, cap[2].to_string()));
        }
    }
    for cap in EXPORT_FROM.captures_iter(source) {
        if let Some(kind) = classify_clause(&cap[1], include_type_only) {
            out.push((kind, cap[2].to_string()));
        }
    }
    for cap in IMPORT_BARE.captures_iter(source) {
        out.push((ClauseKind::SideEffect, cap[1].to_string()));
    }
    for cap in IMPORT_DYNAMIC.captures_iter(source) {
        out.push((ClauseKind::SideEffect, cap[1].to_string()));
    }
    for cap in REQUIRE.captures_iter(source) {
        out.push((ClauseKind::SideEffect, cap[1].to_string()));
    }
    out
}

pub struct JsAnalyzer;

impl LanguageAnalyzer for JsAnalyzer {
    fn tag(&self) -> Lang {
        Lang::Js
    }

    fn analyze_all(
        &self,
        files: &[String],
        sources: &SourceSet,
        ctx: &AnalyzeContext<'_>,
    ) -> anyhow::Result<LanguageResult> {
        let mut result = LanguageResult::default();
        let aliases = load_aliases(ctx.root);
        let file_set: HashSet<&str> = files.iter().map(|s| s.as_str()).collect();

        // Index pass: exported symbols per file, complete before resolution.
        let mut symbols: HashMap<&str, BTreeSet<String>> = HashMap::new();
        for path in files {
            let syms = sources
                .content(path)
                .map(|src| exported_symbols(effective_source(path, src).0))
                .unwrap_or_default();
            symbols.insert(path.as_str(), syms);
        }
        ctx.sink
            .info(format!("js: indexed exports of {} files", files.len()));

        for path in files {
            if ctx.cancel.is_cancelled() {
                return Ok(result);
            }
            let Some(raw) = sources.content(path) else {
                result.complexity.insert(path.clone(), 0);
                continue;
            };
            let (body, is_ts) = effective_source(path, raw);
            result
                .complexity
                .insert(path.clone(), ast_complexity(path, body, is_ts));

            let counts = if ctx.fast_path {
                HashMap::new()
            } else {
                word_counts(body)
            };
            for (kind, module) in collect_clauses(body, ctx.options.include_type_only_imports) {
                let Some(base) = module_base(path, &module, &aliases) else {
                    continue;
                };
                let Some(target) = resolve(&file_set, &base) else {
                    continue;
                };
                let weight = match kind {
                    ClauseKind::Named(n) => n,
                    ClauseKind::SideEffect => 1,
                    ClauseKind::Wildcard => {
                        if ctx.fast_path {
                            1
                        } else {
                            symbols
                                .get(target.as_str())
                                .map(|syms| usage_weight(&counts, syms).max(1))
                                .unwrap_or(1)
                        }
                    }
                };
                result.add_edge(path, &target, weight, ctx.fast_path);
            }
        }
        Ok(result)
    }
}
