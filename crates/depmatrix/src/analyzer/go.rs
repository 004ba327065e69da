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
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::analyzer::common::{extract_quoted, join_relative, parent_dir, usage_weight, word_counts};
use crate::analyzer::{AnalyzeContext, LanguageAnalyzer, LanguageResult};
use crate::complexity::c_family_score;
use crate::filter::Lang;
use crate::source::SourceSet;

/// Dotless stdlib roots; first path segment membership decides.
const GO_STDLIB_ROOTS: &[&str] = &[
    "fmt", "os", "io", "strings", "strconv", "errors", "log", "time", "math", "sort", "sync",
    "context", "encoding", "net", "crypto", "database", "testing", "runtime", "reflect", "regexp",
    "bytes", "bufio", "flag", "path", "filepath",
];

static GO_FUNC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?([A-Z]\w*)").unwrap());
static GO_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^type\s+([A-Z]\w*)").unwrap());
static GO_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:var|const)\s+([A-Z]\w*)").unwrap());

/// Exported (capitalised) top-level identifiers of one file.
fn exported_symbols(source: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for re in [&GO_FUNC, &GO_TYPE, &GO_VALUE] {
        for cap in re.captures_iter(source) {
            out.insert(cap[1].to_string());
        }
    }
    out
}

/// One import entry: the quoted path plus whether it was blank (`_`).
#[derive(Debug, PartialEq)]
struct GoImport {
    path: String,
    blank: bool,
}

fn parse_imports(source: &str) -> Vec<GoImport> {
    let mut out = Vec::new();
    let mut in_block = false;
    for line in source.lines() {
        let t = line.trim();
        if t.starts_with("import (") {
            in_block = true;
            continue;
        }
        if in_block {
            if t.starts_with(')') {
                in_block = false;
                continue;
            }
            if let Some(p) = extract_quoted(t) {
                out.push(GoImport {
                    path: p,
                    blank: t.starts_with('_'),
                });
            }
            continue;
        }
        if let Some(rest) = t.strip_prefix("import ") {
            if let Some(p) = extract_quoted(rest) {
                out.push(GoImport {
                    path: p,
                    blank: rest.trim_start().starts_with('_'),
                });
            }
        }
    }
    out
}

fn read_module_path(root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(root.join("go.mod")).ok()?;
    for line in content.lines() {
        if let Some(name) = line.trim().strip_prefix("module ") {
            return Some(name.trim().to_string());
        }
    }
    None
}

struct GoIndex {
    /// package directory -> member files, in sorted input order.
    packages: BTreeMap<String, Vec<String>>,
    symbols: HashMap<String, BTreeSet<String>>,
    module_path: Option<String>,
}

impl GoIndex {
    fn build(files: &[String], sources: &SourceSet, root: &Path) -> GoIndex {
        let mut packages: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut symbols = HashMap::new();
        for path in files {
            packages
                .entry(parent_dir(path).to_string())
                .or_default()
                .push(path.clone());
            let syms = sources
                .content(path)
                .map(exported_symbols)
                .unwrap_or_default();
            symbols.insert(path.clone(), syms);
        }
        GoIndex {
            packages,
            symbols,
            module_path: read_module_path(root),
        }
    }

    /// Package directories matching `import_path` as a path suffix; the
    /// longest directory wins.
    fn resolve_suffix(&self, import_path: &str) -> Option<&Vec<String>> {
        let mut best: Option<(&String, &Vec<String>)> = None;
        for (dir, members) in &self.packages {
            if dir.is_empty() {
                continue;
            }
            let hit = dir == import_path || import_path.ends_with(&format!("/{}", dir));
            if hit && best.map(|(b, _)| dir.len() > b.len()).unwrap_or(true) {
                best = Some((dir, members));
            }
        }
        best.map(|(_, members)| members)
    }

    fn resolve(&self, importer: &str, import_path: &str) -> Option<&Vec<String>> {
        if import_path.starts_with("./") || import_path.starts_with("../") {
            let dir = join_relative(parent_dir(importer), import_path);
            return self.packages.get(&dir);
        }
        // A go.mod module prefix maps dotted import paths back into the
        // repository.
        if let Some(module) = &self.module_path {
            if import_path == module {
                return self.packages.get("");
            }
            if let Some(rel) = import_path.strip_prefix(&format!("{}/", module)) {
                return self.packages.get(rel).or_else(|| self.resolve_suffix(rel));
            }
        }
        let first = import_path.split('/').next().unwrap_or(import_path);
        if first.contains('.') {
            return None; // third-party host path
        }
        if GO_STDLIB_ROOTS.contains(&first) {
            return None;
        }
        self.resolve_suffix(import_path)
    }
}

pub struct GoAnalyzer;

impl LanguageAnalyzer for GoAnalyzer {
    fn tag(&self) -> Lang {
        Lang::Go
    }

    fn analyze_all(
        &self,
        files: &[String],
        sources: &SourceSet,
        ctx: &AnalyzeContext<'_>,
    ) -> anyhow::Result<LanguageResult> {
        let mut result = LanguageResult::default();
        let index = GoIndex::build(files, sources, ctx.root);
        ctx.sink
            .info(format!("go: indexed {} packages", index.packages.len()));
        for path in files {
            if ctx.cancel.is_cancelled() {
                return Ok(result);
            }
            let Some(source) = sources.content(path) else {
                result.complexity.insert(path.clone(), 0);
                continue;
            };
            result
                .complexity
                .insert(path.clone(), c_family_score(Lang::Go, source));
            let counts = if ctx.fast_path {
                HashMap::new()
            } else {
                word_counts(source)
            };
            for import in parse_imports(source) {
                let Some(members) = index.resolve(path, &import.path) else {
                    continue;
                };
                for target in members {
                    let weight = if import.blank || ctx.fast_path {
                        1
                    } else {
                        index
                            .symbols
                            .get(target)
                            .map(|syms| usage_weight(&counts, syms).max(1))
                            .unwrap_or(1)
                    };
                    result.add_edge(path, target, weight, ctx.fast_path);
                }
            }
        }
        Ok(result)
    }
}
