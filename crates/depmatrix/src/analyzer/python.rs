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

use crate::analyzer::common::{parent_dir, usage_weight, word_counts};
use crate::analyzer::{AnalyzeContext, LanguageAnalyzer, LanguageResult};
use crate::complexity::python_score;
use crate::filter::Lang;
use crate::source::SourceSet;

/// Dotted stdlib / well-known third-party roots; a non-relative import whose
/// first segment is one of these is not an intra-repo candidate.
const PY_EXTERNAL_ROOTS: &[&str] = &[
    "sys",
    "os",
    "re",
    "json",
    "datetime",
    "collections",
    "typing",
    "pathlib",
    "io",
    "time",
    "random",
    "math",
    "logging",
    "unittest",
    "argparse",
    "subprocess",
    "threading",
    "multiprocessing",
    "asyncio",
    "django",
    "flask",
    "numpy",
    "pandas",
    "requests",
    "pytest",
    "sqlalchemy",
    "redis",
    "celery",
    "boto3",
    "pydantic",
];

static PY_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:async\s+)?def\s+([A-Za-z_]\w*)").unwrap());
static PY_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^class\s+([A-Za-z_]\w*)").unwrap());
static PY_CONST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([A-Za-z_]\w*)\s*(?::[^=\n]+)?=[^=]").unwrap());

/// Dotted module path a file inhabits: `pkg/m.py` -> `pkg.m`,
/// `pkg/__init__.py` -> `pkg`.
fn module_path(path: &str) -> String {
    let trimmed = path.strip_suffix(".py").unwrap_or(path);
    let trimmed = trimmed.strip_suffix("/__init__").unwrap_or(trimmed);
    trimmed.replace('/', ".")
}

/// Top-level names a module defines (functions, classes, constants).
fn top_level_symbols(source: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for re in [&PY_DEF, &PY_CLASS, &PY_CONST] {
        for cap in re.captures_iter(source) {
            out.insert(cap[1].to_string());
        }
    }
    out
}

struct PyIndex {
    /// module path -> file path; complete before any resolution happens.
    modules: BTreeMap<String, String>,
    symbols: HashMap<String, BTreeSet<String>>,
}

impl PyIndex {
    fn build(files: &[String], sources: &SourceSet) -> PyIndex {
        let mut modules = BTreeMap::new();
        let mut symbols = HashMap::new();
        for path in files {
            modules.insert(module_path(path), path.clone());
            let syms = sources
                .content(path)
                .map(top_level_symbols)
                .unwrap_or_default();
            symbols.insert(path.clone(), syms);
        }
        PyIndex { modules, symbols }
    }

    /// Files whose module path equals `module` or lives beneath it.
    fn candidates(&self, module: &str) -> Vec<String> {
        if module.is_empty() {
            return Vec::new();
        }
        let prefix = format!("{}.", module);
        self.modules
            .iter()
            .filter(|(m, _)| m.as_str() == module || m.starts_with(&prefix))
            .map(|(_, f)| f.clone())
            .collect()
    }

    fn symbols_of(&self, file: &str) -> Option<&BTreeSet<String>> {
        self.symbols.get(file)
    }
}

#[derive(Debug, PartialEq)]
enum PyImport {
    From {
        module: String,
        level: usize,
        names: Vec<String>,
        star: bool,
    },
    Plain {
        module: String,
    },
}

/// Join parenthesised `from x import (...)` continuations into one line.
fn logical_lines(source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending: Option<String> = None;
    for line in source.lines() {
        if let Some(acc) = pending.as_mut() {
            acc.push(' ');
            acc.push_str(line.trim());
            if line.contains(')') {
                out.push(pending.take().unwrap_or_default());
            }
            continue;
        }
        let t = line.trim();
        if (t.starts_with("from ") || t.starts_with("import "))
            && t.contains('(')
            && !t.contains(')')
        {
            pending = Some(t.to_string());
        } else {
            out.push(t.to_string());
        }
    }
    if let Some(acc) = pending {
        out.push(acc);
    }
    out
}

fn parse_imports(source: &str) -> Vec<PyImport> {
    let mut clauses = Vec::new();
    for line in logical_lines(source) {
        let t = line.as_str();
        if let Some(rest) = t.strip_prefix("from ") {
            let Some((module_part, imports_part)) = rest.split_once(" import ") else {
                continue;
            };
            let m = module_part.trim();
            let level = m.chars().take_while(|&c| c == '.').count();
            let module = m[level..].to_string();
            let names_src = imports_part
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')');
            let mut names = Vec::new();
            let mut star = false;
            for part in names_src.split(',') {
                let mut name = part.trim();
                if name.is_empty() {
                    continue;
                }
                if name == "*" {
                    star = true;
                    continue;
                }
                if let Some(idx) = name.find(" as ") {
                    name = name[..idx].trim();
                }
                names.push(name.to_string());
            }
            clauses.push(PyImport::From {
                module,
                level,
                names,
                star,
            });
        } else if let Some(rest) = t.strip_prefix("import ") {
            for part in rest.split(',') {
                let mut token = part.trim();
                if let Some(idx) = token.find(" as ") {
                    token = token[..idx].trim();
                }
                let token = token.split_whitespace().next().unwrap_or("");
                if !token.is_empty() {
                    clauses.push(PyImport::Plain {
                        module: token.to_string(),
                    });
                }
            }
        }
    }
    clauses
}

fn is_external(module: &str) -> bool {
    let first = module.split('.').next().unwrap_or(module);
    PY_EXTERNAL_ROOTS.contains(&first)
}

/// Dotted package the import is relative to: one leading dot anchors at the
/// importing file's own package, each further dot walks one level up.
/// `None` when the dots climb past the repository root.
fn relative_base(importer: &str, level: usize) -> Option<String> {
    let dir = parent_dir(importer);
    let mut parts: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };
    for _ in 1..level {
        parts.pop()?;
    }
    Some(parts.join("."))
}

fn absolute_module(importer: &str, module: &str, level: usize) -> Option<String> {
    if level == 0 {
        return Some(module.to_string());
    }
    let base = relative_base(importer, level)?;
    Some(match (base.is_empty(), module.is_empty()) {
        (_, true) => base,
        (true, false) => module.to_string(),
        (false, false) => format!("{}.{}", base, module),
    })
}

pub struct PythonAnalyzer;

impl LanguageAnalyzer for PythonAnalyzer {
    fn tag(&self) -> Lang {
        Lang::Python
    }

    fn analyze_all(
        &self,
        files: &[String],
        sources: &SourceSet,
        ctx: &AnalyzeContext<'_>,
    ) -> anyhow::Result<LanguageResult> {
        let mut result = LanguageResult::default();
        let index = PyIndex::build(files, sources);
        ctx.sink
            .info(format!("python: indexed {} modules", index.modules.len()));

        for path in files {
            if ctx.cancel.is_cancelled() {
                return Ok(result);
            }
            let Some(source) = sources.content(path) else {
                result.complexity.insert(path.clone(), 0);
                continue;
            };
            result.complexity.insert(path.clone(), python_score(source));

            let counts = if ctx.fast_path {
                HashMap::new()
            } else {
                word_counts(source)
            };
            for clause in parse_imports(source) {
                match clause {
                    PyImport::From {
                        module,
                        level,
                        names,
                        star,
                    } => {
                        if level == 0 && is_external(&module) {
                            continue;
                        }
                        let Some(abs) = absolute_module(path, &module, level) else {
                            continue;
                        };
                        let candidates = index.candidates(&abs);
                        if candidates.is_empty() {
                            continue;
                        }
                        if star {
                            for target in &candidates {
                                let w = if ctx.fast_path {
                                    1
                                } else {
                                    index
                                        .symbols_of(target)
                                        .map(|syms| usage_weight(&counts, syms).max(1))
                                        .unwrap_or(1)
                                };
                                result.add_edge(path, target, w, ctx.fast_path);
                            }
                        }
                        for name in &names {
                            // `from pkg import m` may name a submodule
                            // rather than a symbol.
                            let sub = format!("{}.{}", abs, name);
                            let sub_candidates = index.candidates(&sub);
                            if !sub_candidates.is_empty() {
                                for target in &sub_candidates {
                                    result.add_edge(path, target, 1, ctx.fast_path);
                                }
                                continue;
                            }
                            let holders: Vec<&String> = candidates
                                .iter()
                                .filter(|f| {
                                    index
                                        .symbols_of(f)
                                        .map(|s| s.contains(name))
                                        .unwrap_or(false)
                                })
                                .collect();
                            if !holders.is_empty() {
                                for target in holders {
                                    result.add_edge(path, target, 1, ctx.fast_path);
                                }
                            } else {
                                // Unattributed name: count it once against
                                // the module's own file when it exists,
                                // otherwise against every candidate.
                                let exact: Vec<&String> = candidates
                                    .iter()
                                    .filter(|f| module_path(f) == abs)
                                    .collect();
                                let targets: Vec<&String> = if exact.is_empty() {
                                    candidates.iter().collect()
                                } else {
                                    exact
                                };
                                for target in targets {
                                    result.add_edge(path, target, 1, ctx.fast_path);
                                }
                            }
                        }
                    }
                    PyImport::Plain { module } => {
                        if is_external(&module) {
                            continue;
                        }
                        for target in &index.candidates(&module) {
                            let w = if ctx.fast_path {
                                1
                            } else {
                                index
                                    .symbols_of(target)
                                    .map(|syms| usage_weight(&counts, syms).max(1))
                                    .unwrap_or(1)
                            };
                            result.add_edge(path, target, w, ctx.fast_path);
                        }
                    }
                }
            }
        }
        Ok(result)
    }
}
