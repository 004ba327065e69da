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

use crate::analyzer::common::{base_name, usage_weight, word_counts};
use crate::analyzer::{AnalyzeContext, LanguageAnalyzer, LanguageResult};
use crate::complexity::c_family_score;
use crate::filter::Lang;
use crate::source::SourceSet;

static NAMESPACE_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*namespace\s+([A-Za-z_][\w.]*)").unwrap());
static TYPE_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:class|interface|struct|enum|record)\s+([A-Za-z_]\w*)").unwrap());
static USING_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:global\s+)?using\s+(static\s+)?(?:([A-Za-z_]\w*)\s*=\s*)?([A-Za-z_][\w.]*)\s*;",
    )
    .unwrap()
});

/// One `using` directive: `static` flag plus the dotted target (aliases are
/// expanded to their right-hand side at parse time).
#[derive(Debug, PartialEq)]
struct Using {
    is_static: bool,
    target: String,
}

fn parse_usings(source: &str) -> Vec<Using> {
    USING_DECL
        .captures_iter(source)
        .map(|cap| Using {
            is_static: cap.get(1).is_some(),
            target: cap[3].to_string(),
        })
        .collect()
}

fn file_stem(path: &str) -> &str {
    let base = base_name(path);
    base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base)
}

struct CsIndex {
    /// namespace -> files declaring it (insertion order = sorted input).
    namespaces: HashMap<String, Vec<String>>,
    /// `<namespace>.<file stem>` -> file, the type-address convention.
    types: HashMap<String, String>,
    /// file -> declared type names, for usage weighting.
    symbols: HashMap<String, BTreeSet<String>>,
    /// Most common first namespace segment across the repo.
    root_namespace: Option<String>,
}

impl CsIndex {
    fn build(files: &[String], sources: &SourceSet) -> CsIndex {
        let mut namespaces: HashMap<String, Vec<String>> = HashMap::new();
        let mut types: HashMap<String, String> = HashMap::new();
        let mut symbols: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut root_counts: BTreeMap<String, u32> = BTreeMap::new();
        for path in files {
            let Some(source) = sources.content(path) else {
                continue;
            };
            let declared: BTreeSet<String> = TYPE_DECL
                .captures_iter(source)
                .map(|c| c[1].to_string())
                .collect();
            symbols.insert(path.clone(), declared);
            if let Some(cap) = NAMESPACE_DECL.captures(source) {
                let ns = cap[1].to_string();
                if let Some(first) = ns.split('.').next() {
                    *root_counts.entry(first.to_string()).or_insert(0) += 1;
                }
                types
                    .entry(format!("{}.{}", ns, file_stem(path)))
                    .or_insert_with(|| path.clone());
                namespaces.entry(ns).or_default().push(path.clone());
            }
        }
        let root_namespace = root_counts
            .iter()
            .max_by_key(|(_, n)| **n)
            .map(|(name, _)| name.clone());
        CsIndex {
            namespaces,
            types,
            symbols,
            root_namespace,
        }
    }
}

/// `System*`, `Xunit*`, `Moq*` and `Microsoft.*` never resolve in-repo,
/// except `Microsoft.*` under the project's own root namespace.
fn is_external(target: &str, root_namespace: Option<&str>) -> bool {
    if target.starts_with("System") || target.starts_with("Xunit") || target.starts_with("Moq") {
        return true;
    }
    if target.starts_with("Microsoft.") {
        if let Some(root) = root_namespace {
            let qualified = format!("Microsoft.{}", root);
            if target == qualified || target.starts_with(&format!("{}.", qualified)) {
                return false;
            }
            if root.starts_with("Microsoft")
                && (target == root || target.starts_with(&format!("{}.", root)))
            {
                return false;
            }
        }
        return true;
    }
    false
}

pub struct CSharpAnalyzer;

impl LanguageAnalyzer for CSharpAnalyzer {
    fn tag(&self) -> Lang {
        Lang::CSharp
    }

    fn analyze_all(
        &self,
        files: &[String],
        sources: &SourceSet,
        ctx: &AnalyzeContext<'_>,
    ) -> anyhow::Result<LanguageResult> {
        let mut result = LanguageResult::default();
        let index = CsIndex::build(files, sources);
        ctx.sink.info(format!(
            "csharp: indexed {} namespaces",
            index.namespaces.len()
        ));
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
                .insert(path.clone(), c_family_score(Lang::CSharp, source));
            let counts = if ctx.fast_path {
                HashMap::new()
            } else {
                word_counts(source)
            };
            for using in parse_usings(source) {
                if is_external(&using.target, index.root_namespace.as_deref()) {
                    continue;
                }
                if let Some(target) = index.types.get(&using.target) {
                    let weight = if using.is_static && !ctx.fast_path {
                        // `using static N.C;` pulls C's members in
                        // unqualified, so occurrences decide the weight.
                        index
                            .symbols
                            .get(target)
                            .map(|syms| usage_weight(&counts, syms).max(1))
                            .unwrap_or(1)
                    } else {
                        // `using N.C;` / `using A = N.C;` name one type.
                        1
                    };
                    result.add_edge(path, target, weight, ctx.fast_path);
                } else if let Some(members) = index.namespaces.get(&using.target) {
                    for target in members {
                        let weight = if ctx.fast_path {
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
        }
        Ok(result)
    }
}
