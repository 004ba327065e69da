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

use crate::analyzer::common::{base_name, join_relative, parent_dir, usage_weight, word_counts};
use crate::analyzer::{AnalyzeContext, LanguageAnalyzer, LanguageResult};
use crate::complexity::c_family_score;
use crate::filter::Lang;
use crate::source::SourceSet;

/// Search roots tried for bare include paths, in order.
const INCLUDE_ROOTS: &[&str] = &["include", "src", "lib", "common", "inc", "headers"];

static INCLUDE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*#\s*include\s*(["<])([^">]+)[">]"#).unwrap());

/// Standard C/C++, POSIX and platform headers that an angled include may
/// name; anything else in angle brackets is still a project candidate.
static STD_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)^(?:
          (?:assert|complex|ctype|errno|fenv|float|inttypes|iso646|limits|locale|math|setjmp|signal|stdalign|stdarg|stdatomic|stdbool|stddef|stdint|stdio|stdlib|stdnoreturn|string|tgmath|threads|time|uchar|wchar|wctype)\.h
        | c(?:assert|complex|ctype|errno|fenv|float|inttypes|limits|locale|math|setjmp|signal|stdarg|stddef|stdint|stdio|stdlib|string|time|uchar|wchar|wctype)
        | algorithm|any|array|atomic|bit|bitset|charconv|chrono|codecvt|compare|concepts|condition_variable|coroutine|deque|exception|execution|filesystem|format|forward_list|fstream|functional|future|initializer_list|iomanip|ios|iosfwd|iostream|istream|iterator|latch|limits|list|locale|map|memory|memory_resource|mutex|new|numbers|numeric|optional|ostream|queue|random|ranges|ratio|regex|scoped_allocator|semaphore|set|shared_mutex|span|sstream|stack|stdexcept|stop_token|streambuf|string|string_view|strstream|syncstream|system_error|thread|tuple|type_traits|typeindex|typeinfo|unordered_map|unordered_set|utility|valarray|variant|vector|version
        | (?:unistd|fcntl|pthread|semaphore|dirent|dlfcn|grp|pwd|sched|termios|poll|spawn)\.h
        | sys/.*|netinet/.*|arpa/.*|linux/.*
        | (?:windows|winsock2|ws2tcpip|tchar|io|direct)\.h
        )$",
    )
    .unwrap()
});

static CPP_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:class|struct|enum|union)\s+([A-Za-z_]\w*)").unwrap());
static CPP_DEFINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*#\s*define\s+([A-Za-z_]\w*)").unwrap());
static CPP_TYPEDEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\btypedef\b[^;\n]*[\s*&]([A-Za-z_]\w*)\s*;").unwrap());
static CPP_USING_ALIAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\busing\s+([A-Za-z_]\w*)\s*=").unwrap());

/// One include directive: the path text and whether it was quoted.
#[derive(Debug, PartialEq)]
struct Include {
    path: String,
    quoted: bool,
}

fn parse_includes(source: &str) -> Vec<Include> {
    INCLUDE_LINE
        .captures_iter(source)
        .map(|cap| Include {
            path: cap[2].to_string(),
            quoted: &cap[1] == "\"",
        })
        .collect()
}

/// Names a header exposes; used for usage weighting. Prototype scanning is
/// deliberately conservative, the fallback weight covers the rest.
fn declared_symbols(source: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for re in [&CPP_TYPE, &CPP_DEFINE, &CPP_TYPEDEF, &CPP_USING_ALIAS] {
        for cap in re.captures_iter(source) {
            out.insert(cap[1].to_string());
        }
    }
    out
}

struct CppIndex {
    file_set: HashSet<String>,
    files: Vec<String>,
    by_basename: HashMap<String, Vec<String>>,
    symbols: HashMap<String, BTreeSet<String>>,
}

impl CppIndex {
    fn build(files: &[String], sources: &SourceSet) -> CppIndex {
        let mut by_basename: HashMap<String, Vec<String>> = HashMap::new();
        let mut symbols = HashMap::new();
        for path in files {
            by_basename
                .entry(base_name(path).to_string())
                .or_default()
                .push(path.clone());
            let syms = sources
                .content(path)
                .map(declared_symbols)
                .unwrap_or_default();
            symbols.insert(path.clone(), syms);
        }
        CppIndex {
            file_set: files.iter().cloned().collect(),
            files: files.to_vec(),
            by_basename,
            symbols,
        }
    }

    /// Ordered include search: importer-relative, workspace-relative, the
    /// conventional include roots, path-suffix match, then unique basename.
    fn resolve(&self, importer: &str, include_path: &str) -> Option<String> {
        let relative = join_relative(parent_dir(importer), include_path);
        if self.file_set.contains(&relative) {
            return Some(relative);
        }
        let from_root = join_relative("", include_path);
        if self.file_set.contains(&from_root) {
            return Some(from_root);
        }
        for root in INCLUDE_ROOTS {
            let candidate = join_relative(root, include_path);
            if self.file_set.contains(&candidate) {
                return Some(candidate);
            }
        }
        let suffix = format!("/{}", from_root);
        if let Some(hit) = self.files.iter().find(|f| f.ends_with(&suffix)) {
            return Some(hit.clone());
        }
        let base = base_name(include_path).to_string();
        if let Some(named) = self.by_basename.get(&base) {
            if named.len() == 1 {
                return Some(named[0].clone());
            }
            let dir_hint = parent_dir(include_path);
            if !dir_hint.is_empty() {
                let wanted = format!("/{}/", dir_hint);
                let sharing: Vec<&String> =
                    named.iter().filter(|f| f.contains(&wanted)).collect();
                if sharing.len() == 1 {
                    return Some(sharing[0].clone());
                }
            }
        }
        None
    }
}

pub struct CppAnalyzer;

impl LanguageAnalyzer for CppAnalyzer {
    fn tag(&self) -> Lang {
        Lang::Cpp
    }

    fn analyze_all(
        &self,
        files: &[String],
        sources: &SourceSet,
        ctx: &AnalyzeContext<'_>,
    ) -> anyhow::Result<LanguageResult> {
        let mut result = LanguageResult::default();
        let index = CppIndex::build(files, sources);
        ctx.sink
            .info(format!("cpp: indexed {} headers and sources", index.files.len()));
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
                .insert(path.clone(), c_family_score(Lang::Cpp, source));
            let counts = if ctx.fast_path {
                HashMap::new()
            } else {
                word_counts(source)
            };
            for include in parse_includes(source) {
                if !include.quoted && STD_HEADER.is_match(&include.path) {
                    continue;
                }
                let Some(target) = index.resolve(path, &include.path) else {
                    continue;
                };
                // An include names no symbols, so each directive is
                // weighted by how often the header's names occur.
                let weight = if ctx.fast_path {
                    1
                } else {
                    index
                        .symbols
                        .get(&target)
                        .map(|syms| usage_weight(&counts, syms).max(1))
                        .unwrap_or(1)
                };
                result.add_edge(path, &target, weight, ctx.fast_path);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_directives_parse() {
        let src = "#include \"lib/foo.hpp\"\n  #  include <vector>\n#include <project/api.h>\n";
        let includes = parse_includes(src);
        assert_eq!(
            includes,
            vec![
                Include {
                    path: "lib/foo.hpp".into(),
                    quoted: true
                },
                Include {
                    path: "vector".into(),
                    quoted: false
                },
                Include {
                    path: "project/api.h".into(),
                    quoted: false
                },
            ]
        );
    }

    #[test]
    fn std_headers_recognised() {
        for h in ["vector", "cstdio", "string.h", "sys/types.h", "unistd.h", "windows.h"] {
            assert!(STD_HEADER.is_match(h), "{} should be standard", h);
        }
        for h in ["project/api.h", "foo.hpp", "mylib.h"] {
            assert!(!STD_HEADER.is_match(h), "{} should be a candidate", h);
        }
    }

    #[test]
    fn declared_symbol_scan() {
        let src = "#pragma once\n#define MAX_DEPTH 4\nclass Engine { };\nstruct Frame;\ntypedef unsigned long tick_t;\nusing Clock = std::chrono::steady_clock;\n";
        let syms = declared_symbols(src);
        for s in ["MAX_DEPTH", "Engine", "Frame", "tick_t", "Clock"] {
            assert!(syms.contains(s), "missing {}", s);
        }
    }

    #[test]
    fn resolution_order() {
        let files = vec![
            "include/lib/foo.hpp".to_string(),
            "src/detail/bar.hpp".to_string(),
            "src/a.cpp".to_string(),
            "only/here/unique.hpp".to_string(),
        ];
        let tmp = tempfile::TempDir::new().expect("tmpdir");
        let sources = crate::source::SourceSet::read(
            tmp.path(),
            &files,
            Some(1),
            &crate::progress::CancelFlag::new(),
        );
        let index = CppIndex::build(&files, &sources);
        // Common include roots.
        assert_eq!(
            index.resolve("src/a.cpp", "lib/foo.hpp"),
            Some("include/lib/foo.hpp".to_string())
        );
        // Importer-relative.
        assert_eq!(
            index.resolve("src/a.cpp", "detail/bar.hpp"),
            Some("src/detail/bar.hpp".to_string())
        );
        // Unique basename.
        assert_eq!(
            index.resolve("src/a.cpp", "unique.hpp"),
            Some("only/here/unique.hpp".to_string())
        );
        assert_eq!(index.resolve("src/a.cpp", "missing.hpp"), None);
    }
}
