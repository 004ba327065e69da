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
use std::collections::BTreeMap;

use crate::options::AnalyzeOptions;

/// Language tag a file is dispatched under. `Other` extensions are admitted
/// by the allow-list but have no registered analyzer and are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang {
    Js,
    Python,
    Cpp,
    Java,
    CSharp,
    Go,
    Other,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Js => "js",
            Lang::Python => "python",
            Lang::Cpp => "cpp",
            Lang::Java => "java",
            Lang::CSharp => "csharp",
            Lang::Go => "go",
            Lang::Other => "other",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Lang> {
        match ext {
            "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" | "vue" => Some(Lang::Js),
            "py" => Some(Lang::Python),
            "cpp" | "cc" | "cxx" | "c" | "h" | "hpp" | "hxx" | "hh" => Some(Lang::Cpp),
            "java" => Some(Lang::Java),
            "cs" => Some(Lang::CSharp),
            "go" => Some(Lang::Go),
            "rs" | "rb" | "php" | "swift" | "kt" | "scala" => Some(Lang::Other),
            _ => None,
        }
    }
}

/// Directory names excluded wherever they appear in a path.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    "vendor",
    "dist",
    "build",
    ".git",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
];

static MINIFIED_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\.min\.js|\.bundle\.js)$").unwrap());

// Only consulted when include_tests is off.
const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec"];
static TEST_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\.(?:spec|test)\.[^/.]+|_test\.go)$").unwrap());

fn extension(path: &str) -> Option<&str> {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => Some(ext),
        _ => None,
    }
}

/// Language tag for an admitted path, or `None` when the file is filtered
/// out. Paths are repository-relative with forward slashes.
pub fn admit(path: &str, opts: &AnalyzeOptions) -> Option<Lang> {
    let ext = extension(path)?;
    let lang = Lang::from_extension(&ext.to_ascii_lowercase())?;
    for segment in path.split('/') {
        if EXCLUDED_DIRS.contains(&segment) {
            return None;
        }
        if !opts.include_tests && TEST_DIRS.contains(&segment) {
            return None;
        }
    }
    if MINIFIED_FILE.is_match(path) {
        return None;
    }
    if !opts.include_tests && TEST_FILE.is_match(path) {
        return None;
    }
    Some(lang)
}

/// Partition the raw file list into per-language buckets. Bucket order and
/// order within a bucket are deterministic (tag order, then path order).
pub fn partition(files: &[String], opts: &AnalyzeOptions) -> BTreeMap<Lang, Vec<String>> {
    let mut buckets: BTreeMap<Lang, Vec<String>> = BTreeMap::new();
    for path in files {
        if let Some(lang) = admit(path, opts) {
            buckets.entry(lang).or_default().push(path.clone());
        }
    }
    for bucket in buckets.values_mut() {
        bucket.sort();
        bucket.dedup();
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> AnalyzeOptions {
        AnalyzeOptions::default()
    }

    #[test]
    fn extensions_map_to_tags() {
        assert_eq!(admit("src/app.tsx", &opts()), Some(Lang::Js));
        assert_eq!(admit("lib/widget.vue", &opts()), Some(Lang::Js));
        assert_eq!(admit("main.py", &opts()), Some(Lang::Python));
        assert_eq!(admit("core/engine.hpp", &opts()), Some(Lang::Cpp));
        assert_eq!(admit("A/B/C.java", &opts()), Some(Lang::Java));
        assert_eq!(admit("Web/Controller.cs", &opts()), Some(Lang::CSharp));
        assert_eq!(admit("cmd/main.go", &opts()), Some(Lang::Go));
        assert_eq!(admit("src/lib.rs", &opts()), Some(Lang::Other));
        assert_eq!(admit("README.md", &opts()), None);
        assert_eq!(admit("Makefile", &opts()), None);
    }

    #[test]
    fn excluded_directories_reject_any_segment() {
        assert_eq!(admit("node_modules/left-pad/index.js", &opts()), None);
        assert_eq!(admit("pkg/vendor/dep.go", &opts()), None);
        assert_eq!(admit("a/__pycache__/m.py", &opts()), None);
        assert_eq!(admit("a/b/.git/hook.py", &opts()), None);
    }

    #[test]
    fn minified_bundles_rejected() {
        assert_eq!(admit("dist2/app.min.js", &opts()), None);
        assert_eq!(admit("static/vendor.bundle.js", &opts()), None);
        assert_eq!(admit("static/app.js", &opts()), Some(Lang::Js));
    }

    #[test]
    fn test_files_rejected_only_when_flag_off() {
        let no_tests = AnalyzeOptions::builder().include_tests(false).build();
        assert_eq!(admit("src/app.test.ts", &opts()), Some(Lang::Js));
        assert_eq!(admit("src/app.test.ts", &no_tests), None);
        assert_eq!(admit("pkg/util_test.go", &no_tests), None);
        assert_eq!(admit("tests/fixture.py", &no_tests), None);
        assert_eq!(admit("src/app.ts", &no_tests), Some(Lang::Js));
    }

    #[test]
    fn partition_is_sorted_and_deduped() {
        let files = vec![
            "b.py".to_string(),
            "a.py".to_string(),
            "a.py".to_string(),
            "x.go".to_string(),
        ];
        let buckets = partition(&files, &opts());
        assert_eq!(buckets[&Lang::Python], vec!["a.py", "b.py"]);
        assert_eq!(buckets[&Lang::Go], vec!["x.go"]);
    }
}
