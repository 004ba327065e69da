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

use std::collections::HashMap;

use crate::analyzer::common::base_name;
use crate::analyzer::{AnalyzeContext, LanguageAnalyzer, LanguageResult};
use crate::complexity::c_family_score;
use crate::filter::Lang;
use crate::source::SourceSet;

/// Import roots that never resolve inside the repository.
const JAVA_EXTERNAL_PREFIXES: &[&str] = &[
    "java.",
    "javax.",
    "org.junit.",
    "org.mockito.",
    "org.apache.commons.",
    "org.apache.log4j.",
];

/// One `import` statement, already trimmed of `static` and `;`.
/// `a.b.C` or `a.b.C.member` for static imports; wildcards are dropped at
/// parse time.
fn parse_imports(source: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in source.lines() {
        let t = line.trim();
        let Some(rest) = t.strip_prefix("import ") else {
            continue;
        };
        let mut rest = rest.trim();
        let is_static = if let Some(r) = rest.strip_prefix("static ") {
            rest = r.trim();
            true
        } else {
            false
        };
        let rest = match rest.find(';') {
            Some(i) => rest[..i].trim(),
            None => rest,
        };
        if rest.is_empty() || rest.ends_with(".*") || rest == "*" {
            // Package wildcards have no cheap file resolution; dropped.
            continue;
        }
        let path = if is_static {
            // `import static a.b.C.member;` targets the class C.
            match rest.rsplit_once('.') {
                Some((class_path, _member)) => class_path.to_string(),
                None => rest.to_string(),
            }
        } else {
            rest.to_string()
        };
        out.push(path);
    }
    out
}

fn is_external(import_path: &str) -> bool {
    JAVA_EXTERNAL_PREFIXES
        .iter()
        .any(|p| import_path.starts_with(p))
}

struct JavaIndex {
    files: Vec<String>,
    /// `Basket.java` -> number of files with that basename; only a unique
    /// basename is trusted as a fallback target.
    basename_counts: HashMap<String, u32>,
    basename_first: HashMap<String, String>,
}

impl JavaIndex {
    fn build(files: &[String]) -> JavaIndex {
        let mut basename_counts: HashMap<String, u32> = HashMap::new();
        let mut basename_first: HashMap<String, String> = HashMap::new();
        for path in files {
            let base = base_name(path).to_string();
            *basename_counts.entry(base.clone()).or_insert(0) += 1;
            basename_first.entry(base).or_insert_with(|| path.clone());
        }
        JavaIndex {
            files: files.to_vec(),
            basename_counts,
            basename_first,
        }
    }

    /// `a.b.C` -> the file whose path ends with `a/b/C.java`, else the
    /// unique file named `C.java`.
    fn resolve(&self, import_path: &str) -> Option<&String> {
        let suffix = format!("{}.java", import_path.replace('.', "/"));
        let mut matches = self
            .files
            .iter()
            .filter(|f| f.as_str() == suffix || f.ends_with(&format!("/{}", suffix)));
        if let Some(hit) = matches.next() {
            return Some(hit);
        }
        let base = format!("{}.java", import_path.rsplit('.').next().unwrap_or(import_path));
        if self.basename_counts.get(&base).copied() == Some(1) {
            return self.basename_first.get(&base);
        }
        None
    }
}

pub struct JavaAnalyzer;

impl LanguageAnalyzer for JavaAnalyzer {
    fn tag(&self) -> Lang {
        Lang::Java
    }

    fn analyze_all(
        &self,
        files: &[String],
        sources: &SourceSet,
        ctx: &AnalyzeContext<'_>,
    ) -> anyhow::Result<LanguageResult> {
        let mut result = LanguageResult::default();
        let index = JavaIndex::build(files);
        ctx.sink
            .info(format!("java: indexed {} classes", index.files.len()));
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
                .insert(path.clone(), c_family_score(Lang::Java, source));
            for import_path in parse_imports(source) {
                if is_external(&import_path) {
                    continue;
                }
                if let Some(target) = index.resolve(&import_path) {
                    // The clause names exactly one class (or one static
                    // member), so it contributes weight 1.
                    result.add_edge(path, target, 1, ctx.fast_path);
                }
            }
        }
        Ok(result)
    }
}
