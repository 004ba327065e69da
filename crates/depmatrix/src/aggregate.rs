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

use std::collections::BTreeMap;

use crate::analyzer::LanguageResult;
use crate::filter::Lang;
use crate::payload::{DependencyRef, DsmPayload, FileSummary};
use crate::source::SourceSet;

/// Final per-file record; immutable once the aggregator has produced it.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    pub language: Lang,
    pub line_count: u32,
    pub complexity: u32,
    /// target path -> positive weight; self-edges already dropped.
    pub dependencies: BTreeMap<String, u32>,
}

/// Merge the per-language results into one record per admitted file. Every
/// edge target is guaranteed to be a key of the returned map: analyzers
/// only resolve within their own bucket, and anything else is discarded
/// here.
pub fn aggregate(
    buckets: &BTreeMap<Lang, Vec<String>>,
    results: &BTreeMap<Lang, LanguageResult>,
    sources: &SourceSet,
) -> BTreeMap<String, FileRecord> {
    let mut records: BTreeMap<String, FileRecord> = BTreeMap::new();
    for (lang, files) in buckets {
        if *lang == Lang::Other {
            continue;
        }
        let result = results.get(lang);
        for path in files {
            let complexity = result
                .and_then(|r| r.complexity.get(path))
                .copied()
                .unwrap_or(0);
            records.insert(
                path.clone(),
                FileRecord {
                    path: path.clone(),
                    language: *lang,
                    line_count: sources.line_count(path),
                    complexity,
                    dependencies: BTreeMap::new(),
                },
            );
        }
    }
    for result in results.values() {
        for (source_path, targets) in &result.edges {
            if !records.contains_key(source_path) {
                continue;
            }
            let filtered: BTreeMap<String, u32> = targets
                .iter()
                .filter(|(target, weight)| {
                    **weight > 0 && *target != source_path && records.contains_key(*target)
                })
                .map(|(t, w)| (t.clone(), *w))
                .collect();
            if let Some(record) = records.get_mut(source_path) {
                for (target, weight) in filtered {
                    *record.dependencies.entry(target).or_insert(0) += weight;
                }
            }
        }
    }
    records
}

/// Shape the records plus the display tree into the delivered payload.
pub fn into_payload(
    records: BTreeMap<String, FileRecord>,
    display_items: Vec<crate::payload::DisplayItem>,
    file_list: Vec<String>,
    branch: String,
) -> DsmPayload {
    let files = records
        .into_iter()
        .map(|(path, record)| {
            let dependencies = record
                .dependencies
                .into_iter()
                .map(|(file_name, weight)| DependencyRef {
                    file_name,
                    dependencies: weight,
                })
                .collect();
            (
                path,
                FileSummary {
                    complexity: record.complexity,
                    line_count: record.line_count,
                    dependencies,
                },
            )
        })
        .collect();
    DsmPayload {
        files,
        display_items,
        file_list,
        branch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::CancelFlag;
    use crate::source::SourceSet;
    use std::fs;
    use tempfile::TempDir;

    fn sources_for(entries: &[(&str, &str)]) -> (TempDir, SourceSet) {
        let tmp = TempDir::new().expect("tmpdir");
        let mut files = Vec::new();
        for (rel, body) in entries {
            let full = tmp.path().join(rel);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("mkdir");
            }
            fs::write(full, body).expect("write");
            files.push(rel.to_string());
        }
        let set = SourceSet::read(tmp.path(), &files, Some(1), &CancelFlag::new());
        (tmp, set)
    }

    #[test]
    fn edges_to_unknown_targets_are_dropped() {
        let (_tmp, sources) = sources_for(&[("a.py", "import b\n"), ("b.py", "x = 1\n")]);
        let mut buckets = BTreeMap::new();
        buckets.insert(Lang::Python, vec!["a.py".to_string(), "b.py".to_string()]);
        let mut result = LanguageResult::default();
        result.add_edge("a.py", "b.py", 2, false);
        result.add_edge("a.py", "ghost.py", 5, false);
        result.complexity.insert("a.py".to_string(), 1);
        result.complexity.insert("b.py".to_string(), 1);
        let mut results = BTreeMap::new();
        results.insert(Lang::Python, result);

        let records = aggregate(&buckets, &results, &sources);
        assert_eq!(records["a.py"].dependencies.len(), 1);
        assert_eq!(records["a.py"].dependencies["b.py"], 2);
        assert_eq!(records["b.py"].line_count, 1);
    }

    #[test]
    fn files_without_results_get_zero_complexity() {
        let (_tmp, sources) = sources_for(&[("x.rb", "puts 1\n"), ("m.py", "pass\n")]);
        let mut buckets = BTreeMap::new();
        buckets.insert(Lang::Other, vec!["x.rb".to_string()]);
        buckets.insert(Lang::Python, vec!["m.py".to_string()]);
        let results = BTreeMap::new();

        let records = aggregate(&buckets, &results, &sources);
        assert!(!records.contains_key("x.rb"), "other-bucket files are skipped");
        assert_eq!(records["m.py"].complexity, 0);
        assert_eq!(records["m.py"].line_count, 1);
    }
}
