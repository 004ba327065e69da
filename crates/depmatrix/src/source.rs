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

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::HashMap;
use std::path::Path;

use crate::options::thread_cap;
use crate::progress::CancelFlag;

/// In-memory view of every admitted file, read once after filtering.
///
/// The workspace is read-only from this point on; analyzers and the
/// aggregator all work from these contents so a run is deterministic even
/// if the underlying tree changes mid-flight.
pub struct SourceSet {
    paths: Vec<String>,
    contents: HashMap<String, String>,
    line_counts: HashMap<String, u32>,
}

impl SourceSet {
    /// Reads are a suspension point: the flag is polled before each file,
    /// so a cancel mid-read stops touching the disk. Files skipped that
    /// way stay contentless; the caller checks the flag after the read.
    pub fn read(
        root: &Path,
        files: &[String],
        threads: Option<usize>,
        cancel: &CancelFlag,
    ) -> SourceSet {
        let cap = thread_cap(threads);
        let read_entry = |(idx, rel): (usize, &String)| {
            if cancel.is_cancelled() {
                return (idx, rel.clone(), None);
            }
            (idx, rel.clone(), read_one(root, rel))
        };
        let mut loaded: Vec<(usize, String, Option<String>)> =
            if let Ok(pool) = ThreadPoolBuilder::new().num_threads(cap).build() {
                pool.install(|| files.par_iter().enumerate().map(read_entry).collect())
            } else {
                files.par_iter().enumerate().map(read_entry).collect()
            };
        loaded.sort_by_key(|(idx, _, _)| *idx);

        let mut paths = Vec::with_capacity(files.len());
        let mut contents = HashMap::with_capacity(files.len());
        let mut line_counts = HashMap::with_capacity(files.len());
        for (_, rel, body) in loaded {
            match body {
                Some(text) => {
                    line_counts.insert(rel.clone(), significant_lines(&text));
                    contents.insert(rel.clone(), text);
                }
                None => {
                    if !cancel.is_cancelled() {
                        log::warn!("failed to read {}; treating as empty", rel);
                    }
                    line_counts.insert(rel.clone(), 0);
                }
            }
            paths.push(rel);
        }
        SourceSet {
            paths,
            contents,
            line_counts,
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// `None` when the file could not be read; callers treat that as a
    /// per-file parse failure.
    pub fn content(&self, path: &str) -> Option<&str> {
        self.contents.get(path).map(|s| s.as_str())
    }

    pub fn line_count(&self, path: &str) -> u32 {
        self.line_counts.get(path).copied().unwrap_or(0)
    }
}

fn read_one(root: &Path, rel: &str) -> Option<String> {
    let full = root.join(rel);
    let bytes = std::fs::read(&full).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Count of lines whose trimmed form is non-empty.
fn significant_lines(text: &str) -> u32 {
    text.lines().filter(|l| !l.trim().is_empty()).count() as u32
}
