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

pub mod common;
pub mod cpp;
pub mod csharp;
pub mod go;
pub mod java;
pub mod js;
pub mod python;

use std::collections::BTreeMap;
use std::path::Path;

use crate::filter::Lang;
use crate::options::AnalyzeOptions;
use crate::progress::{CancelFlag, ProgressSink};
use crate::source::SourceSet;

/// Per-run context handed to each analyzer.
pub struct AnalyzeContext<'a> {
    pub root: &'a Path,
    pub options: &'a AnalyzeOptions,
    /// Set when the admitted-file count exceeds the large-repo threshold;
    /// analyzers then pin every resolved edge to weight 1 and skip
    /// symbol-usage counting.
    pub fast_path: bool,
    pub sink: &'a ProgressSink,
    pub cancel: &'a CancelFlag,
}

/// Output of one language's two-pass run: importer path -> target path ->
/// summed weight, plus the per-file cyclomatic score.
#[derive(Debug, Default)]
pub struct LanguageResult {
    pub edges: BTreeMap<String, BTreeMap<String, u32>>,
    pub complexity: BTreeMap<String, u32>,
}

impl LanguageResult {
    /// Record one clause's contribution. Self-edges are dropped here so no
    /// analyzer has to remember; under the fast path the weight is pinned
    /// instead of summed.
    pub fn add_edge(&mut self, source: &str, target: &str, weight: u32, fast_path: bool) {
        if source == target || weight == 0 {
            return;
        }
        let slot = self
            .edges
            .entry(source.to_string())
            .or_default()
            .entry(target.to_string())
            .or_insert(0);
        if fast_path {
            *slot = 1;
        } else {
            *slot += weight;
        }
    }
}

/// One analyzer per language tag; all implement the same two-pass
/// protocol: build the language index over every file first, then resolve
/// imports against the completed index.
pub trait LanguageAnalyzer: Send + Sync {
    fn tag(&self) -> Lang;

    fn analyze_all(
        &self,
        files: &[String],
        sources: &SourceSet,
        ctx: &AnalyzeContext<'_>,
    ) -> anyhow::Result<LanguageResult>;
}

/// The fixed analyzer registry. Extensions in the `other` bucket are
/// admitted by the filter but have no entry here; adding a language means
/// adding one module and one line below.
pub fn registry() -> Vec<Box<dyn LanguageAnalyzer>> {
    vec![
        Box::new(js::JsAnalyzer),
        Box::new(python::PythonAnalyzer),
        Box::new(cpp::CppAnalyzer),
        Box::new(java::JavaAnalyzer),
        Box::new(csharp::CSharpAnalyzer),
        Box::new(go::GoAnalyzer),
    ]
}
