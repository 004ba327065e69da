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

pub const DEFAULT_LARGE_REPO_THRESHOLD: usize = 100;
pub const DEFAULT_MAX_REPO_BYTES: u64 = 200 * 1024 * 1024;
pub const DEFAULT_CLONE_DEPTH: u32 = 1;

/// Tunables for one analysis run. See the builder for defaults.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Admit test files and directories.
    pub include_tests: bool,
    /// Count TypeScript `import type` clauses.
    pub include_type_only_imports: bool,
    /// Above this many admitted files, edge weights are pinned to 1 and
    /// symbol-usage counting is skipped.
    pub large_repo_threshold: usize,
    /// Upper bound on the packed repository size, checked after clone.
    pub max_repo_bytes: u64,
    pub clone_depth: u32,
    /// Worker-pool cap; falls back to `DEPMATRIX_THREADS`, then to
    /// `min(available_parallelism, 8)`.
    pub threads: Option<usize>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            include_tests: true,
            include_type_only_imports: true,
            large_repo_threshold: DEFAULT_LARGE_REPO_THRESHOLD,
            max_repo_bytes: DEFAULT_MAX_REPO_BYTES,
            clone_depth: DEFAULT_CLONE_DEPTH,
            threads: None,
        }
    }
}

impl AnalyzeOptions {
    pub fn builder() -> AnalyzeOptionsBuilder {
        AnalyzeOptionsBuilder::default()
    }
}

#[derive(Default)]
pub struct AnalyzeOptionsBuilder {
    inner: Option<AnalyzeOptions>,
}

impl AnalyzeOptionsBuilder {
    fn opts(&mut self) -> &mut AnalyzeOptions {
        self.inner.get_or_insert_with(AnalyzeOptions::default)
    }

    pub fn include_tests(mut self, v: bool) -> Self {
        self.opts().include_tests = v;
        self
    }

    pub fn include_type_only_imports(mut self, v: bool) -> Self {
        self.opts().include_type_only_imports = v;
        self
    }

    pub fn large_repo_threshold(mut self, v: usize) -> Self {
        self.opts().large_repo_threshold = v;
        self
    }

    pub fn max_repo_bytes(mut self, v: u64) -> Self {
        self.opts().max_repo_bytes = v;
        self
    }

    pub fn clone_depth(mut self, v: u32) -> Self {
        self.opts().clone_depth = v.max(1);
        self
    }

    pub fn threads(mut self, v: usize) -> Self {
        self.opts().threads = Some(v.max(1));
        self
    }

    pub fn build(self) -> AnalyzeOptions {
        self.inner.unwrap_or_default()
    }
}

/// Effective worker-pool size for this run.
pub(crate) fn thread_cap(requested: Option<usize>) -> usize {
    let avail = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let default_cap = avail.min(8).max(1);
    let env_cap = std::env::var("DEPMATRIX_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .map(|n| n.max(1));
    requested
        .or(env_cap)
        .unwrap_or(default_cap)
        .min(avail)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let opts = AnalyzeOptions::builder().build();
        assert!(opts.include_tests);
        assert!(opts.include_type_only_imports);
        assert_eq!(opts.large_repo_threshold, 100);
        assert_eq!(opts.max_repo_bytes, 200 * 1024 * 1024);
        assert_eq!(opts.clone_depth, 1);
        assert!(opts.threads.is_none());
    }

    #[test]
    fn builder_overrides() {
        let opts = AnalyzeOptions::builder()
            .include_tests(false)
            .large_repo_threshold(5)
            .clone_depth(0)
            .threads(2)
            .build();
        assert!(!opts.include_tests);
        assert_eq!(opts.large_repo_threshold, 5);
        assert_eq!(opts.clone_depth, 1, "depth is clamped to >= 1");
        assert_eq!(opts.threads, Some(2));
    }
}
