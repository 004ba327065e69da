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

//! Orchestrates one analysis run: fetch -> filter -> per-language
//! analyze -> aggregate -> hierarchy -> payload.

use std::collections::BTreeMap;
use std::path::Path;

use crate::aggregate;
use crate::analyzer::{registry, AnalyzeContext, LanguageResult};
use crate::error::PipelineError;
use crate::fetch;
use crate::filter::{self, Lang};
use crate::hierarchy;
use crate::options::AnalyzeOptions;
use crate::payload::DsmPayload;
use crate::progress::{CancelFlag, ProgressSink};
use crate::source::SourceSet;

/// Full run against a repository URL, emitting the terminal frame on the
/// sink. The reader always receives `Complete` or `Error`.
pub fn run_url(url: &str, opts: &AnalyzeOptions, sink: &ProgressSink, cancel: &CancelFlag) {
    deliver(analyze_url(url, opts, sink, cancel), sink);
}

/// Full run against a local directory (fetch bypass), with terminal frame.
pub fn run_dir(
    root: &Path,
    branch: &str,
    opts: &AnalyzeOptions,
    sink: &ProgressSink,
    cancel: &CancelFlag,
) {
    deliver(analyze_dir(root, branch, opts, sink, cancel), sink);
}

fn deliver(outcome: Result<DsmPayload, PipelineError>, sink: &ProgressSink) {
    match outcome {
        Ok(payload) => sink.finish(payload),
        Err(err) => {
            log::error!("pipeline failed: {}", err);
            sink.fail(err.to_string());
        }
    }
}

/// Clone and analyse. The workspace lives for exactly this call: created
/// before the fetch, removed on return — success, error or cancellation.
pub fn analyze_url(
    url: &str,
    opts: &AnalyzeOptions,
    sink: &ProgressSink,
    cancel: &CancelFlag,
) -> Result<DsmPayload, PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    let fetched = fetch::fetch_repository(url, opts, sink, cancel)?;
    analyze_files(
        fetched.workspace.root(),
        fetched.branch.clone(),
        fetched.files.clone(),
        opts,
        sink,
        cancel,
    )
}

/// Analyse an existing directory. Used by re-runs and tests; the directory
/// is treated as read-only.
pub fn analyze_dir(
    root: &Path,
    branch: &str,
    opts: &AnalyzeOptions,
    sink: &ProgressSink,
    cancel: &CancelFlag,
) -> Result<DsmPayload, PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    let files = fetch::list_local_files(root)?;
    analyze_files(root, branch.to_string(), files, opts, sink, cancel)
}

fn analyze_files(
    root: &Path,
    branch: String,
    files: Vec<String>,
    opts: &AnalyzeOptions,
    sink: &ProgressSink,
    cancel: &CancelFlag,
) -> Result<DsmPayload, PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    let buckets = filter::partition(&files, opts);
    let admitted: Vec<String> = buckets
        .iter()
        .filter(|(lang, _)| **lang != Lang::Other)
        .flat_map(|(_, bucket)| bucket.iter().cloned())
        .collect();
    if admitted.is_empty() {
        sink.info("No analyzable source files found");
        return Ok(DsmPayload::empty(branch));
    }
    sink.info(format!("Analyzing {} source files", admitted.len()));

    let sources = SourceSet::read(root, &admitted, opts.threads, cancel);
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    let fast_path = admitted.len() > opts.large_repo_threshold;
    if fast_path {
        log::info!(
            "{} admitted files exceed the threshold of {}; using unit edge weights",
            admitted.len(),
            opts.large_repo_threshold
        );
        sink.info("Large repository: using unit edge weights");
    }
    let ctx = AnalyzeContext {
        root,
        options: opts,
        fast_path,
        sink,
        cancel,
    };

    let mut results: BTreeMap<Lang, LanguageResult> = BTreeMap::new();
    for analyzer in registry() {
        let lang = analyzer.tag();
        let Some(bucket) = buckets.get(&lang) else {
            continue;
        };
        if bucket.is_empty() {
            continue;
        }
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        sink.info(format!(
            "Resolving imports for {} {} files",
            bucket.len(),
            lang.as_str()
        ));
        match analyzer.analyze_all(bucket, &sources, &ctx) {
            Ok(result) => {
                results.insert(lang, result);
            }
            Err(err) => {
                // One broken language never takes the run down.
                log::error!("{} analysis failed: {}", lang.as_str(), err);
                sink.info(format!("Skipping {} analysis: {}", lang.as_str(), err));
            }
        }
    }
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    let records = aggregate::aggregate(&buckets, &results, &sources);
    let paths: Vec<String> = records.keys().cloned().collect();
    let (display_items, file_list) = hierarchy::build(&paths);
    let payload = aggregate::into_payload(records, display_items, file_list, branch);
    sink.info("Analysis complete");
    Ok(payload)
}
