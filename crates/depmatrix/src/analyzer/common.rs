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

//! Helpers shared by the language analyzers: quoted-module extraction,
//! whole-word usage counting for wildcard imports, and POSIX path algebra
//! over repository-relative paths.

use std::collections::{BTreeSet, HashMap};

/// First quoted span in `s`, honouring either quote character.
pub fn extract_quoted(s: &str) -> Option<String> {
    let mut current = None;
    for (i, ch) in s.char_indices() {
        if ch == '"' || ch == '\'' {
            match current {
                None => current = Some((ch, i)),
                Some((qc, start)) if qc == ch => return Some(s[start + 1..i].to_string()),
                Some(_) => {}
            }
        }
    }
    None
}

/// Multiset of identifier-like tokens in `source`. Tokens split on anything
/// that is not alphanumeric or `_`, so `ns.foo()` yields `ns` and `foo`.
pub fn word_counts(source: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for tok in source.split(|c: char| !c.is_alphanumeric() && c != '_') {
        if tok.is_empty() {
            continue;
        }
        *counts.entry(tok.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Wildcard-import weight: total occurrences of the target's exported
/// symbols as whole-word tokens in the importing file.
pub fn usage_weight(counts: &HashMap<String, u32>, symbols: &BTreeSet<String>) -> u32 {
    symbols
        .iter()
        .map(|s| counts.get(s).copied().unwrap_or(0))
        .sum()
}

/// Collapse `.` and `..` segments; input and output use forward slashes.
pub fn normalize_posix(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            _ => stack.push(part),
        }
    }
    stack.join("/")
}

/// Directory part of a repo-relative path ("" at the root).
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Basename of a repo-relative path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Resolve `rel` against `base_dir` and normalize.
pub fn join_relative(base_dir: &str, rel: &str) -> String {
    if base_dir.is_empty() {
        normalize_posix(rel)
    } else {
        normalize_posix(&format!("{}/{}", base_dir, rel))
    }
}
