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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One outgoing dependency of a file. `dependencies` is the summed symbol
/// weight of all import clauses resolving to `file_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    pub file_name: String,
    pub dependencies: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub complexity: u32,
    pub line_count: u32,
    /// Sorted by `file_name`.
    pub dependencies: Vec<DependencyRef>,
}

/// One row of the hierarchical display list: a file or a directory node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub path: String,
    pub display_name: String,
    pub indent: u32,
    pub is_directory: bool,
    /// Indices into `DsmPayload::file_list` covered by this node; a file
    /// covers exactly itself, a directory its whole subtree.
    pub file_indices: Vec<usize>,
    /// Dotted-decimal outline id ("2.3.1").
    pub id: String,
    pub show_in_matrix: bool,
}

/// The delivered analysis result.
///
/// `files` keys, `file_list` entries and every `DependencyRef::file_name`
/// are repository-relative forward-slash paths over the same file set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsmPayload {
    pub files: BTreeMap<String, FileSummary>,
    pub display_items: Vec<DisplayItem>,
    pub file_list: Vec<String>,
    pub branch: String,
}

impl DsmPayload {
    /// Payload for a repository with no admitted files.
    pub fn empty(branch: String) -> Self {
        Self {
            files: BTreeMap::new(),
            display_items: Vec::new(),
            file_list: Vec::new(),
            branch,
        }
    }
}
