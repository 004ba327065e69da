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

//! Turns the flat admitted-file list into the ordered display tree:
//! pre-order, siblings sorted lexicographically, directories ahead of
//! their children, dotted-decimal outline ids.

use std::collections::BTreeMap;

use crate::payload::DisplayItem;

#[derive(Default)]
struct Node {
    children: BTreeMap<String, Node>,
    is_file: bool,
}

impl Node {
    fn insert(&mut self, segments: &[&str]) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        let child = self.children.entry(head.to_string()).or_default();
        if rest.is_empty() {
            child.is_file = true;
        } else {
            child.insert(rest);
        }
    }
}

/// Build the ordered display list and the flat file list its
/// `file_indices` refer to. Input order does not matter; output is fully
/// determined by the path set.
pub fn build(paths: &[String]) -> (Vec<DisplayItem>, Vec<String>) {
    let mut root = Node::default();
    for path in paths {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        root.insert(&segments);
    }
    let mut items = Vec::new();
    let mut file_list = Vec::new();
    flatten(&root, "", "", 0, &mut items, &mut file_list);
    (items, file_list)
}

fn flatten(
    node: &Node,
    prefix: &str,
    id_prefix: &str,
    depth: u32,
    items: &mut Vec<DisplayItem>,
    file_list: &mut Vec<String>,
) -> Vec<usize> {
    let mut covered = Vec::new();
    for (sibling_index, (name, child)) in node.children.iter().enumerate() {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };
        let id = if id_prefix.is_empty() {
            format!("{}", sibling_index + 1)
        } else {
            format!("{}.{}", id_prefix, sibling_index + 1)
        };
        if child.is_file {
            let index = file_list.len();
            file_list.push(path.clone());
            covered.push(index);
            items.push(DisplayItem {
                path,
                display_name: name.clone(),
                indent: depth,
                is_directory: false,
                file_indices: vec![index],
                id,
                show_in_matrix: true,
            });
        } else {
            // Directory rows are emitted before their children; the
            // subtree's indices are patched in afterwards.
            let slot = items.len();
            items.push(DisplayItem {
                path: path.clone(),
                display_name: name.clone(),
                indent: depth,
                is_directory: true,
                file_indices: Vec::new(),
                id: id.clone(),
                show_in_matrix: false,
            });
            let subtree = flatten(child, &path, &id, depth + 1, items, file_list);
            items[slot].file_indices = subtree.clone();
            covered.extend(subtree);
        }
    }
    covered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn outline_ids_and_indents() {
        let (items, file_list) = build(&paths(&["a/x.ts", "a/y.ts", "b/z.ts"]));
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "1.1", "1.2", "2", "2.1"]);
        let dirs: Vec<bool> = items.iter().map(|i| i.is_directory).collect();
        assert_eq!(dirs, vec![true, false, false, true, false]);
        let indents: Vec<u32> = items.iter().map(|i| i.indent).collect();
        assert_eq!(indents, vec![0, 1, 1, 0, 1]);
        assert_eq!(file_list, paths(&["a/x.ts", "a/y.ts", "b/z.ts"]));
    }

    #[test]
    fn directory_covers_its_subtree() {
        let (items, file_list) = build(&paths(&["p/q/one.py", "p/two.py", "zed.py"]));
        // Pre-order: p, p/q, p/q/one.py, p/two.py, zed.py
        assert_eq!(items[0].path, "p");
        assert_eq!(items[0].file_indices, vec![0, 1]);
        assert_eq!(items[1].path, "p/q");
        assert_eq!(items[1].file_indices, vec![0]);
        assert_eq!(items[4].path, "zed.py");
        assert_eq!(items[4].file_indices, vec![2]);
        assert_eq!(file_list, paths(&["p/q/one.py", "p/two.py", "zed.py"]));
    }

    #[test]
    fn siblings_sort_lexicographically_regardless_of_kind() {
        let (items, _) = build(&paths(&["b.py", "a/c.py"]));
        let order: Vec<&str> = items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(order, vec!["a", "a/c.py", "b.py"]);
    }

    #[test]
    fn build_is_idempotent() {
        let input = paths(&["m/a.go", "m/b.go", "n/c.go"]);
        let first = build(&input);
        let second = build(&input);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn empty_input_yields_empty_tree() {
        let (items, file_list) = build(&[]);
        assert!(items.is_empty());
        assert!(file_list.is_empty());
    }
}
