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

use std::fs::{create_dir_all, write};
use std::path::Path;
use tempfile::TempDir;

use depmatrix::{analyze_dir, AnalyzeOptions, CancelFlag, DsmPayload, ProgressSink};

fn write_repo(entries: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().expect("tmpdir");
    for (rel, body) in entries {
        let full = tmp.path().join(rel);
        if let Some(parent) = full.parent() {
            create_dir_all(parent).expect("mkdir");
        }
        write(full, body).expect("write");
    }
    tmp
}

fn analyze(root: &Path) -> DsmPayload {
    analyze_dir(
        root,
        "main",
        &AnalyzeOptions::default(),
        &ProgressSink::null(),
        &CancelFlag::new(),
    )
    .expect("analysis")
}

fn dep(payload: &DsmPayload, source: &str, target: &str) -> Option<u32> {
    payload.files[source]
        .dependencies
        .iter()
        .find(|d| d.file_name == target)
        .map(|d| d.dependencies)
}

#[test]
fn package_import_weighs_exported_symbol_usage() {
    let repo = write_repo(&[
        ("mod/util/u.go", "package util\n\nfunc Help() {}\n"),
        (
            "mod/main.go",
            "package main\n\nimport \"mod/util\"\n\nfunc main() { util.Help(); util.Help() }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "mod/main.go", "mod/util/u.go"), Some(2));
}

#[test]
fn blank_import_counts_one_per_file() {
    let repo = write_repo(&[
        ("driver/d.go", "package driver\n\nfunc init() {}\n"),
        (
            "main.go",
            "package main\n\nimport (\n    _ \"proj/driver\"\n)\n\nfunc main() {}\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "main.go", "driver/d.go"), Some(1));
}

#[test]
fn stdlib_imports_skipped() {
    let repo = write_repo(&[(
        "main.go",
        "package main\n\nimport (\n    \"fmt\"\n    \"encoding/json\"\n    \"net/http\"\n)\n\nfunc main() { fmt.Println(1) }\n",
    )]);
    let payload = analyze(repo.path());
    assert!(payload.files["main.go"].dependencies.is_empty());
}

#[test]
fn go_mod_module_prefix_maps_into_repo() {
    let repo = write_repo(&[
        ("go.mod", "module example.com/svc\n\ngo 1.22\n"),
        ("pkg/db/db.go", "package db\n\nfunc Open() {}\n"),
        (
            "cmd/main.go",
            "package main\n\nimport \"example.com/svc/pkg/db\"\n\nfunc main() { db.Open() }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "cmd/main.go", "pkg/db/db.go"), Some(1));
}

#[test]
fn third_party_host_imports_skipped() {
    let repo = write_repo(&[(
        "main.go",
        "package main\n\nimport \"github.com/elsewhere/lib\"\n\nfunc main() { lib.Do() }\n",
    )]);
    let payload = analyze(repo.path());
    assert!(payload.files["main.go"].dependencies.is_empty());
}

#[test]
fn package_with_multiple_files_gets_an_edge_each() {
    let repo = write_repo(&[
        ("store/reader.go", "package store\n\nfunc Read() {}\n"),
        ("store/writer.go", "package store\n\nfunc Write() {}\n"),
        (
            "main.go",
            "package main\n\nimport \"app/store\"\n\nfunc main() { store.Read(); store.Write(); store.Write() }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "main.go", "store/reader.go"), Some(1));
    assert_eq!(dep(&payload, "main.go", "store/writer.go"), Some(2));
}
