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
fn repeated_include_sums_unit_weights() {
    let repo = write_repo(&[
        ("include/lib/foo.hpp", "#pragma once\n"),
        (
            "src/a.cpp",
            "#include \"lib/foo.hpp\"\n#include \"lib/foo.hpp\"\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "src/a.cpp", "include/lib/foo.hpp"), Some(2));
}

#[test]
fn include_weighs_header_symbol_usage() {
    let repo = write_repo(&[
        (
            "include/engine.hpp",
            "#pragma once\nclass Engine { public: void start(); };\n",
        ),
        (
            "src/main.cpp",
            "#include \"engine.hpp\"\nint main() { Engine a; Engine b; a.start(); }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    // Two whole-word occurrences of Engine.
    assert_eq!(dep(&payload, "src/main.cpp", "include/engine.hpp"), Some(2));
}

#[test]
fn angled_standard_headers_skipped_project_headers_kept() {
    let repo = write_repo(&[
        ("include/project/api.h", "#pragma once\nstruct Api;\n"),
        (
            "src/use.cpp",
            "#include <vector>\n#include <string>\n#include <project/api.h>\nApi* make();\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(payload.files["src/use.cpp"].dependencies.len(), 1);
    assert_eq!(
        dep(&payload, "src/use.cpp", "include/project/api.h"),
        Some(1)
    );
}

#[test]
fn importer_relative_include_wins() {
    let repo = write_repo(&[
        ("src/detail/impl.hpp", "#pragma once\n"),
        ("src/a.cpp", "#include \"detail/impl.hpp\"\n"),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "src/a.cpp", "src/detail/impl.hpp"), Some(1));
}

#[test]
fn unique_basename_fallback() {
    let repo = write_repo(&[
        ("deep/nested/rare.hpp", "#pragma once\n"),
        ("src/a.cpp", "#include \"rare.hpp\"\n"),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "src/a.cpp", "deep/nested/rare.hpp"), Some(1));
}

#[test]
fn self_include_produces_no_edge() {
    let repo = write_repo(&[(
        "src/solo.cpp",
        "#include \"solo.cpp\"\nint main() { return 0; }\n",
    )]);
    let payload = analyze(repo.path());
    assert!(payload.files["src/solo.cpp"].dependencies.is_empty());
}
