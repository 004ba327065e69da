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
fn dotted_import_resolves_by_path_suffix() {
    let repo = write_repo(&[
        (
            "src/main/java/shop/cart/Basket.java",
            "package shop.cart;\npublic class Basket { }\n",
        ),
        (
            "src/main/java/shop/web/Controller.java",
            "package shop.web;\nimport shop.cart.Basket;\nclass Controller { Basket b; }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(
        dep(
            &payload,
            "src/main/java/shop/web/Controller.java",
            "src/main/java/shop/cart/Basket.java"
        ),
        Some(1)
    );
}

#[test]
fn static_import_targets_the_class_and_weights_sum() {
    let repo = write_repo(&[
        (
            "app/util/Checks.java",
            "package util;\npublic class Checks {\n    public static boolean ok() { return true; }\n}\n",
        ),
        (
            "app/Main.java",
            "import util.Checks;\nimport static util.Checks.ok;\nclass Main { }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(
        dep(&payload, "app/Main.java", "app/util/Checks.java"),
        Some(2)
    );
}

#[test]
fn unique_basename_fallback_resolves() {
    let repo = write_repo(&[
        (
            "lib/Helper.java",
            "package very.deep.pkg;\npublic class Helper { }\n",
        ),
        (
            "app/Main.java",
            "import very.deep.pkg.Helper;\nclass Main { Helper h; }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "app/Main.java", "lib/Helper.java"), Some(1));
}

#[test]
fn wildcard_and_stdlib_imports_are_dropped() {
    let repo = write_repo(&[
        ("pkg/A.java", "package pkg;\npublic class A { }\n"),
        (
            "Main.java",
            "import pkg.*;\nimport java.util.List;\nimport org.junit.Test;\nclass Main { }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert!(payload.files["Main.java"].dependencies.is_empty());
}

#[test]
fn ambiguous_basename_without_suffix_match_is_unresolved() {
    let repo = write_repo(&[
        ("one/Thing.java", "public class Thing { }\n"),
        ("two/Thing.java", "public class Thing { }\n"),
        (
            "Main.java",
            "import elsewhere.Thing;\nclass Main { Thing t; }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert!(payload.files["Main.java"].dependencies.is_empty());
}
