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
fn namespace_using_weighs_type_occurrences() {
    let repo = write_repo(&[
        (
            "Core/Entities/Basket.cs",
            "namespace MyApp.Core.Entities;\npublic class Basket {}\n",
        ),
        (
            "Web/Controller.cs",
            "using MyApp.Core.Entities;\nclass C { Basket b; Basket f() => new Basket(); }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    // Three whole-word occurrences of Basket in the controller.
    assert_eq!(
        dep(&payload, "Web/Controller.cs", "Core/Entities/Basket.cs"),
        Some(3)
    );
}

#[test]
fn namespace_using_reaches_every_member_file() {
    let repo = write_repo(&[
        (
            "Core/Basket.cs",
            "namespace Shop.Core;\npublic class Basket {}\n",
        ),
        (
            "Core/Order.cs",
            "namespace Shop.Core;\npublic class Order {}\n",
        ),
        (
            "Web/Page.cs",
            "using Shop.Core;\nclass Page { Basket b; Order o1; Order o2; }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "Web/Page.cs", "Core/Basket.cs"), Some(1));
    assert_eq!(dep(&payload, "Web/Page.cs", "Core/Order.cs"), Some(2));
}

#[test]
fn type_using_and_alias_resolve_to_one_file() {
    let repo = write_repo(&[
        (
            "Core/Entities/Basket.cs",
            "namespace MyApp.Core.Entities\n{\n    public class Basket {}\n}\n",
        ),
        (
            "Web/A.cs",
            "using MyApp.Core.Entities.Basket;\nclass A { }\n",
        ),
        (
            "Web/B.cs",
            "using B = MyApp.Core.Entities.Basket;\nclass HolderB { }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert_eq!(dep(&payload, "Web/A.cs", "Core/Entities/Basket.cs"), Some(1));
    assert_eq!(dep(&payload, "Web/B.cs", "Core/Entities/Basket.cs"), Some(1));
}

#[test]
fn using_static_weighs_usage() {
    let repo = write_repo(&[
        (
            "Util/Guard.cs",
            "namespace MyApp.Util;\npublic static class Guard {\n    public static void Check() {}\n}\n",
        ),
        (
            "Web/D.cs",
            "using static MyApp.Util.Guard;\nclass D { void M() { Guard.Check(); Guard.Check(); } }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    // One occurrence in the directive plus two qualified uses.
    assert_eq!(dep(&payload, "Web/D.cs", "Util/Guard.cs"), Some(3));
}

#[test]
fn system_and_test_framework_usings_skipped() {
    let repo = write_repo(&[
        (
            "App/Service.cs",
            "namespace MyApp;\npublic class Service {}\n",
        ),
        (
            "App/Tests.cs",
            "using System;\nusing System.Text.Json;\nusing Xunit;\nusing Moq;\nusing Microsoft.Extensions.Logging;\nnamespace MyApp;\nclass Tests { }\n",
        ),
    ]);
    let payload = analyze(repo.path());
    assert!(payload.files["App/Tests.cs"].dependencies.is_empty());
}
