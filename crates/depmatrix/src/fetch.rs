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

use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;
use std::process::Stdio;

use crate::error::PipelineError;
use crate::options::AnalyzeOptions;
use crate::progress::{CancelFlag, ProgressSink};

/// Temporary root the repository is materialised into. Dropping it removes
/// the tree, so cleanup happens on every exit path.
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    pub(crate) fn create() -> Result<Workspace, PipelineError> {
        tempfile::TempDir::new()
            .map(|dir| Workspace { dir })
            .map_err(|e| PipelineError::Fetch(format!("failed to create workspace: {}", e)))
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

pub struct Fetched {
    pub workspace: Workspace,
    pub branch: String,
    /// Repository-relative forward-slash paths of all tracked files.
    pub files: Vec<String>,
}

/// Test hook mirroring a `git clone` invocation: receives (url, dst) and
/// returns the process output to classify.
pub(crate) type CloneRunner<'a> =
    dyn Fn(&str, &Path) -> std::io::Result<std::process::Output> + 'a;

/// Shallow-clone `url`, stream progress, enumerate tracked files. The
/// workspace is created first and owned by the result; any error drops it.
pub fn fetch_repository(
    url: &str,
    opts: &AnalyzeOptions,
    sink: &ProgressSink,
    cancel: &CancelFlag,
) -> Result<Fetched, PipelineError> {
    let workspace = Workspace::create()?;
    sink.info(format!("Cloning {}", url));
    run_clone(url, workspace.root(), opts.clone_depth, sink, cancel, None)?;
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    enforce_size_limit(workspace.root(), opts.max_repo_bytes)?;
    let branch = current_branch(workspace.root());
    let files = list_tracked_files(workspace.root())?;
    sink.info(format!("Fetched {} files on branch {}", files.len(), branch));
    Ok(Fetched {
        workspace,
        branch,
        files,
    })
}

/// Non-interactive `git clone --depth N --single-branch --no-tags`.
/// When `runner` is provided (tests), its output is classified without
/// streaming.
pub(crate) fn run_clone(
    url: &str,
    dst: &Path,
    depth: u32,
    sink: &ProgressSink,
    cancel: &CancelFlag,
    runner: Option<&CloneRunner>,
) -> Result<(), PipelineError> {
    if let Some(run) = runner {
        let output = run(url, dst)
            .map_err(|e| PipelineError::Fetch(format!("failed to spawn git clone: {}", e)))?;
        if output.status.success() {
            return Ok(());
        }
        return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
    }

    let mut cmd = std::process::Command::new("git");
    cmd.arg("clone")
        .arg("--depth")
        .arg(depth.max(1).to_string())
        .arg("--single-branch")
        .arg("--no-tags")
        .arg("--progress")
        .arg(url)
        .arg(dst);
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    if url.starts_with("git@") || url.starts_with("ssh://") {
        cmd.env("GIT_SSH_COMMAND", "ssh -o BatchMode=yes");
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .map_err(|e| PipelineError::Fetch(format!("failed to spawn git clone: {}", e)))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| PipelineError::Fetch("git clone produced no stderr handle".into()))?;

    let mut parser = CloneProgressParser::default();
    let mut tail: VecDeque<String> = VecDeque::new();
    let mut partial = String::new();
    let mut buf = [0u8; 4096];
    loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(PipelineError::Cancelled);
        }
        match stderr.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                // git writes progress with bare carriage returns.
                for ch in String::from_utf8_lossy(&buf[..n]).chars() {
                    if ch == '\r' || ch == '\n' {
                        if !partial.is_empty() {
                            if let Some(msg) = parser.observe(&partial) {
                                sink.info(msg);
                            }
                            tail.push_back(std::mem::take(&mut partial));
                            if tail.len() > 64 {
                                tail.pop_front();
                            }
                        }
                    } else {
                        partial.push(ch);
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    if !partial.is_empty() {
        tail.push_back(partial);
    }
    let status = child
        .wait()
        .map_err(|e| PipelineError::Fetch(format!("git clone did not finish: {}", e)))?;
    if status.success() {
        Ok(())
    } else {
        let stderr_text: Vec<String> = tail.into_iter().collect();
        Err(classify_failure(&stderr_text.join("\n")))
    }
}

/// Map clone stderr to an error kind: denied, not found, or generic.
pub(crate) fn classify_failure(stderr: &str) -> PipelineError {
    let trimmed = stderr.trim();
    let lowered = trimmed.to_lowercase();
    let detail = trimmed
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or(trimmed)
        .trim();
    if lowered.contains("authentication failed")
        || lowered.contains("permission denied")
        || lowered.contains("could not read username")
        || lowered.contains("fatal: could not read")
    {
        PipelineError::Fetch(format!("clone denied: {}", detail))
    } else if lowered.contains("repository not found")
        || lowered.contains("not found")
        || trimmed.contains("404")
    {
        PipelineError::Fetch(format!("repository not found: {}", detail))
    } else {
        PipelineError::Fetch(format!("clone failed: {}", detail))
    }
}

/// Collapses git's progress stream: emit on phase change, or when a phase
/// percentage advances by at least five points.
#[derive(Default)]
struct CloneProgressParser {
    phase: String,
    last_percent: i64,
}

impl CloneProgressParser {
    fn observe(&mut self, line: &str) -> Option<String> {
        let t = line.trim();
        let t = t.strip_prefix("remote:").unwrap_or(t).trim();
        if t.is_empty() {
            return None;
        }
        let phase = t.split(':').next().unwrap_or(t).trim().to_string();
        match percent_of(t) {
            Some(pct) => {
                if phase != self.phase || pct >= self.last_percent + 5 {
                    self.phase = phase.clone();
                    self.last_percent = pct;
                    Some(format!("{}: {}%", phase, pct))
                } else {
                    None
                }
            }
            None => {
                if phase != self.phase {
                    self.phase = phase.clone();
                    self.last_percent = -5;
                    Some(phase)
                } else {
                    None
                }
            }
        }
    }
}

fn percent_of(line: &str) -> Option<i64> {
    let idx = line.find('%')?;
    let digits: String = line[..idx]
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

fn git_in(root: &Path, args: &[&str]) -> std::io::Result<std::process::Output> {
    std::process::Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .stdin(Stdio::null())
        .output()
}

/// Branch label for the payload; opaque to the pipeline.
pub(crate) fn current_branch(root: &Path) -> String {
    match git_in(root, &["rev-parse", "--abbrev-ref", "HEAD"]) {
        Ok(out) if out.status.success() => {
            let name = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if name.is_empty() {
                "HEAD".to_string()
            } else {
                name
            }
        }
        _ => "HEAD".to_string(),
    }
}

/// All tracked files via `git ls-files` (respects ignore rules by
/// construction).
fn list_tracked_files(root: &Path) -> Result<Vec<String>, PipelineError> {
    let out = git_in(root, &["ls-files", "-z"])
        .map_err(|e| PipelineError::Fetch(format!("failed to run git ls-files: {}", e)))?;
    if !out.status.success() {
        return Err(PipelineError::Fetch(format!(
            "git ls-files failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&out.stdout)
        .split('\0')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect())
}

/// Packed-size guard, checked between clone and enumeration. Best effort:
/// a missing or failing `git count-objects` skips the check.
fn enforce_size_limit(root: &Path, max_bytes: u64) -> Result<(), PipelineError> {
    let Ok(out) = git_in(root, &["count-objects", "-v"]) else {
        return Ok(());
    };
    if !out.status.success() {
        return Ok(());
    }
    let text = String::from_utf8_lossy(&out.stdout);
    let mut kib = 0u64;
    for line in text.lines() {
        if let Some(v) = line
            .strip_prefix("size: ")
            .or_else(|| line.strip_prefix("size-pack: "))
        {
            kib += v.trim().parse::<u64>().unwrap_or(0);
        }
    }
    if kib.saturating_mul(1024) > max_bytes {
        return Err(PipelineError::Fetch(format!(
            "repository too large: {} KiB packed exceeds the {} byte limit",
            kib, max_bytes
        )));
    }
    Ok(())
}

/// File enumeration for a directory analysed in place (fetch bypass):
/// `git ls-files` when the directory is a repository, otherwise a
/// gitignore-aware walk.
pub fn list_local_files(root: &Path) -> Result<Vec<String>, PipelineError> {
    if root.join(".git").exists() {
        if let Ok(out) = git_in(root, &["ls-files", "-z"]) {
            if out.status.success() {
                let mut files: Vec<String> = String::from_utf8_lossy(&out.stdout)
                    .split('\0')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect();
                files.sort();
                return Ok(files);
            }
        }
    }
    let mut files = Vec::new();
    let walker = ignore::WalkBuilder::new(root).standard_filters(true).build();
    for dent in walker {
        let Ok(dent) = dent else { continue };
        if !dent.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let rel = pathdiff::diff_paths(dent.path(), root)
            .unwrap_or_else(|| dent.path().to_path_buf());
        files.push(rel.to_string_lossy().replace('\\', "/"));
    }
    files.sort();
    Ok(files)
}
