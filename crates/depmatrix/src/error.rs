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

use std::error::Error;
use std::fmt::{self, Display};

/// Typed errors surfaced by the analysis pipeline.
///
/// Per-file and per-language failures never reach callers; they are logged
/// and the affected file/language is skipped. The kinds below are the ones
/// that terminate a run.
#[derive(Debug)]
pub enum PipelineError {
    /// Repository acquisition failed (clone denied, not found, network,
    /// size limit). The string carries the classified detail.
    Fetch(String),
    /// The cancellation signal fired; no payload is produced.
    Cancelled,
    /// A fatal analysis-phase failure outside any single language.
    Analysis(String),
    /// Filesystem error outside the per-file recovery paths.
    Io(String),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Fetch(s) => write!(f, "fetch error: {}", s),
            PipelineError::Cancelled => write!(f, "analysis cancelled"),
            PipelineError::Analysis(s) => write!(f, "analysis error: {}", s),
            PipelineError::Io(s) => write!(f, "io error: {}", s),
        }
    }
}

impl Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Io(e.to_string())
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(e: anyhow::Error) -> Self {
        PipelineError::Analysis(e.to_string())
    }
}
