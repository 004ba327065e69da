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

//! DepMatrix builds a Design Structure Matrix for a source repository:
//! per-file directed dependency weights from resolved intra-repo imports,
//! cyclomatic complexity, significant-line counts, and a display
//! hierarchy, streamed behind a progress channel.

pub mod aggregate;
pub mod analyzer;
pub mod complexity;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod hierarchy;
pub mod options;
pub mod payload;
pub mod pipeline;
pub mod progress;
pub mod source;

pub use error::PipelineError;
pub use options::AnalyzeOptions;
pub use payload::{DependencyRef, DisplayItem, DsmPayload, FileSummary};
pub use pipeline::{analyze_dir, analyze_url, run_dir, run_url};
pub use progress::{CancelFlag, ProgressEvent, ProgressSink};
