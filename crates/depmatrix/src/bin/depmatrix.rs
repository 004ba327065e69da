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

use clap::Parser;
use log::{error, info};
use std::io::Write;
use std::path::PathBuf;

use depmatrix::{AnalyzeOptions, CancelFlag, ProgressEvent, ProgressSink};

/// Dependency-matrix analyzer: clone a repository (or point at a local
/// checkout) and emit the DSM payload as JSON.
#[derive(Parser)]
struct Args {
    /// Repository URL (https, ssh, or file scheme).
    url: Option<String>,
    /// Analyse a local directory instead of cloning.
    #[arg(long)]
    root: Option<PathBuf>,
    /// Write the payload here instead of stdout.
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Exclude test files and directories.
    #[arg(long)]
    no_tests: bool,
    /// Ignore TypeScript `import type` clauses.
    #[arg(long)]
    skip_type_imports: bool,
    /// Admitted-file count above which edge weights are pinned to 1.
    #[arg(long)]
    threshold: Option<usize>,
    /// Packed repository size limit in MiB.
    #[arg(long)]
    max_repo_mb: Option<u64>,
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct AppConfig {
    out: Option<PathBuf>,
    threshold: Option<usize>,
    max_repo_mb: Option<u64>,
    depth: Option<u32>,
    threads: Option<usize>,
}

impl AppConfig {
    fn load(path: Option<&PathBuf>) -> Result<AppConfig, anyhow::Error> {
        let cfg_path = path
            .cloned()
            .unwrap_or_else(|| PathBuf::from("depmatrix.toml"));
        if cfg_path.exists() {
            let s = std::fs::read_to_string(&cfg_path)?;
            Ok(toml::from_str(&s)?)
        } else {
            Ok(AppConfig::default())
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::Builder::from_env(env).init();
    let cfg = AppConfig::load(args.config.as_ref())?;

    let mut builder = AnalyzeOptions::builder()
        .include_tests(!args.no_tests)
        .include_type_only_imports(!args.skip_type_imports);
    if let Some(t) = args.threshold.or(cfg.threshold) {
        builder = builder.large_repo_threshold(t);
    }
    if let Some(mb) = args.max_repo_mb.or(cfg.max_repo_mb) {
        builder = builder.max_repo_bytes(mb.saturating_mul(1024 * 1024));
    }
    if let Some(d) = args.depth.or(cfg.depth) {
        builder = builder.clone_depth(d);
    }
    if let Some(n) = args.threads.or(cfg.threads) {
        builder = builder.threads(n);
    }
    let opts = builder.build();
    let out_path = args.out.or(cfg.out);

    let (sink, rx) = ProgressSink::channel(64);
    let cancel = CancelFlag::new();

    let worker = {
        let sink = sink.clone();
        let cancel = cancel.clone();
        match (args.url, args.root) {
            (Some(url), None) => std::thread::spawn(move || {
                depmatrix::run_url(&url, &opts, &sink, &cancel);
            }),
            (None, Some(root)) => std::thread::spawn(move || {
                let branch = "local";
                depmatrix::run_dir(&root, branch, &opts, &sink, &cancel);
            }),
            _ => {
                anyhow::bail!("pass exactly one of a repository URL or --root <dir>");
            }
        }
    };
    drop(sink);

    let mut exit_err: Option<String> = None;
    for event in rx {
        match event {
            ProgressEvent::Progress(msg) => info!("{}", msg),
            ProgressEvent::Error(msg) => {
                exit_err = Some(msg);
                break;
            }
            ProgressEvent::Complete(payload) => {
                match &out_path {
                    Some(path) => {
                        let file = std::fs::File::create(path)?;
                        let mut writer = std::io::BufWriter::new(file);
                        serde_json::to_writer_pretty(&mut writer, payload.as_ref())?;
                        writer.flush()?;
                        info!("Wrote payload to {}", path.display());
                    }
                    None => {
                        let stdout = std::io::stdout();
                        let mut lock = stdout.lock();
                        serde_json::to_writer_pretty(&mut lock, payload.as_ref())?;
                        writeln!(lock)?;
                    }
                }
                break;
            }
        }
    }

    if worker.join().is_err() {
        error!("analysis thread panicked");
        std::process::exit(1);
    }
    if let Some(msg) = exit_err {
        error!("{}", msg);
        std::process::exit(1);
    }
    Ok(())
}
