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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;

use crate::payload::DsmPayload;

/// Frames delivered over the progress channel. `Error` and `Complete` are
/// terminal: the pipeline sends exactly one of them and nothing after.
#[derive(Debug)]
pub enum ProgressEvent {
    /// Free-form human-readable status line.
    Progress(String),
    Error(String),
    Complete(Box<DsmPayload>),
}

/// Write side of the progress channel.
///
/// Informational frames are sent with `try_send` and silently dropped when
/// the buffer is full; the pipeline never blocks on a slow reader. Terminal
/// frames use a blocking `send` so a live reader always observes the outcome;
/// a hung-up reader is ignored.
#[derive(Clone)]
pub struct ProgressSink {
    tx: Option<SyncSender<ProgressEvent>>,
}

impl ProgressSink {
    /// Bounded channel; `capacity` is clamped to at least 1.
    pub fn channel(capacity: usize) -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = sync_channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// Sink that discards everything. For callers that do not listen.
    pub fn null() -> Self {
        Self { tx: None }
    }

    pub fn info(&self, msg: impl Into<String>) {
        if let Some(tx) = &self.tx {
            match tx.try_send(ProgressEvent::Progress(msg.into())) {
                Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }

    pub fn finish(&self, payload: DsmPayload) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressEvent::Complete(Box::new(payload)));
        }
    }

    pub fn fail(&self, msg: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressEvent::Error(msg.into()));
        }
    }
}

/// Shared cancellation signal checked at every suspension point.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
