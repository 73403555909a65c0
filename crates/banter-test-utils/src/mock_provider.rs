// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock reply provider for deterministic testing.
//!
//! Scripted outcomes are popped from a FIFO queue: `Ok` replies with the
//! text, `Err` fails with a retryable external-service error. When the
//! script runs dry, a default "mock reply" is returned. Every invocation
//! is counted, which is how tests observe the enqueue/generate decoupling
//! and retry behavior.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use banter_core::{BanterError, ReplyProvider};
use tokio::sync::Mutex;

/// A scripted outcome: a reply or a transient failure message.
pub type ScriptedReply = Result<String, String>;

/// Mock [`ReplyProvider`] with a scripted outcome queue.
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<ScriptedReply>>>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// A provider with an empty script (always replies "mock reply").
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider scripted with the given replies, in order.
    pub fn with_replies(replies: Vec<String>) -> Self {
        Self::with_script(replies.into_iter().map(Ok).collect())
    }

    /// A provider scripted with mixed replies and failures.
    pub fn with_script(script: Vec<ScriptedReply>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(script))),
            calls: AtomicUsize::new(0),
        }
    }

    /// Append a reply to the script.
    pub async fn add_reply(&self, text: String) {
        self.script.lock().await.push_back(Ok(text));
    }

    /// Append a transient failure to the script.
    pub async fn add_failure(&self, message: String) {
        self.script.lock().await.push_back(Err(message));
    }

    /// How many times `generate_reply` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyProvider for MockProvider {
    async fn generate_reply(&self, _prompt: &str) -> Result<String, BanterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(BanterError::ExternalService {
                message,
                source: None,
            }),
            None => Ok("mock reply".to_string()),
        }
    }
}
