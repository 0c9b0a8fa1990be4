// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write hooks that record when they were called.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use litebook_core::{LitebookError, WriteHooks};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Pause,
    Resume,
}

/// `WriteHooks` that log every call with a timestamp.
///
/// Optionally fails every pause, to check that resume still runs.
#[derive(Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<(HookEvent, Instant)>>,
    fail_pause: bool,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks whose `pause_writes` always returns an error.
    pub fn failing_pause() -> Self {
        Self {
            fail_pause: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<(HookEvent, Instant)> {
        self.events.lock().expect("hooks lock poisoned").clone()
    }

    pub fn kinds(&self) -> Vec<HookEvent> {
        self.events().into_iter().map(|(kind, _)| kind).collect()
    }

    /// Time of the most recent event of `kind`.
    pub fn last(&self, kind: HookEvent) -> Option<Instant> {
        self.events()
            .into_iter()
            .rev()
            .find(|(k, _)| *k == kind)
            .map(|(_, at)| at)
    }

    fn record(&self, kind: HookEvent) {
        self.events
            .lock()
            .expect("hooks lock poisoned")
            .push((kind, Instant::now()));
    }
}

#[async_trait]
impl WriteHooks for RecordingHooks {
    async fn pause_writes(&self, _timeout: Duration) -> Result<(), LitebookError> {
        self.record(HookEvent::Pause);
        if self.fail_pause {
            return Err(LitebookError::Internal("pause refused".into()));
        }
        Ok(())
    }

    async fn resume_writes(&self) -> Result<(), LitebookError> {
        self.record(HookEvent::Resume);
        Ok(())
    }
}
