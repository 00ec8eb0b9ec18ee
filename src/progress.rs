// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Progress reporting decoupled from the pipeline stages

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::Mutex;

/// Pipeline stage being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadSlices,
    Extract,
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::LoadSlices => "loading slices",
            Stage::Extract => "marching cubes",
            Stage::Export => "writing mesh",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of progress events.
///
/// Implementations must not panic and have no way to fail the computation they
/// observe. `advance` may be called concurrently from worker threads.
pub trait ProgressSink: Send + Sync {
    /// A stage begins with `total` ticks of work
    fn start(&self, stage: Stage, total: u64);
    /// `delta` ticks completed
    fn advance(&self, delta: u64);
    /// The current stage completed
    fn finish(&self);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn start(&self, _stage: Stage, _total: u64) {}
    fn advance(&self, _delta: u64) {}
    fn finish(&self) {}
}

/// Terminal progress bars, one per stage
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Option<ProgressBar> {
        // A poisoned lock only means another reporter panicked; keep the bar.
        match self.bar.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, bar: Option<ProgressBar>) -> Option<ProgressBar> {
        match self.bar.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, bar),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), bar),
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn start(&self, stage: Stage, total: u64) {
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:<16} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(stage.as_str());
        if let Some(previous) = self.replace(Some(bar)) {
            previous.finish_and_clear();
        }
    }

    fn advance(&self, delta: u64) {
        if let Some(bar) = self.current() {
            bar.inc(delta);
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.replace(None) {
            bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_progress_without_start() {
        let progress = ConsoleProgress::new();
        progress.advance(3);
        progress.finish();
    }

    #[test]
    fn test_console_progress_stage_cycle() {
        let progress = ConsoleProgress::new();
        progress.start(Stage::LoadSlices, 2);
        progress.advance(1);
        progress.start(Stage::Extract, 10);
        progress.advance(10);
        progress.finish();
        assert!(progress.current().is_none());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Export.to_string(), "writing mesh");
    }
}
