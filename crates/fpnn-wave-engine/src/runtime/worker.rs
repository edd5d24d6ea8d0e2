// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Actor thread handle
//!
//! Thin wrapper over a named OS thread that joins on drop, so tearing
//! down an evaluation fabric can never leak a running actor.

use std::thread::{self, JoinHandle};
use tracing::warn;

pub(crate) struct ActorThread {
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl ActorThread {
    /// Spawn a named actor thread running `body` to completion.
    ///
    /// The body is responsible for exiting when its shutdown channel
    /// disconnects; `join` only waits, it cannot interrupt.
    pub(crate) fn spawn<F>(name: String, body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(body)
            .expect("failed to spawn actor thread");
        Self {
            name,
            handle: Some(handle),
        }
    }

    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(actor = %self.name, "actor thread panicked");
            }
        }
    }
}

impl Drop for ActorThread {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_join_on_drop_runs_body_to_completion() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);
        {
            let _actor = ActorThread::spawn("test-actor".to_string(), move || {
                ran_clone.store(true, Ordering::Relaxed);
            });
        }
        assert!(ran.load(Ordering::Relaxed));
    }
}
