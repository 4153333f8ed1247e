//! Single-flight playback lock.
//!
//! The lock is one `AtomicBool`. Acquisition is a compare-exchange, so it
//! happens synchronously before the caller awaits anything. Release happens in
//! [`PlaybackGuard`]'s `Drop`, which covers normal completion, cancellation,
//! a dropped future and unwinding alike.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use linesim_core::PlaybackState;

/// Shared single-flight flag.
///
/// Cloning creates a new handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct PlaybackLock {
    playing: Arc<AtomicBool>,
}

impl PlaybackLock {
    /// Create an idle lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to move from idle to playing.
    ///
    /// Returns `None` if a playback already holds the lock.
    pub fn try_acquire(&self) -> Option<PlaybackGuard> {
        self.playing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PlaybackGuard {
                playing: Arc::clone(&self.playing),
            })
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        if self.playing.load(Ordering::Acquire) {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }
}

/// Proof that the holder owns the playback lock.
#[derive(Debug)]
pub struct PlaybackGuard {
    playing: Arc<AtomicBool>,
}

impl Drop for PlaybackGuard {
    fn drop(&mut self) {
        self.playing.store(false, Ordering::Release);
    }
}
