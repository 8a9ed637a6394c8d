//! Session state machine
//!
//! One session exists per process. The listening loop moves it between
//! `Idle` (waiting for a wake phrase) and `Awake` (waiting for a command);
//! `Stopped` is terminal and reached exactly once. The `paused` flag is
//! orthogonal: it suppresses listening in any state without losing state,
//! and may be toggled from outside the loop, so it is atomic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Listening state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Listening only for a wake phrase
    Idle,
    /// Wake phrase heard; listening for one command
    Awake,
    /// Shut down; terminal
    Stopped,
}

/// Shared handle to the single session
///
/// Cheap to clone; all clones observe the same state. The loop mutates
/// `Idle`/`Awake`; pause/resume and stop may come from anywhere.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<SessionState>,
    paused: AtomicBool,
    running: AtomicBool,
    language: Mutex<String>,
    default_language: String,
}

impl Session {
    /// Create a session in `Idle`, unpaused and running
    #[must_use]
    pub fn new(default_language: impl Into<String>) -> Self {
        let default_language = default_language.into();
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::Idle),
                paused: AtomicBool::new(false),
                running: AtomicBool::new(true),
                language: Mutex::new(default_language.clone()),
                default_language,
            }),
        }
    }

    /// Current listening state
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Whether the session is awaiting a command
    #[must_use]
    pub fn is_awake(&self) -> bool {
        self.state() == SessionState::Awake
    }

    /// Transition `Idle -> Awake`
    ///
    /// Returns false if the session was not idle (already awake, or
    /// stopped), in which case nothing changes.
    pub fn wake(&self) -> bool {
        let mut state = self.inner.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if *state == SessionState::Idle {
            *state = SessionState::Awake;
            tracing::debug!("session awake");
            true
        } else {
            false
        }
    }

    /// Transition `Awake -> Idle` after a dispatch cycle or timeout
    ///
    /// Also resets the spoken language to the default; language carries
    /// for one cycle only. No-op when stopped.
    pub fn reset_to_idle(&self) {
        let mut state = self.inner.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if *state == SessionState::Awake {
            *state = SessionState::Idle;
            tracing::debug!("session idle");
        }
        drop(state);
        self.reset_language();
    }

    /// Transition to `Stopped`, from any state
    ///
    /// Returns true only for the transition that actually stopped the
    /// session; later calls are no-ops.
    pub fn stop(&self) -> bool {
        let stopped = self.inner.running.swap(false, Ordering::SeqCst);
        if stopped {
            let mut state =
                self.inner.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            *state = SessionState::Stopped;
            tracing::info!("session stopped");
        }
        stopped
    }

    /// Whether the session has not yet stopped
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Whether listening is currently suppressed
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    /// Suppress or resume listening
    pub fn set_paused(&self, paused: bool) {
        self.inner.paused.store(paused, Ordering::SeqCst);
        tracing::info!(paused, "pause flag changed");
    }

    /// Spoken-response language for the current cycle
    #[must_use]
    pub fn language(&self) -> String {
        self.inner
            .language
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Set the spoken-response language for the current cycle
    pub fn set_language(&self, code: impl Into<String>) {
        let mut language =
            self.inner.language.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *language = code.into();
    }

    /// Reset the spoken-response language to the default
    pub fn reset_language(&self) {
        self.set_language(self.inner.default_language.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_running_unpaused() {
        let session = Session::new("en");
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.is_running());
        assert!(!session.is_paused());
    }

    #[test]
    fn wake_only_from_idle() {
        let session = Session::new("en");
        assert!(session.wake());
        assert_eq!(session.state(), SessionState::Awake);
        // Already awake
        assert!(!session.wake());

        session.reset_to_idle();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.wake());
    }

    #[test]
    fn stop_is_terminal_and_returns_true_once() {
        let session = Session::new("en");
        assert!(session.stop());
        assert!(!session.stop());
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(!session.is_running());

        // No transition escapes Stopped
        assert!(!session.wake());
        session.reset_to_idle();
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn pause_is_orthogonal_to_listening_state() {
        let session = Session::new("en");
        session.wake();
        session.set_paused(true);

        // Pausing does not lose the awake state
        assert_eq!(session.state(), SessionState::Awake);
        assert!(session.is_paused());

        session.set_paused(false);
        assert_eq!(session.state(), SessionState::Awake);
    }

    #[test]
    fn language_resets_with_the_cycle() {
        let session = Session::new("en");
        session.wake();
        session.set_language("es");
        assert_eq!(session.language(), "es");

        session.reset_to_idle();
        assert_eq!(session.language(), "en");
    }

    #[test]
    fn clones_share_state() {
        let session = Session::new("en");
        let other = session.clone();

        other.set_paused(true);
        assert!(session.is_paused());

        session.stop();
        assert!(!other.is_running());
    }
}
