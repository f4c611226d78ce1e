//! Readiness state.
//!
//! # States
//! - Ready: `/readyz` answers 200
//! - NotReady: `/readyz` answers 503
//!
//! # Design Decisions
//! - Starts Ready
//! - Flipped only by the administrative toggle, never by the service itself
//! - Atomic, so concurrent probes and toggles need no lock

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadinessStatus {
    Ready,
    NotReady,
}

impl ReadinessStatus {
    fn from_flag(ready: bool) -> Self {
        if ready {
            Self::Ready
        } else {
            Self::NotReady
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::NotReady => "NOT_READY",
        }
    }
}

#[derive(Debug)]
pub struct Readiness {
    ready: AtomicBool,
}

impl Readiness {
    pub fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
        }
    }

    pub fn status(&self) -> ReadinessStatus {
        ReadinessStatus::from_flag(self.ready.load(Ordering::Acquire))
    }

    /// Flip the flag, returning the new status.
    pub fn toggle(&self) -> ReadinessStatus {
        let previous = self.ready.fetch_xor(true, Ordering::AcqRel);
        ReadinessStatus::from_flag(!previous)
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_toggle_cycle() {
        let readiness = Readiness::default();
        assert_eq!(readiness.status(), ReadinessStatus::Ready);
        assert_eq!(readiness.toggle(), ReadinessStatus::NotReady);
        assert_eq!(readiness.status(), ReadinessStatus::NotReady);
        assert_eq!(readiness.toggle(), ReadinessStatus::Ready);
        assert_eq!(readiness.status(), ReadinessStatus::Ready);
    }

    #[test]
    fn test_serializes_as_wire_strings() {
        assert_eq!(
            serde_json::to_string(&ReadinessStatus::NotReady).unwrap(),
            "\"NOT_READY\""
        );
        assert_eq!(ReadinessStatus::Ready.as_str(), "READY");
    }

    #[test]
    fn test_concurrent_toggles_pair_up() {
        let readiness = Arc::new(Readiness::default());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let readiness = readiness.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        readiness.toggle();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        // An even number of flips lands back on the initial state.
        assert_eq!(readiness.status(), ReadinessStatus::Ready);
    }
}
