//! Refresh passes and the last published result
//!
//! A pass is all-or-nothing: either its input was fetched completely and
//! its result is published, or nothing changes and the previous result
//! stays visible. Results are keyed by an explicit, increasing pass id so a
//! slow pass finishing after a newer one can never overwrite it.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Identifier of one refresh pass; later passes have larger ids
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PassId(pub u64);

impl PassId {
    pub const FIRST: PassId = PassId(1);

    pub fn next(self) -> Self {
        PassId(self.0 + 1)
    }
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pass store error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    #[error("Pass {attempted} is not newer than published pass {current}")]
    Stale { attempted: PassId, current: PassId },

    #[error("Pass {pass} failed: {reason}")]
    Failed { pass: PassId, reason: String },
}

/// A result together with the pass that produced it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Published<T> {
    pub pass: PassId,
    pub value: T,
}

/// Holds the most recent successfully published pass result
#[derive(Clone, Debug)]
pub struct PassStore<T> {
    latest: Option<Published<T>>,
}

impl<T> Default for PassStore<T> {
    fn default() -> Self {
        Self { latest: None }
    }
}

impl<T> PassStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the result of a pass; rejected if a newer or equal pass is already published
    pub fn publish(&mut self, pass: PassId, value: T) -> Result<(), PassError> {
        if let Some(current) = self.current_pass() {
            if pass <= current {
                warn!(%pass, %current, "discarding stale pass result");
                return Err(PassError::Stale {
                    attempted: pass,
                    current,
                });
            }
        }
        debug!(%pass, "published pass result");
        self.latest = Some(Published { pass, value });
        Ok(())
    }

    /// Run a pass over fetched input; a failed fetch leaves the previous result in place
    pub fn run<I, E, F>(&mut self, pass: PassId, input: Result<I, E>, compute: F) -> Result<(), PassError>
    where
        E: std::fmt::Display,
        F: FnOnce(I) -> T,
    {
        match input {
            Ok(input) => self.publish(pass, compute(input)),
            Err(err) => {
                warn!(%pass, error = %err, "pass input unavailable, keeping previous result");
                Err(PassError::Failed {
                    pass,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Latest published result, `None` until a pass succeeds
    pub fn latest(&self) -> Option<&Published<T>> {
        self.latest.as_ref()
    }

    /// Consume the store, yielding the latest published result
    pub fn into_latest(self) -> Option<Published<T>> {
        self.latest
    }

    pub fn current_pass(&self) -> Option<PassId> {
        self.latest.as_ref().map(|p| p.pass)
    }

    /// True until some pass has been published
    pub fn has_no_data(&self) -> bool {
        self.latest.is_none()
    }
}
