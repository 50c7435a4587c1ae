//! Surface-once failure reporting for OS collaborators.
//!
//! A failing input sink can fail on every frame. The first failure after a
//! healthy period is logged at `error` and produces an [`Alert`]; repeats are
//! logged at `debug` only. A success clears the condition.

use std::fmt;

use serde::Serialize;

use optik_core::error::OptikError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Input,
    Dictation,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collaborator::Input => write!(f, "input"),
            Collaborator::Dictation => write!(f, "dictation"),
        }
    }
}

/// A collaborator failure surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub collaborator: Collaborator,
    pub message: String,
    /// Engine frame on which the failure started.
    pub frame: u64,
}

#[derive(Debug, Clone)]
pub struct CollaboratorHealth {
    collaborator: Collaborator,
    failing_since: Option<u64>,
    repeats: u64,
}

impl CollaboratorHealth {
    pub fn new(collaborator: Collaborator) -> Self {
        Self {
            collaborator,
            failing_since: None,
            repeats: 0,
        }
    }

    pub fn is_failing(&self) -> bool {
        self.failing_since.is_some()
    }

    /// Record a failure. Returns an alert only for the first failure of a run.
    pub fn record_failure(&mut self, error: &OptikError, frame: u64) -> Option<Alert> {
        if self.failing_since.is_some() {
            self.repeats += 1;
            tracing::debug!(
                collaborator = %self.collaborator,
                error = %error,
                repeats = self.repeats,
                "Collaborator still failing"
            );
            return None;
        }

        tracing::error!(
            collaborator = %self.collaborator,
            error = %error,
            frame,
            "Collaborator failed"
        );
        self.failing_since = Some(frame);
        self.repeats = 0;
        Some(Alert {
            collaborator: self.collaborator,
            message: error.to_string(),
            frame,
        })
    }

    pub fn record_success(&mut self) {
        if let Some(since) = self.failing_since.take() {
            tracing::info!(
                collaborator = %self.collaborator,
                failed_since = since,
                repeats = self.repeats,
                "Collaborator recovered"
            );
            self.repeats = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_error() -> OptikError {
        OptikError::Input("access denied".into())
    }

    #[test]
    fn test_first_failure_alerts() {
        let mut health = CollaboratorHealth::new(Collaborator::Input);
        let alert = health.record_failure(&input_error(), 7).unwrap();
        assert_eq!(alert.collaborator, Collaborator::Input);
        assert_eq!(alert.frame, 7);
        assert!(alert.message.contains("access denied"));
        assert!(health.is_failing());
    }

    #[test]
    fn test_repeats_are_silent() {
        let mut health = CollaboratorHealth::new(Collaborator::Input);
        assert!(health.record_failure(&input_error(), 1).is_some());
        for frame in 2..50 {
            assert!(health.record_failure(&input_error(), frame).is_none());
        }
    }

    #[test]
    fn test_success_rearms() {
        let mut health = CollaboratorHealth::new(Collaborator::Dictation);
        health.record_failure(&input_error(), 1);
        health.record_success();
        assert!(!health.is_failing());
        assert!(health.record_failure(&input_error(), 9).is_some());
    }
}
