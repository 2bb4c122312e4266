//! Scouting session controllers.
//!
//! A session owns the form being filled in for one match ([`MatchSession`])
//! or one pit interview ([`PitSession`]). Its state lives in an
//! `Arc` snapshot that is replaced on every transition, so a reader holding an
//! older snapshot keeps seeing a consistent form.
//!
//! Submitting validates the required fields, hands the record to a
//! [`RecordStore`](crate::db::RecordStore), and on success resets the form,
//! carrying over the fields a scout keeps between matches.

pub mod match_session;
pub mod pit_session;

pub use match_session::{ActionDraft, MatchSession, MatchState};
pub use pit_session::{PathDraft, PitSession, PitState, Stroke};

use serde::Deserialize;
use thiserror::Error;

/// What cancelling an in-progress action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Nothing is recorded and nothing is removed
    #[default]
    Discard,
    /// Also take back the most recent record of the same type and phase
    UndoTally,
}

/// Why a submit did not persist anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Required fields are missing; every problem is listed
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),

    /// The store rejected the record
    #[error("{0}")]
    Store(String),
}

impl SubmitError {
    /// Messages to show the scout.
    pub fn messages(&self) -> Vec<String> {
        match self {
            SubmitError::Validation(messages) => messages.clone(),
            SubmitError::Store(message) => vec![message.clone()],
        }
    }
}

/// Next match number after a submit; unparseable input counts as 0.
fn next_match_number(current: &str) -> String {
    let current: u32 = current.trim().parse().unwrap_or(0);
    current.saturating_add(1).to_string()
}

/// `message` when `value` is blank.
fn require(errors: &mut Vec<String>, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_match_number() {
        assert_eq!(next_match_number("12"), "13");
        assert_eq!(next_match_number(" 7 "), "8");
        assert_eq!(next_match_number("Q7"), "1");
        assert_eq!(next_match_number(""), "1");
    }

    #[test]
    fn test_submit_error_messages() {
        let err = SubmitError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "a; b");
        assert_eq!(err.messages().len(), 2);
        assert_eq!(SubmitError::Store("disk full".to_string()).messages(), ["disk full"]);
    }

    #[test]
    fn test_cancel_policy_parse() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: CancelPolicy,
        }
        let parsed: Wrapper = toml::from_str("policy = \"undo_tally\"").unwrap();
        assert_eq!(parsed.policy, CancelPolicy::UndoTally);
        assert_eq!(CancelPolicy::default(), CancelPolicy::Discard);
    }
}
