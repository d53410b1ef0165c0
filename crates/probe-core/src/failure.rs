//! Requirement failures: every way a test expectation can go unmet.

use serde::{Deserialize, Serialize};

/// Raised by assertion primitives when the target does not meet an
/// expectation. These are test outcomes, never setup or transport faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum RequirementFailure {
    #[error("target did not respond within the timeout")]
    NoResponse,
    #[error("target did not react within the timeout")]
    NoReaction,
    #[error("target responded when silence was required")]
    UnexpectedResponse,
    #[error("target response did not match the expectation")]
    ResponseDidNotMatch,
    #[error("target reacted with the wrong symbol")]
    ReactionDidNotMatch,
    #[error("target response reported an internal error")]
    ErroredResponse,
    #[error("target did not report an expected error")]
    UnexpectedSuccess,
    #[error("human arbiter did not answer within the timeout")]
    HumanResponseTimeout,
    #[error("human arbiter rejected the test outcome")]
    HumanResponseFailure,
}

impl RequirementFailure {
    pub const ALL: [RequirementFailure; 9] = [
        RequirementFailure::NoResponse,
        RequirementFailure::NoReaction,
        RequirementFailure::UnexpectedResponse,
        RequirementFailure::ResponseDidNotMatch,
        RequirementFailure::ReactionDidNotMatch,
        RequirementFailure::ErroredResponse,
        RequirementFailure::UnexpectedSuccess,
        RequirementFailure::HumanResponseTimeout,
        RequirementFailure::HumanResponseFailure,
    ];

    pub fn code(self) -> &'static str {
        match self {
            RequirementFailure::NoResponse => "no_response",
            RequirementFailure::NoReaction => "no_reaction",
            RequirementFailure::UnexpectedResponse => "unexpected_response",
            RequirementFailure::ResponseDidNotMatch => "response_did_not_match",
            RequirementFailure::ReactionDidNotMatch => "reaction_did_not_match",
            RequirementFailure::ErroredResponse => "errored_response",
            RequirementFailure::UnexpectedSuccess => "unexpected_success",
            RequirementFailure::HumanResponseTimeout => "human_response_timeout",
            RequirementFailure::HumanResponseFailure => "human_response_failure",
        }
    }

    /// True for failures that come from the human-arbitration path.
    pub fn is_human(self) -> bool {
        matches!(
            self,
            RequirementFailure::HumanResponseTimeout | RequirementFailure::HumanResponseFailure
        )
    }

    /// True when the failure was produced by a wait running out its window.
    pub fn is_timeout(self) -> bool {
        matches!(
            self,
            RequirementFailure::NoResponse
                | RequirementFailure::NoReaction
                | RequirementFailure::HumanResponseTimeout
        )
    }
}
