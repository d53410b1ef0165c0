//! Validation for probe configuration.

use serde::{Deserialize, Serialize};

use crate::config::ProbeConfig;

const LONG_RESPONSE_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: ValidationLevel,
    pub code: &'static str,
    pub message: String,
}

pub trait Validate {
    fn validate(&self) -> Vec<ValidationIssue>;
}

impl Validate for ProbeConfig {
    fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if self.target.name.trim().is_empty() {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "target.name.empty",
                message: "target name must not be empty; it would match every member".to_string(),
            });
        }

        if self.commands.prefix.trim().is_empty() {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "commands.prefix.empty",
                message: "command prefix must not be empty".to_string(),
            });
        }

        if self.timeouts.response_secs == 0 {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "timeouts.response.zero",
                message: "response timeout cannot be 0".to_string(),
            });
        } else if self.timeouts.response_secs > LONG_RESPONSE_TIMEOUT_SECS {
            issues.push(ValidationIssue {
                level: ValidationLevel::Warning,
                code: "timeouts.response.long",
                message: format!(
                    "response timeout {}s is very long; every silence check waits this long",
                    self.timeouts.response_secs
                ),
            });
        }

        let token_missing = self
            .session
            .token
            .as_deref()
            .map(|token| token.trim().is_empty())
            .unwrap_or(true);
        if token_missing {
            issues.push(ValidationIssue {
                level: ValidationLevel::Warning,
                code: "session.token.missing",
                message: "no session token configured; only local sessions can be used".to_string(),
            });
        }

        if self
            .assertions
            .error_markers
            .iter()
            .any(|marker| marker.trim().is_empty())
        {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "assertions.error_markers.empty_entry",
                message: "error markers must not contain empty strings".to_string(),
            });
        }

        issues
    }
}
