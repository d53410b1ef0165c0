//! Result lifecycle of a registered test.

use serde::{Deserialize, Serialize};

/// `Unrun → {Success, Failed}`; any later run overwrites the previous result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    #[default]
    Unrun,
    Success,
    Failed,
}

impl std::fmt::Display for TestResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            TestResult::Unrun => "UNRUN",
            TestResult::Success => "SUCCESS",
            TestResult::Failed => "FAILED",
        };
        f.write_str(tag)
    }
}

impl TestResult {
    pub fn is_unrun(&self) -> bool {
        matches!(self, TestResult::Unrun)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestResult::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TestResult::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unrun() {
        assert_eq!(TestResult::default(), TestResult::Unrun);
        assert!(TestResult::default().is_unrun());
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&TestResult::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
        let decoded: TestResult = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(decoded, TestResult::Failed);
    }

    #[test]
    fn display_matches_serde_tag() {
        assert_eq!(format!("{}", TestResult::Unrun), "UNRUN");
        assert_eq!(format!("{}", TestResult::Failed), "FAILED");
    }
}
