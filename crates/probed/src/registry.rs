//! Named test cases and the ordered registry that holds them.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use probe_core::state::TestResult;
use std::future::Future;
use std::sync::Arc;

use crate::expect_calls::ExpectCalls;
use crate::interface::{Interface, InterfaceError};

/// Names the control surface uses as run selectors.
pub const RESERVED_TEST_NAMES: [&str; 3] = ["all", "unrun", "failed"];

pub type TestFuture = BoxFuture<'static, Result<(), InterfaceError>>;
pub type TestLogic = Arc<dyn Fn(Interface) -> TestFuture + Send + Sync>;

/// Wrap an async closure as test logic.
pub fn test_logic<F, Fut>(logic: F) -> TestLogic
where
    F: Fn(Interface) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), InterfaceError>> + Send + 'static,
{
    Arc::new(move |interface| logic(interface).boxed())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("'{name}' is not a valid test name")]
    InvalidName { name: String },
    #[error("a test case called {name} already exists")]
    DuplicateName { name: String },
}

pub fn validate_test_name(name: &str) -> Result<(), RegistryError> {
    if name.trim().is_empty() || RESERVED_TEST_NAMES.contains(&name) {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub struct TestCase {
    name: String,
    logic: TestLogic,
    needs_human: bool,
    last_run: Option<DateTime<Utc>>,
    result: TestResult,
}

impl TestCase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn needs_human(&self) -> bool {
        self.needs_human
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    pub fn result(&self) -> TestResult {
        self.result
    }

    pub fn logic(&self) -> TestLogic {
        Arc::clone(&self.logic)
    }

    pub(crate) fn mark_started(&mut self, at: DateTime<Utc>) {
        self.last_run = Some(at);
    }

    pub(crate) fn record(&mut self, result: TestResult) {
        self.result = result;
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("needs_human", &self.needs_human)
            .field("last_run", &self.last_run)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// Registration input for [`TestRegistry::collector`].
pub struct TestDefinition {
    pub name: String,
    pub logic: TestLogic,
    pub needs_human: bool,
}

impl TestDefinition {
    pub fn new(name: impl Into<String>, logic: TestLogic) -> Self {
        Self {
            name: name.into(),
            logic,
            needs_human: false,
        }
    }

    pub fn needs_human(mut self) -> Self {
        self.needs_human = true;
        self
    }
}

/// Ordered, append-only collection of test cases.
///
/// Registration happens during bootstrap only; nothing registers while a
/// run is iterating.
#[derive(Debug, Default)]
pub struct TestRegistry {
    tests: Vec<TestCase>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        logic: TestLogic,
        needs_human: bool,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        validate_test_name(&name)?;
        if self.find_by_name(&name).is_some() {
            return Err(RegistryError::DuplicateName { name });
        }
        self.tests.push(TestCase {
            name,
            logic,
            needs_human,
            last_run: None,
            result: TestResult::Unrun,
        });
        Ok(())
    }

    /// Registration callback that must run exactly `expected` times before
    /// the returned checker verifies.
    pub fn collector(
        &mut self,
        expected: usize,
    ) -> ExpectCalls<impl FnMut(TestDefinition) -> Result<(), RegistryError> + '_> {
        ExpectCalls::new("test registration", move |definition: TestDefinition| {
            self.register(definition.name, definition.logic, definition.needs_human)
        })
        .with_expected(expected)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&TestCase> {
        self.tests.iter().find(|test| test.name == name)
    }

    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut TestCase> {
        self.tests.iter_mut().find(|test| test.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.tests.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TestCase> {
        self.tests.iter_mut()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tests.iter().map(|test| test.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl<'a> IntoIterator for &'a TestRegistry {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> TestLogic {
        test_logic(|_| async { Ok(()) })
    }

    #[test]
    fn registered_test_starts_unrun_with_human_flag() {
        let mut registry = TestRegistry::new();
        registry.register("ping", noop(), false).expect("ping");
        registry.register("judge", noop(), true).expect("judge");

        let ping = registry.find_by_name("ping").expect("ping registered");
        assert_eq!(ping.result(), TestResult::Unrun);
        assert!(!ping.needs_human());
        assert!(ping.last_run().is_none());

        let judge = registry.find_by_name("judge").expect("judge registered");
        assert!(judge.needs_human());
    }

    #[test]
    fn duplicate_name_is_rejected_without_growing() {
        let mut registry = TestRegistry::new();
        registry.register("ping", noop(), false).expect("first");

        let err = registry
            .register("ping", noop(), true)
            .expect_err("duplicate");
        assert_eq!(
            err,
            RegistryError::DuplicateName {
                name: "ping".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
        assert!(!registry.find_by_name("ping").expect("ping").needs_human());
    }

    #[test]
    fn reserved_and_empty_names_are_invalid() {
        let mut registry = TestRegistry::new();
        for name in ["all", "unrun", "failed", "", "   "] {
            let err = registry
                .register(name, noop(), false)
                .expect_err("invalid name");
            assert!(matches!(err, RegistryError::InvalidName { .. }));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn reserved_check_is_exact() {
        assert!(validate_test_name("all_commands").is_ok());
        assert!(validate_test_name("ALL").is_ok());
        assert!(validate_test_name("failed").is_err());
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut registry = TestRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(name, noop(), false).expect("register");
        }
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            (&registry).into_iter().map(TestCase::name).collect::<Vec<_>>(),
            vec!["zeta", "alpha", "mid"]
        );
    }

    #[test]
    fn find_by_name_mut_exposes_the_stored_entity() {
        let mut registry = TestRegistry::new();
        registry.register("ping", noop(), false).expect("ping");

        registry
            .find_by_name_mut("ping")
            .expect("ping")
            .record(TestResult::Failed);
        assert_eq!(
            registry.find_by_name("ping").map(TestCase::result),
            Some(TestResult::Failed)
        );
        assert!(registry.find_by_name("pong").is_none());
    }

    #[test]
    fn collector_counts_registrations() {
        let mut registry = TestRegistry::new();
        let mut add = registry.collector(2);
        add.call(TestDefinition::new("one", noop())).expect("one");
        add.call(TestDefinition::new("two", noop()).needs_human())
            .expect("two");
        add.verify().expect("two registrations");

        assert_eq!(registry.names(), vec!["one", "two"]);
        assert!(registry.find_by_name("two").expect("two").needs_human());
    }

    #[test]
    fn collector_flags_missing_registration() {
        let mut registry = TestRegistry::new();
        let mut add = registry.collector(2);
        add.call(TestDefinition::new("only", noop())).expect("only");
        let err = add.verify().expect_err("one short");
        assert_eq!(err.expected, 2);
        assert_eq!(err.actual, 1);
    }
}
