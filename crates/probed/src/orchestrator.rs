//! Runs registered tests against a live session and records their results.

use chrono::Utc;
use probe_core::config::ProbeConfig;
use probe_core::failure::RequirementFailure;
use probe_core::state::TestResult;
use probe_core::types::ChannelId;
use probe_session::{MemberNameResolver, ResolveError, Session, SessionError, TargetResolver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::interface::{Interface, InterfaceError, InterfaceSettings};
use crate::registry::{TestCase, TestRegistry};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("test {test} failed: {failure}")]
    Requirement {
        test: String,
        failure: RequirementFailure,
    },
    #[error("could not resolve target: {0}")]
    Resolve(#[from] ResolveError),
    #[error("test {test} aborted: {source}")]
    Aborted {
        test: String,
        #[source]
        source: InterfaceError,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl OrchestratorError {
    /// True for a recorded test failure, false for setup or transport faults.
    pub fn is_requirement(&self) -> bool {
        matches!(self, OrchestratorError::Requirement { .. })
    }
}

/// Which tests a batch run selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSelector {
    All,
    Unrun,
    Failed,
    Named(String),
}

impl RunSelector {
    pub fn parse(arg: &str) -> Self {
        match arg {
            "all" => RunSelector::All,
            "unrun" => RunSelector::Unrun,
            "failed" => RunSelector::Failed,
            name => RunSelector::Named(name.to_string()),
        }
    }

    pub fn matches(&self, test: &TestCase) -> bool {
        match self {
            RunSelector::All => true,
            RunSelector::Unrun => test.result().is_unrun(),
            RunSelector::Failed => test.result().is_failed(),
            RunSelector::Named(name) => test.name() == name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub name: String,
    pub result: TestResult,
    pub failure: Option<RequirementFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn passed(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.result.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.result.is_failed())
            .count()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }
}

pub struct Orchestrator {
    session: Arc<dyn Session>,
    resolver: Arc<dyn TargetResolver>,
    target_name: String,
    settings: Arc<InterfaceSettings>,
}

impl Orchestrator {
    pub fn new(
        session: Arc<dyn Session>,
        resolver: Arc<dyn TargetResolver>,
        config: &ProbeConfig,
    ) -> Self {
        Self {
            session,
            resolver,
            target_name: config.target.name.clone(),
            settings: Arc::new(InterfaceSettings::from(config)),
        }
    }

    /// Orchestrator resolving the target by member name on `session`.
    pub fn with_member_resolver(session: Arc<dyn Session>, config: &ProbeConfig) -> Self {
        let resolver = Arc::new(MemberNameResolver::new(Arc::clone(&session)));
        Self::new(session, resolver, config)
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Run one test in `channel` and record its result.
    ///
    /// A requirement failure marks the test `Failed` and is swallowed unless
    /// `stop_on_error` is set, in which case it is returned after recording.
    /// Setup and transport faults propagate and leave the result untouched.
    pub async fn run_test(
        &self,
        test: &mut TestCase,
        channel: &ChannelId,
        stop_on_error: bool,
    ) -> Result<TestResult, OrchestratorError> {
        let target = self.resolver.resolve(&self.target_name, channel).await?;
        let interface = Interface::new(
            Arc::clone(&self.session),
            channel.clone(),
            target,
            Arc::clone(&self.settings),
        );

        info!(test = test.name(), channel = %channel, "running test");
        test.mark_started(Utc::now());
        let logic = test.logic();

        match logic(interface).await {
            Ok(()) => {
                test.record(TestResult::Success);
                info!(test = test.name(), "test passed");
                Ok(TestResult::Success)
            }
            Err(InterfaceError::Requirement(failure)) => {
                test.record(TestResult::Failed);
                warn!(
                    test = test.name(),
                    failure = failure.code(),
                    timed_out = failure.is_timeout(),
                    human = failure.is_human(),
                    "test failed"
                );
                if stop_on_error {
                    return Err(OrchestratorError::Requirement {
                        test: test.name().to_string(),
                        failure,
                    });
                }
                Ok(TestResult::Failed)
            }
            Err(source) => Err(OrchestratorError::Aborted {
                test: test.name().to_string(),
                source,
            }),
        }
    }

    /// Run every test matching `predicate`, in registration order.
    ///
    /// One test failing does not stop the batch; a fatal error does.
    pub async fn run_by_predicate<P>(
        &self,
        registry: &mut TestRegistry,
        channel: &ChannelId,
        predicate: P,
    ) -> Result<BatchReport, OrchestratorError>
    where
        P: Fn(&TestCase) -> bool,
    {
        let mut report = BatchReport::default();
        for test in registry.iter_mut() {
            if !predicate(test) {
                continue;
            }
            self.session
                .send_message(channel, &format!("**Running test {}**", test.name()))
                .await?;

            let failure = match self.run_test(test, channel, true).await {
                Ok(_) => None,
                Err(OrchestratorError::Requirement { failure, .. }) => Some(failure),
                Err(err) => return Err(err),
            };
            report.entries.push(BatchEntry {
                name: test.name().to_string(),
                result: test.result(),
                failure,
            });
        }
        info!(
            ran = report.entries.len(),
            passed = report.passed(),
            failed = report.failed(),
            "batch finished"
        );
        Ok(report)
    }

    pub async fn run_selected(
        &self,
        registry: &mut TestRegistry,
        channel: &ChannelId,
        selector: &RunSelector,
    ) -> Result<BatchReport, OrchestratorError> {
        self.run_by_predicate(registry, channel, |test| selector.matches(test))
            .await
    }
}
