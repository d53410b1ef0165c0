pub mod commands;
pub mod demo;
pub mod expect_calls;
pub mod interface;
pub mod logging;
pub mod orchestrator;
pub mod registry;
pub mod reporter;

#[cfg(test)]
mod test_support;

pub use commands::*;
pub use demo::*;
pub use expect_calls::*;
pub use interface::*;
pub use logging::*;
pub use orchestrator::*;
pub use registry::*;
pub use reporter::*;

#[cfg(test)]
mod tests {
    use super::{
        render_stats, test_logic, CallCountMismatch, Command, CommandDispatcher, ExpectCalls,
        Interface, InterfaceError, Orchestrator, OrchestratorError, RunSelector, TestCase,
        TestRegistry,
    };
    use std::any::TypeId;

    #[test]
    fn crate_root_reexports_harness_types() {
        let _ = TypeId::of::<Interface>();
        let _ = TypeId::of::<InterfaceError>();
        let _ = TypeId::of::<Orchestrator>();
        let _ = TypeId::of::<OrchestratorError>();
        let _ = TypeId::of::<TestRegistry>();
        let _ = TypeId::of::<TestCase>();
        let _ = TypeId::of::<CommandDispatcher>();
        let _ = TypeId::of::<CallCountMismatch>();
        let _ = TypeId::of::<ExpectCalls<fn(())>>();
    }

    #[test]
    fn crate_root_reexports_helpers() {
        let mut registry = TestRegistry::new();
        registry
            .register("ping", test_logic(|_| async { Ok(()) }), false)
            .expect("register");
        assert!(render_stats(&registry).contains("ping"));
        assert_eq!(
            Command::parse("::", "::run failed"),
            Some(Command::Run(Some(RunSelector::Failed)))
        );
    }
}
