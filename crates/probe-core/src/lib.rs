pub mod config;
pub mod failure;
pub mod state;
pub mod types;
pub mod validation;

pub use config::*;
pub use failure::*;
pub use state::*;
pub use types::*;
pub use validation::*;
