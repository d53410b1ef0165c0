pub mod error;
pub mod local;
pub mod resolve;
pub mod session;
pub mod watch;

pub use error::*;
pub use local::*;
pub use resolve::*;
pub use session::*;
pub use watch::*;
