pub mod config;
pub mod error;
pub mod kernel;
pub mod services;

pub use error::WatchError;
pub use kernel::reactor::Reactor;
