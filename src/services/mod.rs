pub mod notify;
pub mod queue;
pub mod retry;
pub mod steam;
pub mod store;
