//! Scheduling helpers: fixed-delay retries and cancellable periodic tasks.
pub mod periodic;
pub mod retry;

pub use periodic::PeriodicTask;
pub use retry::RetryPolicy;
