// crates/resilience/src/lib.rs
//! Async task utilities for the player's event loop
//!
//! - Timeouts for operations that may never complete (metadata probes)
//! - Cancellable tasks keyed by resource id, so a superseding request can
//!   abort the stale one before it lands
//!
//! # Example
//!
//! ```rust
//! use bookdeck_resilience::{KeyedTasks, Timeout};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let timeout = Timeout::from_millis(500);
//! let mut tasks: KeyedTasks<String> = KeyedTasks::new();
//! tasks.spawn("1-chapter-1".to_string(), async move {
//!     let _ = timeout.run(async { 42 }).await;
//! });
//! # }
//! ```

mod error;
mod tasks;
mod timeout;

pub use error::{ResilienceError, ResilienceResult};
pub use tasks::{Generation, KeyedTasks};
pub use timeout::{with_timeout, Timeout};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: KeyedTasks<u32> = KeyedTasks::default();
        let _: Timeout = Timeout::new(std::time::Duration::from_secs(5));
    }
}
