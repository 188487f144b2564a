//! Worker loop and handler registry.

pub mod handler;
pub mod handlers;
mod loop_;

pub use handler::{HandlerFn, HandlerRegistry, HandlerRegistryBuilder};
pub use handlers::builtin_registry;
pub use loop_::Worker;

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}
