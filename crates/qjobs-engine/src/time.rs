//! Wall-clock helpers. The store persists timestamps as Unix epoch
//! seconds (float), matching the Python reference implementation this
//! queue's wire format was distilled from.

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}
