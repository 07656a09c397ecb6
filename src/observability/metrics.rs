//! Metrics collection.
//!
//! # Metrics
//! - `file_rbac_hash_cache_hits_total` (counter): verifications served from the hash cache
//! - `file_rbac_hash_cache_misses_total` (counter): verifications that derived a hash
//! - `file_rbac_hash_duration_seconds` (histogram): time spent deriving a hash
//! - `file_rbac_reloads_total` (counter): reload cycles by `outcome`
//! - `file_rbac_auth_decisions_total` (counter): connect decisions by `decision`

use std::time::Duration;

pub fn record_hash_cache_hit() {
    metrics::counter!("file_rbac_hash_cache_hits_total").increment(1);
}

pub fn record_hash_cache_miss() {
    metrics::counter!("file_rbac_hash_cache_misses_total").increment(1);
}

pub fn record_hash_duration(elapsed: Duration) {
    metrics::histogram!("file_rbac_hash_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record one reload cycle (`missing`, `unchanged`, `rejected`, `reloaded`).
pub fn record_reload(outcome: &'static str) {
    metrics::counter!("file_rbac_reloads_total", "outcome" => outcome).increment(1);
}

/// Record one connect decision (`authenticated`, `failed`, `next`).
pub fn record_auth_decision(decision: &'static str) {
    metrics::counter!("file_rbac_auth_decisions_total", "decision" => decision).increment(1);
}
