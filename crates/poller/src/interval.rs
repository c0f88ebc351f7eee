//! Poll interval computation.

use std::time::Duration;

use crate::types::BACKOFF_FLOOR_SECS;

/// Computes the delay before the next fetch, in seconds.
///
/// With no failures the base is `refresh_secs`. After `retry_attempts`
/// consecutive failures the base grows linearly as
/// `retry_attempts * refresh_secs`, floored at [`BACKOFF_FLOOR_SECS`].
/// The server's advertised minimum then wins if it is longer.
pub fn next_interval_secs(retry_attempts: u32, refresh_secs: u64, server_secs: Option<u64>) -> u64 {
    let base = if retry_attempts > 0 {
        u64::from(retry_attempts)
            .saturating_mul(refresh_secs)
            .max(BACKOFF_FLOOR_SECS)
    } else {
        refresh_secs
    };
    base.max(server_secs.unwrap_or(refresh_secs))
}

/// [`next_interval_secs`] as a [`Duration`].
pub fn next_interval(retry_attempts: u32, refresh_secs: u64, server_secs: Option<u64>) -> Duration {
    Duration::from_secs(next_interval_secs(retry_attempts, refresh_secs, server_secs))
}
