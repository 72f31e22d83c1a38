use std::sync::atomic::{AtomicI64, Ordering};

/// Identifiers are opaque strings assigned either by the CMS backend or,
/// for components, client-side at creation time.
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Last millisecond value handed out by [`next_timestamp_id`].
static LAST_ISSUED_MS: AtomicI64 = AtomicI64::new(0);

/// Return a strictly increasing millisecond timestamp for use in ids.
///
/// Follows the wall clock, but never returns the same value twice within a
/// process, even when called several times in the same millisecond or when
/// the clock steps backwards.
pub fn next_timestamp_id() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_ISSUED_MS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ISSUED_MS.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}
