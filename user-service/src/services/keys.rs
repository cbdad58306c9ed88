use crate::models::KEY_PREFIX;
use std::sync::atomic::{AtomicU64, Ordering};

/// Issues `user::<epoch millis>` keys.
///
/// Two calls landing in the same millisecond get consecutive values, so keys
/// are strictly increasing within one process. Keys minted by other processes
/// can still collide; the store's insert reports that as a conflict.
#[derive(Debug, Default)]
pub struct KeyGenerator {
    last_millis: AtomicU64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_key(&self) -> String {
        format!("{}{}", KEY_PREFIX, self.next_millis(now_millis()))
    }

    fn next_millis(&self, now: u64) -> u64 {
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let candidate = if now > last { now } else { last + 1 };
            match self.last_millis.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
