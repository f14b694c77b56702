//! Generic timestamp wrapper.

use serde::{Deserialize, Serialize};

/// A value tagged with the capture time in microseconds since epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timestamped<T> {
    pub data: T,
    pub timestamp_us: u64,
}

impl<T> Timestamped<T> {
    #[inline]
    pub fn new(data: T, timestamp_us: u64) -> Self {
        Self { data, timestamp_us }
    }
}

/// Current wall-clock time in microseconds since epoch.
pub fn now_us() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_us_stamps_records() {
        let first = now_us();
        let stamped = Timestamped::new(7u32, now_us());

        assert!(first > 1_600_000_000_000_000);
        assert!(stamped.timestamp_us >= first);
        assert_eq!(stamped.data, 7);
    }
}
