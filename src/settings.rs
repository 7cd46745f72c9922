//! Debounced propagation of job settings to the persistence collaborator
//!
//! Slider/numeric settings (sample size, annotation mix, context window
//! sizes) are buffered per key; only the last value within the
//! quiescence window is propagated, superseded pending values are
//! discarded. Latest-value-wins, not a queue and not a retry policy.
//!
//! Time is passed in by the caller (milliseconds), never read ambiently,
//! so the policy is deterministic and natively testable.

use std::collections::HashMap;

use serde_json::Value;

/// Default quiescence window in milliseconds
pub const DEFAULT_QUIESCENCE_MS: u64 = 500;

#[derive(Clone, Debug)]
struct Pending {
    value: Value,
    deadline: u64,
}

/// Per-key latest-value-wins debounce buffer
#[derive(Clone, Debug)]
pub struct DebouncedSettings {
    quiescence_ms: u64,
    pending: HashMap<String, Pending>,
}

impl Default for DebouncedSettings {
    fn default() -> Self {
        Self::new(DEFAULT_QUIESCENCE_MS)
    }
}

impl DebouncedSettings {
    pub fn new(quiescence_ms: u64) -> Self {
        Self {
            quiescence_ms,
            pending: HashMap::new(),
        }
    }

    /// Buffer a new value for a key, restarting its quiescence window.
    /// Any pending value for the same key is discarded.
    pub fn submit(&mut self, key: &str, value: Value, now_ms: u64) {
        self.pending.insert(
            key.to_string(),
            Pending {
                value,
                deadline: now_ms + self.quiescence_ms,
            },
        );
    }

    /// Flush every key whose quiescence window has elapsed.
    /// Returned pairs are sorted by key for deterministic ordering.
    pub fn poll(&mut self, now_ms: u64) -> Vec<(String, Value)> {
        let ready: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now_ms)
            .map(|(k, _)| k.clone())
            .collect();

        let mut flushed: Vec<(String, Value)> = ready
            .into_iter()
            .filter_map(|key| {
                self.pending
                    .remove(&key)
                    .map(|p| (key, p.value))
            })
            .collect();
        flushed.sort_by(|(a, _), (b, _)| a.cmp(b));
        flushed
    }

    /// Drop everything pending (document/job change)
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nothing_flushes_before_quiescence() {
        let mut settings = DebouncedSettings::new(500);
        settings.submit("n", json!(10), 1000);
        assert!(settings.poll(1400).is_empty());
        assert_eq!(settings.poll(1500), vec![("n".to_string(), json!(10))]);
        assert!(!settings.has_pending());
    }

    #[test]
    fn test_latest_value_wins() {
        let mut settings = DebouncedSettings::new(500);
        settings.submit("n", json!(10), 1000);
        settings.submit("n", json!(20), 1200);
        settings.submit("n", json!(30), 1400);

        // the earlier deadlines were superseded, not queued
        assert!(settings.poll(1600).is_empty());
        assert_eq!(settings.poll(1900), vec![("n".to_string(), json!(30))]);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut settings = DebouncedSettings::new(500);
        settings.submit("n", json!(10), 1000);
        settings.submit("mix", json!(5), 1300);

        assert_eq!(settings.poll(1500), vec![("n".to_string(), json!(10))]);
        assert!(settings.has_pending());
        assert_eq!(settings.poll(1800), vec![("mix".to_string(), json!(5))]);
    }

    #[test]
    fn test_clear_discards_pending() {
        let mut settings = DebouncedSettings::new(500);
        settings.submit("n", json!(10), 0);
        settings.clear();
        assert!(settings.poll(10_000).is_empty());
    }
}
