//! Recently used codes, most-recent-first

use serde::{Deserialize, Serialize};

const DEFAULT_CAP: usize = 10;

/// Bounded, de-duplicated history of recently assigned code values
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RecentCodeHistory {
    values: Vec<String>,
    cap: usize,
}

impl Default for RecentCodeHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAP)
    }
}

impl RecentCodeHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            values: Vec::new(),
            cap,
        }
    }

    /// Record a use of a code value, moving it to the front
    pub fn push(&mut self, value: &str) {
        self.values.retain(|v| v != value);
        self.values.insert(0, value.to_string());
        self.values.truncate(self.cap);
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
