//! A generic point-in-time wrapper, used wherever a stage needs to pair a
//! value with the instant it was observed (a quote, an account snapshot)
//! without every such type re-declaring its own `timestamp` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub value: T,
    pub observed_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    pub fn new(value: T, observed_at: DateTime<Utc>) -> Self {
        Self { value, observed_at }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Snapshot<U> {
        Snapshot {
            value: f(self.value),
            observed_at: self.observed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_the_observation_time() {
        let snapshot = Snapshot::new(5, Utc::now());
        let observed_at = snapshot.observed_at;
        let mapped = snapshot.map(|v| v * 2);
        assert_eq!(mapped.value, 10);
        assert_eq!(mapped.observed_at, observed_at);
    }
}
