//! Rejection reason counters

use crate::validation::RejectionReason;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// How often each rejection reason occurred
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RejectionTally {
    counts: BTreeMap<RejectionReason, usize>,
}

impl RejectionTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: RejectionReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &RejectionTally) {
        for (&reason, &count) in &other.counts {
            *self.counts.entry(reason).or_insert(0) += count;
        }
    }

    pub fn get(&self, reason: RejectionReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RejectionReason, usize)> + '_ {
        self.counts.iter().map(|(&r, &c)| (r, c))
    }
}

impl fmt::Display for RejectionTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return f.write_str("none");
        }
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(reason, count)| format!("{}: {}", reason, count))
            .collect();
        f.write_str(&parts.join(", "))
    }
}
