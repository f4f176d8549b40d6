use serde::{Deserialize, Serialize};

use super::profile::RiskProfile;

/// How often one flag message occurred across a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagCount {
    pub flag: String,
    pub count: usize,
}

/// Batch-level totals over independently assessed profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub properties_assessed: usize,
    pub properties_with_flags: usize,
    pub total_flags: usize,
    /// Ordered by first occurrence.
    pub flag_counts: Vec<FlagCount>,
}

impl BatchSummary {
    pub fn from_profiles(profiles: &[RiskProfile]) -> Self {
        profiles
            .iter()
            .fold(Self::default(), |mut summary, profile| {
                summary.record(profile);
                summary
            })
    }

    fn record(&mut self, profile: &RiskProfile) {
        self.properties_assessed += 1;
        if profile.has_red_flags() {
            self.properties_with_flags += 1;
        }
        for flag in profile.red_flags() {
            self.total_flags += 1;
            match self.flag_counts.iter_mut().find(|entry| entry.flag == *flag) {
                Some(entry) => entry.count += 1,
                None => self.flag_counts.push(FlagCount {
                    flag: flag.clone(),
                    count: 1,
                }),
            }
        }
    }

    pub fn count_for(&self, flag: &str) -> usize {
        self.flag_counts
            .iter()
            .find(|entry| entry.flag == flag)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}
