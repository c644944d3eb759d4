//! Data-quality grading for profiled columns.
//!
//! A column is graded from its null and uniqueness percentages using a fixed
//! policy, evaluated in order:
//!
//! 1. `LOW` when more than half the rows are null, or fewer than 5% of rows
//!    hold distinct values (a near-constant column).
//! 2. `HIGH` when fewer than 5% of rows are null and more than half are distinct.
//! 3. `MEDIUM` otherwise.
//!
//! Each level maps to a numeric score used for aggregate reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const LOW_NULL_PERCENT: f64 = 50.0;
pub const LOW_UNIQUE_PERCENT: f64 = 5.0;
pub const HIGH_NULL_PERCENT: f64 = 5.0;
pub const HIGH_UNIQUE_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityLevel {
    High,
    Medium,
    Low,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 3] = [QualityLevel::High, QualityLevel::Medium, QualityLevel::Low];

    pub fn classify(null_percentage: f64, unique_percentage: f64) -> Self {
        if null_percentage > LOW_NULL_PERCENT || unique_percentage < LOW_UNIQUE_PERCENT {
            QualityLevel::Low
        } else if null_percentage < HIGH_NULL_PERCENT && unique_percentage > HIGH_UNIQUE_PERCENT {
            QualityLevel::High
        } else {
            QualityLevel::Medium
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            QualityLevel::High => 100,
            QualityLevel::Medium => 70,
            QualityLevel::Low => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::High => "HIGH",
            QualityLevel::Medium => "MEDIUM",
            QualityLevel::Low => "LOW",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rounded mean of the per-column scores; 0 when there are no columns.
pub fn overall_score<I>(levels: I) -> u32
where
    I: IntoIterator<Item = QualityLevel>,
{
    let (total, count) = levels
        .into_iter()
        .fold((0u64, 0u64), |(total, count), level| {
            (total + u64::from(level.score()), count + 1)
        });
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as u32
}

/// Counts per level, always in HIGH, MEDIUM, LOW order.
pub fn level_counts<I>(levels: I) -> [(QualityLevel, usize); 3]
where
    I: IntoIterator<Item = QualityLevel>,
{
    let mut counts = QualityLevel::ALL.map(|level| (level, 0usize));
    for level in levels {
        if let Some(entry) = counts.iter_mut().find(|(candidate, _)| *candidate == level) {
            entry.1 += 1;
        }
    }
    counts
}
