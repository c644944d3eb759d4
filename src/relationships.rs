//! Name-based relationship detection across tables.
//!
//! Detection runs in two passes. The first generates candidates for every
//! ordered pair of columns from different tables: exact matches (names equal
//! ignoring case) and then fuzzy matches (normalized Levenshtein similarity
//! strictly between 0.7 and 1.0). The second pass keeps the first candidate
//! seen for each unordered column pair and stable-sorts the survivors by
//! strength.

use std::{collections::HashSet, fmt};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::column_profile::{ColumnProfile, round_to};

/// Fuzzy matches need a similarity above `NUMERATOR / DENOMINATOR`.
pub const SIMILARITY_NUMERATOR: usize = 7;
pub const SIMILARITY_DENOMINATOR: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnRef {
    pub table_name: String,
    pub column_name: String,
}

impl ColumnRef {
    pub fn of(profile: &ColumnProfile) -> Self {
        Self {
            table_name: profile.table_name.clone(),
            column_name: profile.column_name.clone(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table_name, self.column_name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    ExactMatch,
    SimilarName,
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipType::ExactMatch => f.write_str("EXACT_MATCH"),
            RelationshipType::SimilarName => f.write_str("SIMILAR_NAME"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Strength {
    High,
    Medium,
    Low,
}

impl Strength {
    fn rank(&self) -> u8 {
        match self {
            Strength::High => 0,
            Strength::Medium => 1,
            Strength::Low => 2,
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::High => f.write_str("HIGH"),
            Strength::Medium => f.write_str("MEDIUM"),
            Strength::Low => f.write_str("LOW"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub from: ColumnRef,
    pub to: ColumnRef,
    pub relationship_type: RelationshipType,
    pub strength: Strength,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl Relationship {
    fn unordered_key(&self) -> (ColumnRef, ColumnRef) {
        if self.from <= self.to {
            (self.from.clone(), self.to.clone())
        } else {
            (self.to.clone(), self.from.clone())
        }
    }
}

pub fn detect_relationships<C>(columns: &[C]) -> Vec<Relationship>
where
    C: AsRef<ColumnProfile>,
{
    let candidates = generate_candidates(columns);
    deduplicate(candidates)
}

fn generate_candidates<C>(columns: &[C]) -> Vec<Relationship>
where
    C: AsRef<ColumnProfile>,
{
    let lowered = columns
        .iter()
        .map(|c| c.as_ref().column_name.to_lowercase())
        .collect::<Vec<_>>();
    let cross_table_pairs = (0..columns.len())
        .cartesian_product(0..columns.len())
        .filter(|&(a, b)| {
            a != b && columns[a].as_ref().table_name != columns[b].as_ref().table_name
        })
        .collect::<Vec<_>>();

    let mut candidates = Vec::new();
    for &(a, b) in &cross_table_pairs {
        if lowered[a] == lowered[b] {
            candidates.push(Relationship {
                from: ColumnRef::of(columns[a].as_ref()),
                to: ColumnRef::of(columns[b].as_ref()),
                relationship_type: RelationshipType::ExactMatch,
                strength: Strength::High,
                similarity: None,
            });
        }
    }
    for &(a, b) in &cross_table_pairs {
        if let Some(similarity) = fuzzy_similarity(&lowered[a], &lowered[b]) {
            candidates.push(Relationship {
                from: ColumnRef::of(columns[a].as_ref()),
                to: ColumnRef::of(columns[b].as_ref()),
                relationship_type: RelationshipType::SimilarName,
                strength: Strength::Medium,
                similarity: Some(similarity),
            });
        }
    }
    candidates
}

fn deduplicate(candidates: Vec<Relationship>) -> Vec<Relationship> {
    let mut seen = HashSet::new();
    let mut kept = candidates
        .into_iter()
        .filter(|rel| seen.insert(rel.unordered_key()))
        .collect::<Vec<_>>();
    kept.sort_by_key(|rel| rel.strength.rank());
    kept
}

/// Similarity of two already-lowercased names when it lies strictly inside
/// the fuzzy-match window, rounded to four decimals.
///
/// The window test runs on integer edit counts so that a similarity of exactly
/// 0.7 is never admitted through floating-point error.
pub fn fuzzy_similarity(left: &str, right: &str) -> Option<f64> {
    let longest = left.chars().count().max(right.chars().count());
    if longest == 0 {
        return None;
    }
    let distance = levenshtein(left, right);
    let kept = longest - distance;
    let above_threshold = kept * SIMILARITY_DENOMINATOR > longest * SIMILARITY_NUMERATOR;
    (distance > 0 && above_threshold).then(|| round_to(kept as f64 / longest as f64, 4))
}

/// Character-level edit distance using a single rolling row.
pub fn levenshtein(left: &str, right: &str) -> usize {
    let right_chars = right.chars().collect::<Vec<_>>();
    if left.is_empty() {
        return right_chars.len();
    }
    let mut row = (0..=right_chars.len()).collect::<Vec<usize>>();
    for (i, lc) in left.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, rc) in right_chars.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(lc != *rc);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }
    row[right_chars.len()]
}
