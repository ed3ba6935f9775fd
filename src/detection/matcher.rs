//! Brute-force descriptor matching with cross-check.

use super::features::Descriptor;

/// One accepted match between two descriptor sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorMatch {
    /// Index into the first (query) set.
    pub query: usize,
    /// Index into the second (train) set.
    pub train: usize,
    /// Hamming distance; lower is better.
    pub distance: u32,
}

/// Matches two descriptor sets into ranked correspondences.
pub trait DescriptorMatcher: Send + Sync {
    /// Returns matches ordered by ascending distance.
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<DescriptorMatch>;
}

/// Exhaustive Hamming matcher.
///
/// With cross-check enabled a pair is kept only if each descriptor is
/// the other's nearest neighbour.
#[derive(Debug, Clone, Copy)]
pub struct BruteForceMatcher {
    cross_check: bool,
}

impl BruteForceMatcher {
    pub fn new(cross_check: bool) -> Self {
        Self { cross_check }
    }
}

impl Default for BruteForceMatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Index and distance of the nearest candidate; first wins on ties.
fn nearest(needle: &Descriptor, haystack: &[Descriptor]) -> Option<(usize, u32)> {
    haystack
        .iter()
        .enumerate()
        .map(|(i, d)| (i, needle.hamming(d)))
        .min_by_key(|&(i, dist)| (dist, i))
}

impl DescriptorMatcher for BruteForceMatcher {
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<DescriptorMatch> {
        let backward: Vec<Option<usize>> = if self.cross_check {
            train
                .iter()
                .map(|d| nearest(d, query).map(|(i, _)| i))
                .collect()
        } else {
            Vec::new()
        };

        let mut matches: Vec<DescriptorMatch> = query
            .iter()
            .enumerate()
            .filter_map(|(q, d)| {
                let (t, distance) = nearest(d, train)?;
                if self.cross_check && backward[t] != Some(q) {
                    return None;
                }
                Some(DescriptorMatch {
                    query: q,
                    train: t,
                    distance,
                })
            })
            .collect();

        matches.sort_by_key(|m| (m.distance, m.query));
        matches
    }
}
