//! Fuzzy merging of POI groups whose names are near-identical.
//!
//! The places API often returns the same shop under slightly different names
//! from different route points ("Coffee House" / "Coffee Hous"). Groups whose
//! case-insensitive similarity ratio exceeds a threshold are treated as one
//! physical POI.
//!
//! Two merge modes are available:
//! - [`MergeMode::Greedy`]: single pass in encounter order. Each unmerged seed
//!   absorbs every later unmerged group similar to the seed's own name. The
//!   outcome depends on input order.
//! - [`MergeMode::Transitive`]: union-find over every similar pair, so chains
//!   of similar names collapse into one group regardless of order.

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::PoiGroup;

/// How similar names are clustered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Encounter-order seeds, compared against the seed name only
    #[default]
    Greedy,
    /// Connected components of the "similar" relation
    Transitive,
}

/// Similarity of two strings on a 0-100 scale.
///
/// Computed as `2 * LCS / (len_a + len_b)` over Unicode characters (the
/// Levenshtein indel ratio) and rounded half-to-even. Identical strings score
/// 100; an empty string against a non-empty one scores 0. Comparison is
/// case-sensitive; callers lowercase first.
///
/// # Example
///
/// ```rust
/// use route_poi::fuzzy_ratio;
///
/// assert_eq!(fuzzy_ratio("coffee house", "coffee hous"), 96.0);
/// assert!(fuzzy_ratio("coffee house", "gas station") < 85.0);
/// ```
pub fn fuzzy_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 100.0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let common = longest_common_subsequence(&a, &b);
    let total = (a.len() + b.len()) as f64;
    (200.0 * common as f64 / total).round_ties_even()
}

/// Length of the longest common subsequence (two-row dynamic programming).
fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Merge groups with similar names.
///
/// `threshold` is on the 0-100 scale of [`fuzzy_ratio`]; a pair merges only
/// when its ratio is strictly greater. The merged group keeps the canonical
/// name (the seed in greedy mode, the earliest name in transitive mode) and
/// the members of every absorbed group, appended in encounter order.
///
/// # Example
///
/// ```rust
/// use route_poi::{merge_similar_groups, MergeMode, PoiGroup};
///
/// let groups = vec![
///     PoiGroup::new("Coffee House"),
///     PoiGroup::new("Gas Station"),
///     PoiGroup::new("Coffee Hous"),
/// ];
///
/// let merged = merge_similar_groups(groups, 85.0, MergeMode::Greedy);
/// let names: Vec<&str> = merged.iter().map(|g| g.name.as_str()).collect();
/// assert_eq!(names, vec!["Coffee House", "Gas Station"]);
/// ```
pub fn merge_similar_groups(
    groups: Vec<PoiGroup>,
    threshold: f64,
    mode: MergeMode,
) -> Vec<PoiGroup> {
    let input_count = groups.len();
    let merged = match mode {
        MergeMode::Greedy => merge_greedy(groups, threshold),
        MergeMode::Transitive => merge_transitive(groups, threshold),
    };

    info!(
        "[NameMerge] {} groups -> {} after {:?} merge (threshold {})",
        input_count,
        merged.len(),
        mode,
        threshold
    );

    merged
}

fn merge_greedy(groups: Vec<PoiGroup>, threshold: f64) -> Vec<PoiGroup> {
    let lowered: Vec<String> = groups.iter().map(|g| g.name.to_lowercase()).collect();
    let mut slots: Vec<Option<PoiGroup>> = groups.into_iter().map(Some).collect();
    let mut merged = Vec::new();

    for i in 0..slots.len() {
        let Some(mut seed) = slots[i].take() else {
            continue;
        };

        // Every earlier slot is already taken
        for j in (i + 1)..slots.len() {
            if slots[j].is_none() {
                continue;
            }
            let similarity = fuzzy_ratio(&lowered[i], &lowered[j]);
            if similarity > threshold {
                if let Some(other) = slots[j].take() {
                    debug!(
                        "[NameMerge] '{}' absorbs '{}' ({:.0})",
                        seed.name, other.name, similarity
                    );
                    seed.members.extend(other.members);
                }
            }
        }

        merged.push(seed);
    }

    merged
}

fn merge_transitive(groups: Vec<PoiGroup>, threshold: f64) -> Vec<PoiGroup> {
    let lowered: Vec<String> = groups.iter().map(|g| g.name.to_lowercase()).collect();
    let mut parent: Vec<usize> = (0..groups.len()).collect();

    for i in 0..lowered.len() {
        for j in (i + 1)..lowered.len() {
            if fuzzy_ratio(&lowered[i], &lowered[j]) > threshold {
                union(&mut parent, i, j);
            }
        }
    }

    // The root of each component is its earliest group, so it is seen first
    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut merged: Vec<PoiGroup> = Vec::new();

    for (i, group) in groups.into_iter().enumerate() {
        let root = find(&mut parent, i);
        match slot_of_root.get(&root) {
            Some(&slot) => {
                debug!("[NameMerge] '{}' joins '{}'", group.name, merged[slot].name);
                merged[slot].members.extend(group.members);
            }
            None => {
                slot_of_root.insert(root, merged.len());
                merged.push(group);
            }
        }
    }

    merged
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let current = parent[i];
    if current == i {
        return i;
    }
    let root = find(parent, current);
    parent[i] = root;
    root
}

/// Join two components, keeping the smaller index as root.
fn union(parent: &mut [usize], a: usize, b: usize) {
    let root_a = find(parent, a);
    let root_b = find(parent, b);
    if root_a != root_b {
        let (keep, attach) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        parent[attach] = keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpsPoint, GroupMember, Side};

    fn group(name: &str, members: usize) -> PoiGroup {
        let mut g = PoiGroup::new(name);
        for i in 0..members {
            g.members.push(GroupMember {
                side: Side::Right,
                source: GpsPoint::new(10.0 + i as f64 * 0.0001, 106.0),
                poi: GpsPoint::new(10.0005, 106.001),
                bearing: 60.0,
                distance: 120.0,
            });
        }
        g
    }

    fn names(groups: &[PoiGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_fuzzy_ratio_values() {
        assert_eq!(fuzzy_ratio("coffee house", "coffee hous"), 96.0);
        assert_eq!(fuzzy_ratio("coffee house", "gas station"), 17.0);
        assert_eq!(fuzzy_ratio("abc", "abc"), 100.0);
        assert_eq!(fuzzy_ratio("", ""), 100.0);
        assert_eq!(fuzzy_ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_fuzzy_ratio_unicode() {
        // Vietnamese diacritics count as single characters
        assert_eq!(fuzzy_ratio("phở hòa", "phở hòa"), 100.0);
        assert_eq!(fuzzy_ratio("phở", "pho"), 67.0);
    }

    #[test]
    fn test_lcs() {
        let a: Vec<char> = "ABCBDAB".chars().collect();
        let b: Vec<char> = "BDCABA".chars().collect();
        assert_eq!(longest_common_subsequence(&a, &b), 4);
    }

    #[test]
    fn test_similar_names_merge_case_insensitive() {
        let groups = vec![group("Coffee House", 2), group("COFFEE HOUS", 1)];
        let merged = merge_similar_groups(groups, 85.0, MergeMode::Greedy);
        assert_eq!(names(&merged), vec!["Coffee House"]);
        assert_eq!(merged[0].members.len(), 3);
    }

    #[test]
    fn test_dissimilar_names_stay_apart() {
        let groups = vec![group("Coffee House", 1), group("Gas Station", 1)];
        let merged = merge_similar_groups(groups, 85.0, MergeMode::Greedy);
        assert_eq!(names(&merged), vec!["Coffee House", "Gas Station"]);
    }

    #[test]
    fn test_threshold_is_strict() {
        // Ratio is exactly 85
        assert_eq!(fuzzy_ratio("ben thanh mark", "ben thanh market st"), 85.0);
        let groups = vec![group("Ben Thanh Mark", 1), group("Ben Thanh Market St", 1)];
        assert_eq!(merge_similar_groups(groups, 85.0, MergeMode::Greedy).len(), 2);
    }

    #[test]
    fn test_greedy_is_order_dependent() {
        // A~B (87), B~C (94), A!~C (81)
        let a = "Pharmacity Q1";
        let b = "Pharmacity Q1 Hub";
        let c = "Pharmacity Q1 Hub 2";

        let seeded_by_a = merge_similar_groups(
            vec![group(a, 1), group(c, 1), group(b, 1)],
            85.0,
            MergeMode::Greedy,
        );
        assert_eq!(names(&seeded_by_a), vec![a, c]);
        assert_eq!(seeded_by_a[0].members.len(), 2);

        let seeded_by_b = merge_similar_groups(
            vec![group(b, 1), group(a, 1), group(c, 1)],
            85.0,
            MergeMode::Greedy,
        );
        assert_eq!(names(&seeded_by_b), vec![b]);
        assert_eq!(seeded_by_b[0].members.len(), 3);
    }

    #[test]
    fn test_transitive_merges_chains() {
        let merged = merge_similar_groups(
            vec![
                group("Pharmacity Q1", 1),
                group("Gas Station", 2),
                group("Pharmacity Q1 Hub 2", 1),
                group("Pharmacity Q1 Hub", 1),
            ],
            85.0,
            MergeMode::Transitive,
        );
        assert_eq!(names(&merged), vec!["Pharmacity Q1", "Gas Station"]);
        assert_eq!(merged[0].members.len(), 3);
        assert_eq!(merged[1].members.len(), 2);
    }

    #[test]
    fn test_merge_preserves_member_order() {
        let mut first = group("Coffee House", 1);
        first.members[0].distance = 1.0;
        let mut second = group("Coffee Hous", 1);
        second.members[0].distance = 2.0;

        let merged = merge_similar_groups(vec![first, second], 85.0, MergeMode::Greedy);
        assert_eq!(merged[0].distances(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_similar_groups(vec![], 85.0, MergeMode::Greedy).is_empty());
        assert!(merge_similar_groups(vec![], 85.0, MergeMode::Transitive).is_empty());
    }
}
