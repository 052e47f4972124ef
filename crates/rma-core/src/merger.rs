//! Correspondence between a candidate collection and the previous release.
//!
//! For every pair of groups with intersecting loop sets the merger records
//! the intersection, both set differences and both asymmetric overlap
//! ratios, then classifies each candidate group: exact match, updated
//! (same lineage, version bump), or new identity, with the matched old
//! motifs recorded as parents.

use std::collections::{BTreeMap, BTreeSet};

use crate::collection::MotifCollection;

/// Both overlap ratios must reach this threshold for a group to keep the
/// lineage of an intersecting motif.
pub const MIN_OVERLAP: f64 = 2.0 / 3.0;

/// How one candidate group relates to the previous release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The group is identical to one old motif; id and version are reused.
    ExactMatch {
        /// The old motif id.
        motif_id: String,
    },
    /// The group continues one old motif's lineage with a changed member
    /// set; the handle is kept and the version incremented.
    Updated {
        /// The old motif whose lineage is continued.
        motif_id: String,
        /// All intersecting old motifs, the winner included.
        parents: Vec<String>,
    },
    /// The group gets a brand-new motif id.
    New {
        /// Intersecting old motifs recorded as ancestry, possibly empty.
        parents: Vec<String>,
    },
}

/// Classification plus the human-readable reason stored on the motif row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDecision {
    pub classification: Classification,
    pub explanation: &'static str,
}

/// Pairwise comparison data and the per-group classification.
///
/// `intersections`, `overlaps` and `setdiffs` are keyed in both directions:
/// `[new group][old motif]` and `[old motif][new group]`.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub decisions: BTreeMap<String, GroupDecision>,
    pub intersections: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    pub overlaps: BTreeMap<String, BTreeMap<String, f64>>,
    pub setdiffs: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl MergeOutcome {
    /// The old motifs intersecting a candidate group, if any.
    pub fn matches_of(&self, group: &str) -> Option<&BTreeMap<String, BTreeSet<String>>> {
        self.intersections.get(group)
    }

    /// The recorded overlap ratio |A∩B| / |A| for the (a, b) orientation.
    pub fn overlap(&self, a: &str, b: &str) -> Option<f64> {
        self.overlaps.get(a).and_then(|row| row.get(b)).copied()
    }
}

/// Compare the candidate collection against the previous release's.
pub fn merge(new: &MotifCollection, old: &MotifCollection) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    compare(new, old, &mut outcome);

    for group in new.group_set() {
        let decision = classify(group, new, &outcome);
        outcome.decisions.insert(group.clone(), decision);
    }
    outcome
}

/// Record intersections, set differences and overlaps for every
/// intersecting pair.
fn compare(new: &MotifCollection, old: &MotifCollection, outcome: &mut MergeOutcome) {
    for group in new.group_set() {
        let Some(group_loops) = new.loop_set_of(group) else {
            continue;
        };
        for motif in old.group_set() {
            let Some(motif_loops) = old.loop_set_of(motif) else {
                continue;
            };
            let shared: BTreeSet<String> =
                group_loops.intersection(motif_loops).cloned().collect();
            if shared.is_empty() {
                continue;
            }

            let group_only: BTreeSet<String> =
                group_loops.difference(motif_loops).cloned().collect();
            let motif_only: BTreeSet<String> =
                motif_loops.difference(group_loops).cloned().collect();

            let forward = shared.len() as f64 / group_loops.len() as f64;
            let backward = shared.len() as f64 / motif_loops.len() as f64;

            outcome
                .intersections
                .entry(group.clone())
                .or_default()
                .insert(motif.clone(), shared.clone());
            outcome
                .intersections
                .entry(motif.clone())
                .or_default()
                .insert(group.clone(), shared);
            outcome
                .setdiffs
                .entry(group.clone())
                .or_default()
                .insert(motif.clone(), group_only);
            outcome
                .setdiffs
                .entry(motif.clone())
                .or_default()
                .insert(group.clone(), motif_only);
            outcome
                .overlaps
                .entry(group.clone())
                .or_default()
                .insert(motif.clone(), forward);
            outcome
                .overlaps
                .entry(motif.clone())
                .or_default()
                .insert(group.clone(), backward);
        }
    }
}

/// Classify one candidate group. First matching rule wins.
fn classify(group: &str, new: &MotifCollection, outcome: &MergeOutcome) -> GroupDecision {
    let Some(matches) = outcome.matches_of(group) else {
        return GroupDecision {
            classification: Classification::New {
                parents: Vec::new(),
            },
            explanation: "New id, no parents",
        };
    };

    let group_size = new.loop_set_of(group).map(BTreeSet::len).unwrap_or(0);
    let qualified = |motif: &str| {
        outcome.overlap(group, motif).unwrap_or(0.0) >= MIN_OVERLAP
            && outcome.overlap(motif, group).unwrap_or(0.0) >= MIN_OVERLAP
    };

    if matches.len() == 1 {
        let Some((motif, shared)) = matches.iter().next() else {
            // matches_of never yields an empty map.
            return GroupDecision {
                classification: Classification::New {
                    parents: Vec::new(),
                },
                explanation: "New id, no parents",
            };
        };
        let motif = motif.clone();
        let motif_size = outcome
            .setdiffs
            .get(&motif)
            .and_then(|row| row.get(group))
            .map(|diff| diff.len() + shared.len())
            .unwrap_or(0);

        if shared.len() == group_size && shared.len() == motif_size {
            GroupDecision {
                classification: Classification::ExactMatch { motif_id: motif },
                explanation: "Exact match",
            }
        } else if qualified(&motif) {
            GroupDecision {
                classification: Classification::Updated {
                    motif_id: motif.clone(),
                    parents: vec![motif],
                },
                explanation: "Updated, 1 parent",
            }
        } else {
            GroupDecision {
                classification: Classification::New {
                    parents: vec![motif],
                },
                explanation: "New id, 1 parent",
            }
        }
    } else if matches.len() == 2 {
        let parents: Vec<String> = matches.keys().cloned().collect();
        // Candidates are tried in a fixed order: strongest combined
        // overlap first, ties broken by motif id.
        let mut candidates = parents.clone();
        candidates.sort_by(|a, b| {
            let score = |m: &str| {
                outcome.overlap(group, m).unwrap_or(0.0)
                    + outcome.overlap(m, group).unwrap_or(0.0)
            };
            score(b)
                .partial_cmp(&score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });

        for motif in &candidates {
            if qualified(motif) {
                return GroupDecision {
                    classification: Classification::Updated {
                        motif_id: motif.clone(),
                        parents,
                    },
                    explanation: "Updated, 2 parents",
                };
            }
        }
        GroupDecision {
            classification: Classification::New { parents },
            explanation: "New id, 2 parents",
        }
    } else {
        GroupDecision {
            classification: Classification::New {
                parents: matches.keys().cloned().collect(),
            },
            explanation: "> 2 parents",
        }
    }
}
