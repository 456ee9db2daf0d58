//! Match identifiers and hit/match association maps.

use crossview_core::HitId;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of one tested cluster pair.
///
/// Only meaningful within the matching pass that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MatchId(pub u32);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Issues [`MatchId`]s 1, 2, 3, ... for one matching pass.
#[derive(Debug, Clone)]
pub struct MatchIdSequence {
    next: u32,
}

impl Default for MatchIdSequence {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl MatchIdSequence {
    /// Starts a new sequence at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identifier.
    pub fn next_id(&mut self) -> MatchId {
        let id = MatchId(self.next);
        self.next += 1;
        id
    }
}

/// Hits of one view claimed by cluster-pair matches.
///
/// Both directions are kept in step by [`record`](Self::record): every
/// `(hit, match)` pairing appears in the hit map and in the match map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ViewAssociations {
    hit_to_matches: BTreeMap<HitId, BTreeSet<MatchId>>,
    match_to_hits: BTreeMap<MatchId, BTreeSet<HitId>>,
}

impl ViewAssociations {
    /// Creates empty maps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `match_id` claims `hit`.
    pub fn record(&mut self, match_id: MatchId, hit: HitId) {
        self.hit_to_matches.entry(hit).or_default().insert(match_id);
        self.match_to_hits.entry(match_id).or_default().insert(hit);
    }

    /// Matches claiming a hit.
    #[must_use]
    pub fn matches_for_hit(&self, hit: HitId) -> Option<&BTreeSet<MatchId>> {
        self.hit_to_matches.get(&hit)
    }

    /// Hits claimed by a match.
    #[must_use]
    pub fn hits_for_match(&self, match_id: MatchId) -> Option<&BTreeSet<HitId>> {
        self.match_to_hits.get(&match_id)
    }

    /// Hit to claiming matches.
    #[must_use]
    pub fn hit_map(&self) -> &BTreeMap<HitId, BTreeSet<MatchId>> {
        &self.hit_to_matches
    }

    /// Match to claimed hits.
    #[must_use]
    pub fn match_map(&self) -> &BTreeMap<MatchId, BTreeSet<HitId>> {
        &self.match_to_hits
    }

    /// Number of claiming matches for a hit (zero if unclaimed).
    #[must_use]
    pub fn claim_count(&self, hit: HitId) -> usize {
        self.hit_to_matches.get(&hit).map_or(0, BTreeSet::len)
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.match_to_hits.is_empty()
    }

    /// Number of recorded `(hit, match)` pairings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.match_to_hits.values().map(BTreeSet::len).sum()
    }

    /// Checks that the two maps describe the same pairings.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let forward: usize = self.hit_to_matches.values().map(BTreeSet::len).sum();
        forward == self.len()
            && self.hit_to_matches.iter().all(|(hit, matches)| {
                matches.iter().all(|m| {
                    self.match_to_hits
                        .get(m)
                        .is_some_and(|hits| hits.contains(hit))
                })
            })
    }
}
