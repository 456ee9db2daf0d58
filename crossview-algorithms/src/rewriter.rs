//! Cluster rewriting from accumulated hit associations.
//!
//! Hits claimed by exactly one match move out of their current cluster into
//! a new cluster per match. Hits claimed by several matches stay where they
//! are. Work happens on a staged copy of the event so a failure leaves the
//! view's list exactly as it was.

use crate::association::{MatchId, ViewAssociations};
use crossview_core::{ClusterId, Error, Event, HitId, MatchingError};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

/// What the rewriter did to one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RewriteSummary {
    /// Claimed hits left alone because several matches claim them.
    pub ambiguous_hits: usize,
    /// Hits moved into new clusters.
    pub hits_migrated: usize,
    /// Clusters deleted because all their hits moved.
    pub clusters_deleted: usize,
    /// Clusters that lost some of their hits.
    pub clusters_trimmed: usize,
    /// Clusters created from match claims.
    pub clusters_created: usize,
    /// Clusters kept as they are because one match claims exactly their hits.
    pub clusters_retained: usize,
}

impl RewriteSummary {
    /// Returns true if the list was not modified.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.clusters_deleted == 0 && self.clusters_trimmed == 0 && self.clusters_created == 0
    }
}

/// Rewrites the available clusters of `list_name` from `associations`.
///
/// Fatal errors: a uniquely claimed hit owned by zero or several available
/// clusters of the list, or an empty destination group. Store failures are
/// propagated as [`MatchingError::Event`].
pub fn modify_clusters(
    event: &mut Event,
    list_name: &str,
    associations: &ViewAssociations,
) -> Result<RewriteSummary, MatchingError> {
    let mut summary = RewriteSummary::default();
    // Handles of deleted clusters are dropped from the rewritten list.
    let list: Vec<ClusterId> = event
        .cluster_list(list_name)?
        .iter()
        .copied()
        .filter(|&id| event.cluster(id).is_ok())
        .collect();

    let mut hits_to_clusters: BTreeMap<HitId, BTreeSet<ClusterId>> = BTreeMap::new();
    let mut clusters_to_hits: BTreeMap<ClusterId, BTreeSet<HitId>> = BTreeMap::new();
    for (id, cluster) in event.clusters_in_list(list_name)? {
        if !cluster.is_available() {
            continue;
        }
        for &hit in cluster.hits() {
            hits_to_clusters.entry(hit).or_default().insert(id);
            clusters_to_hits.entry(id).or_default().insert(hit);
        }
    }

    let mut ambiguous: BTreeSet<HitId> = BTreeSet::new();
    let mut clusters_to_modify: BTreeMap<ClusterId, BTreeSet<HitId>> = BTreeMap::new();
    let mut clusters_to_create: BTreeMap<MatchId, BTreeSet<HitId>> = BTreeMap::new();

    for (&match_id, hits) in associations.match_map() {
        for &hit in hits {
            if associations.claim_count(hit) > 1 {
                ambiguous.insert(hit);
                continue;
            }

            let owner = match hits_to_clusters.get(&hit).map(|owners| (owners.len(), owners.first())) {
                Some((1, Some(&owner))) => owner,
                Some((owners, _)) if owners > 1 => {
                    return Err(MatchingError::SharedHit { hit, owners });
                }
                _ => return Err(MatchingError::UnownedHit(hit)),
            };

            clusters_to_modify.entry(owner).or_default().insert(hit);
            clusters_to_create.entry(match_id).or_default().insert(hit);
        }
    }
    summary.ambiguous_hits = ambiguous.len();

    if clusters_to_create.is_empty() {
        debug!("{list_name}: no uniquely claimed hits");
        return Ok(summary);
    }

    if let Some((&match_id, _)) = clusters_to_create.iter().find(|(_, hits)| hits.is_empty()) {
        return Err(MatchingError::EmptyDestination(match_id.0));
    }

    // A match claiming exactly one whole cluster leaves that cluster in place.
    let retained: Vec<(MatchId, ClusterId)> = clusters_to_create
        .iter()
        .filter_map(|(&match_id, hits)| {
            let first = hits.first()?;
            let &owner = hits_to_clusters.get(first)?.first()?;
            (clusters_to_hits.get(&owner) == Some(hits)).then_some((match_id, owner))
        })
        .collect();
    for (match_id, owner) in retained {
        clusters_to_create.remove(&match_id);
        clusters_to_modify.remove(&owner);
        summary.clusters_retained += 1;
    }

    let mut staged = event.clone();
    let mut deleted: BTreeSet<ClusterId> = BTreeSet::new();

    for (&cluster, to_remove) in &clusters_to_modify {
        let start = clusters_to_hits
            .get(&cluster)
            .ok_or(Error::ClusterNotFound(cluster))?;

        if start.iter().all(|hit| to_remove.contains(hit)) {
            staged.delete_cluster(cluster)?;
            deleted.insert(cluster);
            summary.clusters_deleted += 1;
        } else {
            for &hit in to_remove {
                staged.remove_from_cluster(cluster, hit)?;
            }
            summary.clusters_trimmed += 1;
        }
        summary.hits_migrated += to_remove.len();
    }

    let mut new_list: Vec<ClusterId> = list
        .into_iter()
        .filter(|id| !deleted.contains(id))
        .collect();

    for (match_id, hits) in &clusters_to_create {
        let id = staged.create_cluster(hits.iter().copied())?;
        debug!("{list_name}: {match_id} formed cluster {id} with {} hits", hits.len());
        new_list.push(id);
        summary.clusters_created += 1;
    }

    staged.replace_cluster_list(list_name, new_list)?;
    *event = staged;

    info!(
        "{list_name}: {} hits migrated, {} clusters deleted, {} trimmed, {} created, {} ambiguous hits kept",
        summary.hits_migrated,
        summary.clusters_deleted,
        summary.clusters_trimmed,
        summary.clusters_created,
        summary.ambiguous_hits
    );
    Ok(summary)
}
