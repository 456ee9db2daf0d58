//! Arena-backed event store.
//!
//! Owns every hit and cluster of one event and the named cluster lists that
//! refer to them. Hits and clusters are addressed by [`HitId`] and
//! [`ClusterId`]; cluster slots are emptied on deletion and never reused.
//! Hit ownership is recorded on both sides (hit owner and cluster hit set)
//! and only the primitives here change it.

use crate::clustering::{Cluster, ClusterId, ClusterStatus, Extent};
use crate::error::{Error, Result};
use crate::geometry::{Position, View};
use crate::hit::{Hit, HitId};
use std::collections::{BTreeMap, BTreeSet};

/// Handle for the next slot of an arena holding `len` entries.
fn next_handle(len: usize, kind: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::CapacityExceeded(kind))
}

/// Hits, clusters and named cluster lists of one event.
#[derive(Debug, Clone, Default)]
pub struct Event {
    hits: Vec<Hit>,
    clusters: Vec<Option<Cluster>>,
    lists: BTreeMap<String, Vec<ClusterId>>,
}

impl Event {
    /// Creates an empty event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unclustered hit.
    ///
    /// Fails with [`Error::CapacityExceeded`] once every `u32` handle is taken.
    pub fn add_hit(&mut self, view: View, position: Position) -> Result<HitId> {
        let id = HitId(next_handle(self.hits.len(), "hits")?);
        self.hits.push(Hit::new(view, position));
        Ok(id)
    }

    /// Looks up a hit.
    pub fn hit(&self, id: HitId) -> Result<&Hit> {
        self.hits.get(id.index()).ok_or(Error::HitNotFound(id))
    }

    /// Position of a hit.
    pub fn hit_position(&self, id: HitId) -> Result<Position> {
        self.hit(id).map(Hit::position)
    }

    /// Number of hits in the event.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    /// Looks up a live cluster.
    pub fn cluster(&self, id: ClusterId) -> Result<&Cluster> {
        self.clusters
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(Error::ClusterNotFound(id))
    }

    fn cluster_mut(&mut self, id: ClusterId) -> Result<&mut Cluster> {
        self.clusters
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(Error::ClusterNotFound(id))
    }

    /// Number of live clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.iter().filter(|c| c.is_some()).count()
    }

    /// Creates a cluster from available hits of a single view.
    ///
    /// The new cluster is available and does not belong to any list.
    pub fn create_cluster<I>(&mut self, hits: I) -> Result<ClusterId>
    where
        I: IntoIterator<Item = HitId>,
    {
        let hits: BTreeSet<HitId> = hits.into_iter().collect();
        let first = *hits.first().ok_or(Error::EmptyCluster)?;
        let view = self.hit(first)?.view();

        for &id in &hits {
            let hit = self.hit(id)?;
            if let Some(owner) = hit.owner() {
                return Err(Error::HitAlreadyClustered { hit: id, owner });
            }
            if hit.view() != view {
                return Err(Error::ViewMismatch {
                    hit: id,
                    expected: view,
                    found: hit.view(),
                });
            }
        }

        let cluster_id = ClusterId(next_handle(self.clusters.len(), "clusters")?);
        for &id in &hits {
            self.hits[id.index()].set_owner(Some(cluster_id));
        }
        self.clusters.push(Some(Cluster::new(view, hits)));
        Ok(cluster_id)
    }

    /// Deletes a cluster, releasing its hits.
    ///
    /// Lists keep the stale handle until they are replaced.
    pub fn delete_cluster(&mut self, id: ClusterId) -> Result<()> {
        let cluster = self
            .clusters
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(Error::ClusterNotFound(id))?;

        for hit in cluster.hits() {
            self.hits[hit.index()].set_owner(None);
        }
        Ok(())
    }

    /// Removes one hit from a cluster, releasing it.
    ///
    /// The last hit of a cluster cannot be removed; delete the cluster instead.
    pub fn remove_from_cluster(&mut self, id: ClusterId, hit: HitId) -> Result<()> {
        self.hit(hit)?;
        let cluster = self.cluster_mut(id)?;
        if !cluster.contains(hit) {
            return Err(Error::HitNotInCluster { hit, cluster: id });
        }
        if cluster.len() == 1 {
            return Err(Error::WouldEmptyCluster { hit, cluster: id });
        }
        cluster.remove(hit);
        self.hits[hit.index()].set_owner(None);
        Ok(())
    }

    /// Marks a cluster as available or consumed.
    pub fn set_cluster_status(&mut self, id: ClusterId, status: ClusterStatus) -> Result<()> {
        self.cluster_mut(id)?.set_status(status);
        Ok(())
    }

    /// Handles stored under a list name.
    pub fn cluster_list(&self, name: &str) -> Result<&[ClusterId]> {
        self.lists
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::ListNotFound(name.to_string()))
    }

    /// Names of all cluster lists.
    pub fn list_names(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    /// Replaces (or creates) a named list in one step.
    ///
    /// Every handle must refer to a live cluster; on failure the previous
    /// list is left in place.
    pub fn replace_cluster_list(&mut self, name: &str, ids: Vec<ClusterId>) -> Result<()> {
        for &id in &ids {
            self.cluster(id)?;
        }
        self.lists.insert(name.to_string(), ids);
        Ok(())
    }

    /// Live clusters of a list, skipping stale handles.
    pub fn clusters_in_list(&self, name: &str) -> Result<Vec<(ClusterId, &Cluster)>> {
        Ok(self
            .cluster_list(name)?
            .iter()
            .filter_map(|&id| self.cluster(id).ok().map(|c| (id, c)))
            .collect())
    }

    /// Positions of a cluster's hits, in handle order.
    pub fn cluster_positions(&self, id: ClusterId) -> Result<Vec<(HitId, Position)>> {
        self.cluster(id)?
            .hits()
            .iter()
            .map(|&hit| self.hit_position(hit).map(|p| (hit, p)))
            .collect()
    }

    /// Bounding box of a cluster.
    pub fn cluster_extent(&self, id: ClusterId) -> Result<Extent> {
        let positions = self.cluster_positions(id)?;
        Extent::from_positions(positions.into_iter().map(|(_, p)| p)).ok_or(Error::EmptyCluster)
    }

    /// Drift-coordinate span `(min, max)` of a cluster.
    pub fn cluster_span_x(&self, id: ClusterId) -> Result<(f64, f64)> {
        self.cluster_extent(id).map(|e| (e.min_x, e.max_x))
    }

    /// Squared bounding-box length of a cluster.
    pub fn cluster_length_squared(&self, id: ClusterId) -> Result<f64> {
        self.cluster_extent(id).map(|e| e.length_squared())
    }

    /// Verifies that hit owners and cluster memberships agree.
    pub fn check_consistency(&self) -> Result<()> {
        let mut seen = vec![None; self.hits.len()];
        for (slot, cluster) in self.clusters.iter().enumerate() {
            let Some(cluster) = cluster else { continue };
            let id = ClusterId(u32::try_from(slot).unwrap_or(u32::MAX));
            for &hit in cluster.hits() {
                let entry = seen.get_mut(hit.index()).ok_or(Error::HitNotFound(hit))?;
                if let Some(owner) = *entry {
                    return Err(Error::HitAlreadyClustered { hit, owner });
                }
                *entry = Some(id);
            }
        }
        for (index, hit) in self.hits.iter().enumerate() {
            if hit.owner() != seen[index] {
                let id = HitId(u32::try_from(index).unwrap_or(u32::MAX));
                return match (hit.owner(), seen[index]) {
                    (Some(owner), _) => Err(Error::HitNotInCluster {
                        hit: id,
                        cluster: owner,
                    }),
                    (None, Some(owner)) => Err(Error::HitAlreadyClustered { hit: id, owner }),
                    (None, None) => Ok(()),
                };
            }
        }
        Ok(())
    }
}
