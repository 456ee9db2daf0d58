//! Per-cluster trajectory fit cache.

use crossview_core::{
    ClusterId, Error, Event, MatchingError, Position, TrajectoryFit, TrajectoryFitter,
};
use log::warn;
use rayon::prelude::*;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// One trajectory fit per cluster, built once per event and then read-only.
#[derive(Debug, Clone)]
pub struct FitCache<F> {
    fits: BTreeMap<ClusterId, F>,
}

impl<F> Default for FitCache<F> {
    fn default() -> Self {
        Self {
            fits: BTreeMap::new(),
        }
    }
}

impl<F: TrajectoryFit> FitCache<F> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit of a cluster, if one was built.
    #[must_use]
    pub fn get(&self, id: ClusterId) -> Option<&F> {
        self.fits.get(&id)
    }

    /// Returns true if the cluster has a fit.
    #[must_use]
    pub fn contains(&self, id: ClusterId) -> bool {
        self.fits.contains_key(&id)
    }

    /// Number of cached fits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fits.len()
    }

    /// Returns true if no fit is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }

    /// Cached cluster handles in order.
    pub fn cluster_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.fits.keys().copied()
    }

    /// Inserts a fit under its cluster.
    ///
    /// A second fit for the same cluster is an internal error.
    pub fn insert(&mut self, fit: F) -> Result<(), MatchingError> {
        match self.fits.entry(fit.cluster_id()) {
            Entry::Vacant(slot) => {
                slot.insert(fit);
                Ok(())
            }
            Entry::Occupied(slot) => Err(MatchingError::DuplicateFit(*slot.key())),
        }
    }

    /// Fits every listed cluster that has no fit yet.
    ///
    /// Fits are computed in parallel and inserted in handle order. Clusters
    /// the fitter rejects are logged and left without a fit. Returns the
    /// number of fits added.
    pub fn add_clusters<T>(
        &mut self,
        event: &Event,
        clusters: &[ClusterId],
        fitter: &T,
        half_window: usize,
    ) -> Result<usize, MatchingError>
    where
        T: TrajectoryFitter<Fit = F>,
    {
        let pending: BTreeSet<ClusterId> = clusters
            .iter()
            .copied()
            .filter(|&id| !self.contains(id))
            .collect();

        let inputs = pending
            .into_iter()
            .map(|id| {
                let positions: Vec<Position> = event
                    .cluster_positions(id)?
                    .into_iter()
                    .map(|(_, position)| position)
                    .collect();
                Ok((id, positions))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let results: Vec<_> = inputs
            .par_iter()
            .map(|(id, positions)| (*id, fitter.fit(*id, positions, half_window)))
            .collect();

        let mut added = 0;
        for (id, result) in results {
            match result {
                Ok(fit) => {
                    self.insert(fit)?;
                    added += 1;
                }
                Err(err) => warn!("no trajectory fit for cluster {id}: {err}"),
            }
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossview_core::{SlidingLinearFit, SlidingLinearFitter, View};

    fn event_with_lines(n_clusters: usize) -> (Event, Vec<ClusterId>) {
        let mut event = Event::new();
        let ids = (0..n_clusters)
            .map(|c| {
                let hits: Vec<_> = (0..12)
                    .map(|i| {
                        let z = c as f64 * 10.0 + 0.3 * i as f64;
                        event.add_hit(View::W, Position::new(i as f64, z)).unwrap()
                    })
                    .collect();
                event.create_cluster(hits).unwrap()
            })
            .collect();
        (event, ids)
    }

    #[test]
    fn test_builder_is_idempotent() {
        let (event, ids) = event_with_lines(3);
        let fitter = SlidingLinearFitter::default();
        let mut cache: FitCache<SlidingLinearFit> = FitCache::new();

        assert_eq!(cache.add_clusters(&event, &ids, &fitter, 15).unwrap(), 3);
        let snapshot: Vec<_> = ids.iter().map(|&id| cache.get(id).cloned()).collect();

        assert_eq!(cache.add_clusters(&event, &ids, &fitter, 15).unwrap(), 0);
        assert_eq!(cache.len(), 3);
        let again: Vec<_> = ids.iter().map(|&id| cache.get(id).cloned()).collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_repeated_input_fits_once() {
        let (event, ids) = event_with_lines(1);
        let mut cache = FitCache::new();
        let added = cache
            .add_clusters(&event, &[ids[0], ids[0]], &SlidingLinearFitter::default(), 15)
            .unwrap();
        assert_eq!(added, 1);
    }

    #[test]
    fn test_duplicate_insert_is_error() {
        let (event, ids) = event_with_lines(1);
        let positions: Vec<_> = event
            .cluster_positions(ids[0])
            .unwrap()
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        let fit = SlidingLinearFit::new(ids[0], &positions, 15, 0.5).unwrap();

        let mut cache = FitCache::new();
        cache.insert(fit.clone()).unwrap();
        assert_eq!(cache.insert(fit), Err(MatchingError::DuplicateFit(ids[0])));
    }

    #[test]
    fn test_unknown_cluster_propagates() {
        let (event, _) = event_with_lines(1);
        let mut cache: FitCache<SlidingLinearFit> = FitCache::new();
        let err = cache
            .add_clusters(&event, &[ClusterId(9)], &SlidingLinearFitter::default(), 15)
            .unwrap_err();
        assert_eq!(err, MatchingError::Event(Error::ClusterNotFound(ClusterId(9))));
    }
}
