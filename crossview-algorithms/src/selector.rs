//! Selection of available and clean clusters from a view's list.

use crossview_core::{ClusterId, Event, MatchingError};

/// Available clusters of a list, largest first.
///
/// Ties in hit count are broken by handle so the order is reproducible.
/// Fails with [`MatchingError::NoAvailableClusters`] if nothing is available.
pub fn select_available_clusters(
    event: &Event,
    list_name: &str,
) -> Result<Vec<ClusterId>, MatchingError> {
    let mut selected: Vec<(ClusterId, usize)> = event
        .clusters_in_list(list_name)?
        .into_iter()
        .filter(|(_, cluster)| cluster.is_available())
        .map(|(id, cluster)| (id, cluster.len()))
        .collect();

    if selected.is_empty() {
        return Err(MatchingError::NoAvailableClusters(list_name.to_string()));
    }

    selected.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    Ok(selected.into_iter().map(|(id, _)| id).collect())
}

/// Clusters at least `min_length` long, keeping the input order.
pub fn select_clean_clusters(
    event: &Event,
    clusters: &[ClusterId],
    min_length: f64,
) -> Result<Vec<ClusterId>, MatchingError> {
    let min_length_squared = min_length * min_length;
    let mut clean = Vec::with_capacity(clusters.len());
    for &id in clusters {
        if event.cluster_length_squared(id)? < min_length_squared {
            continue;
        }
        clean.push(id);
    }
    Ok(clean)
}
