//! Serialized form of an event.
//!
//! An event file holds one record per cluster list:
//!
//! ```json
//! { "views": [ { "view": "U", "list_name": "ClustersU",
//!                "clusters": [ { "available": true, "hits": [[0.0, 1.5]] } ] } ] }
//! ```
//!
//! Each hit is an `[x, z]` pair in the record's view.

use crate::{Error, Result};
use crossview_core::{ClusterStatus, Event, InputListNames, Position, View};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whole event file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFile {
    /// Cluster lists, one per record.
    pub views: Vec<ViewRecord>,
}

/// One named cluster list of a single view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    /// View of every hit in the list.
    pub view: View,
    /// Name the list is registered under.
    pub list_name: String,
    /// Clusters of the list.
    #[serde(default)]
    pub clusters: Vec<ClusterRecord>,
}

impl ViewRecord {
    /// Captures one list of an event, checking every cluster is in `view`.
    fn from_event(event: &Event, view: View, list_name: &str) -> Result<Self> {
        let mut clusters = Vec::new();
        for (id, cluster) in event.clusters_in_list(list_name)? {
            if cluster.view() != view {
                return Err(Error::InvalidFormat(format!(
                    "cluster {id} in list '{list_name}' belongs to view {}",
                    cluster.view()
                )));
            }
            let hits = event
                .cluster_positions(id)?
                .into_iter()
                .map(|(_, p)| [p.x, p.z])
                .collect();
            clusters.push(ClusterRecord {
                available: cluster.is_available(),
                hits,
            });
        }
        Ok(Self {
            view,
            list_name: list_name.to_string(),
            clusters,
        })
    }
}

/// One cluster and its hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// False for clusters already consumed by earlier processing.
    #[serde(default = "default_available")]
    pub available: bool,
    /// Hit positions as `[x, z]`.
    pub hits: Vec<[f64; 2]>,
}

fn default_available() -> bool {
    true
}

impl EventFile {
    /// Builds an event holding every listed cluster.
    ///
    /// Fails on repeated list names and on clusters without hits.
    pub fn to_event(&self) -> Result<Event> {
        let mut event = Event::new();
        let mut seen = BTreeSet::new();

        for record in &self.views {
            if !seen.insert(record.list_name.as_str()) {
                return Err(Error::InvalidFormat(format!(
                    "cluster list '{}' appears more than once",
                    record.list_name
                )));
            }

            let mut ids = Vec::with_capacity(record.clusters.len());
            for (index, cluster) in record.clusters.iter().enumerate() {
                if cluster.hits.is_empty() {
                    return Err(Error::InvalidFormat(format!(
                        "cluster {index} of list '{}' has no hits",
                        record.list_name
                    )));
                }
                let hits = cluster
                    .hits
                    .iter()
                    .map(|&[x, z]| event.add_hit(record.view, Position::new(x, z)))
                    .collect::<crossview_core::Result<Vec<_>>>()?;
                let id = event.create_cluster(hits)?;
                if !cluster.available {
                    event.set_cluster_status(id, ClusterStatus::Consumed)?;
                }
                ids.push(id);
            }
            event.replace_cluster_list(&record.list_name, ids)?;
        }
        Ok(event)
    }

    /// Captures the named lists of an event, U then V then W.
    pub fn from_event(event: &Event, names: &InputListNames) -> Result<Self> {
        let views = View::ALL
            .into_iter()
            .map(|view| ViewRecord::from_event(event, view, names.get(view)))
            .collect::<Result<_>>()?;
        Ok(Self { views })
    }

    /// Re-reads every record of this file from `event`.
    ///
    /// Record order, views and empty lists are kept, so lists the matching
    /// never touched come back unchanged.
    pub fn refreshed(&self, event: &Event) -> Result<Self> {
        let views = self
            .views
            .iter()
            .map(|record| ViewRecord::from_event(event, record.view, &record.list_name))
            .collect::<Result<_>>()?;
        Ok(Self { views })
    }

    /// List names when every view has exactly one record.
    #[must_use]
    pub fn list_names(&self) -> Option<InputListNames> {
        let name_of = |view: View| {
            let mut records = self.views.iter().filter(|r| r.view == view);
            match (records.next(), records.next()) {
                (Some(record), None) => Some(record.list_name.clone()),
                _ => None,
            }
        };
        Some(InputListNames::new(
            name_of(View::U)?,
            name_of(View::V)?,
            name_of(View::W)?,
        ))
    }

    /// Number of clusters and hits of each record.
    pub fn counts(&self) -> impl Iterator<Item = (&ViewRecord, usize, usize)> {
        self.views.iter().map(|record| {
            let hits = record.clusters.iter().map(|c| c.hits.len()).sum();
            (record, record.clusters.len(), hits)
        })
    }
}
