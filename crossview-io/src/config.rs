//! Matching configuration files.

use crate::Result;
use crossview_core::{InputListNames, MatchingConfig};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Contents of a configuration file.
///
/// ```json
/// { "input_cluster_list_names": { "u": "ClustersU", "v": "ClustersV", "w": "ClustersW" },
///   "matching": { "min_matched_hits": 8 } }
/// ```
///
/// Omitted matching thresholds keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Cluster list to process in each view.
    pub input_cluster_list_names: InputListNames,
    /// Matching thresholds.
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Loads and validates a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
    let path = path.as_ref();
    let config: ConfigFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    config.input_cluster_list_names.validate()?;
    config.matching.validate()?;
    debug!("loaded configuration from {}", path.display());
    Ok(config)
}
