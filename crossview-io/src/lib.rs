//! crossview-io: JSON files for crossview.
//!
//! This crate reads and writes events as per-view cluster lists and loads
//! matching configuration files.
//!

mod config;
mod error;
mod format;
mod reader;
mod writer;

pub use config::{load_config, ConfigFile};
pub use error::{Error, Result};
pub use format::{ClusterRecord, EventFile, ViewRecord};
pub use reader::{read_event, read_event_file};
pub use writer::{write_event, write_event_file, write_refreshed_event};
