//! Event file readers.

use crate::format::EventFile;
use crate::Result;
use crossview_core::Event;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads an event file without building the event.
pub fn read_event_file<P: AsRef<Path>>(path: P) -> Result<EventFile> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let file: EventFile = serde_json::from_reader(reader)?;
    debug!("read {} cluster lists from {}", file.views.len(), path.display());
    Ok(file)
}

/// Reads an event file and builds the event.
pub fn read_event<P: AsRef<Path>>(path: P) -> Result<(EventFile, Event)> {
    let file = read_event_file(path)?;
    let event = file.to_event()?;
    Ok((file, event))
}
