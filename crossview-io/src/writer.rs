//! Event file writers.

use crate::format::EventFile;
use crate::Result;
use crossview_core::{Event, InputListNames};
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes an event file as pretty-printed JSON.
pub fn write_event_file<P: AsRef<Path>>(path: P, file: &EventFile) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, file)?;
    writeln!(writer)?;
    writer.flush()?;
    debug!("wrote {} cluster lists to {}", file.views.len(), path.display());
    Ok(())
}

/// Writes the named lists of an event.
pub fn write_event<P: AsRef<Path>>(path: P, event: &Event, names: &InputListNames) -> Result<()> {
    write_event_file(path, &EventFile::from_event(event, names)?)
}

/// Writes every list of `input` as it now stands in `event`.
pub fn write_refreshed_event<P: AsRef<Path>>(path: P, input: &EventFile, event: &Event) -> Result<()> {
    write_event_file(path, &input.refreshed(event)?)
}
