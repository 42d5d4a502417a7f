//! Intermediate (CSV) and trace (TSV) file handling.

use crate::store::Grid;
use crate::utils::error::ConverterError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Line terminator expected by the simulator's `-load` reader
pub const INTERMEDIATE_LINE_END: &str = "\r\n";

/// Write the first cell of each row as one line of the intermediate file
///
/// **Public** - step 1 of the conversion
///
/// # Arguments
/// * `grid` - Harvested rows; rows without cells become empty lines
/// * `path` - Intermediate file to create (truncated if present)
///
/// # Returns
/// The lines written, in order
///
/// # Errors
/// * `ConverterError::Io` - file could not be created or written
pub fn write_intermediate(grid: &Grid, path: &Path) -> Result<Vec<String>, ConverterError> {
    let io_err = |source: std::io::Error| ConverterError::Io {
        path: path.to_path_buf(),
        source,
    };

    let lines: Vec<String> = grid
        .iter()
        .map(|row| row.first().cloned().unwrap_or_default())
        .collect();

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    for line in &lines {
        writer.write_all(line.as_bytes()).map_err(io_err)?;
        writer
            .write_all(INTERMEDIATE_LINE_END.as_bytes())
            .map_err(io_err)?;
    }

    // Flush and close before the simulator opens the file
    writer.flush().map_err(io_err)?;
    drop(writer);

    info!("Wrote {} lines to {}", lines.len(), path.display());
    Ok(lines)
}

/// Parse a finished trace file into rows of tab-separated fields
///
/// **Public** - step 3 of the conversion
///
/// Content is not validated; a line without tabs becomes a one-cell row.
pub fn read_trace(path: &Path) -> Result<Grid, ConverterError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConverterError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let trace = parse_trace(&contents);
    debug!("Parsed {} trace rows from {}", trace.len(), path.display());
    Ok(trace)
}

/// Split TSV text into rows, dropping line terminators
pub fn parse_trace(contents: &str) -> Grid {
    contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}
