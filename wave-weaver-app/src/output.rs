use crate::config::OutputFormat;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use wfc_core::{CellSnapshot, GridSnapshot};

/// JSON document written for `--output-format json`.
#[derive(Serialize)]
struct GridFile<'a> {
    width: usize,
    height: usize,
    seed: u64,
    complete: bool,
    /// Row-major tile ids, `-1` for unresolved cells.
    tiles: Vec<i64>,
    cells: &'a [CellSnapshot],
}

/// Writes rows of space-separated tile ids, `-1` for unresolved cells.
pub fn write_text<W: Write>(grid: &GridSnapshot, writer: &mut W) -> io::Result<()> {
    for row in grid.rows() {
        let line = row
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Saves a grid snapshot to a file in the requested format.
///
/// Incomplete grids are saved as well; unresolved cells come out as `-1`.
pub fn save_grid_to_file(
    grid: &GridSnapshot,
    seed: u64,
    format: OutputFormat,
    output_path: &Path,
) -> Result<()> {
    log::info!("Attempting to save grid to {:?}...", output_path);

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {output_path:?}"))?;
    let mut writer = io::BufWriter::new(file);

    match format {
        OutputFormat::Text => {
            write_text(grid, &mut writer).context("Failed to write grid rows")?;
        }
        OutputFormat::Json => {
            let document = GridFile {
                width: grid.width,
                height: grid.height,
                seed,
                complete: grid.is_complete(),
                tiles: grid.tiles(),
                cells: &grid.cells,
            };
            serde_json::to_writer_pretty(&mut writer, &document)
                .context("Failed to serialize grid as JSON")?;
            writeln!(writer)?;
        }
    }

    writer
        .flush()
        .context("Failed to flush writer for output file")?;
    log::info!("Successfully saved grid to {:?}", output_path);

    Ok(())
}
