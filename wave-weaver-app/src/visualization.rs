use colored::{ColoredString, Colorize};
use std::io::{self, Write};
use wfc_core::{CellSnapshot, Entropy, GridSnapshot};

/// Trait for types that can show a grid snapshot to the user.
pub trait Visualizer {
    /// Displays or updates the visualization for the given state.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame could not be written.
    fn display_state(&mut self, grid: &GridSnapshot) -> Result<(), anyhow::Error>;
}

/// Renders the grid as colored characters in the terminal.
///
/// Collapsed cells show their tile id in base 36, open cells show `?` when no
/// neighbor constrains them and `.` otherwise, and contradictions show `X`.
#[derive(Debug)]
pub struct TerminalVisualizer<W: Write = io::Stdout> {
    writer: W,
    frames: usize,
}

impl TerminalVisualizer {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for TerminalVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalVisualizer<W> {
    pub const fn with_writer(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    pub const fn frames(&self) -> usize {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// The frame as text, one grid row per line.
pub fn render_to_string(grid: &GridSnapshot) -> String {
    let mut out = String::new();
    if grid.width == 0 {
        return out;
    }
    for row in grid.cells.chunks(grid.width) {
        for cell in row {
            out.push_str(&glyph(cell).to_string());
        }
        out.push('\n');
    }
    out
}

fn glyph(cell: &CellSnapshot) -> ColoredString {
    match (cell.collapsed_tile, cell.entropy) {
        (Some(tile), _) => {
            let symbol = char::from_digit((tile.0 % 36) as u32, 36).unwrap_or('#');
            paint(symbol.to_string(), tile.0)
        }
        (None, Entropy::Unconstrained) => "?".dimmed(),
        (None, Entropy::Finite(0)) => "X".red().bold(),
        (None, Entropy::Finite(_)) => ".".normal(),
    }
}

fn paint(text: String, tile: usize) -> ColoredString {
    match tile % 6 {
        0 => text.green(),
        1 => text.yellow(),
        2 => text.blue(),
        3 => text.magenta(),
        4 => text.cyan(),
        _ => text.white(),
    }
}

impl<W: Write> Visualizer for TerminalVisualizer<W> {
    fn display_state(&mut self, grid: &GridSnapshot) -> Result<(), anyhow::Error> {
        self.frames += 1;
        let collapsed = grid
            .cells
            .iter()
            .filter(|cell| cell.collapsed_tile.is_some())
            .count();
        writeln!(
            self.writer,
            "--- Frame {} ({}/{} collapsed) ---",
            self.frames,
            collapsed,
            grid.cells.len()
        )?;
        write!(self.writer, "{}", render_to_string(grid))?;
        self.writer.flush()?;
        Ok(())
    }
}
