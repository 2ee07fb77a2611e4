use anyhow::Result;
use wave_weaver_app::visualization::{render_to_string, TerminalVisualizer, Visualizer};
use wfc_core::{CellSnapshot, Entropy, GridSnapshot, TileId};

fn cell(index: usize, width: usize, tile: Option<usize>, entropy: Entropy) -> CellSnapshot {
    CellSnapshot {
        index,
        x: index % width,
        y: index / width,
        collapsed_tile: tile.map(TileId),
        entropy,
        candidates: tile.map(TileId).into_iter().collect(),
    }
}

// Row 0: collapsed 1, collapsed 11 (base 36 "b"), unconstrained.
// Row 1: two candidates, contradiction, collapsed 0.
fn create_test_grid() -> GridSnapshot {
    GridSnapshot {
        width: 3,
        height: 2,
        cells: vec![
            cell(0, 3, Some(1), Entropy::Finite(0)),
            cell(1, 3, Some(11), Entropy::Finite(0)),
            cell(2, 3, None, Entropy::Unconstrained),
            cell(3, 3, None, Entropy::Finite(2)),
            cell(4, 3, None, Entropy::Finite(0)),
            cell(5, 3, Some(0), Entropy::Finite(0)),
        ],
    }
}

#[test]
fn test_render_glyphs() {
    colored::control::set_override(false);
    assert_eq!(render_to_string(&create_test_grid()), "1b?\n.X0\n");
}

#[test]
fn test_render_empty_grid() {
    let grid = GridSnapshot {
        width: 0,
        height: 0,
        cells: Vec::new(),
    };
    assert_eq!(render_to_string(&grid), "");
}

#[test]
fn test_terminal_visualizer_writes_frames() -> Result<()> {
    colored::control::set_override(false);
    let mut visualizer = TerminalVisualizer::with_writer(Vec::new());
    visualizer.display_state(&create_test_grid())?;
    visualizer.display_state(&create_test_grid())?;
    assert_eq!(visualizer.frames(), 2);

    let text = String::from_utf8(visualizer.into_inner())?;
    assert!(text.starts_with("--- Frame 1 (3/6 collapsed) ---\n1b?\n.X0\n"));
    assert!(text.contains("--- Frame 2 (3/6 collapsed) ---"));
    Ok(())
}
