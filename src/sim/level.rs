//! Level layout
//!
//! The board is a dense grid of Normal blocks with a fixed "T" of walls through it
//! and a handful of BallBonus blocks sprinkled in. Shape is fixed, content is random.

use std::ops::Range;

use rand::Rng;

use super::state::{Block, BlockKind};
use crate::tuning::GridLayout;

/// Crossbar of the T (grid row, column span)
const CROSSBAR_ROW: usize = 6;
const CROSSBAR_COLS: Range<usize> = 5..55;
/// Uprights of the T (row span, columns)
const UPRIGHT_ROWS: Range<usize> = 7..18;
const UPRIGHT_COLS: [usize; 3] = [5, 30, 54];

/// Bonus blocks stay this many cells away from the grid edges
const BONUS_COL_MARGIN: usize = 10;
const BONUS_ROW_MARGIN: usize = 5;

/// Grid cells (row, col) covered by walls. Same for every level.
pub fn wall_cells(layout: &GridLayout) -> Vec<(usize, usize)> {
    let crossbar = CROSSBAR_COLS.map(|col| (CROSSBAR_ROW, col));
    let uprights = UPRIGHT_COLS
        .iter()
        .flat_map(|&col| UPRIGHT_ROWS.map(move |row| (row, col)));

    crossbar
        .chain(uprights)
        .filter(|&(row, col)| row < layout.rows && col < layout.cols)
        .collect()
}

/// Build a fresh board
pub fn generate_level<R: Rng>(rng: &mut R, layout: &GridLayout) -> Vec<Block> {
    let cols = layout.cols;
    let rows = layout.rows;
    let size = layout.block_size;

    let mut blocks = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let hp = rng.random_range(1..=3);
            blocks.push(Block::normal(layout.cell_origin(row, col), size, hp));
        }
    }

    for (row, col) in wall_cells(layout) {
        blocks[row * cols + col] = Block::wall(layout.cell_origin(row, col), size);
    }

    let bonus_cols = BONUS_COL_MARGIN..cols.saturating_sub(BONUS_COL_MARGIN);
    let bonus_rows = BONUS_ROW_MARGIN..rows.saturating_sub(BONUS_ROW_MARGIN);
    if bonus_cols.is_empty() || bonus_rows.is_empty() {
        log::warn!("Grid {}x{} too small for bonus blocks", cols, rows);
        return blocks;
    }

    let min = layout.min_bonus_blocks.min(layout.max_bonus_blocks);
    let count = rng.random_range(min..=layout.max_bonus_blocks);
    let mut placed = 0;
    for _ in 0..count {
        let col = rng.random_range(bonus_cols.clone());
        let row = rng.random_range(bonus_rows.clone());
        let index = row * cols + col;
        // A wall or an earlier bonus already there: skip, don't retry
        if blocks[index].kind == BlockKind::Normal {
            blocks[index] = Block::ball_bonus(layout.cell_origin(row, col), size);
            placed += 1;
        }
    }

    log::debug!(
        "Generated level: {} blocks, {} bonus ({} attempted)",
        blocks.len(),
        placed,
        count
    );
    blocks
}
