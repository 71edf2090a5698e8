//! Zone filler interface

use anyhow::Result;

use super::{Board, ItemId};

/// Generates zone fill polygons; the checker only triggers it
pub trait ZoneFiller {
    /// Refill every zone on the board
    fn fill_all(&mut self, board: &mut Board) -> Result<()>;

    /// Zones whose fill is out of date with the board
    fn check_all(&mut self, board: &Board) -> Vec<ItemId>;
}
